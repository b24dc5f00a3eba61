//! Makes and models.

use super::SynonymTable;

/// Vehicle makes and the short names people use for them.
pub const BRANDS: &SynonymTable = &[
    ("acura", &[]),
    ("alfa romeo", &["alfa"]),
    ("audi", &[]),
    ("bmw", &["beemer", "bimmer"]),
    ("buick", &[]),
    ("cadillac", &["caddy"]),
    ("chevrolet", &["chevy", "chev"]),
    ("chrysler", &[]),
    ("dodge", &[]),
    ("fiat", &[]),
    ("ford", &[]),
    ("genesis", &[]),
    ("gmc", &[]),
    ("honda", &[]),
    ("hyundai", &["hyundia"]),
    ("infiniti", &["infinity"]),
    ("isuzu", &[]),
    ("jaguar", &["jag"]),
    ("jeep", &[]),
    ("kia", &[]),
    ("land rover", &["landrover"]),
    ("lexus", &[]),
    ("lincoln", &[]),
    ("mazda", &[]),
    ("mercedes-benz", &["mercedes", "benz", "mercedez"]),
    ("mini", &["mini cooper"]),
    ("mitsubishi", &[]),
    ("nissan", &[]),
    ("porsche", &[]),
    ("ram", &[]),
    ("subaru", &[]),
    ("suzuki", &[]),
    ("tesla", &[]),
    ("toyota", &[]),
    ("volkswagen", &["vw", "volkswagon"]),
    ("volvo", &[]),
];

/// Well-known models and the make they belong to.
///
/// Used to infer a brand when the user only names a model
/// (`"corolla"` implies Toyota).
pub const MODELS: &[(&str, &str)] = &[
    // Toyota
    ("corolla", "toyota"),
    ("camry", "toyota"),
    ("rav4", "toyota"),
    ("tacoma", "toyota"),
    ("tundra", "toyota"),
    ("4runner", "toyota"),
    ("highlander", "toyota"),
    ("yaris", "toyota"),
    ("prius", "toyota"),
    ("sienna", "toyota"),
    ("hilux", "toyota"),
    // Honda
    ("civic", "honda"),
    ("accord", "honda"),
    ("cr-v", "honda"),
    ("hr-v", "honda"),
    ("odyssey", "honda"),
    // Nissan
    ("sentra", "nissan"),
    ("altima", "nissan"),
    ("versa", "nissan"),
    ("rogue", "nissan"),
    ("frontier", "nissan"),
    ("pathfinder", "nissan"),
    // Hyundai / Kia
    ("elantra", "hyundai"),
    ("sonata", "hyundai"),
    ("tucson", "hyundai"),
    ("santa fe", "hyundai"),
    ("forte", "kia"),
    ("sportage", "kia"),
    ("sorento", "kia"),
    ("telluride", "kia"),
    // Ford
    ("f-150", "ford"),
    ("mustang", "ford"),
    ("explorer", "ford"),
    ("ranger", "ford"),
    ("bronco", "ford"),
    // Chevrolet / GMC
    ("silverado", "chevrolet"),
    ("camaro", "chevrolet"),
    ("corvette", "chevrolet"),
    ("malibu", "chevrolet"),
    ("tahoe", "chevrolet"),
    ("equinox", "chevrolet"),
    ("colorado", "chevrolet"),
    ("sierra", "gmc"),
    ("yukon", "gmc"),
    // Jeep / Dodge / Ram
    ("wrangler", "jeep"),
    ("grand cherokee", "jeep"),
    ("cherokee", "jeep"),
    ("gladiator", "jeep"),
    ("charger", "dodge"),
    ("challenger", "dodge"),
    ("durango", "dodge"),
    // German
    ("3 series", "bmw"),
    ("5 series", "bmw"),
    ("x3", "bmw"),
    ("x5", "bmw"),
    ("m3", "bmw"),
    ("c-class", "mercedes-benz"),
    ("e-class", "mercedes-benz"),
    ("gle", "mercedes-benz"),
    ("a4", "audi"),
    ("q5", "audi"),
    ("q7", "audi"),
    ("jetta", "volkswagen"),
    ("golf", "volkswagen"),
    ("tiguan", "volkswagen"),
    ("911", "porsche"),
    ("cayenne", "porsche"),
    ("macan", "porsche"),
    // Others
    ("mazda3", "mazda"),
    ("cx-5", "mazda"),
    ("mx-5", "mazda"),
    ("outback", "subaru"),
    ("forester", "subaru"),
    ("impreza", "subaru"),
    ("model 3", "tesla"),
    ("model y", "tesla"),
    ("model s", "tesla"),
    ("rx", "lexus"),
    ("outlander", "mitsubishi"),
    ("mirage", "mitsubishi"),
];

/// Look up the make for a known model name.
#[must_use]
pub fn brand_for_model(model: &str) -> Option<&'static str> {
    let wanted = crate::model::tokenize(model).join(" ");
    MODELS
        .iter()
        .find(|(name, _)| crate::model::tokenize(name).join(" ") == wanted)
        .map(|&(_, brand)| brand)
}
