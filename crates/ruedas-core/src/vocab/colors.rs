//! Exterior/interior color names.

use super::SynonymTable;

/// Standard colors and their English/Spanish spellings.
///
/// Compound finishes that dealers list as a color in their own right
/// (pearl white, gunmetal, two-tone) are separate canonical entries.
pub const COLORS: &SynonymTable = &[
    ("white", &["blanco", "blanca", "blancos", "blancas"]),
    ("black", &["negro", "negra", "negros", "negras"]),
    ("silver", &["plateado", "plateada", "plata"]),
    ("gray", &["grey", "gris", "grises"]),
    ("red", &["rojo", "roja", "rojos", "rojas"]),
    ("blue", &["azul", "azules"]),
    ("green", &["verde", "verdes"]),
    ("yellow", &["amarillo", "amarilla"]),
    ("orange", &["anaranjado", "anaranjada", "naranja"]),
    ("brown", &["marrón", "marron", "carmelita"]),
    ("beige", &["tan", "crema", "arena"]),
    ("gold", &["dorado", "dorada", "oro"]),
    ("purple", &["morado", "morada", "violeta", "púrpura"]),
    ("burgundy", &["maroon", "vino tinto", "borgoña", "granate"]),
    ("pearl white", &["white pearl", "blanco perla", "blanco perlado"]),
    ("gunmetal", &["gun metal", "gris oscuro", "dark gray", "dark grey"]),
    ("two-tone", &["two tone", "dual tone", "bicolor", "dos tonos"]),
];

/// Finish descriptors that qualify a color.
pub const COLOR_DESCRIPTORS: &SynonymTable = &[
    ("metallic", &["metálico", "metálica", "metalizado", "metalizada"]),
    ("matte", &["matt", "mate", "satin", "satinado"]),
    ("pearl", &["pearlescent", "perla", "perlado", "nacarado"]),
    ("iridescent", &["iridiscente", "tornasol", "tornasolado"]),
];

/// Spellings that are also everyday Spanish words (`"no tan caro"`,
/// `"poca plata"`). They still match stored inventory values, but a query
/// only names them as a color next to a [`COLOR_CONTEXT`] word.
pub const CONTEXT_ONLY_SPELLINGS: &[&str] = &["tan", "plata", "arena", "mate"];

/// Words that mark the neighbouring term as a color.
pub const COLOR_CONTEXT: &[&str] = &["color", "colour", "paint", "pintura", "acabado", "finish"];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::word_haystack;
    use crate::vocab::{canonicalize, find_canonical};

    #[test]
    fn test_spanish_colors_resolve() {
        assert_eq!(canonicalize(COLORS, "rojo"), Some("red"));
        assert_eq!(canonicalize(COLORS, "Marrón"), Some("brown"));
        assert_eq!(canonicalize(COLORS, "dos tonos"), Some("two-tone"));
    }

    #[test]
    fn test_descriptor_lookup() {
        let haystack = word_haystack("rojo metálico");
        assert_eq!(find_canonical(COLOR_DESCRIPTORS, &haystack), Some("metallic"));
    }
}
