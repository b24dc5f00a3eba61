//! Body styles, drivetrain terms, domain keywords, stop-words and language
//! indicator words.

use super::SynonymTable;

pub const VEHICLE_TYPES: &SynonymTable = &[
    ("sedan", &["sedán", "saloon"]),
    ("suv", &["suvs", "crossover", "todoterreno", "jeepeta"]),
    (
        "truck",
        &["trucks", "pickup", "pick up", "pick-up", "camion", "camión", "troca"],
    ),
    ("coupe", &["coupé", "cupé", "cupe"]),
    ("convertible", &["cabriolet", "descapotable"]),
    ("hatchback", &["hatch"]),
    ("minivan", &["mini van", "minivans"]),
    ("van", &["vans", "furgoneta", "guagua"]),
    ("wagon", &["station wagon", "familiar"]),
];

pub const FUEL_TYPES: &SynonymTable = &[
    ("gasoline", &["gas", "gasolina", "petrol"]),
    ("diesel", &["diésel", "gasoil"]),
    ("hybrid", &["híbrido", "híbrida", "hybrids", "plug-in hybrid"]),
    ("electric", &["eléctrico", "eléctrica", "electricos", "ev", "evs", "battery electric"]),
];

pub const TRANSMISSIONS: &SynonymTable = &[
    ("automatic", &["auto transmission", "automático", "automática", "automatica"]),
    ("manual", &["stick", "stick shift", "estándar", "standard", "mecánico", "mecánica"]),
    ("cvt", &["continuously variable"]),
];

pub const CONDITIONS: &SynonymTable = &[
    ("new", &["brand new", "nuevo", "nueva", "nuevos", "0 km", "0km"]),
    ("used", &["pre-owned", "preowned", "usado", "usada", "usados", "seminuevo"]),
    ("certified", &["certified pre-owned", "cpo", "certificado", "certificada"]),
];

/// Aspiration and layout descriptors found in engine descriptions.
pub const ENGINE_TYPES: &SynonymTable = &[
    ("turbo", &["turbocharged", "turbocargado", "twin turbo", "biturbo"]),
    ("supercharged", &["supercargado", "supercharger"]),
    ("rotary", &["rotativo", "wankel"]),
    ("boxer", &["flat four", "flat six", "bóxer"]),
];

/// Terms whose presence marks a query as belonging to the vehicle domain.
///
/// Brands, models and the synonym tables above count too; this list holds
/// the generic nouns and shopping words that do not appear elsewhere.
pub const AUTOMOTIVE_KEYWORDS: &[&str] = &[
    "car", "cars", "auto", "autos", "automobile", "vehicle", "vehicles", "carro", "carros",
    "coche", "coches", "vehiculo", "vehículo", "vehiculos", "vehículos", "dealer", "dealership",
    "concesionario", "mileage", "millaje", "millas", "miles", "engine", "motor", "cylinder",
    "cylinders", "cilindro", "cilindros", "horsepower", "caballos de fuerza", "transmission",
    "transmisión", "awd", "4x4", "4wd", "turbo", "mpg", "trim", "financing", "financiamiento",
    "lease", "test drive",
];

/// Keywords that mark a query as asking about mechanical specifications.
pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "cylinder", "cylinders", "cyl", "cilindro", "cilindros", "engine", "motor", "horsepower",
    "hp", "caballos", "torque", "displacement", "cilindrada", "liter", "litre", "litros", "turbo",
    "supercharged", "v6", "v8", "v10", "v12",
];

/// Words ignored when falling back to raw query tokens.
pub const STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "the", "and", "or", "for", "with", "without", "in", "on", "of", "to", "from",
    "under", "over", "below", "above", "less", "more", "than", "between", "around", "about",
    "show", "find", "me", "i", "want", "need", "looking", "search", "buy", "some", "any",
    "cheap", "good", "best", "like", "that", "this", "is", "are", "have", "has", "do", "does",
    "what", "which", "near", "car", "cars", "vehicle", "vehicles", "auto", "autos",
    // Spanish
    "un", "una", "unos", "unas", "el", "la", "los", "las", "y", "o", "para", "con", "sin", "en",
    "de", "del", "al", "menos", "mas", "más", "que", "entre", "por", "busco", "buscando",
    "quiero", "necesito", "muestrame", "muéstrame", "dame", "hay", "tienen", "tienes", "algun",
    "alguno", "alguna", "barato", "barata", "bueno", "mejor", "cerca", "carro", "carros", "coche",
    "coches", "vehiculo", "vehículo", "vehiculos", "vehículos",
];

/// Spanish function words: articles, prepositions, question words.
pub const SPANISH_INDICATORS: &[&str] = &[
    "el", "la", "los", "las", "un", "una", "unos", "unas", "de", "del", "con", "para", "por",
    "que", "qué", "en", "y", "menos", "más", "mas", "entre", "desde", "hasta", "sin", "cual",
    "cuál", "cuanto", "cuánto", "donde", "dónde", "como", "cómo", "quiero", "busco", "tengo",
    "hay", "es", "son", "mi", "tu",
];

/// English function words: articles, prepositions, question words.
pub const ENGLISH_INDICATORS: &[&str] = &[
    "the", "an", "of", "with", "for", "in", "on", "under", "over", "below", "above",
    "than", "between", "from", "to", "and", "or", "what", "which", "where", "how", "much",
    "is", "are", "i", "want", "looking", "show", "me", "find", "any", "my",
];

/// Spanish-only domain words that tip short queries (`"carro rojo"`).
pub const SPANISH_HINTS: &[&str] = &[
    "carro", "carros", "coche", "coches", "camioneta", "guagua", "rojo", "roja", "negro",
    "negra", "blanco", "blanca", "azul", "gris", "verde", "plateado", "usado", "usada", "nuevo",
    "nueva", "precio", "millas", "barato", "barata", "cilindros", "cilindro", "automatico",
    "automático", "año",
];

/// English-only domain words that tip short queries (`"red car"`).
pub const ENGLISH_HINTS: &[&str] = &[
    "car", "cars", "truck", "trucks", "red", "black", "white", "blue", "gray", "grey", "green",
    "silver", "used", "new", "price", "miles", "cheap", "cylinder", "cylinders", "automatic",
    "year",
];

/// Municipalities of the default market region, matched as explicit
/// location filters.
pub const LOCATIONS: &[&str] = &[
    "San Juan", "Bayamón", "Carolina", "Ponce", "Caguas", "Guaynabo", "Arecibo", "Mayagüez",
    "Toa Baja", "Toa Alta", "Trujillo Alto", "Humacao", "Fajardo", "Aguadilla", "Dorado",
    "Manatí", "Vega Baja", "Cayey", "Yauco", "Hatillo", "Cidra", "Río Grande", "Canóvanas",
    "Isabela", "Juana Díaz",
];
