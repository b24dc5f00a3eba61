/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

// Mirrors the columns of the production inventory store. `year` and `price`
// are text there (dealers type them freely), so readers cast them through
// `safe_number`.
const MIGRATION_001: &str = r#"
CREATE TABLE IF NOT EXISTS vehicles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brand TEXT NOT NULL,
    model TEXT NOT NULL,
    year TEXT,
    price TEXT,
    exterior_color TEXT,
    interior_color TEXT,
    transmission TEXT,
    fuel_type TEXT,
    engine TEXT,
    vehicle_type TEXT,
    condition TEXT,
    mileage INTEGER,
    location TEXT NOT NULL,
    address TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_vehicles_brand ON vehicles(brand);
CREATE INDEX IF NOT EXISTS idx_vehicles_model ON vehicles(model);
CREATE INDEX IF NOT EXISTS idx_vehicles_location ON vehicles(location);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "vehicles",
    sql: MIGRATION_001,
}];
