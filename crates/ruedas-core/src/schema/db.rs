use rusqlite::{Connection, InterruptHandle, OpenFlags};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{format_price, VehicleRecord};

use super::filter::TierPlan;
use super::functions;
use super::migrations::MIGRATIONS;

/// A connection to the vehicle inventory.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        functions::register(&conn)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an existing inventory for searching only.
    ///
    /// No migrations are applied: the production schema is owned by the
    /// inventory service, and a search must never write to it.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        functions::register(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        functions::register(&conn)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// A handle that aborts whatever statement this connection is running.
    ///
    /// Safe to call from another thread; used to cancel searches that
    /// exceeded their deadline.
    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Search
impl Database {
    /// Run one tier's predicates and return the matching vehicles.
    pub fn search(&self, plan: &TierPlan) -> Result<Vec<VehicleRecord>> {
        let (sql, params) = plan.to_sql();
        log::debug!("{} tier: {} ({} bound values)", plan.tier, sql, params.len());

        let mut stmt = self.conn.prepare(&sql)?;
        let vehicles = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_vehicle)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    /// Count every listing in the inventory.
    pub fn count_vehicles(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vehicles", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn row_to_vehicle(row: &rusqlite::Row) -> rusqlite::Result<VehicleRecord> {
    Ok(VehicleRecord {
        id: row.get(0)?,
        brand: row.get(1)?,
        model: row.get(2)?,
        year: row.get::<_, Option<i64>>(3)?.and_then(|y| i32::try_from(y).ok()),
        price: row.get(4)?,
        exterior_color: row.get(5)?,
        interior_color: row.get(6)?,
        transmission: row.get(7)?,
        fuel_type: row.get(8)?,
        engine: row.get(9)?,
        vehicle_type: row.get(10)?,
        condition: row.get(11)?,
        mileage: row.get(12)?,
        location: row.get(13)?,
        address: row.get(14)?,
    })
}

// Inventory maintenance (local development inventories)
impl Database {
    /// Insert a listing and return its new id.
    pub fn insert_vehicle(&self, vehicle: &VehicleRecord) -> Result<i64> {
        insert_into(&self.conn, vehicle)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a batch of listings in one transaction.
    ///
    /// Every record is validated first; nothing is written if any record is
    /// missing its brand, model or location.
    pub fn import_vehicles(&mut self, vehicles: &[VehicleRecord]) -> Result<usize> {
        for (index, vehicle) in vehicles.iter().enumerate() {
            let missing = [
                ("brand", &vehicle.brand),
                ("model", &vehicle.model),
                ("location", &vehicle.location),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty());
            if let Some((field, _)) = missing {
                return Err(Error::InvalidRecord {
                    index,
                    reason: format!("{field} is empty"),
                });
            }
        }

        let tx = self.conn.transaction()?;
        for vehicle in vehicles {
            insert_into(&tx, vehicle)?;
        }
        tx.commit()?;
        log::info!("Imported {} vehicles", vehicles.len());
        Ok(vehicles.len())
    }

    /// Read a JSON array of listings from disk and import it.
    pub fn import_json(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let vehicles: Vec<VehicleRecord> = serde_json::from_str(&content)?;
        self.import_vehicles(&vehicles)
    }
}

fn insert_into(conn: &Connection, vehicle: &VehicleRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO vehicles (
            brand, model, year, price, exterior_color, interior_color,
            transmission, fuel_type, engine, vehicle_type, condition,
            mileage, location, address
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        rusqlite::params![
            vehicle.brand,
            vehicle.model,
            vehicle.year.map(|y| y.to_string()),
            vehicle.price.map(format_price),
            vehicle.exterior_color,
            vehicle.interior_color,
            vehicle.transmission,
            vehicle.fuel_type,
            vehicle.engine,
            vehicle.vehicle_type,
            vehicle.condition,
            vehicle.mileage,
            vehicle.location,
            vehicle.address,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SearchTier;
    use crate::schema::filter::{Column, Predicate};
    use tempfile::TempDir;

    fn vehicle(brand: &str, model: &str, year: i32, price: f64) -> VehicleRecord {
        VehicleRecord {
            year: Some(year),
            price: Some(price),
            ..VehicleRecord::new(brand, model, "Puerto Rico")
        }
    }

    #[test]
    fn test_interrupt_handle_aborts_running_statement() {
        let db = Database::open_in_memory().unwrap();
        let handle = db.interrupt_handle();
        let worker = std::thread::spawn(move || {
            db.conn().query_row(
                "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n)
                 SELECT count(*) FROM n",
                [],
                |row| row.get::<_, i64>(0),
            )
        });

        // An interrupt sent before the statement starts is discarded.
        while !worker.is_finished() {
            handle.interrupt();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        let err = worker.join().unwrap().unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::OperationInterrupted)
        );
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.count_vehicles().unwrap(), 0);
    }

    #[test]
    fn test_vehicle_round_trip_casts_text_columns() {
        let db = Database::open_in_memory().unwrap();
        let mut corolla = vehicle("Toyota", "Corolla", 2019, 18_500.0);
        corolla.exterior_color = Some("Rojo".to_string());
        let id = db.insert_vehicle(&corolla).unwrap();

        let stored_price: String = db
            .conn()
            .query_row("SELECT price FROM vehicles WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(stored_price, "$18,500");

        let found = db
            .search(&TierPlan::new(SearchTier::Optimized, 15))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(found[0].year, Some(2019));
        assert_eq!(found[0].price, Some(18_500.0));
        assert_eq!(found[0].exterior_color.as_deref(), Some("Rojo"));
    }

    #[test]
    fn test_search_numeric_bounds_skip_unparsable_prices() {
        let db = Database::open_in_memory().unwrap();
        db.insert_vehicle(&vehicle("BMW", "X5", 2020, 48_000.0)).unwrap();
        db.insert_vehicle(&vehicle("BMW", "M3", 2021, 72_000.0)).unwrap();
        db.conn()
            .execute(
                "INSERT INTO vehicles (brand, model, price, location)
                 VALUES ('BMW', 'X3', 'call us', 'Puerto Rico')",
                [],
            )
            .unwrap();

        let plan = TierPlan::new(SearchTier::Optimized, 15)
            .with(Predicate::contains(Column::Brand, "bmw"))
            .with(Predicate::AtMost {
                column: Column::Price,
                value: 50_000.0,
            });
        let found = db.search(&plan).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].model, "X5");
    }

    #[test]
    fn test_search_fuzzy_model_tolerates_typos() {
        let db = Database::open_in_memory().unwrap();
        db.insert_vehicle(&vehicle("Toyota", "Corolla", 2018, 15_000.0))
            .unwrap();
        db.insert_vehicle(&vehicle("Honda", "Civic", 2018, 16_000.0))
            .unwrap();

        let plan = TierPlan::new(SearchTier::Optimized, 15)
            .with(Predicate::fuzzy(Column::Model, "corola"));
        let found = db.search(&plan).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].brand, "Toyota");
    }

    #[test]
    fn test_search_folds_accents_and_case_beyond_ascii() {
        let db = Database::open_in_memory().unwrap();
        db.insert_vehicle(&VehicleRecord::new("Jeep", "Wrangler", "BAYAMÓN"))
            .unwrap();
        db.insert_vehicle(&VehicleRecord::new("Kia", "Soul", "Ponce"))
            .unwrap();

        for wanted in ["bayamón", "Bayamon", "BAYAMÓN"] {
            let plan = TierPlan::new(SearchTier::Optimized, 15)
                .with(Predicate::contains(Column::Location, wanted));
            let found = db.search(&plan).unwrap();
            assert_eq!(found.len(), 1, "{wanted}");
            assert_eq!(found[0].model, "Wrangler");
        }
    }

    #[test]
    fn test_search_respects_limit() {
        let db = Database::open_in_memory().unwrap();
        for year in 2010..2020 {
            db.insert_vehicle(&vehicle("Kia", "Forte", year, 9_000.0))
                .unwrap();
        }
        let found = db.search(&TierPlan::new(SearchTier::Keyword, 3)).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_import_rejects_incomplete_records() {
        let mut db = Database::open_in_memory().unwrap();
        let good = vehicle("Ford", "Ranger", 2017, 21_000.0);
        let bad = VehicleRecord::new("Ford", "", "Puerto Rico");
        let err = db.import_vehicles(&[good, bad]).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { index: 1, .. }));
        assert_eq!(db.count_vehicles().unwrap(), 0);
    }

    #[test]
    fn test_import_json_and_read_only_open() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("inventory.db");
        let json_path = temp_dir.path().join("vehicles.json");
        std::fs::write(
            &json_path,
            r#"[
                {"brand": "Jeep", "model": "Wrangler", "year": 2020, "price": 35000,
                 "location": "Puerto Rico", "address": "Calle Loíza, San Juan"},
                {"brand": "Tesla", "model": "Model 3", "fuel_type": "Electric",
                 "location": "Puerto Rico"}
            ]"#,
        )
        .unwrap();

        let mut db = Database::open(&db_path).unwrap();
        assert_eq!(db.import_json(&json_path).unwrap(), 2);
        drop(db);

        let reader = Database::open_read_only(&db_path).unwrap();
        assert_eq!(reader.count_vehicles().unwrap(), 2);
        assert!(reader
            .conn()
            .execute("DELETE FROM vehicles", [])
            .is_err());
    }
}
