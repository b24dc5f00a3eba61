//! End-to-end tests for the search pipeline.
//!
//! Each test builds a small SQLite inventory in a temp directory and runs
//! `SearchService::search` against it, with either the disabled model
//! (deterministic paths only) or a scripted model that counts its calls.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use ruedas_core::model::{Language, SearchTier, VehicleRecord};
use ruedas_core::schema::{Database, TierPlan};
use ruedas_search::{
    ChatRequest, Config, DisabledModel, InventoryStore, LanguageModel, LlmError, SearchResult,
    SearchService, SqliteInventory,
};

fn vehicle(
    brand: &str,
    model: &str,
    year: i32,
    price: f64,
    color: &str,
    engine: Option<&str>,
    fuel: &str,
) -> VehicleRecord {
    VehicleRecord {
        year: Some(year),
        price: Some(price),
        exterior_color: Some(color.to_string()),
        engine: engine.map(str::to_string),
        fuel_type: Some(fuel.to_string()),
        ..VehicleRecord::new(brand, model, "Puerto Rico")
    }
}

fn seed_inventory(path: &Path) {
    let db = Database::open(path).expect("Failed to open database");
    let inventory = [
        vehicle("Toyota", "Corolla", 2019, 18_500.0, "Red", Some("2.0L 4-cylinder"), "Gasoline"),
        vehicle("Nissan", "Sentra", 2021, 21_000.0, "Rojo", Some("2.0L 4-cylinder"), "Gasoline"),
        vehicle("Honda", "Civic", 2020, 22_000.0, "Blue", Some("1.5L turbo 4-cylinder"), "Gasoline"),
        vehicle("BMW", "330i", 2020, 45_000.0, "Black", Some("2.0L turbo 4-cylinder"), "Gasoline"),
        vehicle("BMW", "X5", 2022, 65_000.0, "White", Some("3.0L 6-cylinder"), "Gasoline"),
        vehicle("Ford", "Mustang", 2018, 38_000.0, "Grabber Blue", Some("5.0L V8"), "Gasoline"),
        vehicle("Chevrolet", "Camaro", 2019, 41_000.0, "Black", Some("6.2L 8-cylinder"), "Gasoline"),
        vehicle("Tesla", "Model 3", 2022, 42_000.0, "White", None, "Electric"),
    ];
    for record in &inventory {
        db.insert_vehicle(record).expect("Failed to insert vehicle");
    }
}

/// A SQLite inventory that counts tier calls.
#[derive(Debug)]
struct CountingStore {
    inner: SqliteInventory,
    calls: AtomicUsize,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryStore for CountingStore {
    async fn fetch(
        &self,
        plan: &TierPlan,
        deadline: Duration,
    ) -> SearchResult<Vec<VehicleRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(plan, deadline).await
    }
}

/// Answers extraction and synthesis prompts; fails everything else.
#[derive(Debug, Default)]
struct ScriptedModel {
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let system = request.messages[0].content.as_str();
        if system.starts_with("You extract") {
            Ok(r#"{"brand": "toyota", "color": "red", "query_type": "general"}"#.to_string())
        } else if system.starts_with("You are a friendly") {
            Ok("I found a red Toyota Corolla for you.".to_string())
        } else {
            Err(LlmError::Disabled)
        }
    }
}

struct Fixture {
    _temp_dir: TempDir,
    store: Arc<CountingStore>,
    service: SearchService,
}

fn fixture(config: &Config, model: Arc<dyn LanguageModel>) -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("inventory.db");
    seed_inventory(&db_path);

    let store = Arc::new(CountingStore {
        inner: SqliteInventory::new(&db_path),
        calls: AtomicUsize::new(0),
    });
    let service = SearchService::new(config, model, Arc::clone(&store) as Arc<dyn InventoryStore>);
    Fixture {
        _temp_dir: temp_dir,
        store,
        service,
    }
}

fn offline() -> Fixture {
    fixture(&Config::default(), Arc::new(DisabledModel))
}

#[tokio::test]
async fn test_brand_with_price_ceiling() {
    let f = offline();
    let response = f.service.search("BMW under $50,000").await;

    assert_eq!(response.total_results, 1);
    assert_eq!(response.vehicles[0].model, "330i");
    assert_eq!(response.tier, SearchTier::Optimized);
    assert!(response.suggestions.is_none());
    assert_eq!(response.response, "I found 1 vehicle matching your search.");
}

#[tokio::test]
async fn test_cylinder_search_matches_engine_descriptions() {
    let f = offline();
    let response = f.service.search("8 cylinder car").await;

    let mut models: Vec<&str> = response.vehicles.iter().map(|v| v.model.as_str()).collect();
    models.sort_unstable();
    assert_eq!(models, vec!["Camaro", "Mustang"]);
    assert_eq!(response.tier, SearchTier::Optimized);
    assert!(response.suggestions.is_none());
}

#[tokio::test]
async fn test_color_search_is_bilingual() {
    let f = offline();
    let english = f.service.search("red car").await;
    let spanish = f.service.search("carro rojo").await;

    let ids = |vehicles: &[VehicleRecord]| {
        let mut ids: Vec<i64> = vehicles.iter().map(|v| v.id).collect();
        ids.sort_unstable();
        ids
    };
    assert_eq!(english.total_results, 2);
    assert_eq!(ids(&english.vehicles), ids(&spanish.vehicles));
    assert_eq!(spanish.language, Language::Es);
    assert_eq!(
        spanish.response,
        "Encontré 2 vehículos que coinciden con tu búsqueda."
    );
}

#[tokio::test]
async fn test_tiers_fall_through_in_order() {
    let f = offline();
    let response = f.service.search("Toyota under $5,000").await;

    assert_eq!(response.tier, SearchTier::Simplified);
    assert_eq!(response.total_results, 1);
    assert_eq!(response.vehicles[0].model, "Corolla");
    assert_eq!(f.store.calls(), 2);
    assert!(response.suggestions.is_none());
}

#[tokio::test]
async fn test_contradictory_specs_get_suggestions() {
    let f = offline();
    let response = f.service.search("8 cylinder electric car").await;

    assert_eq!(response.total_results, 0);
    assert!(response.vehicles.is_empty());
    assert_eq!(response.tier, SearchTier::Optimized);
    assert_eq!(f.store.calls(), 3);

    let suggestions = response.suggestions.expect("zero results carry suggestions");
    assert!(suggestions.analysis.contains("electric"));
    assert!(!suggestions.follow_up_questions.is_empty());
    assert!(!suggestions.alternative_searches.is_empty());
}

#[tokio::test]
async fn test_repeated_query_is_served_from_cache() {
    let model = Arc::new(ScriptedModel::default());
    let f = fixture(
        &Config::default(),
        Arc::clone(&model) as Arc<dyn LanguageModel>,
    );

    let first = f.service.search("red toyota").await;
    let (model_calls, store_calls) = (model.calls(), f.store.calls());
    let second = f.service.search("  Red   TOYOTA ").await;

    assert_eq!(first.response, "I found a red Toyota Corolla for you.");
    assert_eq!(first.vehicles.len(), 1);
    assert_eq!(first, second);
    assert_eq!(model.calls(), model_calls);
    assert_eq!(f.store.calls(), store_calls);
}

#[tokio::test]
async fn test_cache_entries_expire() {
    let mut config = Config::default();
    config.cache.pipeline_ttl_secs = 1;
    let f = fixture(&config, Arc::new(DisabledModel));

    f.service.search("red car").await;
    let calls = f.store.calls();
    f.service.search("red car").await;
    assert_eq!(f.store.calls(), calls);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    f.service.search("red car").await;
    assert!(f.store.calls() > calls);
}

#[tokio::test]
async fn test_clear_caches_forces_a_fresh_search() {
    let f = offline();
    f.service.search("BMW under $50,000").await;
    let calls = f.store.calls();

    f.service.clear_caches();
    f.service.search("BMW under $50,000").await;
    assert!(f.store.calls() > calls);
}

#[tokio::test]
async fn test_zero_result_responses_are_not_cached() {
    let f = offline();
    f.service.search("8 cylinder electric car").await;
    f.service.search("8 cylinder electric car").await;
    assert_eq!(f.store.calls(), 6);
}

#[tokio::test]
async fn test_unreachable_inventory() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteInventory::new(temp_dir.path().join("missing.db")));
    let service = SearchService::new(&Config::default(), Arc::new(DisabledModel), store);

    let response = service.search("BMW under $50,000").await;
    assert_eq!(response.query, "BMW under $50,000");
    assert!(response.vehicles.is_empty());
    assert_eq!(response.total_results, 0);
    assert!(response.suggestions.is_none());
    assert!(response.response.contains("unavailable"));
}
