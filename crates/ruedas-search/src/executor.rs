//! Sequential tier execution against the inventory store.
//!
//! Tiers run strictly in order and never concurrently: a tier is only
//! attempted when every earlier tier came back empty, timed out or failed.
//! Each call is bounded by the tier timeout, which the store enforces
//! itself so it can cancel the work it started.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use ruedas_core::model::{SearchTier, VehicleRecord};
use ruedas_core::schema::{Database, InterruptHandle, TierPlan};

use crate::cascade::{cascade, Attempt};
use crate::error::{SearchError, SearchResult};

/// How long the executor keeps waiting after a store's own deadline.
const STORE_GRACE: Duration = Duration::from_millis(250);

/// A relational store that answers tier plans.
#[async_trait]
pub trait InventoryStore: Send + Sync + fmt::Debug {
    /// Run one tier's plan. Implementations own `deadline`: once it passes
    /// they cancel their work and return [`SearchError::QueryTimeout`].
    /// The executor stops waiting [`STORE_GRACE`] later regardless.
    async fn fetch(
        &self,
        plan: &TierPlan,
        deadline: Duration,
    ) -> SearchResult<Vec<VehicleRecord>>;
}

/// The SQLite inventory, opened read-only for every tier call.
#[derive(Debug, Clone)]
pub struct SqliteInventory {
    path: PathBuf,
}

impl SqliteInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InventoryStore for SqliteInventory {
    async fn fetch(
        &self,
        plan: &TierPlan,
        deadline: Duration,
    ) -> SearchResult<Vec<VehicleRecord>> {
        let path = self.path.clone();
        let plan = plan.clone();
        let tier = plan.tier;
        let slot = Arc::new(CancelSlot::default());
        let task_slot = Arc::clone(&slot);

        let task = tokio::task::spawn_blocking(move || {
            let db = Database::open_read_only(&path)?;
            if !task_slot.arm(db.interrupt_handle()) {
                // The caller has already given up on this tier.
                return Ok(Vec::new());
            }
            db.search(&plan)
        });

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result.map_err(SearchError::from),
            Ok(Err(e)) => Err(SearchError::QueryExecutionError(format!(
                "search task failed: {e}"
            ))),
            Err(_) => {
                if slot.cancel() {
                    log::debug!("{tier} tier: interrupted running statement");
                }
                Err(SearchError::QueryTimeout(deadline.as_millis() as u64))
            }
        }
    }
}

/// Meeting point between a tier's blocking task and its timer.
///
/// A timer that fires after the connection is armed interrupts the running
/// statement; a task that arms after the timer fired never starts it.
#[derive(Default)]
struct CancelSlot {
    state: Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    cancelled: bool,
    handle: Option<InterruptHandle>,
}

impl CancelSlot {
    /// Register the connection about to run. False once cancelled.
    fn arm(&self, handle: InterruptHandle) -> bool {
        let mut state = self.lock();
        if state.cancelled {
            return false;
        }
        state.handle = Some(handle);
        true
    }

    /// Mark the tier cancelled. True when a statement was interrupted.
    fn cancel(&self) -> bool {
        let mut state = self.lock();
        state.cancelled = true;
        match &state.handle {
            Some(handle) => {
                handle.interrupt();
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How a single tier attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TierStatus {
    Found(usize),
    Empty,
    TimedOut,
    Failed(String),
}

impl fmt::Display for TierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(n) => write!(f, "{n} rows"),
            Self::Empty => f.write_str("no rows"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAttempt {
    pub tier: SearchTier,
    #[serde(flatten)]
    pub status: TierStatus,
}

/// The rows of the first productive tier plus a record of every attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    /// The tier that produced rows, or `OPTIMIZED` when none did.
    pub tier: SearchTier,
    pub vehicles: Vec<VehicleRecord>,
    pub attempts: Vec<TierAttempt>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// True when every attempt failed outright, i.e. the store could not
    /// be reached at all. Empty or timed-out tiers do not count.
    pub fn store_unreachable(&self) -> bool {
        !self.attempts.is_empty()
            && self
                .attempts
                .iter()
                .all(|a| matches!(a.status, TierStatus::Failed(_)))
    }
}

#[derive(Debug, Clone)]
pub struct SearchExecutor {
    store: Arc<dyn InventoryStore>,
    tier_timeout: Duration,
}

impl SearchExecutor {
    pub fn new(store: Arc<dyn InventoryStore>, tier_timeout: Duration) -> Self {
        Self {
            store,
            tier_timeout,
        }
    }

    /// Run `plans` in order, stopping at the first tier with rows.
    pub async fn execute(&self, plans: &[TierPlan]) -> SearchOutcome {
        let tiers: Vec<SearchTier> = plans.iter().map(|p| p.tier).collect();
        let outcome = cascade(&tiers, |tier| async move {
            let Some(plan) = plans.iter().find(|p| p.tier == tier) else {
                return Attempt::FallThrough(TierStatus::Failed("no plan".to_string()));
            };
            match self.run(plan).await {
                Ok(rows) if rows.is_empty() => Attempt::FallThrough(TierStatus::Empty),
                Ok(rows) => Attempt::Accept(rows),
                Err(e) if e.is_timeout() => {
                    log::warn!("{tier} tier: {e}");
                    Attempt::FallThrough(TierStatus::TimedOut)
                }
                Err(e) => {
                    log::warn!("{tier} tier: {e}");
                    Attempt::FallThrough(TierStatus::Failed(e.to_string()))
                }
            }
        })
        .await;

        let mut attempts: Vec<TierAttempt> = outcome
            .rejected
            .into_iter()
            .map(|r| TierAttempt {
                tier: r.strategy,
                status: r.reason,
            })
            .collect();

        match outcome.accepted {
            Some((tier, vehicles)) => {
                log::info!("{} tier returned {} vehicles", tier, vehicles.len());
                attempts.push(TierAttempt {
                    tier,
                    status: TierStatus::Found(vehicles.len()),
                });
                SearchOutcome {
                    tier,
                    vehicles,
                    attempts,
                }
            }
            None => {
                log::info!("All {} tiers returned no vehicles", attempts.len());
                SearchOutcome {
                    tier: SearchTier::Optimized,
                    vehicles: Vec::new(),
                    attempts,
                }
            }
        }
    }

    async fn run(&self, plan: &TierPlan) -> SearchResult<Vec<VehicleRecord>> {
        let deadline = self.tier_timeout;
        let backstop = deadline + STORE_GRACE;
        match tokio::time::timeout(backstop, self.store.fetch(plan, deadline)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::QueryTimeout(deadline.as_millis() as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruedas_core::schema::{Column, Predicate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Returns canned results per tier and records the order of calls.
    #[derive(Debug, Default)]
    struct ScriptedStore {
        calls: Mutex<Vec<SearchTier>>,
        rows_for: Vec<(SearchTier, usize)>,
        fail: bool,
        stall: bool,
    }

    #[async_trait]
    impl InventoryStore for ScriptedStore {
        async fn fetch(
            &self,
            plan: &TierPlan,
            _deadline: Duration,
        ) -> SearchResult<Vec<VehicleRecord>> {
            self.calls.lock().unwrap().push(plan.tier);
            if self.stall {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail {
                return Err(SearchError::QueryExecutionError("connection refused".to_string()));
            }
            let count = self
                .rows_for
                .iter()
                .find(|(tier, _)| *tier == plan.tier)
                .map_or(0, |(_, n)| *n);
            Ok((0..count)
                .map(|i| VehicleRecord::new("Toyota", format!("Model {i}"), "Puerto Rico"))
                .collect())
        }
    }

    fn plans() -> Vec<TierPlan> {
        SearchTier::ALL
            .iter()
            .map(|&tier| TierPlan::new(tier, 15))
            .collect()
    }

    fn executor(store: Arc<ScriptedStore>) -> SearchExecutor {
        SearchExecutor::new(store, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_stops_at_first_tier_with_rows() {
        let store = Arc::new(ScriptedStore {
            rows_for: vec![(SearchTier::Simplified, 2), (SearchTier::Keyword, 5)],
            ..ScriptedStore::default()
        });
        let outcome = executor(Arc::clone(&store)).execute(&plans()).await;

        assert_eq!(outcome.tier, SearchTier::Simplified);
        assert_eq!(outcome.vehicles.len(), 2);
        assert_eq!(
            *store.calls.lock().unwrap(),
            vec![SearchTier::Optimized, SearchTier::Simplified]
        );
        assert_eq!(outcome.attempts[0].status, TierStatus::Empty);
        assert_eq!(outcome.attempts[1].status, TierStatus::Found(2));
    }

    #[tokio::test]
    async fn test_all_empty_reports_optimized() {
        let store = Arc::new(ScriptedStore::default());
        let outcome = executor(Arc::clone(&store)).execute(&plans()).await;
        assert!(outcome.is_empty());
        assert_eq!(outcome.tier, SearchTier::Optimized);
        assert_eq!(outcome.attempts.len(), 3);
        assert!(!outcome.store_unreachable());
    }

    #[tokio::test]
    async fn test_timeouts_count_as_empty() {
        let store = Arc::new(ScriptedStore {
            stall: true,
            ..ScriptedStore::default()
        });
        let outcome = executor(Arc::clone(&store)).execute(&plans()).await;
        assert!(outcome.is_empty());
        assert!(outcome
            .attempts
            .iter()
            .all(|a| a.status == TierStatus::TimedOut));
        assert!(!outcome.store_unreachable());
    }

    /// Enforces its own deadline the way `SqliteInventory` does, counting
    /// the cancellations it performs.
    #[derive(Debug, Default)]
    struct SelfTimedStore {
        interrupts: AtomicUsize,
    }

    #[async_trait]
    impl InventoryStore for SelfTimedStore {
        async fn fetch(
            &self,
            _plan: &TierPlan,
            deadline: Duration,
        ) -> SearchResult<Vec<VehicleRecord>> {
            std::thread::sleep(Duration::from_millis(2));
            let work = tokio::time::sleep(deadline * 10);
            match tokio::time::timeout(deadline, work).await {
                Ok(()) => Ok(Vec::new()),
                Err(_) => {
                    self.interrupts.fetch_add(1, Ordering::SeqCst);
                    Err(SearchError::QueryTimeout(deadline.as_millis() as u64))
                }
            }
        }
    }

    #[tokio::test]
    async fn test_store_deadline_fires_before_executor_gives_up() {
        let store = Arc::new(SelfTimedStore::default());
        let executor = SearchExecutor::new(
            Arc::clone(&store) as Arc<dyn InventoryStore>,
            Duration::from_millis(30),
        );
        let outcome = executor.execute(&plans()).await;

        assert!(outcome
            .attempts
            .iter()
            .all(|a| a.status == TierStatus::TimedOut));
        assert_eq!(store.interrupts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancel_slot_interrupts_armed_connection() {
        let db = Database::open_in_memory().unwrap();
        let slot = CancelSlot::default();
        assert!(slot.arm(db.interrupt_handle()));
        assert!(slot.cancel());
    }

    #[test]
    fn test_cancel_slot_refuses_late_arm() {
        let db = Database::open_in_memory().unwrap();
        let slot = CancelSlot::default();
        assert!(!slot.cancel());
        assert!(!slot.arm(db.interrupt_handle()));
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let store = Arc::new(ScriptedStore {
            fail: true,
            ..ScriptedStore::default()
        });
        let outcome = executor(Arc::clone(&store)).execute(&plans()).await;
        assert!(outcome.store_unreachable());
        assert_eq!(store.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sqlite_inventory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("inventory.db");
        {
            let db = Database::open(&db_path).unwrap();
            db.insert_vehicle(&VehicleRecord::new("Ford", "Mustang", "Puerto Rico"))
                .unwrap();
        }

        let store = SqliteInventory::new(&db_path);
        let plan = TierPlan::new(SearchTier::Optimized, 15)
            .with(Predicate::fuzzy(Column::Model, "mustang"));
        let rows = store.fetch(&plan, Duration::from_secs(5)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].brand, "Ford");
    }

    #[tokio::test]
    async fn test_missing_database_is_an_execution_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteInventory::new(temp_dir.path().join("missing.db"));
        let plan = TierPlan::new(SearchTier::Optimized, 15);
        let err = store.fetch(&plan, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, SearchError::QueryExecutionError(_)));
    }
}
