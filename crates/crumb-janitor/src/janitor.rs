//! Core Janitor implementation: the run pipeline and its serialization

use crate::config::{self, JanitorConfig};
use crate::maintenance::{self, MaintenancePlan};
use crate::metrics;
use crate::{JanitorError, Ledger, RunObserver, RunSummary, Trigger};
use crumb_domain::time::now_secs;
use crumb_domain::{BucketSet, MetricsSnapshot, Preferences, RunResult};
use crumb_store::CookieDb;
use std::sync::{Arc, Mutex};

/// Janitor service for scheduled cookie maintenance
///
/// Responsible for:
/// - Previewing how many cookies each candidate threshold would affect
/// - Deleting expired and unused cookies, and capping long expiries
/// - Keeping the lifetime ledger in the preference store
/// - Letting only one snapshot or run touch the store at a time
///
/// Each snapshot or run executes as a single task on tokio's blocking pool
/// with a fresh session per step, so neither SQLite nor preference file I/O
/// blocks the async side. Dropping a pending `run_now()` does not cancel a
/// run that has started.
///
/// # Examples
///
/// ```no_run
/// use crumb_janitor::Janitor;
/// use crumb_store::{CookieDb, TomlPrefs};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = CookieDb::in_profile("/home/me/.mozilla/firefox/abc.default");
///     let prefs = TomlPrefs::open("/home/me/.config/crumb/prefs.toml")?;
///     let janitor = Janitor::new(db, prefs)?;
///
///     let summary = janitor.run_now().await?;
///     println!("{}", summary.summary());
///     Ok(())
/// }
/// ```
pub struct Janitor<P> {
    db: CookieDb,
    prefs: Arc<Mutex<P>>,
    buckets: BucketSet,
    observers: Vec<Arc<dyn RunObserver>>,
    run_lock: Arc<tokio::sync::Mutex<()>>,
}

impl<P> Janitor<P>
where
    P: Preferences + Send + 'static,
{
    /// Create a new Janitor, installing first-run defaults into `prefs`
    pub fn new(db: CookieDb, mut prefs: P) -> Result<Self, JanitorError> {
        config::install_defaults(&mut prefs)?;
        Ok(Self {
            db,
            prefs: Arc::new(Mutex::new(prefs)),
            buckets: BucketSet::default(),
            observers: Vec::new(),
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Use custom preview buckets instead of the default day lists
    pub fn with_buckets(mut self, buckets: BucketSet) -> Self {
        self.buckets = buckets;
        self
    }

    /// Register an observer notified after every run
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The cookie database this janitor maintains
    pub fn db(&self) -> &CookieDb {
        &self.db
    }

    /// The preview buckets (before configured thresholds are added)
    pub fn buckets(&self) -> &BucketSet {
        &self.buckets
    }

    /// Whether a snapshot or run is in progress
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Current settings, with defaults substituted for invalid values
    pub fn config(&self) -> Result<JanitorConfig, JanitorError> {
        with_prefs(&self.prefs, |prefs| Ok(JanitorConfig::load(&*prefs)))
    }

    /// Store new settings
    ///
    /// Flushes the preference store on the calling thread.
    pub fn update_config(&self, config: &JanitorConfig) -> Result<(), JanitorError> {
        with_prefs(&self.prefs, |prefs| config.save(prefs))
    }

    /// Current lifetime counters
    pub fn ledger(&self) -> Result<Ledger, JanitorError> {
        with_prefs(&self.prefs, |prefs| Ok(Ledger::load(&*prefs)))
    }

    /// Epoch seconds of the last successful idle-time run
    pub fn last_idle_run(&self) -> Result<Option<u64>, JanitorError> {
        with_prefs(&self.prefs, |prefs| Ok(config::last_idle_run(&*prefs)))
    }

    /// Compute a read-only preview of what each threshold would affect
    pub async fn preview(&self) -> Result<MetricsSnapshot, JanitorError> {
        self.detached(|pipeline| {
            let settings = pipeline.settings()?;
            pipeline.snapshot(&settings)
        })
        .await
    }

    /// Run maintenance immediately ("run now")
    pub async fn run_now(&self) -> Result<RunSummary, JanitorError> {
        self.detached(|pipeline| pipeline.run(Trigger::Manual))
            .await?
            .ok_or_else(|| JanitorError::Worker("manual run was skipped".to_string()))
    }

    /// Run maintenance for a scheduled idle-time trigger
    ///
    /// Returns `Ok(None)` without touching the store when idle runs are
    /// disabled.
    pub async fn run_idle(&self) -> Result<Option<RunSummary>, JanitorError> {
        self.detached(|pipeline| pipeline.run(Trigger::Scheduled))
            .await
    }

    /// Run `f` on the blocking pool while holding the run lock
    ///
    /// The task owns the lock, so dropping the returned future only detaches
    /// the caller: a started run still finishes, persists its ledger and
    /// notifies observers before the next one may start.
    async fn detached<T, F>(&self, f: F) -> Result<T, JanitorError>
    where
        F: FnOnce(Pipeline<P>) -> Result<T, JanitorError> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.run_lock.clone().lock_owned().await;
        let pipeline = Pipeline {
            db: self.db.clone(),
            prefs: self.prefs.clone(),
            buckets: self.buckets.clone(),
            observers: self.observers.clone(),
        };

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            f(pipeline)
        })
        .await
        .map_err(|e| JanitorError::Worker(format!("Task join error: {}", e)))?
    }
}

/// Everything one locked invocation needs, moved onto the blocking pool
struct Pipeline<P> {
    db: CookieDb,
    prefs: Arc<Mutex<P>>,
    buckets: BucketSet,
    observers: Vec<Arc<dyn RunObserver>>,
}

impl<P: Preferences> Pipeline<P> {
    fn settings(&self) -> Result<JanitorConfig, JanitorError> {
        with_prefs(&self.prefs, |prefs| Ok(JanitorConfig::load(&*prefs)))
    }

    fn snapshot(&self, settings: &JanitorConfig) -> Result<MetricsSnapshot, JanitorError> {
        let buckets = self
            .buckets
            .including(settings.delete_unused_days, settings.expire_days);
        self.db
            .with_session(|session| metrics::compute_snapshot(session, &buckets))
    }

    /// Perform a complete run and notify observers
    fn run(&self, trigger: Trigger) -> Result<Option<RunSummary>, JanitorError> {
        match self.sweep(trigger) {
            Ok(Some(summary)) => {
                for observer in &self.observers {
                    observer.on_run_complete(&summary);
                }
                Ok(Some(summary))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::error!("Cookie maintenance ({}) failed: {}", trigger, e);
                for observer in &self.observers {
                    observer.on_run_failed(trigger, &e);
                }
                Err(e)
            }
        }
    }

    /// The run pipeline: snapshot, mutate, then advance the ledger
    ///
    /// The ledger is driven by the pre-run snapshot rather than by the rows
    /// each statement changed, so a cookie that is both expired and unused
    /// is counted by both features.
    fn sweep(&self, trigger: Trigger) -> Result<Option<RunSummary>, JanitorError> {
        let settings = self.settings()?;
        if trigger == Trigger::Scheduled && !settings.idle_enabled {
            tracing::info!("Idle-time cookie maintenance is disabled, skipping");
            return Ok(None);
        }

        let plan = MaintenancePlan {
            delete_expired: settings.delete_expired_enabled,
            delete_unused_days: settings.delete_unused_days,
            expire_days: settings.expire_days,
        };

        tracing::info!(
            "Starting cookie maintenance ({}): delete expired {}, delete unused {}d, cap expiry {}d",
            trigger,
            plan.delete_expired,
            plan.delete_unused_days,
            plan.expire_days
        );

        let snapshot = self.snapshot(&settings)?;
        let affected = self
            .db
            .with_session(|session| maintenance::run_maintenance(session, &plan))?;

        let result = run_result(&snapshot, &plan);
        let finished_at = now_secs();
        let idle_run = (trigger == Trigger::Scheduled).then_some(finished_at);
        let ledger = with_prefs(&self.prefs, |prefs| persist(prefs, &result, idle_run))?;

        tracing::info!(
            "Cookie maintenance ({}) completed: {} ({} rows changed)",
            trigger,
            result,
            affected.total()
        );

        Ok(Some(RunSummary {
            trigger,
            result,
            affected,
            ledger,
            finished_at,
        }))
    }
}

/// Stage the advanced ledger and idle timestamp, then flush once
///
/// On failure the previous counters are staged back so a later flush cannot
/// persist counts from a failed run.
fn persist<P: Preferences>(
    prefs: &mut P,
    result: &RunResult,
    idle_run: Option<u64>,
) -> Result<Ledger, JanitorError> {
    let previous = Ledger::load(&*prefs);
    if result.is_empty() && idle_run.is_none() {
        return Ok(previous);
    }

    let mut ledger = previous;
    ledger.record(result);

    let staged = ledger.stage(prefs).and_then(|()| match idle_run {
        Some(secs) => config::write_idle_run(prefs, secs),
        None => Ok(()),
    });
    match staged.and_then(|()| config::flush(prefs)) {
        Ok(()) => Ok(ledger),
        Err(e) => {
            if let Err(restore_err) = previous.stage(prefs) {
                tracing::warn!("Failed to restore ledger after error: {}", restore_err);
            }
            Err(e)
        }
    }
}

fn with_prefs<P, T, F>(prefs: &Arc<Mutex<P>>, f: F) -> Result<T, JanitorError>
where
    F: FnOnce(&mut P) -> Result<T, JanitorError>,
{
    let mut prefs = prefs
        .lock()
        .map_err(|_| JanitorError::Worker("preference lock poisoned".to_string()))?;
    f(&mut *prefs)
}

/// Per-feature counts at the configured thresholds; disabled features stay 0
pub(crate) fn run_result(snapshot: &MetricsSnapshot, plan: &MaintenancePlan) -> RunResult {
    let mut result = RunResult::default();

    if plan.delete_expired {
        result.deleted_expired = snapshot.expired;
    }
    if plan.delete_unused_days > 0 {
        result.deleted_unused = snapshot.unused_at(plan.delete_unused_days).unwrap_or(0);
    }
    if plan.expire_days > 0 {
        result.expiry_capped = snapshot.long_lived_at(plan.expire_days).unwrap_or(0);
    }

    result
}
