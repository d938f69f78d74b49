//! Background worker for scheduled Janitor runs

use crate::{Janitor, JanitorError};
use crumb_domain::Preferences;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Counters for the worker's own activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Timer ticks handled
    pub ticks: usize,

    /// Runs that completed successfully
    pub runs: usize,

    /// Ticks skipped because idle runs are disabled
    pub skipped: usize,

    /// Runs that failed
    pub failures: usize,
}

/// Background worker that fires idle-time runs on a schedule
///
/// The worker shares its [`Janitor`] with the host, so a manual "run now"
/// and a scheduled tick that overlap are serialized by the janitor.
///
/// # Examples
///
/// ```no_run
/// use crumb_janitor::{Janitor, JanitorWorker};
/// use crumb_store::{CookieDb, TomlPrefs};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = CookieDb::in_profile("/home/me/.mozilla/firefox/abc.default");
///     let prefs = TomlPrefs::open("/home/me/.config/crumb/prefs.toml")?;
///     let janitor = Arc::new(Janitor::new(db, prefs)?);
///     let mut worker = JanitorWorker::from_config(janitor)?;
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct JanitorWorker<P> {
    janitor: Arc<Janitor<P>>,
    interval: Duration,
    stats: WorkerStats,
}

impl<P> JanitorWorker<P>
where
    P: Preferences + Send + 'static,
{
    /// Create a worker firing every `interval`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero interval.
    pub fn new(janitor: Arc<Janitor<P>>, interval: Duration) -> Result<Self, JanitorError> {
        if interval.is_zero() {
            return Err(JanitorError::Config(
                "worker interval must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            janitor,
            interval,
            stats: WorkerStats::default(),
        })
    }

    /// Create a worker using the configured sweep interval
    pub fn from_config(janitor: Arc<Janitor<P>>) -> Result<Self, JanitorError> {
        let interval = janitor.config()?.sweep_interval();
        Self::new(janitor, interval)
    }

    /// The shared janitor
    pub fn janitor(&self) -> &Arc<Janitor<P>> {
        &self.janitor
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    ///
    /// A failed run is logged and the worker keeps going; the next tick is
    /// the retry.
    pub async fn run(&mut self) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Janitor worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::warn!("Scheduled run failed, retrying next tick: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping janitor worker");
                    break;
                }
            }
        }

        tracing::info!("Janitor worker stopped: {:?}", self.stats);
        Ok(())
    }

    /// Run for a specific number of ticks, stopping at the first failure
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting tick {}/{}", cycle + 1, cycles);
            self.tick().await?;
        }

        tracing::info!("Janitor worker finished {} cycles: {:?}", cycles, self.stats);
        Ok(())
    }

    async fn tick(&mut self) -> Result<(), JanitorError> {
        self.stats.ticks += 1;
        match self.janitor.run_idle().await {
            Ok(Some(_)) => {
                self.stats.runs += 1;
                Ok(())
            }
            Ok(None) => {
                self.stats.skipped += 1;
                Ok(())
            }
            Err(e) => {
                self.stats.failures += 1;
                Err(e)
            }
        }
    }

    /// Get the worker's counters
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Reset the worker's counters
    pub fn reset_stats(&mut self) {
        self.stats = WorkerStats::default();
    }
}
