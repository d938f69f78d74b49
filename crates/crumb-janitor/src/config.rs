//! Configuration for Janitor operations
//!
//! Settings live in the host's key-value preference store under the
//! [`PREF_BRANCH`] prefix. Reading never fails: a missing or invalid value is
//! logged and replaced by its documented default.

use crate::JanitorError;
use crumb_domain::time::MAX_DAYS;
use crumb_domain::{PrefValue, Preferences};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

/// Prefix shared by every preference key
pub const PREF_BRANCH: &str = "crumb.";

/// Ledger of expired cookies deleted
pub const PREF_DELETE_EXPIRED_COUNT: &str = "deleteExpired.count";
/// Whether expired cookies are deleted
pub const PREF_DELETE_EXPIRED_ENABLED: &str = "deleteExpired.enabled";
/// Ledger of unused cookies deleted
pub const PREF_DELETE_UNUSED_COUNT: &str = "deleteUnused.count";
/// Unused-cookie threshold in days (0 disables)
pub const PREF_DELETE_UNUSED_DAYS: &str = "deleteUnused.days";
/// Ledger of cookies whose expiry was capped
pub const PREF_EXPIRE_COUNT: &str = "expire.count";
/// Expiry cap in days (0 disables)
pub const PREF_EXPIRE_DAYS: &str = "expire.days";
/// Whether scheduled idle-time runs are allowed
pub const PREF_IDLE_ENABLED: &str = "idle.enabled";
/// Epoch seconds of the last successful idle-time run
pub const PREF_IDLE_LASTRAN: &str = "idle.lastran";

const DEFAULT_DAYS: u32 = 90;
const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 24 * 60;

/// Full preference key for a setting name
pub fn pref_key(name: &str) -> String {
    format!("{}{}", PREF_BRANCH, name)
}

/// Configuration for the Janitor service
///
/// # Examples
///
/// ```
/// use crumb_janitor::JanitorConfig;
///
/// let config = JanitorConfig::default();
/// assert!(config.delete_expired_enabled);
/// assert_eq!(config.delete_unused_days, 90);
/// assert_eq!(config.expire_days, 90);
/// assert!(!config.idle_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Delete cookies whose expiry has passed
    /// Default: true
    #[serde(default = "default_true")]
    pub delete_expired_enabled: bool,

    /// Delete cookies not accessed for this many days (0 disables)
    /// Default: 90
    #[serde(default = "default_days")]
    pub delete_unused_days: u32,

    /// Cap cookie expiry at this many days from now (0 disables)
    /// Default: 90
    #[serde(default = "default_days")]
    pub expire_days: u32,

    /// Allow scheduled idle-time runs
    /// Default: false
    #[serde(default)]
    pub idle_enabled: bool,

    /// How often the background worker fires (in minutes)
    /// Default: 1440 (daily). Not stored in preferences.
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,
}

fn default_true() -> bool {
    true
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

fn default_sweep_interval_minutes() -> u64 {
    DEFAULT_SWEEP_INTERVAL_MINUTES
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            delete_expired_enabled: true,
            delete_unused_days: DEFAULT_DAYS,
            expire_days: DEFAULT_DAYS,
            idle_enabled: false,
            sweep_interval_minutes: DEFAULT_SWEEP_INTERVAL_MINUTES,
        }
    }
}

impl JanitorConfig {
    /// Read the settings from preferences, substituting defaults for bad values
    pub fn load<P: Preferences>(prefs: &P) -> Self {
        let defaults = Self::default();
        Self {
            delete_expired_enabled: read_bool(
                prefs,
                PREF_DELETE_EXPIRED_ENABLED,
                defaults.delete_expired_enabled,
            ),
            delete_unused_days: read_days(prefs, PREF_DELETE_UNUSED_DAYS, defaults.delete_unused_days),
            expire_days: read_days(prefs, PREF_EXPIRE_DAYS, defaults.expire_days),
            idle_enabled: read_bool(prefs, PREF_IDLE_ENABLED, defaults.idle_enabled),
            sweep_interval_minutes: defaults.sweep_interval_minutes,
        }
    }

    /// Write the user-facing settings back to preferences and flush
    pub fn save<P: Preferences>(&self, prefs: &mut P) -> Result<(), JanitorError> {
        self.validate()?;
        write(prefs, PREF_DELETE_EXPIRED_ENABLED, PrefValue::Bool(self.delete_expired_enabled))?;
        write(prefs, PREF_DELETE_UNUSED_DAYS, PrefValue::Int(i64::from(self.delete_unused_days)))?;
        write(prefs, PREF_EXPIRE_DAYS, PrefValue::Int(i64::from(self.expire_days)))?;
        write(prefs, PREF_IDLE_ENABLED, PrefValue::Bool(self.idle_enabled))?;
        prefs
            .flush()
            .map_err(|e| JanitorError::Preferences(e.to_string()))
    }

    /// Reject thresholds outside the supported range
    pub fn validate(&self) -> Result<(), JanitorError> {
        for (name, days) in [
            (PREF_DELETE_UNUSED_DAYS, self.delete_unused_days),
            (PREF_EXPIRE_DAYS, self.expire_days),
        ] {
            if days > MAX_DAYS {
                return Err(JanitorError::Config(format!(
                    "'{}' must be at most {} days, got {}",
                    pref_key(name),
                    MAX_DAYS,
                    days
                )));
            }
        }
        if self.sweep_interval_minutes == 0 {
            return Err(JanitorError::Config(
                "sweep interval must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes.max(1) * 60)
    }

    /// Whether any maintenance feature is switched on
    pub fn any_enabled(&self) -> bool {
        self.delete_expired_enabled || self.delete_unused_days > 0 || self.expire_days > 0
    }
}

/// Write first-install defaults for every key that has never been set
///
/// Existing values, including ledger counters, are never overwritten.
/// Returns the number of keys written.
pub fn install_defaults<P: Preferences>(prefs: &mut P) -> Result<usize, JanitorError> {
    let defaults = JanitorConfig::default();
    let entries = [
        (PREF_DELETE_EXPIRED_COUNT, PrefValue::Int(0)),
        (PREF_DELETE_EXPIRED_ENABLED, PrefValue::Bool(defaults.delete_expired_enabled)),
        (PREF_DELETE_UNUSED_COUNT, PrefValue::Int(0)),
        (PREF_DELETE_UNUSED_DAYS, PrefValue::Int(i64::from(defaults.delete_unused_days))),
        (PREF_EXPIRE_COUNT, PrefValue::Int(0)),
        (PREF_EXPIRE_DAYS, PrefValue::Int(i64::from(defaults.expire_days))),
        (PREF_IDLE_ENABLED, PrefValue::Bool(defaults.idle_enabled)),
    ];

    let mut installed = 0;
    for (name, value) in entries {
        let key = pref_key(name);
        let present = prefs
            .contains(&key)
            .map_err(|e| JanitorError::Preferences(e.to_string()))?;
        if !present {
            write(prefs, name, value)?;
            installed += 1;
        }
    }

    if installed > 0 {
        tracing::info!("Installed {} default preferences under '{}'", installed, PREF_BRANCH);
        prefs
            .flush()
            .map_err(|e| JanitorError::Preferences(e.to_string()))?;
    }
    Ok(installed)
}

/// Epoch seconds of the last successful idle-time run, if any
pub fn last_idle_run<P: Preferences>(prefs: &P) -> Option<u64> {
    match prefs.get(&pref_key(PREF_IDLE_LASTRAN)) {
        Ok(Some(PrefValue::Int(secs))) => u64::try_from(secs).ok(),
        _ => None,
    }
}

/// Record the time of a successful idle-time run
pub fn record_idle_run<P: Preferences>(prefs: &mut P, secs: u64) -> Result<(), JanitorError> {
    write_idle_run(prefs, secs)?;
    flush(prefs)
}

/// Stage the idle timestamp without flushing
pub(crate) fn write_idle_run<P: Preferences>(prefs: &mut P, secs: u64) -> Result<(), JanitorError> {
    write(prefs, PREF_IDLE_LASTRAN, PrefValue::Int(i64::try_from(secs).unwrap_or(i64::MAX)))
}

pub(crate) fn flush<P: Preferences>(prefs: &mut P) -> Result<(), JanitorError> {
    prefs
        .flush()
        .map_err(|e| JanitorError::Preferences(e.to_string()))
}

pub(crate) fn write<P: Preferences>(
    prefs: &mut P,
    name: &str,
    value: PrefValue,
) -> Result<(), JanitorError> {
    let key = pref_key(name);
    prefs
        .set(&key, value)
        .map_err(|e| JanitorError::Preferences(format!("cannot write '{}': {}", key, e)))
}

/// Read and convert a preference, falling back to `default` on any problem
fn read_or_default<P, T, F>(prefs: &P, name: &str, default: T, convert: F) -> T
where
    P: Preferences,
    T: Display,
    F: Fn(&PrefValue) -> Option<T>,
{
    let key = pref_key(name);
    let err = match prefs.get(&key) {
        Ok(Some(value)) => match convert(&value) {
            Some(converted) => return converted,
            None => JanitorError::Config(format!("invalid {} value {} for '{}'", value.kind(), value, key)),
        },
        Ok(None) => JanitorError::Config(format!("'{}' is not set", key)),
        Err(e) => JanitorError::Config(format!("cannot read '{}': {}", key, e)),
    };

    tracing::warn!("{}; using default {}", err, default);
    default
}

pub(crate) fn read_bool<P: Preferences>(prefs: &P, name: &str, default: bool) -> bool {
    read_or_default(prefs, name, default, |value| match value {
        PrefValue::Bool(b) => Some(*b),
        _ => None,
    })
}

pub(crate) fn read_days<P: Preferences>(prefs: &P, name: &str, default: u32) -> u32 {
    read_or_default(prefs, name, default, |value| match value {
        PrefValue::Int(days) => u32::try_from(*days).ok().filter(|d| *d <= MAX_DAYS),
        _ => None,
    })
}

pub(crate) fn read_counter<P: Preferences>(prefs: &P, name: &str) -> u64 {
    read_or_default(prefs, name, 0, |value| match value {
        PrefValue::Int(count) => u64::try_from(*count).ok(),
        _ => None,
    })
}
