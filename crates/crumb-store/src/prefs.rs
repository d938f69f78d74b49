//! Key-value preference backends
//!
//! [`MemoryPrefs`] keeps values in process; [`TomlPrefs`] persists them as a
//! flat TOML table so settings and ledger counters survive restarts.

use crumb_domain::{PrefValue, Preferences};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the file-backed preference store
#[derive(Error, Debug)]
pub enum PrefsError {
    /// I/O error reading or writing the preference file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The preference file is not valid TOML
    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The preferences could not be serialized
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A stored value has a type preferences cannot hold
    #[error("Unsupported value for '{key}': {kind}")]
    Unsupported {
        /// Offending key
        key: String,
        /// TOML type found
        kind: &'static str,
    },
}

/// In-process preference store
#[derive(Debug, Clone, Default)]
pub struct MemoryPrefs {
    values: BTreeMap<String, PrefValue>,
}

impl MemoryPrefs {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys set
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Preferences for MemoryPrefs {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<PrefValue>, Self::Error> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<(), Self::Error> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Preference store persisted as a flat TOML file
///
/// The file is read once on [`TomlPrefs::open`]; writes stay in memory until
/// [`Preferences::flush`].
///
/// ```toml
/// "crumb.deleteExpired.enabled" = true
/// "crumb.deleteUnused.days" = 90
/// "crumb.expire.count" = 12
/// ```
#[derive(Debug)]
pub struct TomlPrefs {
    path: PathBuf,
    table: toml::Table,
    dirty: bool,
}

impl TomlPrefs {
    /// Load preferences from `path`, starting empty if the file does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PrefsError> {
        let path = path.as_ref().to_path_buf();
        let table = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            toml::from_str::<toml::Table>(&contents)?
        } else {
            toml::Table::new()
        };

        Ok(Self {
            path,
            table,
            dirty: false,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are writes not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Preferences for TomlPrefs {
    type Error = PrefsError;

    fn get(&self, key: &str) -> Result<Option<PrefValue>, Self::Error> {
        let value = match self.table.get(key) {
            Some(value) => value,
            None => return Ok(None),
        };

        match value {
            toml::Value::Boolean(b) => Ok(Some(PrefValue::Bool(*b))),
            toml::Value::Integer(i) => Ok(Some(PrefValue::Int(*i))),
            toml::Value::String(s) => Ok(Some(PrefValue::Str(s.clone()))),
            other => Err(PrefsError::Unsupported {
                key: key.to_string(),
                kind: other.type_str(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<(), Self::Error> {
        let value = match value {
            PrefValue::Bool(b) => toml::Value::Boolean(b),
            PrefValue::Int(i) => toml::Value::Integer(i),
            PrefValue::Str(s) => toml::Value::String(s),
        };
        self.table.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if !self.dirty {
            return Ok(());
        }

        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(&self.table)?;
        fs::write(&self.path, contents)?;
        self.dirty = false;
        Ok(())
    }
}
