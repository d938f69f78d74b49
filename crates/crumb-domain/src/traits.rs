//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use std::fmt;

/// A value held in the host's key-value configuration store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefValue {
    /// Boolean preference
    Bool(bool),
    /// Integer preference
    Int(i64),
    /// String preference
    Str(String),
}

impl PrefValue {
    /// Name of the value's type, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            PrefValue::Bool(_) => "bool",
            PrefValue::Int(_) => "int",
            PrefValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Bool(b) => write!(f, "{}", b),
            PrefValue::Int(i) => write!(f, "{}", i),
            PrefValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Trait for the host's persistent key-value configuration store
///
/// Implemented by the infrastructure layer (crumb-store). Keys are full,
/// prefixed names such as `crumb.expire.days`.
pub trait Preferences {
    /// Error type for preference operations
    type Error: fmt::Display;

    /// Read a raw value, `None` when the key has never been set
    fn get(&self, key: &str) -> Result<Option<PrefValue>, Self::Error>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: PrefValue) -> Result<(), Self::Error>;

    /// Persist pending writes
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Whether a key has been set
    fn contains(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self.get(key)?.is_some())
    }
}
