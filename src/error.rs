//! Crate error type
//!
//! Nothing here is surfaced to the player. Runtime paths log these and
//! degrade (skip a spawn, fall back to default settings) instead of failing.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RangeError {
    /// Target radius was zero, negative or not finite
    InvalidTargetRadius { radius: f32 },
    /// Mode identifier outside the fixed set
    UnknownMode(String),
    /// Preloader identifier outside the fixed set
    UnknownPreloader(String),
    /// Key-value backend unavailable or rejected the operation
    Storage(String),
    /// Persisted settings could not be parsed or encoded
    SettingsFormat(String),
    /// A host capability (DOM API, GPU adapter, surface) is missing or failed
    Platform(String),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::InvalidTargetRadius { radius } => {
                write!(f, "target radius must be positive and finite, got {radius}")
            }
            RangeError::UnknownMode(name) => write!(f, "unknown game mode '{name}'"),
            RangeError::UnknownPreloader(name) => write!(f, "unknown preloader '{name}'"),
            RangeError::Storage(msg) => write!(f, "storage error: {msg}"),
            RangeError::SettingsFormat(msg) => write!(f, "malformed settings: {msg}"),
            RangeError::Platform(msg) => write!(f, "platform error: {msg}"),
        }
    }
}

impl std::error::Error for RangeError {}

impl From<serde_json::Error> for RangeError {
    fn from(err: serde_json::Error) -> Self {
        RangeError::SettingsFormat(err.to_string())
    }
}
