//! Process-wide configuration slot.
//!
//! The only setting is the default temp-emulation schema: the schema that
//! emulated `#name` temp tables land in when the caller does not pass one
//! explicitly. It is typically written once at program start and read
//! concurrently from translation calls; readers always observe a
//! consistent snapshot.

use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Default schema for emulated temp tables.
    pub temp_emulation_schema: Option<String>,
}

static SETTINGS: Lazy<RwLock<Settings>> = Lazy::new(|| RwLock::new(Settings::default()));

/// Set (or clear) the default temp-emulation schema.
pub fn set_temp_emulation_schema(schema: Option<&str>) {
    let mut settings = SETTINGS.write().expect("settings lock poisoned");
    settings.temp_emulation_schema = schema.map(str::to_string);
}

/// The configured default temp-emulation schema, if any.
pub fn temp_emulation_schema() -> Option<String> {
    let settings = SETTINGS.read().expect("settings lock poisoned");
    settings.temp_emulation_schema.clone()
}

/// A snapshot of the current settings.
pub fn settings() -> Settings {
    SETTINGS.read().expect("settings lock poisoned").clone()
}
