//! The single source of truth for tablestore engine settings.
//!
//! A `StoreConfig` is created once at the embedding boundary (for example from a
//! JSON document) and then consulted when building contexts and builders. It is
//! plain data and cheap to clone.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

//==================================================================================
// I. Configuration Struct
//==================================================================================

/// Engine-wide settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of loop iterations between two cancellation checks.
    #[serde(default = "default_safepoint_interval")]
    pub safepoint_interval: u32,

    /// Initial capacity used by builders when the caller has no size hint.
    #[serde(default = "default_builder_capacity")]
    pub default_builder_capacity: usize,

    /// The bounded length reported by shrinking text inference for short texts.
    #[serde(default = "default_short_text_limit")]
    pub short_text_limit: usize,

    /// UTC offset applied when a date is widened to a date-time at start of day.
    #[serde(default)]
    pub datetime_offset_seconds: i32,

    /// Whether the embedder should install the verbose logger at start-up.
    #[serde(default)]
    pub verbose_logging: bool,
}

fn default_safepoint_interval() -> u32 {
    1024
}

fn default_builder_capacity() -> usize {
    64
}

fn default_short_text_limit() -> usize {
    255
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            safepoint_interval: default_safepoint_interval(),
            default_builder_capacity: default_builder_capacity(),
            short_text_limit: default_short_text_limit(),
            datetime_offset_seconds: 0,
            verbose_logging: false,
        }
    }
}

//==================================================================================
// II. Loading & Validation
//==================================================================================

impl StoreConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let config: StoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.safepoint_interval == 0 {
            return Err(StoreError::InvalidConfig(
                "safepoint_interval must be at least 1".to_string(),
            ));
        }
        if self.short_text_limit == 0 {
            return Err(StoreError::InvalidConfig(
                "short_text_limit must be at least 1".to_string(),
            ));
        }
        // chrono accepts offsets strictly within one day.
        if self.datetime_offset_seconds.abs() >= 86_400 {
            return Err(StoreError::InvalidConfig(format!(
                "datetime_offset_seconds {} is out of range",
                self.datetime_offset_seconds
            )));
        }
        Ok(())
    }
}

//==================================================================================
// III. Unit Tests
//==================================================================================
