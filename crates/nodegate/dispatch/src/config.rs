//! Dispatcher configuration

use crate::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};

/// Workflow dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Undelivered progress events buffered per subscriber before it starts
    /// skipping
    pub progress_channel_capacity: usize,
    /// Emit a debug event for every progress update
    pub log_progress_updates: bool,
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.progress_channel_capacity == 0 {
            return Err(DispatchError::Config(
                "progress_channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            progress_channel_capacity: 1024,
            log_progress_updates: true,
        }
    }
}
