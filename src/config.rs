//! Reconstruction configuration
//!
//! The defaults reproduce the trace-viewer contract exactly; overriding them
//! is only useful for event streams produced by a differently-labelled
//! instrumentation layer.

use crate::error::{Result, TraceError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Labels the reconstruction pass keys on
///
/// # Example
/// ```
/// use optrace::config::ReconstructConfig;
///
/// let config = ReconstructConfig::default();
/// assert_eq!(config.origin_marker, "__start_profile");
/// assert_eq!(config.wrapper_name, "forward");
/// assert_eq!(config.pid_label, "CPU Functions");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Name of the event marking session time zero
    pub origin_marker: String,

    /// Name of the synthetic wrapper span excluded from output
    pub wrapper_name: String,

    /// Constant `pid` track label written into every trace entry
    pub pid_label: String,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            origin_marker: "__start_profile".to_string(),
            wrapper_name: "forward".to_string(),
            pid_label: "CPU Functions".to_string(),
        }
    }
}

impl ReconstructConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| TraceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.origin_marker.is_empty() {
            return Err(TraceError::Config("origin_marker must not be empty".into()));
        }
        if self.origin_marker == self.wrapper_name {
            return Err(TraceError::Config(
                "origin_marker and wrapper_name must differ".into(),
            ));
        }
        Ok(())
    }
}
