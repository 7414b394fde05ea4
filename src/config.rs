//! Engine configuration.
//!
//! ```toml
//! warnings_as_errors = false
//! strict_capabilities = true
//! default_order = "append"
//! log_level = "debug"
//! ```

use crate::core::context::ValidationContext;
use crate::core::error::{TrellisError, TrellisResult};
use crate::dsl::state::InsertOrder;
use crate::transform::pipeline::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Fail on the first transform warning.
    pub warnings_as_errors: bool,
    /// Check capability modules against the registered components.
    pub strict_capabilities: bool,
    /// Where the compiler inserts entities it builds.
    pub default_order: InsertOrder,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warnings_as_errors: false,
            strict_capabilities: false,
            default_order: InsertOrder::Append,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML.
    pub fn from_toml_str(src: &str) -> TrellisResult<Self> {
        let config: EngineConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> TrellisResult<Self> {
        let path = path.as_ref();
        log::debug!("loading engine config from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> TrellisResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(TrellisError::Other(format!(
                "invalid config: log_level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    pub fn with_strict_capabilities(mut self, enabled: bool) -> Self {
        self.strict_capabilities = enabled;
        self
    }

    pub fn with_default_order(mut self, order: InsertOrder) -> Self {
        self.default_order = order;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Pipeline options implied by this configuration.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new().with_warnings_as_errors(self.warnings_as_errors)
    }

    /// Apply the capability setting to `ctx`.
    pub fn apply_to(&self, ctx: ValidationContext) -> ValidationContext {
        ctx.with_strict_capabilities(self.strict_capabilities)
    }
}
