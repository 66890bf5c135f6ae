use super::StorageConfig;
use crate::models::CANONICAL_COLUMNS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FAILURE_REASON: &str = "No Reason Provided";

/// How replacement values are drawn when several rows in one pass need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Every repaired cell gets its own freshly drawn value.
    #[default]
    PerRow,
    /// One value is drawn per pass (per sentinel kind for identifiers) and
    /// shared by every row that needs it.
    PerBatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub fallback_policy: FallbackPolicy,
    pub failure_reason_placeholder: String,
    pub seed: Option<u64>,
    /// Fail the save when a canonical column is missing from the table.
    pub strict_column_order: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::PerRow,
            failure_reason_placeholder: DEFAULT_FAILURE_REASON.to_string(),
            seed: None,
            strict_column_order: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub records: usize,
    pub inject_faults: bool,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            records: 100,
            inject_faults: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub column_order: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            column_order: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub storage: StorageConfig,
    pub repair: RepairConfig,
    pub generator: GeneratorConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse pipeline config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(
                "Pipeline config not found at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.repair.failure_reason_placeholder.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "repair.failure_reason_placeholder cannot be empty"
            ));
        }

        if self.output.column_order.is_empty() {
            return Err(anyhow::anyhow!("output.column_order cannot be empty"));
        }

        Ok(())
    }
}
