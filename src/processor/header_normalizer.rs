use anyhow::Result;
use polars::prelude::*;
use tracing::{info, warn};

use crate::models::CANONICAL_COLUMNS;

/// Maps drifting CSV headers back onto the canonical column names.
///
/// Producers are not consistent about spacing or capitalisation
/// (`"Quantity Ordered"`, `" Price "`, `"quantity_ordered"`), so headers are
/// trimmed, whitespace runs become `_`, and the result is matched
/// case-insensitively against the canonical set.
pub struct HeaderNormalizer {
    canonical: Vec<&'static str>,
}

impl HeaderNormalizer {
    pub fn new() -> Self {
        HeaderNormalizer {
            canonical: CANONICAL_COLUMNS.to_vec(),
        }
    }

    pub fn normalize_header(&self, header: &str) -> String {
        let underscored = header.split_whitespace().collect::<Vec<_>>().join("_");

        self.canonical
            .iter()
            .find(|canonical| canonical.eq_ignore_ascii_case(&underscored))
            .map(|canonical| canonical.to_string())
            .unwrap_or(underscored)
    }

    /// Renames columns in place and returns the `(from, to)` pairs applied.
    pub fn normalize_dataframe(&self, df: &mut DataFrame) -> Result<Vec<(String, String)>> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut renamed = Vec::new();
        for col_name in column_names {
            let normalized = self.normalize_header(&col_name);
            if normalized == col_name {
                continue;
            }

            if df.column(&normalized).is_ok() {
                warn!(
                    "Header '{}' normalizes to '{}' which already exists, leaving it as is",
                    col_name, normalized
                );
                continue;
            }

            df.rename(&col_name, normalized.as_str().into())?;
            info!("Normalized header '{}' -> '{}'", col_name, normalized);
            renamed.push((col_name, normalized));
        }

        Ok(renamed)
    }
}

impl Default for HeaderNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
