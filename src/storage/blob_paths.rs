use chrono::{DateTime, Utc};

/// Where a pipeline stage keeps its files inside a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Raw,
    Repaired,
}

impl Stage {
    fn prefix(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::Repaired => "repaired",
        }
    }
}

/// `raw/2024/05/17/orders-101500.csv` style key for an upload made now.
pub fn dated_blob_path(stage: Stage, file_name: &str) -> String {
    dated_blob_path_at(stage, file_name, Utc::now())
}

pub fn dated_blob_path_at(stage: Stage, file_name: &str, at: DateTime<Utc>) -> String {
    let date = at.format("%Y/%m/%d").to_string();
    let timestamp = at.format("%H%M%S").to_string();

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (file_name, None),
    };

    match extension {
        Some(extension) => format!(
            "{}/{}/{}-{}.{}",
            stage.prefix(),
            date,
            stem,
            timestamp,
            extension
        ),
        None => format!("{}/{}/{}-{}", stage.prefix(), date, stem, timestamp),
    }
}
