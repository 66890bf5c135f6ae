use anyhow::{Context, Result, bail};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Loads a CSV with a header row. Every column is read as text so corrupt
/// numeric cells survive until the repairer coerces them.
pub fn load_table(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;

    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Writes `df` with exactly `column_order`, overwriting `path`. A configured
/// column the table lacks is an error.
pub fn save_table<S: AsRef<str>>(df: &DataFrame, path: impl AsRef<Path>, column_order: &[S]) -> Result<()> {
    let missing: Vec<&str> = column_order
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| df.column(c).is_err())
        .collect();

    if !missing.is_empty() {
        bail!(
            "Columns missing from table: {}",
            missing.join(", ")
        );
    }

    let mut ordered = df.select(column_order.iter().map(|c| c.as_ref()))?;
    write_csv(&mut ordered, path.as_ref())
}

/// Like [`save_table`] but writes only the configured columns the table has,
/// still in configured order.
pub fn save_table_lenient<S: AsRef<str>>(
    df: &DataFrame,
    path: impl AsRef<Path>,
    column_order: &[S],
) -> Result<()> {
    let (present, missing): (Vec<&str>, Vec<&str>) = column_order
        .iter()
        .map(|c| c.as_ref())
        .partition(|c| df.column(c).is_ok());

    if !missing.is_empty() {
        warn!("Writing without columns: {}", missing.join(", "));
    }

    let mut ordered = df.select(present)?;
    write_csv(&mut ordered, path.as_ref())
}

/// Re-saves an existing CSV in the configured column order.
pub fn reorder_csv<S: AsRef<str>>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    column_order: &[S],
) -> Result<()> {
    let df = load_table(input)?;
    save_table(&df, output, column_order)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
