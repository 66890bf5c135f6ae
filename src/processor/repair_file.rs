use anyhow::{Context, Result};
use rand::Rng;
use std::path::Path;
use tracing::{info, warn};

use super::{RecordRepairer, RepairReport};
use crate::config::PipelineConfig;
use crate::storage::{load_table, save_table, save_table_lenient};

/// Loads `input`, repairs it and writes the result to `output` in the
/// configured column order.
///
/// The save is lenient when `lenient` is set or when
/// `repair.strict_column_order` is off. A strict save fails if a step was
/// skipped for a missing column that the output order names.
pub fn repair_csv_file<R: Rng + ?Sized>(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    lenient: bool,
    rng: &mut R,
) -> Result<RepairReport> {
    let lenient = lenient || !config.repair.strict_column_order;
    let mut df = load_table(input)?;

    let repairer = RecordRepairer::from_config(&config.repair);
    let report = repairer
        .repair(&mut df, rng)
        .with_context(|| format!("Failed to repair {}", input.display()))?;

    if !report.skipped.is_empty() && !lenient {
        warn!(
            "{} repair steps were skipped, the strict save will fail",
            report.skipped.len()
        );
    }

    if lenient {
        save_table_lenient(&df, output, &config.output.column_order)?;
    } else {
        save_table(&df, output, &config.output.column_order).with_context(|| {
            format!(
                "Failed to save repaired table to {} (use --lenient to write partial tables)",
                output.display()
            )
        })?;
    }

    info!("✅ Repaired {} rows into {}", report.rows, output.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PRICE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    const WITHOUT_PRICE: &str = "Order_Id,Customer_Id,Customer_Name,Product_Id,Product_Category,Product_Name,Quantity_ordered,Date_and_Time_When_Order_Was_Placed,Customer_Country,Customer_City,Site_From_Where_Order_Was_Placed,Payment_Type,Payment_Transaction_Confirmation_Id,Payment_Success_or_Failure,Payment_Failure_Reason\n\
InvalidUUID,InvalidCustomerId,Ann Smith,InvalidProductId,Books,Comics,-1,2024-01-01 10:00:00,UK,London,Amazon,UPI,InvalidUUID,N,\n";

    fn input_without_price(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, WITHOUT_PRICE).unwrap();
        path
    }

    #[test]
    fn test_strict_save_fails_when_price_is_missing() {
        let dir = TempDir::new().unwrap();
        let input = input_without_price(&dir);
        let output = dir.path().join("repaired.csv");
        let mut rng = StdRng::seed_from_u64(4);

        let err = repair_csv_file(&PipelineConfig::default(), &input, &output, false, &mut rng)
            .unwrap_err();

        assert!(format!("{:#}", err).contains(PRICE));
        assert!(!output.exists());
    }

    #[test]
    fn test_lenient_flag_writes_partial_table() {
        let dir = TempDir::new().unwrap();
        let input = input_without_price(&dir);
        let output = dir.path().join("repaired.csv");
        let mut rng = StdRng::seed_from_u64(4);

        let report =
            repair_csv_file(&PipelineConfig::default(), &input, &output, true, &mut rng).unwrap();

        assert!(report.was_skipped(PRICE));
        let written = std::fs::read_to_string(&output).unwrap();
        let header = written.lines().next().unwrap();
        assert!(header.starts_with("Order_Id,Customer_Id"));
        assert!(!header.split(',').any(|c| c == PRICE));
        assert_eq!(written.lines().count(), 2);
    }

    #[test]
    fn test_relaxed_column_order_config_writes_partial_table() {
        let dir = TempDir::new().unwrap();
        let input = input_without_price(&dir);
        let output = dir.path().join("repaired.csv");
        let mut rng = StdRng::seed_from_u64(4);

        let mut config = PipelineConfig::default();
        config.repair.strict_column_order = false;

        repair_csv_file(&config, &input, &output, false, &mut rng).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_strict_save_succeeds_for_complete_table() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("orders.csv");
        let with_price = WITHOUT_PRICE
            .replacen("Quantity_ordered,", "Quantity_ordered,Price,", 1)
            .replacen(",-1,", ",-1,N/A,", 1);
        std::fs::write(&input, with_price).unwrap();
        let output = dir.path().join("repaired.csv");
        let mut rng = StdRng::seed_from_u64(4);

        let report =
            repair_csv_file(&PipelineConfig::default(), &input, &output, false, &mut rng).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.prices_replaced, 1);
        assert_eq!(report.total_identifiers_replaced(), 4);
    }
}
