use anyhow::Result;
use polars::prelude::*;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{info, warn};

use super::HeaderNormalizer;
use crate::config::{DEFAULT_FAILURE_REASON, FallbackPolicy, RepairConfig};
use crate::models::{
    CUSTOMER_CITY, CUSTOMER_COUNTRY, CUSTOMER_ID, CUSTOMER_NAME, ORDER_ID, PAYMENT_FAILURE_REASON,
    PAYMENT_TYPE, PRICE, PRODUCT_CATEGORY, PRODUCT_ID, PRODUCT_NAME, QUANTITY_ORDERED,
    ReferenceCatalog, TRANSACTION_ID, is_id_sentinel, random_identifier,
};

pub const QUANTITY_RANGE: (i64, i64) = (1, 5);
pub const PRICE_RANGE: (f64, f64) = (10.0, 1000.0);

/// One column-level transform of a repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RepairStep {
    CategoryProduct,
    Identifier(&'static str),
    CustomerGeo,
    PaymentType,
    Quantity,
    Price,
    FailureReason,
}

impl RepairStep {
    /// Order matters: later steps read columns earlier steps rewrote.
    pub const SEQUENCE: [RepairStep; 10] = [
        RepairStep::CategoryProduct,
        RepairStep::Identifier(PRODUCT_ID),
        RepairStep::Identifier(ORDER_ID),
        RepairStep::Identifier(CUSTOMER_ID),
        RepairStep::Identifier(TRANSACTION_ID),
        RepairStep::CustomerGeo,
        RepairStep::PaymentType,
        RepairStep::Quantity,
        RepairStep::Price,
        RepairStep::FailureReason,
    ];

    /// Input column the step needs; `None` means the step writes its columns
    /// unconditionally.
    pub fn required_column(&self) -> Option<&'static str> {
        match self {
            RepairStep::CategoryProduct => Some(PRODUCT_NAME),
            RepairStep::Identifier(column) => Some(*column),
            RepairStep::CustomerGeo | RepairStep::PaymentType => None,
            RepairStep::Quantity => Some(QUANTITY_ORDERED),
            RepairStep::Price => Some(PRICE),
            RepairStep::FailureReason => Some(PAYMENT_FAILURE_REASON),
        }
    }
}

impl fmt::Display for RepairStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairStep::CategoryProduct => write!(f, "category/product consistency"),
            RepairStep::Identifier(column) => write!(f, "identifier repair ({})", column),
            RepairStep::CustomerGeo => write!(f, "customer/geo repair"),
            RepairStep::PaymentType => write!(f, "payment type repair"),
            RepairStep::Quantity => write!(f, "quantity repair"),
            RepairStep::Price => write!(f, "price repair"),
            RepairStep::FailureReason => write!(f, "failure reason fill"),
        }
    }
}

/// Column names present in a table, taken after header normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<String>,
}

impl TableSchema {
    pub fn of(df: &DataFrame) -> Self {
        TableSchema {
            columns: df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// The missing column that keeps `step` from running, if any.
    pub fn missing_for(&self, step: &RepairStep) -> Option<&'static str> {
        step.required_column().filter(|column| !self.has(column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub step: String,
    pub missing_column: String,
}

/// What a repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairReport {
    pub rows: usize,
    pub renamed_headers: Vec<(String, String)>,
    pub unknown_product_names: usize,
    pub identifiers_replaced: BTreeMap<String, usize>,
    pub quantities_replaced: usize,
    pub prices_replaced: usize,
    pub failure_reasons_filled: usize,
    pub skipped: Vec<SkippedStep>,
}

impl RepairReport {
    pub fn total_identifiers_replaced(&self) -> usize {
        self.identifiers_replaced.values().sum()
    }

    pub fn was_skipped(&self, column: &str) -> bool {
        self.skipped.iter().any(|s| s.missing_column == column)
    }
}

/// Hands out replacement values according to a [`FallbackPolicy`].
struct Fallback<T> {
    policy: FallbackPolicy,
    shared: Option<T>,
}

impl<T: Clone> Fallback<T> {
    fn new(policy: FallbackPolicy) -> Self {
        Fallback {
            policy,
            shared: None,
        }
    }

    fn next(&mut self, draw: impl FnOnce() -> T) -> T {
        match self.policy {
            FallbackPolicy::PerRow => draw(),
            FallbackPolicy::PerBatch => self.shared.get_or_insert_with(draw).clone(),
        }
    }
}

/// Repairs order tables in place so every row satisfies the catalog
/// relationships and the numeric ranges.
///
/// Rows are repaired independently. Nothing in a pass is fatal: a missing
/// input column skips the step that needs it and unrecognized catalog keys
/// are resolved at random. The only errors returned come from the dataframe
/// itself.
pub struct RecordRepairer {
    catalog: ReferenceCatalog,
    headers: HeaderNormalizer,
    fallback_policy: FallbackPolicy,
    failure_reason_placeholder: String,
}

impl RecordRepairer {
    pub fn new() -> Self {
        RecordRepairer {
            catalog: ReferenceCatalog,
            headers: HeaderNormalizer::new(),
            fallback_policy: FallbackPolicy::PerRow,
            failure_reason_placeholder: DEFAULT_FAILURE_REASON.to_string(),
        }
    }

    pub fn from_config(config: &RepairConfig) -> Self {
        Self::new()
            .with_fallback_policy(config.fallback_policy)
            .with_failure_reason_placeholder(&config.failure_reason_placeholder)
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_failure_reason_placeholder(mut self, placeholder: &str) -> Self {
        self.failure_reason_placeholder = placeholder.to_string();
        self
    }

    pub fn repair<R: Rng + ?Sized>(&self, df: &mut DataFrame, rng: &mut R) -> Result<RepairReport> {
        let mut report = RepairReport {
            rows: df.height(),
            ..Default::default()
        };

        report.renamed_headers = self.headers.normalize_dataframe(df)?;
        let schema = TableSchema::of(df);

        for step in RepairStep::SEQUENCE {
            if let Some(column) = schema.missing_for(&step) {
                warn!("Column '{}' not found. Skipping {}...", column, step);
                report.skipped.push(SkippedStep {
                    step: step.to_string(),
                    missing_column: column.to_string(),
                });
                continue;
            }

            match step {
                RepairStep::CategoryProduct => self.repair_category_product(df, rng, &mut report)?,
                RepairStep::Identifier(column) => {
                    self.repair_identifiers(df, column, rng, &mut report)?
                }
                RepairStep::CustomerGeo => self.regenerate_customer_geo(df, rng)?,
                RepairStep::PaymentType => self.regenerate_payment_type(df, rng)?,
                RepairStep::Quantity => self.repair_quantity(df, rng, &mut report)?,
                RepairStep::Price => self.repair_price(df, rng, &mut report)?,
                RepairStep::FailureReason => self.fill_failure_reason(df, &mut report)?,
            }
        }

        if report.unknown_product_names > 0 {
            warn!(
                "{} rows had an unrecognized product name and were assigned a random category",
                report.unknown_product_names
            );
        }

        info!(
            "Repaired {} rows: {} identifiers, {} quantities, {} prices, {} failure reasons, {} steps skipped",
            report.rows,
            report.total_identifiers_replaced(),
            report.quantities_replaced,
            report.prices_replaced,
            report.failure_reasons_filled,
            report.skipped.len()
        );

        Ok(report)
    }

    /// Derives the category from the stale product name, then draws a fresh
    /// name from that category. The original name only feeds the category.
    fn repair_category_product<R: Rng + ?Sized>(
        &self,
        df: &mut DataFrame,
        rng: &mut R,
        report: &mut RepairReport,
    ) -> Result<()> {
        let names = string_values(df, PRODUCT_NAME)?;

        let mut categories = Vec::with_capacity(names.len());
        for name in &names {
            let name = name.as_deref().unwrap_or("").trim();
            if self.catalog.lookup_category(name).is_none() {
                report.unknown_product_names += 1;
            }
            categories.push(self.catalog.category_of(name, rng));
        }

        let _ = df.drop_in_place(PRODUCT_NAME)?;

        let products: Vec<&str> = categories
            .iter()
            .map(|category| self.catalog.random_product(category, rng))
            .collect();

        df.with_column(Series::new(PRODUCT_CATEGORY.into(), categories))?;
        df.with_column(Series::new(PRODUCT_NAME.into(), products))?;

        Ok(())
    }

    fn repair_identifiers<R: Rng + ?Sized>(
        &self,
        df: &mut DataFrame,
        column: &'static str,
        rng: &mut R,
        report: &mut RepairReport,
    ) -> Result<()> {
        let values = string_values(df, column)?;

        // Per-batch sharing is keyed by sentinel kind, so "InvalidUUID" and
        // "InvalidProductId" in one column never collapse onto one value.
        let mut shared: HashMap<String, String> = HashMap::new();
        let mut replaced = 0;
        let mut repaired = Vec::with_capacity(values.len());

        for value in values {
            match value {
                Some(raw) if is_id_sentinel(raw.trim()) => {
                    let fresh = match self.fallback_policy {
                        FallbackPolicy::PerRow => random_identifier(rng),
                        FallbackPolicy::PerBatch => shared
                            .entry(raw.trim().to_string())
                            .or_insert_with(|| random_identifier(rng))
                            .clone(),
                    };
                    repaired.push(Some(fresh));
                    replaced += 1;
                }
                other => repaired.push(other),
            }
        }

        df.with_column(Series::new(column.into(), repaired))?;
        report
            .identifiers_replaced
            .insert(column.to_string(), replaced);

        Ok(())
    }

    /// Full overwrite: previously valid geo data is replaced too.
    fn regenerate_customer_geo<R: Rng + ?Sized>(&self, df: &mut DataFrame, rng: &mut R) -> Result<()> {
        let rows = df.height();
        let mut countries = Vec::with_capacity(rows);
        let mut cities = Vec::with_capacity(rows);
        let mut names = Vec::with_capacity(rows);

        for _ in 0..rows {
            let (country, city) = self.catalog.random_location(rng);
            countries.push(country);
            cities.push(city);
        }
        for _ in 0..rows {
            names.push(self.catalog.random_customer_name(rng));
        }

        df.with_column(Series::new(CUSTOMER_COUNTRY.into(), countries))?;
        df.with_column(Series::new(CUSTOMER_CITY.into(), cities))?;
        df.with_column(Series::new(CUSTOMER_NAME.into(), names))?;

        Ok(())
    }

    fn regenerate_payment_type<R: Rng + ?Sized>(&self, df: &mut DataFrame, rng: &mut R) -> Result<()> {
        let payment_types: Vec<&str> = (0..df.height())
            .map(|_| self.catalog.random_payment_type(rng))
            .collect();

        df.with_column(Series::new(PAYMENT_TYPE.into(), payment_types))?;

        Ok(())
    }

    fn repair_quantity<R: Rng + ?Sized>(
        &self,
        df: &mut DataFrame,
        rng: &mut R,
        report: &mut RepairReport,
    ) -> Result<()> {
        let values = string_values(df, QUANTITY_ORDERED)?;
        let mut fallback = Fallback::new(self.fallback_policy);

        let quantities: Vec<i64> = values
            .iter()
            .map(|value| match value.as_deref().and_then(parse_quantity) {
                Some(quantity) if quantity >= QUANTITY_RANGE.0 => quantity,
                parsed => {
                    report.quantities_replaced += 1;
                    if parsed == Some(-1) {
                        1
                    } else {
                        fallback.next(|| random_quantity(rng))
                    }
                }
            })
            .collect();

        df.with_column(Series::new(QUANTITY_ORDERED.into(), quantities))?;

        Ok(())
    }

    fn repair_price<R: Rng + ?Sized>(
        &self,
        df: &mut DataFrame,
        rng: &mut R,
        report: &mut RepairReport,
    ) -> Result<()> {
        let values = string_values(df, PRICE)?;
        let mut fallback = Fallback::new(self.fallback_policy);

        let prices: Vec<f64> = values
            .iter()
            .map(|value| match value.as_deref().and_then(parse_price) {
                Some(price) => price,
                None => {
                    report.prices_replaced += 1;
                    fallback.next(|| random_price(rng))
                }
            })
            .collect();

        df.with_column(Series::new(PRICE.into(), prices))?;

        Ok(())
    }

    /// Fills blanks regardless of payment status.
    fn fill_failure_reason(&self, df: &mut DataFrame, report: &mut RepairReport) -> Result<()> {
        let values = string_values(df, PAYMENT_FAILURE_REASON)?;

        let reasons: Vec<String> = values
            .into_iter()
            .map(|value| match value {
                Some(reason) if !reason.trim().is_empty() => reason,
                _ => {
                    report.failure_reasons_filled += 1;
                    self.failure_reason_placeholder.clone()
                }
            })
            .collect();

        df.with_column(Series::new(PAYMENT_FAILURE_REASON.into(), reasons))?;

        Ok(())
    }
}

impl Default for RecordRepairer {
    fn default() -> Self {
        Self::new()
    }
}

/// Column values as text, whatever dtype the loader picked.
fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let as_text = df.column(column)?.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|value| value.map(|s| s.to_string()))
        .collect())
}

/// Whole numbers only; `"3.0"` counts, `"2.5"` and `"NaN"` do not.
fn parse_quantity(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(quantity) = trimmed.parse::<i64>() {
        return Some(quantity);
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| f as i64)
}

/// Non-negative price rounded to cents. Values too large to round stay
/// unparsed.
fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
        .map(round_cents)
        .filter(|price| price.is_finite())
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn random_quantity<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(QUANTITY_RANGE.0..=QUANTITY_RANGE.1)
}

pub fn random_price<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    round_cents(rng.gen_range(PRICE_RANGE.0..=PRICE_RANGE.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dirty_frame() -> DataFrame {
        df!(
            "Order_Id" => [Some("InvalidUUID"), Some("0b6c1c57-5b3a-4a8e-9d2f-7d1c9e3f1a11"), Some("InvalidUUID")],
            "Customer_Id" => [Some("InvalidCustomerId"), Some("InvalidCustomerId"), Some("c5d7b0a4-7a0f-4d55-8f38-0d8f0a1e2b33")],
            "Customer_Name" => ["Customer_0", "Customer_1", "Customer_2"],
            "Product_Id" => [Some("InvalidProductId"), Some("a2c3e4f5-1b2c-4d3e-8f9a-0b1c2d3e4f55"), Some("InvalidUUID")],
            "Product_Category" => ["InvalidCategory", "Books", "Sports"],
            "Product_Name" => ["InvalidProductName", "Laptops", "Comics"],
            "Quantity_ordered" => ["-1", "3", "abc"],
            "Price" => ["N/A", "19.999", "250.5"],
            "Date_and_Time_When_Order_Was_Placed" => ["2024-01-01 10:00:00", "2024-02-01 11:00:00", "2024-03-01 12:00:00"],
            "Customer_Country" => ["France", "USA", "UK"],
            "Customer_City" => ["InvalidCity", "Chicago", "Paris"],
            "Site_From_Where_Order_Was_Placed" => ["Amazon", "eBay", "Walmart"],
            "Payment_Type" => ["Credit Card", "UPI", "Gift Card"],
            "Payment_Transaction_Confirmation_Id" => ["InvalidUUID", "InvalidUUID", "d1e2f3a4-b5c6-4d7e-8f9a-0b1c2d3e4f66"],
            "Payment_Success_or_Failure" => ["N", "Y", "N"],
            "Payment_Failure_Reason" => [None, Some("Payment Successful"), Some("Card expired")],
        )
        .unwrap()
    }

    fn strings(df: &DataFrame, column: &str) -> Vec<String> {
        string_values(df, column)
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_relationship_invariants_hold() {
        let catalog = ReferenceCatalog;
        let repairer = RecordRepairer::new();
        let mut df = dirty_frame();
        let mut rng = StdRng::seed_from_u64(17);

        repairer.repair(&mut df, &mut rng).unwrap();

        let categories = strings(&df, PRODUCT_CATEGORY);
        let products = strings(&df, PRODUCT_NAME);
        for (category, product) in categories.iter().zip(&products) {
            assert!(catalog.contains_product(category, product));
        }

        let countries = strings(&df, CUSTOMER_COUNTRY);
        let cities = strings(&df, CUSTOMER_CITY);
        for (country, city) in countries.iter().zip(&cities) {
            assert!(catalog.contains_city(country, city));
        }
    }

    #[test]
    fn test_known_product_keeps_its_category() {
        let repairer = RecordRepairer::new();
        let mut df = dirty_frame();
        let mut rng = StdRng::seed_from_u64(1);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        let categories = strings(&df, PRODUCT_CATEGORY);
        // Laptops and Comics are known, so their rows ignore the stale category
        assert_eq!(categories[1], "Electronics");
        assert_eq!(categories[2], "Books");
        assert_eq!(report.unknown_product_names, 1);
    }

    #[test]
    fn test_invalid_product_scenario() {
        let repairer = RecordRepairer::new();
        let mut df = df!(
            "Product_Name" => ["InvalidProductName"],
            "Quantity_ordered" => ["-1"],
            "Price" => ["N/A"],
            "Payment_Failure_Reason" => [None::<&str>],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(99);

        repairer.repair(&mut df, &mut rng).unwrap();

        let category = &strings(&df, PRODUCT_CATEGORY)[0];
        let product = &strings(&df, PRODUCT_NAME)[0];
        assert!(ReferenceCatalog.contains_product(category, product));

        let quantity = df.column(QUANTITY_ORDERED).unwrap().i64().unwrap().get(0).unwrap();
        assert!((1..=5).contains(&quantity));

        let price = df.column(PRICE).unwrap().f64().unwrap().get(0).unwrap();
        assert!((10.0..=1000.0).contains(&price));
        assert!(((price * 100.0).round() - price * 100.0).abs() < 1e-6);

        assert_eq!(strings(&df, PAYMENT_FAILURE_REASON), vec!["No Reason Provided"]);
    }

    #[test]
    fn test_numeric_columns_are_valid() {
        let repairer = RecordRepairer::new();
        let mut df = dirty_frame();
        let mut rng = StdRng::seed_from_u64(5);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        let quantities: Vec<i64> = df
            .column(QUANTITY_ORDERED)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(quantities[0], 1);
        assert_eq!(quantities[1], 3);
        assert!((1..=5).contains(&quantities[2]));
        assert_eq!(report.quantities_replaced, 2);

        let prices: Vec<f64> = df
            .column(PRICE)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!((10.0..=1000.0).contains(&prices[0]));
        assert_eq!(prices[1], 20.0);
        assert_eq!(prices[2], 250.5);
        for price in prices {
            assert!(price >= 0.0);
            assert!(((price * 100.0).round() - price * 100.0).abs() < 1e-6);
        }
        assert_eq!(report.prices_replaced, 1);
    }

    #[test]
    fn test_quantity_edge_values() {
        assert_eq!(parse_quantity(" 4 "), Some(4));
        assert_eq!(parse_quantity("3.0"), Some(3));
        assert_eq!(parse_quantity("2.5"), None);
        assert_eq!(parse_quantity("NaN"), None);
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("-1"), Some(-1));
        assert_eq!(parse_quantity("9999999999999999999"), None);
        assert_eq!(parse_quantity("1e300"), None);

        let repairer = RecordRepairer::new();
        let mut df = df!("Quantity_ordered" => ["0", "-7", "2.5", "5"]).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        repairer.repair(&mut df, &mut rng).unwrap();

        let quantities: Vec<i64> = df
            .column(QUANTITY_ORDERED)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!(quantities.iter().all(|q| (1..=5).contains(q)));
        assert_eq!(quantities[3], 5);
    }

    #[test]
    fn test_negative_price_is_replaced() {
        let repairer = RecordRepairer::new();
        let mut df = df!("Price" => ["-12.50", "inf", "0"]).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        let prices: Vec<f64> = df
            .column(PRICE)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!((10.0..=1000.0).contains(&prices[0]));
        assert!((10.0..=1000.0).contains(&prices[1]));
        assert_eq!(prices[2], 0.0);
        assert_eq!(report.prices_replaced, 2);
    }

    #[test]
    fn test_price_overflowing_on_rounding_is_replaced() {
        assert_eq!(parse_price("1e307"), None);
        assert_eq!(parse_price("19.999"), Some(20.0));

        let repairer = RecordRepairer::new();
        let mut df = df!("Price" => ["1e307", "1.7e308", "1e300"]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        let prices: Vec<f64> = df
            .column(PRICE)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!(prices.iter().all(|p| p.is_finite()));
        assert!((10.0..=1000.0).contains(&prices[0]));
        assert!((10.0..=1000.0).contains(&prices[1]));
        assert!(prices[2] > 1e299);
        assert_eq!(report.prices_replaced, 2);
    }

    #[test]
    fn test_out_of_range_quantity_is_replaced() {
        let repairer = RecordRepairer::new();
        let mut df = df!("Quantity_ordered" => ["9999999999999999999", "1e300", "2"]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        let quantities: Vec<i64> = df
            .column(QUANTITY_ORDERED)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!((1..=5).contains(&quantities[0]));
        assert!((1..=5).contains(&quantities[1]));
        assert_eq!(quantities[2], 2);
        assert_eq!(report.quantities_replaced, 2);
    }

    #[test]
    fn test_sentinels_replaced_per_row() {
        let repairer = RecordRepairer::new();
        let mut df = dirty_frame();
        let mut rng = StdRng::seed_from_u64(21);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        let order_ids = strings(&df, ORDER_ID);
        assert!(order_ids.iter().all(|id| !is_id_sentinel(id)));
        assert!(order_ids.iter().all(|id| crate::models::is_identifier(id)));
        assert_ne!(order_ids[0], order_ids[2]);
        assert_eq!(order_ids[1], "0b6c1c57-5b3a-4a8e-9d2f-7d1c9e3f1a11");

        let transaction_ids = strings(&df, TRANSACTION_ID);
        assert_ne!(transaction_ids[0], transaction_ids[1]);

        assert_eq!(report.identifiers_replaced[ORDER_ID], 2);
        assert_eq!(report.identifiers_replaced[CUSTOMER_ID], 2);
        assert_eq!(report.identifiers_replaced[PRODUCT_ID], 2);
        assert_eq!(report.identifiers_replaced[TRANSACTION_ID], 2);
        assert_eq!(report.total_identifiers_replaced(), 8);
    }

    #[test]
    fn test_sentinels_shared_per_batch() {
        let repairer = RecordRepairer::new().with_fallback_policy(FallbackPolicy::PerBatch);
        let mut df = dirty_frame();
        let mut rng = StdRng::seed_from_u64(21);

        repairer.repair(&mut df, &mut rng).unwrap();

        let order_ids = strings(&df, ORDER_ID);
        assert_eq!(order_ids[0], order_ids[2]);

        let customer_ids = strings(&df, CUSTOMER_ID);
        assert_eq!(customer_ids[0], customer_ids[1]);

        // Different sentinel kinds in one column get different replacements
        let product_ids = strings(&df, PRODUCT_ID);
        assert_ne!(product_ids[0], product_ids[2]);
    }

    #[test]
    fn test_numeric_fallback_shared_per_batch() {
        let repairer = RecordRepairer::new().with_fallback_policy(FallbackPolicy::PerBatch);
        let mut df = df!(
            "Quantity_ordered" => ["x", "y", "z", "-1"],
            "Price" => ["a", "b", "c", "5"],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        repairer.repair(&mut df, &mut rng).unwrap();

        let quantities: Vec<i64> = df
            .column(QUANTITY_ORDERED)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(quantities[0], quantities[1]);
        assert_eq!(quantities[1], quantities[2]);
        assert_eq!(quantities[3], 1);

        let prices: Vec<f64> = df
            .column(PRICE)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(prices[0], prices[1]);
        assert_eq!(prices[1], prices[2]);
        assert_eq!(prices[3], 5.0);
    }

    #[test]
    fn test_failure_reason_filled_regardless_of_status() {
        let repairer = RecordRepairer::new().with_failure_reason_placeholder("Unknown");
        let mut df = df!(
            "Payment_Success_or_Failure" => ["Y", "N", "N"],
            "Payment_Failure_Reason" => [None, Some("  "), Some("Card expired")],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        assert_eq!(
            strings(&df, PAYMENT_FAILURE_REASON),
            vec!["Unknown", "Unknown", "Card expired"]
        );
        assert_eq!(report.failure_reasons_filled, 2);
        // Status is never touched
        assert_eq!(strings(&df, "Payment_Success_or_Failure"), vec!["Y", "N", "N"]);
    }

    #[test]
    fn test_spaced_quantity_header_accepted() {
        let repairer = RecordRepairer::new();
        let mut df = df!(
            "Quantity Ordered" => ["-1", "oops"],
            "Price" => ["10", "20"],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        assert!(df.column("Quantity Ordered").is_err());
        let quantities: Vec<i64> = df
            .column(QUANTITY_ORDERED)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(quantities[0], 1);
        assert!((1..=5).contains(&quantities[1]));
        assert!(!report.was_skipped(QUANTITY_ORDERED));
        assert_eq!(
            report.renamed_headers,
            vec![("Quantity Ordered".to_string(), QUANTITY_ORDERED.to_string())]
        );
    }

    #[test]
    fn test_missing_price_column_is_skipped() {
        let repairer = RecordRepairer::new();
        let mut df = dirty_frame().drop(PRICE).unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        assert!(df.column(PRICE).is_err());
        assert!(report.was_skipped(PRICE));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].step, "price repair");
        assert!(df.column(QUANTITY_ORDERED).is_ok());
    }

    #[test]
    fn test_generative_steps_create_missing_columns() {
        let repairer = RecordRepairer::new();
        let mut df = df!("Order_Id" => ["InvalidUUID", "InvalidUUID"]).unwrap();
        let mut rng = StdRng::seed_from_u64(10);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        for column in [CUSTOMER_COUNTRY, CUSTOMER_CITY, CUSTOMER_NAME, PAYMENT_TYPE] {
            assert_eq!(df.column(column).unwrap().len(), 2);
        }
        assert!(report.was_skipped(PRODUCT_NAME));
        assert!(report.was_skipped(PRICE));
        assert!(!report.was_skipped(ORDER_ID));
    }

    #[test]
    fn test_second_pass_churns_regenerated_columns() {
        let repairer = RecordRepairer::new();
        let mut df = dirty_frame();
        let mut rng = StdRng::seed_from_u64(12);

        repairer.repair(&mut df, &mut rng).unwrap();
        let first = df.clone();
        repairer.repair(&mut df, &mut rng).unwrap();

        // Three rows, several random columns: at least one of them must move
        let churned = [CUSTOMER_COUNTRY, CUSTOMER_CITY, CUSTOMER_NAME, PAYMENT_TYPE, PRODUCT_NAME]
            .iter()
            .filter(|column| strings(&first, column) != strings(&df, column))
            .count();
        assert!(churned > 0);
        assert_ne!(strings(&first, CUSTOMER_NAME), strings(&df, CUSTOMER_NAME));

        // Repaired numeric and id columns are stable on the second pass
        assert_eq!(strings(&first, ORDER_ID), strings(&df, ORDER_ID));
        assert_eq!(strings(&first, PRODUCT_CATEGORY), strings(&df, PRODUCT_CATEGORY));
        assert_eq!(
            first.column(QUANTITY_ORDERED).unwrap().i64().unwrap().into_no_null_iter().collect::<Vec<_>>(),
            df.column(QUANTITY_ORDERED).unwrap().i64().unwrap().into_no_null_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_same_seed_same_output() {
        let repairer = RecordRepairer::new();
        let mut left = dirty_frame();
        let mut right = dirty_frame();

        repairer
            .repair(&mut left, &mut StdRng::seed_from_u64(77))
            .unwrap();
        repairer
            .repair(&mut right, &mut StdRng::seed_from_u64(77))
            .unwrap();

        assert!(left.equals_missing(&right));
    }

    #[test]
    fn test_empty_table() {
        let repairer = RecordRepairer::new();
        let mut df = df!(
            "Product_Name" => Vec::<&str>::new(),
            "Price" => Vec::<&str>::new(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let report = repairer.repair(&mut df, &mut rng).unwrap();

        assert_eq!(report.rows, 0);
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn test_schema_requirements() {
        let df = df!("Price" => ["1"]).unwrap();
        let schema = TableSchema::of(&df);

        assert!(schema.has(PRICE));
        assert_eq!(schema.missing_for(&RepairStep::Price), None);
        assert_eq!(schema.missing_for(&RepairStep::Quantity), Some(QUANTITY_ORDERED));
        assert_eq!(schema.missing_for(&RepairStep::CustomerGeo), None);
    }
}
