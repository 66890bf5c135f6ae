use anyhow::{Result, anyhow};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use polars::prelude::*;
use rand::Rng;
use tracing::info;

use crate::config::GeneratorConfig;
use crate::models::{
    CANONICAL_COLUMNS, INVALID_CATEGORY, INVALID_CITY, INVALID_CUSTOMER_ID, INVALID_PRICE,
    INVALID_PRODUCT_ID, INVALID_PRODUCT_NAME, INVALID_UUID, OrderRecord, PAYMENT_SUCCESSFUL,
    ReferenceCatalog, random_identifier,
};
use crate::processor::{random_price, random_quantity};

/// Which field a generated row corrupts, chosen by `index % 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    OrderId,
    CustomerId,
    ProductId,
    Category,
    Quantity,
    Price,
    City,
    TransactionId,
    ProductName,
    MissingFailureReason,
}

impl InjectedFault {
    pub fn for_index(index: usize) -> Self {
        match index % 10 {
            0 => InjectedFault::OrderId,
            1 => InjectedFault::CustomerId,
            2 => InjectedFault::ProductId,
            3 => InjectedFault::Category,
            4 => InjectedFault::Quantity,
            5 => InjectedFault::Price,
            6 => InjectedFault::City,
            7 => InjectedFault::TransactionId,
            8 => InjectedFault::ProductName,
            _ => InjectedFault::MissingFailureReason,
        }
    }

    pub fn apply(&self, record: &mut OrderRecord) {
        match self {
            InjectedFault::OrderId => record.order_id = INVALID_UUID.to_string(),
            InjectedFault::CustomerId => record.customer_id = INVALID_CUSTOMER_ID.to_string(),
            InjectedFault::ProductId => record.product_id = INVALID_PRODUCT_ID.to_string(),
            InjectedFault::Category => record.product_category = INVALID_CATEGORY.to_string(),
            InjectedFault::Quantity => record.quantity_ordered = "-1".to_string(),
            InjectedFault::Price => record.price = INVALID_PRICE.to_string(),
            InjectedFault::City => record.customer_city = INVALID_CITY.to_string(),
            InjectedFault::TransactionId => record.transaction_id = INVALID_UUID.to_string(),
            InjectedFault::ProductName => record.product_name = INVALID_PRODUCT_NAME.to_string(),
            InjectedFault::MissingFailureReason => record.payment_failure_reason = None,
        }
    }
}

/// Produces synthetic order rows from the reference catalog.
pub struct OrderGenerator {
    catalog: ReferenceCatalog,
    inject_faults: bool,
}

impl OrderGenerator {
    pub fn new() -> Self {
        OrderGenerator {
            catalog: ReferenceCatalog,
            inject_faults: false,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new().with_faults(config.inject_faults)
    }

    pub fn with_faults(mut self, inject_faults: bool) -> Self {
        self.inject_faults = inject_faults;
        self
    }

    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<OrderRecord> {
        let records: Vec<OrderRecord> = (0..count)
            .map(|index| self.generate_record(index, rng))
            .collect();

        info!(
            "Generated {} order records ({})",
            records.len(),
            if self.inject_faults {
                "with injected faults"
            } else {
                "clean"
            }
        );

        records
    }

    pub fn generate_record<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> OrderRecord {
        let mut record = self.clean_record(rng);
        if self.inject_faults {
            InjectedFault::for_index(index).apply(&mut record);
        }
        record
    }

    fn clean_record<R: Rng + ?Sized>(&self, rng: &mut R) -> OrderRecord {
        let (country, city) = self.catalog.random_location(rng);
        let (category, product) = self.catalog.random_category_and_product(rng);
        let payment_status = self.catalog.random_payment_status(rng);
        let failure_reason = if payment_status == "N" {
            self.catalog.random_failure_reason(rng)
        } else {
            PAYMENT_SUCCESSFUL
        };

        OrderRecord {
            order_id: random_identifier(rng),
            customer_id: random_identifier(rng),
            customer_name: self.catalog.random_customer_name(rng),
            product_id: random_identifier(rng),
            product_category: category.to_string(),
            product_name: product.to_string(),
            quantity_ordered: random_quantity(rng).to_string(),
            price: format!("{:.2}", random_price(rng)),
            placed_at: random_timestamp_this_decade(rng),
            customer_country: country.to_string(),
            customer_city: city.to_string(),
            site: self.catalog.random_site(rng).to_string(),
            payment_type: self.catalog.random_payment_type(rng).to_string(),
            transaction_id: random_identifier(rng),
            payment_status: payment_status.to_string(),
            payment_failure_reason: Some(failure_reason.to_string()),
        }
    }

    /// One text column per canonical field, in canonical order.
    pub fn records_to_dataframe(&self, records: &[OrderRecord]) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(CANONICAL_COLUMNS.len());

        for field in CANONICAL_COLUMNS.iter() {
            let values: Vec<Option<String>> = records
                .iter()
                .map(|record| record.field(field).map(|v| v.to_string()))
                .collect();

            let series = Series::new((*field).into(), values);
            columns.push(series.into());
        }

        DataFrame::new(columns).map_err(|e| anyhow!("Failed to create DataFrame: {}", e))
    }
}

impl Default for OrderGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp between the start of the current decade and now.
fn random_timestamp_this_decade<R: Rng + ?Sized>(rng: &mut R) -> String {
    let now = Utc::now().naive_utc();
    let decade_year = now.year() - now.year().rem_euclid(10);
    let start = NaiveDate::from_ymd_opt(decade_year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(now);

    let span = (now - start).num_seconds().max(0);
    let offset = rng.gen_range(0..=span);

    (start + Duration::seconds(offset))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
