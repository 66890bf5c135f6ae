use anyhow::Result;
use order_repair::generator::OrderGenerator;
use order_repair::models::{
    CUSTOMER_CITY, CUSTOMER_COUNTRY, PAYMENT_FAILURE_REASON, PRICE, PRODUCT_CATEGORY,
    PRODUCT_NAME, QUANTITY_ORDERED, ReferenceCatalog,
};
use order_repair::processor::RecordRepairer;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() -> Result<()> {
    println!("=== INSPECTING ORDER REPAIR ===\n");

    let mut rng = StdRng::seed_from_u64(2024);
    let generator = OrderGenerator::new().with_faults(true);
    let records = generator.generate(10, &mut rng);
    let mut df = generator.records_to_dataframe(&records)?;

    let focus = [
        PRODUCT_CATEGORY,
        PRODUCT_NAME,
        QUANTITY_ORDERED,
        PRICE,
        CUSTOMER_COUNTRY,
        CUSTOMER_CITY,
        PAYMENT_FAILURE_REASON,
    ];

    println!("1. Generated batch (one injected fault per row):");
    println!("{}", df.select(focus)?);

    let report = RecordRepairer::new().repair(&mut df, &mut rng)?;

    println!("\n2. After repair:");
    println!("{}", df.select(focus)?);

    println!("\n=== REPAIR REPORT ===");
    println!("{}", serde_json::to_string_pretty(&report)?);

    let catalog = ReferenceCatalog;
    let categories = df.column(PRODUCT_CATEGORY)?.str()?.clone();
    let products = df.column(PRODUCT_NAME)?.str()?.clone();
    let countries = df.column(CUSTOMER_COUNTRY)?.str()?.clone();
    let cities = df.column(CUSTOMER_CITY)?.str()?.clone();

    let mut consistent = 0;
    for i in 0..df.height() {
        let product_ok = match (categories.get(i), products.get(i)) {
            (Some(category), Some(product)) => catalog.contains_product(category, product),
            _ => false,
        };
        let city_ok = match (countries.get(i), cities.get(i)) {
            (Some(country), Some(city)) => catalog.contains_city(country, city),
            _ => false,
        };
        if product_ok && city_ok {
            consistent += 1;
        }
    }

    println!("\n✅ {}/{} rows satisfy the catalog relationships", consistent, df.height());
    Ok(())
}
