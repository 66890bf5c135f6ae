use rand::Rng;
use rand::seq::SliceRandom;

/// Category name to the products sold under it.
pub static PRODUCT_CATALOG: [(&str, [&str; 5]); 5] = [
    (
        "Electronics",
        ["Smartphones", "Laptops", "Headphones", "Chargers", "Batteries"],
    ),
    ("Clothing", ["T-Shirts", "Jeans", "Jackets", "Socks", "Sweaters"]),
    (
        "Home & Kitchen",
        ["Toothpaste", "Shampoo", "Soap", "Lotion", "Detergent"],
    ),
    (
        "Books",
        ["Fiction", "Non-Fiction", "Comics", "Textbooks", "Magazines"],
    ),
    (
        "Sports",
        ["Football", "Tennis Racket", "Cricket Bat", "Basketball", "Gym Gloves"],
    ),
];

/// Country name to the cities customers can live in.
pub static COUNTRY_CITIES: [(&str, [&str; 5]); 5] = [
    (
        "USA",
        ["New York", "Los Angeles", "Chicago", "Houston", "Phoenix"],
    ),
    ("UK", ["London", "Manchester", "Birmingham", "Leeds", "Glasgow"]),
    (
        "Germany",
        ["Berlin", "Munich", "Frankfurt", "Hamburg", "Cologne"],
    ),
    ("India", ["Mumbai", "Delhi", "Bangalore", "Chennai", "Kolkata"]),
    (
        "Canada",
        ["Toronto", "Vancouver", "Montreal", "Calgary", "Ottawa"],
    ),
];

pub static PAYMENT_TYPES: [&str; 4] = ["Card", "Internet Banking", "UPI", "Wallet"];

pub static SITES: [&str; 5] = ["Amazon", "eBay", "Flipkart", "Walmart", "Shopify"];

pub static PAYMENT_STATUSES: [&str; 2] = ["Y", "N"];

pub static FAILURE_REASONS: [&str; 3] = [
    "Insufficient funds",
    "Payment gateway error",
    "Card expired",
];

static FIRST_NAMES: [&str; 12] = [
    "James", "Maria", "Arjun", "Sophie", "Liam", "Priya", "Lukas", "Emma", "Noah", "Aisha",
    "Oliver", "Mei",
];

static LAST_NAMES: [&str; 12] = [
    "Smith", "Garcia", "Sharma", "Müller", "Brown", "Patel", "Schmidt", "Wilson", "Taylor",
    "Khan", "Martin", "Chen",
];

/// Read-only lookup tables used by both the generator and the repairer.
///
/// Every accessor hands out `'static` data; there is no mutable state, so a
/// single unit value is shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceCatalog;

impl ReferenceCatalog {
    pub fn categories(&self) -> impl Iterator<Item = &'static str> {
        PRODUCT_CATALOG.iter().map(|(category, _)| *category)
    }

    pub fn products(&self, category: &str) -> Option<&'static [&'static str]> {
        PRODUCT_CATALOG
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, products)| products.as_slice())
    }

    pub fn countries(&self) -> impl Iterator<Item = &'static str> {
        COUNTRY_CITIES.iter().map(|(country, _)| *country)
    }

    pub fn cities(&self, country: &str) -> Option<&'static [&'static str]> {
        COUNTRY_CITIES
            .iter()
            .find(|(name, _)| *name == country)
            .map(|(_, cities)| cities.as_slice())
    }

    pub fn payment_types(&self) -> &'static [&'static str] {
        &PAYMENT_TYPES
    }

    pub fn sites(&self) -> &'static [&'static str] {
        &SITES
    }

    pub fn failure_reasons(&self) -> &'static [&'static str] {
        &FAILURE_REASONS
    }

    pub fn contains_product(&self, category: &str, product: &str) -> bool {
        self.products(category)
            .is_some_and(|products| products.contains(&product))
    }

    pub fn contains_city(&self, country: &str, city: &str) -> bool {
        self.cities(country).is_some_and(|cities| cities.contains(&city))
    }

    /// Owning category of a known product name.
    pub fn lookup_category(&self, product: &str) -> Option<&'static str> {
        PRODUCT_CATALOG
            .iter()
            .find(|(_, products)| products.contains(&product))
            .map(|(category, _)| *category)
    }

    /// Category of `product`, or a uniformly random category when the name is
    /// not in the catalog. Unknown names are reassigned, never rejected.
    pub fn category_of<R: Rng + ?Sized>(&self, product: &str, rng: &mut R) -> &'static str {
        self.lookup_category(product)
            .unwrap_or_else(|| self.random_category(rng))
    }

    pub fn random_category<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        PRODUCT_CATALOG[rng.gen_range(0..PRODUCT_CATALOG.len())].0
    }

    /// Uniform pick from the category's product list. Unknown categories fall
    /// back to a random category first so the pair stays consistent.
    pub fn random_product<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> &'static str {
        let products = match self.products(category) {
            Some(products) => products,
            None => {
                let fallback = self.random_category(rng);
                self.products(fallback).unwrap_or(PRODUCT_CATALOG[0].1.as_slice())
            }
        };
        pick(products, rng)
    }

    pub fn random_category_and_product<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> (&'static str, &'static str) {
        let (category, products) = &PRODUCT_CATALOG[rng.gen_range(0..PRODUCT_CATALOG.len())];
        (*category, pick(products, rng))
    }

    pub fn random_location<R: Rng + ?Sized>(&self, rng: &mut R) -> (&'static str, &'static str) {
        let (country, cities) = &COUNTRY_CITIES[rng.gen_range(0..COUNTRY_CITIES.len())];
        (*country, pick(cities, rng))
    }

    pub fn random_payment_type<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        pick(&PAYMENT_TYPES, rng)
    }

    pub fn random_site<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        pick(&SITES, rng)
    }

    pub fn random_payment_status<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        pick(&PAYMENT_STATUSES, rng)
    }

    pub fn random_failure_reason<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        pick(&FAILURE_REASONS, rng)
    }

    pub fn random_customer_name<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        format!("{} {}", pick(&FIRST_NAMES, rng), pick(&LAST_NAMES, rng))
    }
}

fn pick<R: Rng + ?Sized>(values: &[&'static str], rng: &mut R) -> &'static str {
    // Every table above is non-empty.
    values.choose(rng).copied().unwrap_or_default()
}
