use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

pub const ORDER_ID: &str = "Order_Id";
pub const CUSTOMER_ID: &str = "Customer_Id";
pub const CUSTOMER_NAME: &str = "Customer_Name";
pub const PRODUCT_ID: &str = "Product_Id";
pub const PRODUCT_CATEGORY: &str = "Product_Category";
pub const PRODUCT_NAME: &str = "Product_Name";
pub const QUANTITY_ORDERED: &str = "Quantity_ordered";
pub const PRICE: &str = "Price";
pub const ORDER_PLACED_AT: &str = "Date_and_Time_When_Order_Was_Placed";
pub const CUSTOMER_COUNTRY: &str = "Customer_Country";
pub const CUSTOMER_CITY: &str = "Customer_City";
pub const ORDER_SITE: &str = "Site_From_Where_Order_Was_Placed";
pub const PAYMENT_TYPE: &str = "Payment_Type";
pub const TRANSACTION_ID: &str = "Payment_Transaction_Confirmation_Id";
pub const PAYMENT_STATUS: &str = "Payment_Success_or_Failure";
pub const PAYMENT_FAILURE_REASON: &str = "Payment_Failure_Reason";

/// Column order used for every CSV the pipeline writes.
pub const CANONICAL_COLUMNS: [&str; 16] = [
    ORDER_ID,
    CUSTOMER_ID,
    CUSTOMER_NAME,
    PRODUCT_ID,
    PRODUCT_CATEGORY,
    PRODUCT_NAME,
    QUANTITY_ORDERED,
    PRICE,
    ORDER_PLACED_AT,
    CUSTOMER_COUNTRY,
    CUSTOMER_CITY,
    ORDER_SITE,
    PAYMENT_TYPE,
    TRANSACTION_ID,
    PAYMENT_STATUS,
    PAYMENT_FAILURE_REASON,
];

/// Identifier columns that may carry a sentinel instead of a UUID.
pub const IDENTIFIER_COLUMNS: [&str; 4] = [PRODUCT_ID, ORDER_ID, CUSTOMER_ID, TRANSACTION_ID];

pub const INVALID_UUID: &str = "InvalidUUID";
pub const INVALID_PRODUCT_ID: &str = "InvalidProductId";
pub const INVALID_CUSTOMER_ID: &str = "InvalidCustomerId";

/// Markers that stand in for a missing or corrupt identifier.
pub const ID_SENTINELS: [&str; 3] = [INVALID_UUID, INVALID_PRODUCT_ID, INVALID_CUSTOMER_ID];

pub const INVALID_CATEGORY: &str = "InvalidCategory";
pub const INVALID_PRODUCT_NAME: &str = "InvalidProductName";
pub const INVALID_CITY: &str = "InvalidCity";
pub const INVALID_PRICE: &str = "InvalidPrice";

pub const PAYMENT_SUCCESSFUL: &str = "Payment Successful";

/// One order row as the generator emits it.
///
/// Quantity and price are kept as text because generated batches may carry
/// deliberately corrupt values in those cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub product_id: String,
    pub product_category: String,
    pub product_name: String,
    pub quantity_ordered: String,
    pub price: String,
    pub placed_at: String,
    pub customer_country: String,
    pub customer_city: String,
    pub site: String,
    pub payment_type: String,
    pub transaction_id: String,
    pub payment_status: String,
    pub payment_failure_reason: Option<String>,
}

impl OrderRecord {
    /// Cell value for a canonical column name.
    pub fn field(&self, column: &str) -> Option<&str> {
        let value = match column {
            ORDER_ID => &self.order_id,
            CUSTOMER_ID => &self.customer_id,
            CUSTOMER_NAME => &self.customer_name,
            PRODUCT_ID => &self.product_id,
            PRODUCT_CATEGORY => &self.product_category,
            PRODUCT_NAME => &self.product_name,
            QUANTITY_ORDERED => &self.quantity_ordered,
            PRICE => &self.price,
            ORDER_PLACED_AT => &self.placed_at,
            CUSTOMER_COUNTRY => &self.customer_country,
            CUSTOMER_CITY => &self.customer_city,
            ORDER_SITE => &self.site,
            PAYMENT_TYPE => &self.payment_type,
            TRANSACTION_ID => &self.transaction_id,
            PAYMENT_STATUS => &self.payment_status,
            PAYMENT_FAILURE_REASON => return self.payment_failure_reason.as_deref(),
            _ => return None,
        };
        Some(value.as_str())
    }
}

pub fn is_id_sentinel(value: &str) -> bool {
    ID_SENTINELS.contains(&value)
}

/// Version 4 UUID drawn from `rng`, so seeded runs produce the same IDs.
pub fn random_identifier<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}

pub fn is_identifier(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}
