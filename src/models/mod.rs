pub mod order_models;
pub mod reference_catalog;

pub use order_models::*;
pub use reference_catalog::*;
