pub mod order_generator;

pub use order_generator::*;
