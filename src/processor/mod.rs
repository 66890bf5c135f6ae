pub mod header_normalizer;
pub mod record_repairer;
pub mod repair_file;

pub use header_normalizer::*;
pub use record_repairer::*;
pub use repair_file::*;
