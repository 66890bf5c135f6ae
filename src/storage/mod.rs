pub mod blob_paths;
pub mod csv_table;
pub mod error;
pub mod in_memory;
pub mod object_store;
pub mod s3_store;

pub use blob_paths::*;
pub use csv_table::*;
pub use error::*;
pub use in_memory::*;
pub use object_store::*;
pub use s3_store::*;
