pub mod csv_loader;
pub mod store;
pub mod value_parser;

pub use csv_loader::{load_raw_dataset, read_raw_dataset};
pub use store::{DatasetStore, KeyedStore, NormalizedEntry};
