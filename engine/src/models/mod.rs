// Engine-internal models. Boundary types live in the `shared` crate.
pub mod dataset;

pub use dataset::{ColumnValues, NormalizedColumn, NormalizedDataset};
