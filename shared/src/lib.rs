//! Data-transfer models shared between the engine and its callers.

pub mod models;
pub mod utils;
