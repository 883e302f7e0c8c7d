// AutoDash engine: turns an uploaded table plus an untrusted classifier plan into a
// dashboard document.
//
// Flow: data (load, parse) -> normalize -> kpi / charts (over timeseries) -> dashboard,
// orchestrated by services::DashboardService.

pub mod charts;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod kpi;
pub mod models;
pub mod normalize;
pub mod profile;
pub mod services;
pub mod timeseries;

pub use error::{EngineError, ExprError, Result};
