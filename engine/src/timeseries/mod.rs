// Month-grained time series: date axis resolution and aggregation.
pub mod aggregate;
pub mod date_column;

pub use aggregate::{monthly_aggregate, AggMode, MonthlyAggregate, MonthlySeries, YearMonth};
pub use date_column::resolve_date_column;
