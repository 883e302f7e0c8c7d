// Monthly aggregation over a resolved date axis.
use crate::error::{EngineError, Result};
use crate::models::NormalizedDataset;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggMode {
    /// Only months that occur in the data.
    #[default]
    #[serde(rename = "groupby")]
    GroupBy,
    /// Continuous month grid between the first and last month.
    #[serde(rename = "resample")]
    Resample,
}

impl AggMode {
    /// Lenient parse for request/env input; anything unrecognised is `GroupBy`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "resample" => AggMode::Resample,
            _ => AggMode::GroupBy,
        }
    }
}

impl fmt::Display for AggMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggMode::GroupBy => f.write_str("groupby"),
            AggMode::Resample => f.write_str("resample"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(ts: &NaiveDateTime) -> Self {
        YearMonth { year: ts.year(), month: ts.month() }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            YearMonth { year: self.year + 1, month: 1 }
        } else {
            YearMonth { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One month of sums, aligned with `MonthlySeries::columns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlySeries {
    pub columns: Vec<String>,
    pub rows: Vec<MonthlyAggregate>,
}

impl MonthlySeries {
    pub fn months(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.month.as_str()).collect()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let pos = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r.values[pos])
    }

    /// `{"month": "YYYY-MM", <column>: <sum>, ...}` rows for chart data.
    pub fn to_json_rows(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                obj.insert("month".to_string(), Value::from(row.month.clone()));
                for (column, value) in self.columns.iter().zip(&row.values) {
                    obj.insert(column.clone(), Value::from(*value));
                }
                obj
            })
            .collect()
    }
}

/// Sums `value_columns` per calendar month of `date_column`.
///
/// Rows without a date are ignored and missing values count as zero. Value columns are
/// coerced to numbers. With `drop_all_zero`, months whose sums are all zero are removed
/// after filling, in both modes. The date column must already be date-typed: resolve it
/// with [`resolve_date_column`](super::resolve_date_column) first.
pub fn monthly_aggregate<S: AsRef<str>>(
    dataset: &NormalizedDataset,
    date_column: &str,
    value_columns: &[S],
    mode: AggMode,
    drop_all_zero: bool,
) -> Result<MonthlySeries> {
    let dates = dataset.dates(date_column).ok_or_else(|| {
        EngineError::AggregationError(format!("column '{}' is not a date column", date_column))
    })?;
    if value_columns.is_empty() {
        return Ok(MonthlySeries::default());
    }

    let series = value_columns
        .iter()
        .map(|name| {
            dataset
                .column(name.as_ref())
                .map(|c| c.numeric_values())
                .ok_or_else(|| EngineError::AggregationError(format!("column '{}' not found", name.as_ref())))
        })
        .collect::<Result<Vec<_>>>()?;

    let rows: Vec<MonthlyAggregate> = sum_by_month(dates, &series, mode, drop_all_zero)
        .into_iter()
        .map(|(month, values)| MonthlyAggregate { month: month.to_string(), values })
        .collect();

    tracing::debug!(
        date_column,
        %mode,
        drop_all_zero,
        months = rows.len(),
        "Monthly aggregate computed"
    );
    Ok(MonthlySeries {
        columns: value_columns.iter().map(|c| c.as_ref().to_string()).collect(),
        rows,
    })
}

/// Core of the aggregation over pre-extracted columns; `series[i][row]` is the value of
/// column `i` in `row`. Result is sorted by month.
pub(crate) fn sum_by_month(
    dates: &[Option<NaiveDateTime>],
    series: &[Vec<Option<f64>>],
    mode: AggMode,
    drop_all_zero: bool,
) -> Vec<(YearMonth, Vec<f64>)> {
    let mut sums: BTreeMap<YearMonth, Vec<f64>> = BTreeMap::new();
    for (row, date) in dates.iter().enumerate() {
        let Some(date) = date else { continue };
        let acc = sums
            .entry(YearMonth::of(date))
            .or_insert_with(|| vec![0.0; series.len()]);
        for (slot, values) in acc.iter_mut().zip(series) {
            *slot += values.get(row).copied().flatten().unwrap_or(0.0);
        }
    }

    if mode == AggMode::Resample {
        let bounds = sums.keys().next().copied().zip(sums.keys().next_back().copied());
        if let Some((first, last)) = bounds {
            let mut month = first;
            while month < last {
                month = month.next();
                sums.entry(month).or_insert_with(|| vec![0.0; series.len()]);
            }
        }
    }

    sums.into_iter()
        .filter(|(_, values)| !drop_all_zero || values.iter().any(|v| *v != 0.0))
        .collect()
}
