// Typed, column-oriented dataset produced by the normalizer.
use crate::data::value_parser::coerce_numeric;
use chrono::{NaiveDateTime, Timelike};
use shared::models::{CellValue, Dtype};

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Number(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDateTime>>),
    /// Cells passed through untouched.
    Text(Vec<CellValue>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Number(v) => v.len(),
            ColumnValues::Date(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnValues::Number(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Date(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Text(v) => v.iter().filter(|x| x.is_null()).count(),
        }
    }

    /// Storage-level dtype: what the values actually are, regardless of classification.
    pub fn inferred_dtype(&self) -> Dtype {
        match self {
            ColumnValues::Number(_) => Dtype::Number,
            ColumnValues::Date(_) => Dtype::Date,
            ColumnValues::Text(_) => Dtype::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumn {
    pub name: String,
    /// Classification dtype, or the inferred one for unclassified columns. Never `Unknown`.
    pub dtype: Dtype,
    pub values: ColumnValues,
}

impl NormalizedColumn {
    pub fn is_date(&self) -> bool {
        matches!(self.values, ColumnValues::Date(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.values, ColumnValues::Number(_))
    }

    /// Numeric view of the column; text is coerced leniently, dates are missing.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        match &self.values {
            ColumnValues::Number(v) => v.clone(),
            ColumnValues::Date(v) => vec![None; v.len()],
            ColumnValues::Text(v) => v.iter().map(coerce_numeric).collect(),
        }
    }

    /// Display label of a cell, used as a category key. `None` for missing cells.
    pub fn label(&self, row: usize) -> Option<String> {
        match &self.values {
            ColumnValues::Number(v) => v.get(row).copied().flatten().map(|n| n.to_string()),
            ColumnValues::Date(v) => v.get(row).copied().flatten().map(format_timestamp),
            ColumnValues::Text(v) => v.get(row).and_then(CellValue::as_text),
        }
    }
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Immutable snapshot every KPI and chart of a request reads from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedDataset {
    pub columns: Vec<NormalizedColumn>,
    pub row_count: usize,
}

impl NormalizedDataset {
    pub fn column(&self, name: &str) -> Option<&NormalizedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_date_column(&self, name: &str) -> bool {
        self.column(name).is_some_and(NormalizedColumn::is_date)
    }

    pub fn dates(&self, name: &str) -> Option<&[Option<NaiveDateTime>]> {
        match &self.column(name)?.values {
            ColumnValues::Date(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_numeric_view_of_text_column() {
        let col = NormalizedColumn {
            name: "qtd".into(),
            dtype: Dtype::String,
            values: ColumnValues::Text(vec!["10".into(), CellValue::Null, "abc".into(), 2.5.into()]),
        };
        assert_eq!(col.numeric_values(), vec![Some(10.0), None, None, Some(2.5)]);
        assert_eq!(col.values.missing_count(), 1);
    }

    #[test]
    fn test_labels() {
        let dates = NormalizedColumn {
            name: "data".into(),
            dtype: Dtype::Date,
            values: ColumnValues::Date(vec![Some(ts(2024, 1, 5)), None]),
        };
        assert_eq!(dates.label(0).as_deref(), Some("2024-01-05"));
        assert_eq!(dates.label(1), None);

        let numbers = NormalizedColumn {
            name: "loja".into(),
            dtype: Dtype::Number,
            values: ColumnValues::Number(vec![Some(3.0), Some(2.5)]),
        };
        assert_eq!(numbers.label(0).as_deref(), Some("3"));
        assert_eq!(numbers.label(1).as_deref(), Some("2.5"));
    }
}
