// Compact statistical profile of a normalized dataset, sent to the classifier's plan step.
use crate::models::dataset::format_timestamp;
use crate::models::{ColumnValues, NormalizedColumn, NormalizedDataset};
use serde::{Deserialize, Serialize};
use shared::models::ColumnClassification;
use std::collections::{BTreeMap, HashMap};

const TOP_VALUES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnStats {
    Date {
        min: Option<String>,
        max: Option<String>,
        count: usize,
    },
    Number {
        count: usize,
        sum: f64,
        mean: f64,
    },
    Text {
        top_values: Vec<String>,
        top_counts: Vec<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCoverage {
    pub date_col: String,
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    /// Storage dtype of every column: `date`, `number` or `string`.
    pub columns: Vec<ColumnClassification>,
    pub stats: BTreeMap<String, ColumnStats>,
    pub time_coverage: Option<TimeCoverage>,
}

pub fn profile_dataset(dataset: &NormalizedDataset) -> DataProfile {
    let columns = dataset
        .columns
        .iter()
        .map(|c| ColumnClassification::new(c.name.clone(), c.values.inferred_dtype()))
        .collect();
    let stats = dataset
        .columns
        .iter()
        .map(|c| (c.name.clone(), column_stats(c)))
        .collect();
    let time_coverage = dataset.columns.iter().find(|c| c.is_date()).map(|c| {
        let (min, max) = date_bounds(c);
        TimeCoverage { date_col: c.name.clone(), min, max }
    });
    DataProfile { columns, stats, time_coverage }
}

fn column_stats(column: &NormalizedColumn) -> ColumnStats {
    match &column.values {
        ColumnValues::Date(dates) => {
            let (min, max) = date_bounds(column);
            ColumnStats::Date { min, max, count: dates.iter().flatten().count() }
        }
        ColumnValues::Number(numbers) => {
            let present: Vec<f64> = numbers.iter().flatten().copied().collect();
            let sum: f64 = present.iter().sum();
            let mean = if present.is_empty() { 0.0 } else { sum / present.len() as f64 };
            ColumnStats::Number { count: present.len(), sum, mean }
        }
        ColumnValues::Text(cells) => {
            // Counted in first-appearance order so the stable sort breaks ties by it.
            let mut counts: Vec<(String, usize)> = Vec::new();
            let mut index: HashMap<String, usize> = HashMap::new();
            for text in cells.iter().filter_map(|c| c.as_text()) {
                match index.get(&text) {
                    Some(&pos) => counts[pos].1 += 1,
                    None => {
                        index.insert(text.clone(), counts.len());
                        counts.push((text, 1));
                    }
                }
            }
            counts.sort_by(|a, b| b.1.cmp(&a.1));
            counts.truncate(TOP_VALUES);
            let (top_values, top_counts) = counts.into_iter().unzip();
            ColumnStats::Text { top_values, top_counts }
        }
    }
}

fn date_bounds(column: &NormalizedColumn) -> (Option<String>, Option<String>) {
    match &column.values {
        ColumnValues::Date(dates) => {
            let min = dates.iter().flatten().min().copied().map(format_timestamp);
            let max = dates.iter().flatten().max().copied().map(format_timestamp);
            (min, max)
        }
        _ => (None, None),
    }
}
