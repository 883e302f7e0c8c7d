// Chart materializer: validates a chart plan against the dataset and builds its rows.
use crate::data::value_parser::coerce_numeric;
use crate::error::{EngineError, Result};
use crate::models::{ColumnValues, NormalizedColumn, NormalizedDataset};
use crate::timeseries::{monthly_aggregate, resolve_date_column, AggMode};
use serde_json::{Map, Value};
use shared::models::{ChartPlan, ChartSpec};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub agg_mode: AggMode,
    pub drop_all_zero: bool,
    /// Used when a bar plan has no `topN` (or `topN` is 0).
    pub default_top_n: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions { agg_mode: AggMode::GroupBy, drop_all_zero: true, default_top_n: 5 }
    }
}

/// Builds the renderable chart for `plan`.
///
/// `Ok(None)` means the chart was skipped: a time-series plan with no `xKey` on a dataset
/// without a date axis, or without any series present in the dataset. Every other
/// mismatch between plan and dataset is an error naming the chart title.
pub fn materialize_chart(
    plan: &ChartPlan,
    dataset: &NormalizedDataset,
    options: &ChartOptions,
) -> Result<Option<ChartSpec>> {
    let chart_type = plan.chart_type.trim().to_lowercase();
    match chart_type.as_str() {
        "line" | "area" => time_series(plan, chart_type, dataset, options),
        "bar" | "stacked_bar" => top_n_bars(plan, dataset, options).map(Some),
        "pie" | "donut" => composition(plan, chart_type, dataset).map(Some),
        other => Err(EngineError::chart(&plan.title, format!("unsupported chart type '{}'", other))),
    }
}

fn time_series(
    plan: &ChartPlan,
    chart_type: String,
    dataset: &NormalizedDataset,
    options: &ChartOptions,
) -> Result<Option<ChartSpec>> {
    let Some(x) = plan.x_key.as_deref().or_else(|| resolve_date_column(dataset)) else {
        tracing::warn!(chart = %plan.title, "No date axis, chart skipped");
        return Ok(None);
    };
    if !dataset.is_date_column(x) {
        return Err(EngineError::chart(
            &plan.title,
            format!("requires a valid date column, '{}' is not one", x),
        ));
    }

    let series: Vec<_> = plan
        .series
        .iter()
        .flatten()
        .filter(|s| dataset.contains(&s.key))
        .cloned()
        .collect();
    if series.is_empty() {
        tracing::warn!(chart = %plan.title, "No plotted series exists in the dataset, chart skipped");
        return Ok(None);
    }

    let keys: Vec<&str> = series.iter().map(|s| s.key.as_str()).collect();
    let monthly = monthly_aggregate(dataset, x, &keys, options.agg_mode, options.drop_all_zero)?;
    tracing::debug!(chart = %plan.title, x_key = x, months = monthly.rows.len(), "Time series materialized");

    Ok(Some(ChartSpec {
        chart_type,
        title: plan.title.clone(),
        data: monthly.to_json_rows(),
        x_key: Some("month".to_string()),
        y_key: None,
        series: Some(series),
        category_key: None,
        value_key: None,
    }))
}

fn top_n_bars(plan: &ChartPlan, dataset: &NormalizedDataset, options: &ChartOptions) -> Result<ChartSpec> {
    let (x, y) = required_pair(plan, plan.x_key.as_deref(), plan.y_key.as_deref(), "xKey", "yKey")?;
    let (x, y) = (column(plan, dataset, x)?, measure(plan, dataset, y)?);

    let mut groups = sum_by_label(x, y);
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top_n = plan.top_n.filter(|n| *n > 0).unwrap_or(options.default_top_n);
    groups.truncate(top_n);
    tracing::debug!(chart = %plan.title, groups = groups.len(), top_n, "Bar chart materialized");

    Ok(ChartSpec {
        chart_type: "bar".to_string(),
        title: plan.title.clone(),
        data: rows(&groups, &x.name, &y.name),
        x_key: Some(x.name.clone()),
        y_key: Some(y.name.clone()),
        series: None,
        category_key: None,
        value_key: None,
    })
}

fn composition(plan: &ChartPlan, chart_type: String, dataset: &NormalizedDataset) -> Result<ChartSpec> {
    let (category, value) = required_pair(
        plan,
        plan.category_key.as_deref(),
        plan.value_key.as_deref(),
        "categoryKey",
        "valueKey",
    )?;
    let groups = sum_by_label(column(plan, dataset, category)?, measure(plan, dataset, value)?);

    Ok(ChartSpec {
        chart_type,
        title: plan.title.clone(),
        data: rows(&groups, "name", "value"),
        x_key: None,
        y_key: None,
        series: None,
        category_key: Some("name".to_string()),
        value_key: Some("value".to_string()),
    })
}

fn required_pair<'a>(
    plan: &ChartPlan,
    first: Option<&'a str>,
    second: Option<&'a str>,
    first_field: &str,
    second_field: &str,
) -> Result<(&'a str, &'a str)> {
    match (first, second) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EngineError::chart(
            &plan.title,
            format!("{} and {} are both required", first_field, second_field),
        )),
    }
}

fn column<'d>(plan: &ChartPlan, dataset: &'d NormalizedDataset, name: &str) -> Result<&'d NormalizedColumn> {
    dataset
        .column(name)
        .ok_or_else(|| EngineError::chart(&plan.title, format!("column '{}' not found", name)))
}

/// Value column of a bar or composition chart. Dates, and text where no cell reads as a
/// number, are rejected instead of being summed as zeros.
fn measure<'d>(plan: &ChartPlan, dataset: &'d NormalizedDataset, name: &str) -> Result<&'d NormalizedColumn> {
    let col = column(plan, dataset, name)?;
    let numeric = match &col.values {
        ColumnValues::Number(_) => true,
        ColumnValues::Date(_) => false,
        ColumnValues::Text(cells) => cells.iter().any(|c| coerce_numeric(c).is_some()),
    };
    if !numeric {
        return Err(EngineError::chart(&plan.title, format!("column '{}' is not numeric", name)));
    }
    Ok(col)
}

/// Sums `values` per distinct label of `category`. Groups come out in category order:
/// numeric categories by value, everything else by label. Rows with a missing category
/// are dropped; missing values add nothing.
fn sum_by_label(category: &NormalizedColumn, values: &NormalizedColumn) -> Vec<(String, f64)> {
    let numbers = values.numeric_values();
    let keys = match &category.values {
        ColumnValues::Number(v) => v.clone(),
        _ => vec![None; numbers.len()],
    };
    let mut sums: HashMap<String, (Option<f64>, f64)> = HashMap::new();
    for (row, value) in numbers.iter().enumerate() {
        if let Some(label) = category.label(row) {
            let key = keys.get(row).copied().flatten();
            sums.entry(label).or_insert((key, 0.0)).1 += value.unwrap_or(0.0);
        }
    }

    let mut groups: Vec<(String, Option<f64>, f64)> =
        sums.into_iter().map(|(label, (key, sum))| (label, key, sum)).collect();
    groups.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.0.cmp(&b.0),
    });
    groups.into_iter().map(|(label, _, sum)| (label, sum)).collect()
}

fn rows(groups: &[(String, f64)], label_key: &str, value_key: &str) -> Vec<Map<String, Value>> {
    groups
        .iter()
        .map(|(label, value)| {
            let mut row = Map::new();
            row.insert(label_key.to_string(), Value::from(label.clone()));
            row.insert(value_key.to_string(), Value::from(*value));
            row
        })
        .collect()
}
