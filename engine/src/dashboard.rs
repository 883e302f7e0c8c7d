// Assembles the dashboard document from a normalized dataset and an untrusted plan.
use crate::charts::{materialize_chart, ChartOptions};
use crate::config::{EngineSettings, FailurePolicy};
use crate::error::{EngineError, Result};
use crate::kpi::evaluate_kpi;
use crate::models::NormalizedDataset;
use crate::timeseries::{monthly_aggregate, resolve_date_column, AggMode};
use serde::{Deserialize, Serialize};
use shared::models::{ChartPlan, DashboardDoc, DashboardFilters, DashboardPlan, Insight};

/// Per-request overrides of the aggregation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOptions {
    /// `groupby` or `resample`; anything else means `groupby`.
    pub agg_mode: Option<String>,
    pub drop_all_zero: Option<bool>,
}

impl DashboardOptions {
    pub fn resolve(&self, settings: &EngineSettings) -> ChartOptions {
        ChartOptions {
            agg_mode: self
                .agg_mode
                .as_deref()
                .map_or(settings.default_agg_mode, AggMode::from_label),
            drop_all_zero: self.drop_all_zero.unwrap_or(settings.drop_all_zero_months),
            default_top_n: settings.default_top_n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Kpi,
    Chart,
}

/// A KPI or chart left out of the document under `skip_failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub kind: ItemKind,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardBuild {
    pub doc: DashboardDoc,
    pub failures: Vec<ItemFailure>,
}

pub fn build_dashboard(
    dataset_ref: &str,
    dataset: &NormalizedDataset,
    plan: &DashboardPlan,
    settings: &EngineSettings,
    options: &DashboardOptions,
) -> Result<DashboardBuild> {
    let chart_options = options.resolve(settings);
    let mut failures = Vec::new();

    let mut kpis = Vec::new();
    for kpi_plan in plan.kpis.iter().take(settings.max_kpis) {
        match evaluate_kpi(kpi_plan, dataset, &settings.default_currency) {
            Ok(kpi) => kpis.push(kpi),
            Err(e) => record(settings.failure_policy, &mut failures, ItemKind::Kpi, &kpi_plan.name, e)?,
        }
    }

    let charts_plan: Vec<&ChartPlan> = plan.charts.iter().take(settings.max_charts).collect();
    log_aggregation_proof(dataset, &plan.charts, &chart_options);

    let mut charts = Vec::new();
    for chart_plan in charts_plan {
        match materialize_chart(chart_plan, dataset, &chart_options) {
            Ok(Some(chart)) => charts.push(chart),
            Ok(None) => {}
            Err(e) => record(settings.failure_policy, &mut failures, ItemKind::Chart, &chart_plan.title, e)?,
        }
    }

    let insights: Vec<Insight> = plan
        .insights
        .iter()
        .take(settings.max_insights)
        .cloned()
        .map(Insight::from)
        .collect();

    let filters = resolve_date_column(dataset).map(|_| DashboardFilters { time_grain: "month".to_string() });
    tracing::info!(
        dataset_ref,
        kpis = kpis.len(),
        charts = charts.len(),
        insights = insights.len(),
        failed = failures.len(),
        "Dashboard assembled"
    );

    Ok(DashboardBuild {
        doc: DashboardDoc {
            dataset_id: dataset_ref.to_string(),
            kpis,
            charts,
            insights,
            filters,
            version: chrono::Utc::now().format("%Y.%m.%d").to_string(),
        },
        failures,
    })
}

fn record(
    policy: FailurePolicy,
    failures: &mut Vec<ItemFailure>,
    kind: ItemKind,
    name: &str,
    error: EngineError,
) -> Result<()> {
    match policy {
        FailurePolicy::Strict => Err(error),
        FailurePolicy::SkipFailed => {
            tracing::warn!(?kind, item = name, error = %error, "Dashboard item skipped");
            failures.push(ItemFailure { kind, name: name.to_string(), error: error.to_string() });
            Ok(())
        }
    }
}

/// Logs the unfiltered monthly sums of every column the chart plans reference, so the
/// month axis behind the charts can be checked.
fn log_aggregation_proof(dataset: &NormalizedDataset, charts: &[ChartPlan], options: &ChartOptions) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let Some(date_col) = resolve_date_column(dataset) else { return };

    let mut columns: Vec<&str> = Vec::new();
    for chart in charts {
        let keys = chart
            .series
            .iter()
            .flatten()
            .map(|s| s.key.as_str())
            .chain(chart.y_key.as_deref())
            .chain(chart.value_key.as_deref());
        for key in keys {
            if dataset.contains(key) && !columns.contains(&key) {
                columns.push(key);
            }
        }
    }
    if columns.is_empty() {
        columns = dataset
            .columns
            .iter()
            .filter(|c| c.is_numeric() && c.name != date_col)
            .map(|c| c.name.as_str())
            .collect();
    }

    match monthly_aggregate(dataset, date_col, &columns, options.agg_mode, false) {
        Ok(series) => {
            let head: Vec<_> = series.to_json_rows().into_iter().take(24).collect();
            tracing::debug!(
                date_col,
                agg_mode = %options.agg_mode,
                drop_all_zero = options.drop_all_zero,
                months = ?series.months(),
                head = %serde_json::Value::from(head),
                "Aggregation proof"
            );
        }
        Err(e) => tracing::warn!(error = %e, "Aggregation proof failed"),
    }
}
