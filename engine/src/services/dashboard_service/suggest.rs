// Dashboard suggestion: profile, ask the classifier for a plan, compute it.
use crate::classifier::{decode_reply, SemanticClassifier};
use crate::config::EngineSettings;
use crate::dashboard::{build_dashboard, DashboardBuild, DashboardOptions};
use crate::data::DatasetStore;
use crate::error::{EngineError, Result};
use crate::profile::profile_dataset;
use shared::models::DashboardPlan;

pub fn handle_suggest(
    store: &DatasetStore,
    settings: &EngineSettings,
    normalized_dataset_id: &str,
    classifier: &dyn SemanticClassifier,
    options: &DashboardOptions,
) -> Result<DashboardBuild> {
    let entry = store
        .normalized
        .get(normalized_dataset_id)
        .ok_or_else(|| EngineError::NotFound(format!("normalized dataset '{}'", normalized_dataset_id)))?;

    let profile = profile_dataset(&entry.dataset);
    let reply = classifier.suggest_dashboard(&profile, &entry.columns)?;
    let plan: DashboardPlan = decode_reply(&reply)?;
    tracing::debug!(
        normalized_dataset_id,
        kpis = plan.kpis.len(),
        charts = plan.charts.len(),
        insights = plan.insights.len(),
        "Dashboard plan received"
    );

    let build = build_dashboard(normalized_dataset_id, &entry.dataset, &plan, settings, options)?;
    store.dashboards.put(normalized_dataset_id, build.doc.clone());
    Ok(build)
}
