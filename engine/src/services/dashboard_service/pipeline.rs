// Full pipeline: upload, detect, normalize, suggest, with timed stages.
use super::helpers::{finish_stage, start_stage};
use super::{ingest, normalize, suggest};
use crate::classifier::SemanticClassifier;
use crate::config::EngineSettings;
use crate::dashboard::DashboardOptions;
use crate::data::DatasetStore;
use crate::error::Result;
use serde_json::json;
use shared::models::{PipelineResult, RawDataset};

pub fn handle_run_pipeline(
    store: &DatasetStore,
    settings: &EngineSettings,
    raw: RawDataset,
    classifier: &dyn SemanticClassifier,
    options: &DashboardOptions,
) -> Result<PipelineResult> {
    let mut stages = Vec::with_capacity(4);

    let mut stage = start_stage("upload");
    let rows = raw.row_count();
    let preview = ingest::handle_ingest(store, settings, raw)?;
    let dataset_id = preview.dataset_id.clone();
    finish_stage(&mut stage, json!({ "dataset_id": &dataset_id, "rows": rows }));
    stages.push(stage);

    let mut stage = start_stage("detect_ai");
    let columns = ingest::handle_detect(store, settings, &dataset_id, classifier)?;
    finish_stage(&mut stage, json!({ "columns": &columns }));
    stages.push(stage);

    let mut stage = start_stage("normalize");
    let normalized = normalize::handle_normalize(store, &dataset_id, Some(columns))?;
    finish_stage(
        &mut stage,
        json!({
            "normalized_dataset_id": &normalized.normalized_dataset_id,
            "rows": normalized.rows,
            "quality": &normalized.quality,
        }),
    );
    stages.push(stage);

    let mut stage = start_stage("suggest_ai");
    let build = suggest::handle_suggest(store, settings, &normalized.normalized_dataset_id, classifier, options)?;
    finish_stage(
        &mut stage,
        json!({
            "kpis": build.doc.kpis.len(),
            "charts": build.doc.charts.len(),
            "insights": build.doc.insights.len(),
            "failures": &build.failures,
        }),
    );
    stages.push(stage);

    Ok(PipelineResult {
        dataset_id,
        normalized_dataset_id: normalized.normalized_dataset_id,
        dashboard: build.doc,
        stages,
    })
}
