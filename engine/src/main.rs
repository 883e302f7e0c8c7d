// AutoDash command line: runs the full pipeline over a CSV with recorded classifier replies.
use anyhow::{Context, Result};
use autodash_engine::classifier::StaticClassifier;
use autodash_engine::config::EngineSettings;
use autodash_engine::dashboard::DashboardOptions;
use autodash_engine::data::load_raw_dataset;
use autodash_engine::services::DashboardService;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "autodash", about = "Builds a dashboard document from a CSV and a classifier plan")]
struct Args {
    /// CSV file to analyse (`,` or `;` separated)
    #[arg(long)]
    input: PathBuf,

    /// Classifier reply with the column classification (`{"columns": [...]}`)
    #[arg(long)]
    classification: PathBuf,

    /// Classifier reply with the dashboard plan (`{"kpis": [...], "charts": [...]}`)
    #[arg(long)]
    plan: PathBuf,

    /// JSON file overlaid on the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Month axis: `groupby` (months present) or `resample` (continuous)
    #[arg(long)]
    agg_mode: Option<String>,

    /// Keep months whose sums are all zero
    #[arg(long, default_value = "false")]
    keep_zero_months: bool,

    /// Leave failing KPIs/charts out instead of aborting
    #[arg(long, default_value = "false")]
    skip_failed: bool,

    /// Write the result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let mut settings = EngineSettings::load(args.config.as_deref()).context("Failed to load settings")?;
    if args.skip_failed {
        settings.failure_policy = autodash_engine::config::FailurePolicy::SkipFailed;
    }

    let columns_reply = std::fs::read_to_string(&args.classification)
        .with_context(|| format!("Failed to read {}", args.classification.display()))?;
    let plan_reply = std::fs::read_to_string(&args.plan)
        .with_context(|| format!("Failed to read {}", args.plan.display()))?;
    let classifier = StaticClassifier::new(columns_reply, plan_reply);

    let raw = load_raw_dataset(&args.input).with_context(|| format!("Failed to load {}", args.input.display()))?;
    let options = DashboardOptions {
        agg_mode: args.agg_mode,
        drop_all_zero: args.keep_zero_months.then_some(false),
    };

    let service = DashboardService::new(settings);
    let result = service
        .run_pipeline(raw, &classifier, &options)
        .context("Dashboard pipeline failed")?;
    info!(
        dataset_id = %result.dataset_id,
        normalized_dataset_id = %result.normalized_dataset_id,
        kpis = result.dashboard.kpis.len(),
        charts = result.dashboard.charts.len(),
        "Dashboard built"
    );

    let json = serde_json::to_string_pretty(&result)?;
    match args.output {
        Some(path) => std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
