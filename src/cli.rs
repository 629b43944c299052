//! CLI helper functions

use crate::{
    client::ElasticsearchClient,
    config::Settings,
    etl::{Pipeline, house_sales_pipeline},
    job::{Job, JobReport},
    stages::{DocumentLoader, TableExtractor, run_clean, run_extract, run_load},
    storage::{Checkpoint, Snapshot},
    transform::CleaningPlan,
};
use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use owo_colors::OwoColorize;
use std::fmt::Write;

/// The house sales job, wired to the endpoints in `settings`
pub fn load_job(settings: &Settings) -> Result<Job<TableExtractor, ElasticsearchClient>> {
    let pipeline = house_sales_pipeline()?;
    let extractor = TableExtractor::new(settings.postgres.client(), &settings.postgres.table);
    let index = settings.elasticsearch.client()?;
    Ok(Job::new(pipeline, extractor, index, &settings.snapshot_path))
}

/// Extract the source table into a fresh snapshot
///
/// Pipeline: TableExtractor → Snapshot (extracted)
pub async fn extract(settings: &Settings) -> Result<Snapshot> {
    log::info!("Source: {}", settings.postgres);
    let extractor = TableExtractor::new(settings.postgres.client(), &settings.postgres.table);
    run_extract(&extractor, &settings.snapshot_path).await
}

/// Clean the snapshot currently on disk
///
/// Pipeline: Snapshot (extracted) → CleaningPlan → Snapshot (cleaned)
pub fn clean(settings: &Settings) -> Result<Snapshot> {
    let snapshot = Snapshot::open(&settings.snapshot_path, Checkpoint::Extracted)
        .context("Run the extract command first")?;
    log::info!(
        "Cleaning {} row(s) in {}",
        snapshot.rows(),
        snapshot.path().display().bright_black()
    );
    run_clean(&snapshot, &CleaningPlan::house_sales())
}

/// Index every row of the cleaned snapshot
///
/// Pipeline: Snapshot (cleaned) → DocumentLoader → Elasticsearch
pub async fn load(settings: &Settings) -> Result<usize> {
    let snapshot = Snapshot::open(&settings.snapshot_path, Checkpoint::Cleaned)
        .context("Run the clean command first")?;
    log::info!("Target: {}", settings.elasticsearch);
    let loader = DocumentLoader::new(settings.elasticsearch.client()?);
    run_load(&snapshot, &loader).await
}

/// Run the whole job once
pub async fn run(settings: &Settings) -> Result<JobReport> {
    load_job(settings)?.run().await
}

/// Describe the pipeline and its next `count` fire times after `now`
pub fn render_plan(pipeline: &Pipeline, now: DateTime<Utc>, count: usize) -> Result<String> {
    let mut out = pipeline.to_yaml()?;
    if let Some(trigger) = pipeline.trigger() {
        writeln!(out, "next_runs:")?;
        for time in trigger.upcoming(now, count) {
            writeln!(out, "  - {}", time.format("%Y-%m-%d %H:%M UTC"))?;
        }
    }
    Ok(out)
}

/// Print the house sales pipeline
pub fn plan(count: usize) -> Result<()> {
    let pipeline = house_sales_pipeline()?;
    print!("{}", render_plan(&pipeline, Utc::now(), count)?);
    Ok(())
}

/// Run the job at every fire time, forever
///
/// A failed run is logged and the daemon waits for the next fire time.
pub async fn daemon(settings: &Settings) -> Result<()> {
    let job = load_job(settings)?;
    let trigger = job
        .pipeline()
        .trigger()
        .ok_or_else(|| eyre!("Pipeline '{}' has no trigger", job.pipeline().name()))?
        .clone();
    log::info!("Scheduling {} on {}", job.pipeline().name().cyan(), trigger);

    loop {
        let now = Utc::now();
        let next = trigger
            .next_after(now)
            .ok_or_else(|| eyre!("Trigger {} never fires again", trigger))?;
        log::info!("Next run at {}", next.format("%Y-%m-%d %H:%M UTC").cyan());

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match job.run().await {
            Ok(report) => log::info!("Run finished: {}", report),
            Err(e) => log::error!("Run failed: {:#}", e),
        }
    }
}
