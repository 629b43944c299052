//! Local runner for a [`Pipeline`]
//!
//! Runs the stages in dependency order, one after another, handing the
//! snapshot written by each stage to the next. Every stage runs under the
//! pipeline's retry policy.

use crate::client::DocumentIndex;
use crate::etl::{Extractor, Pipeline, StageKind};
use crate::stages::{DocumentLoader, run_clean, run_extract, run_load};
use crate::storage::{Checkpoint, Snapshot};
use crate::table::Table;
use crate::transform::CleaningPlan;
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// What one run of the job did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Rows written by the extract stage
    pub extracted: Option<usize>,
    /// Rows left after cleaning
    pub cleaned: Option<usize>,
    /// Index calls issued by the load stage
    pub loaded: Option<usize>,
}

impl std::fmt::Display for JobReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |n: Option<usize>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
        write!(
            f,
            "extracted {}, cleaned {}, loaded {}",
            show(self.extracted),
            show(self.cleaned),
            show(self.loaded)
        )
    }
}

/// A pipeline bound to its source, snapshot path and target
pub struct Job<E, I> {
    pipeline: Pipeline,
    extractor: E,
    plan: CleaningPlan,
    loader: DocumentLoader<I>,
    snapshot_path: PathBuf,
}

impl<E, I> Job<E, I>
where
    E: Extractor<Output = Table>,
    I: DocumentIndex,
{
    /// Bind `pipeline` to its endpoints, cleaning with [`CleaningPlan::house_sales`]
    pub fn new(pipeline: Pipeline, extractor: E, index: I, snapshot_path: impl AsRef<Path>) -> Self {
        Self {
            pipeline,
            extractor,
            plan: CleaningPlan::house_sales(),
            loader: DocumentLoader::new(index),
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Replace the cleaning plan
    pub fn with_plan(mut self, plan: CleaningPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn index(&self) -> &I {
        self.loader.index()
    }

    /// Run every stage once in dependency order
    ///
    /// A stage without an upstream handle in this run opens the snapshot
    /// already on disk.
    ///
    /// # Errors
    /// Returns the error of the first stage that still fails after its
    /// retries; later stages do not run.
    pub async fn run(&self) -> Result<JobReport> {
        let retry = self.pipeline.retry_policy();
        let mut report = JobReport::default();
        let mut current: Option<Snapshot> = None;

        log::info!("Running {}", self.pipeline.name().cyan());
        for stage in self.pipeline.execution_order() {
            let label = format!("Stage '{}'", stage.name());
            log::info!("{} ({}) started", label, stage.kind());

            match stage.kind() {
                StageKind::Extract => {
                    let snapshot = retry
                        .run(&label, move || run_extract(&self.extractor, &self.snapshot_path))
                        .await?;
                    report.extracted = Some(snapshot.rows());
                    current = Some(snapshot);
                }
                StageKind::Clean => {
                    let upstream = current.as_ref();
                    let snapshot = retry
                        .run(&label, move || async move {
                            let input = self.input(upstream, Checkpoint::Extracted)?;
                            run_clean(&input, &self.plan)
                        })
                        .await?;
                    report.cleaned = Some(snapshot.rows());
                    current = Some(snapshot);
                }
                StageKind::Load => {
                    let upstream = current.as_ref();
                    let count = retry
                        .run(&label, move || async move {
                            let input = self.input(upstream, Checkpoint::Cleaned)?;
                            run_load(&input, &self.loader).await
                        })
                        .await?;
                    report.loaded = Some(count);
                }
            }
        }

        log::info!("✓ {} finished: {}", self.pipeline.name(), report);
        Ok(report)
    }

    fn input(&self, upstream: Option<&Snapshot>, checkpoint: Checkpoint) -> Result<Snapshot> {
        match upstream {
            Some(snapshot) if snapshot.checkpoint() == checkpoint => Ok(snapshot.clone()),
            _ => Snapshot::open(&self.snapshot_path, checkpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::IndexResponse;
    use crate::etl::RetryPolicy;
    use crate::table::{Column, ColumnType, Schema, Value};
    use serde_json::{Map, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct FlakyExtractor {
        failures: AtomicU32,
        table: Table,
    }

    impl Extractor for FlakyExtractor {
        type Output = Table;

        async fn extract(&self) -> Result<Self::Output> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                eyre::bail!("database is starting up");
            }
            Ok(self.table.clone())
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        documents: Mutex<Vec<Map<String, serde_json::Value>>>,
    }

    impl DocumentIndex for RecordingIndex {
        async fn index_document(
            &self,
            document: &Map<String, serde_json::Value>,
        ) -> Result<IndexResponse> {
            self.documents.lock().unwrap().push(document.clone());
            Ok(IndexResponse {
                status: 201,
                body: json!({"result": "created"}),
            })
        }
    }

    fn raw_table() -> Table {
        let names = [
            "Suburb",
            "Date",
            "Postcode",
            "Bedroom2",
            "Bathroom",
            "Car",
            "YearBuilt",
            "Propertycount",
        ];
        let mut columns = vec![
            Column::new(names[0], ColumnType::Text),
            Column::new(names[1], ColumnType::Text),
        ];
        columns.extend(names[2..].iter().map(|n| Column::new(*n, ColumnType::Float)));

        let row = |suburb: &str, date: &str, car: Option<f64>| {
            let mut row = vec![Value::Text(suburb.into()), Value::Text(date.into())];
            row.extend([3067.0, 2.0, 1.0].map(Value::Float));
            row.push(car.map_or(Value::Null, Value::Float));
            row.extend([1900.0, 4019.0].map(Value::Float));
            row
        };

        Table::from_rows(
            Schema::new(columns),
            vec![
                row("Abbotsford", "03/12/2016", Some(1.0)),
                row("Abbotsford", "03/12/2016", Some(1.0)),
                row("Collingwood", "04/02/2016", None),
                row("Richmond", "05/01/2020", Some(2.0)),
            ],
        )
        .unwrap()
    }

    fn pipeline(retry: RetryPolicy) -> Pipeline {
        Pipeline::builder("test")
            .retry(retry)
            .stage("GetData", StageKind::Extract, &[])
            .stage("CleaningData", StageKind::Clean, &["GetData"])
            .stage("PostToElasticsearch", StageKind::Load, &["CleaningData"])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_all_stages() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = FlakyExtractor {
            failures: AtomicU32::new(0),
            table: raw_table(),
        };
        let job = Job::new(
            pipeline(RetryPolicy::none()),
            extractor,
            RecordingIndex::default(),
            temp_dir.path().join("snapshot.csv"),
        );

        let report = job.run().await.unwrap();

        assert_eq!(
            report,
            JobReport {
                extracted: Some(4),
                cleaned: Some(2),
                loaded: Some(2),
            }
        );
        let documents = job.index().documents.lock().unwrap();
        assert_eq!(documents[0]["house_id"], json!(0));
        assert_eq!(documents[1]["house_id"], json!(1));
        assert_eq!(documents[1]["suburb"], json!("Richmond"));
        assert_eq!(documents[1]["date"], json!("2020-01-05"));
        assert_eq!(documents[1]["car"], json!(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stage_is_retried() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = FlakyExtractor {
            failures: AtomicU32::new(1),
            table: raw_table(),
        };
        let job = Job::new(
            pipeline(RetryPolicy::new(1, Duration::from_secs(60))),
            extractor,
            RecordingIndex::default(),
            temp_dir.path().join("snapshot.csv"),
        );

        let report = job.run().await.unwrap();
        assert_eq!(report.extracted, Some(4));
        assert_eq!(report.loaded, Some(2));
    }

    #[tokio::test]
    async fn test_exhausted_retries_stop_the_job() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = FlakyExtractor {
            failures: AtomicU32::new(5),
            table: raw_table(),
        };
        let job = Job::new(
            pipeline(RetryPolicy::none()),
            extractor,
            RecordingIndex::default(),
            temp_dir.path().join("snapshot.csv"),
        );

        let err = job.run().await.unwrap_err();
        assert!(err.to_string().contains("Stage 'GetData' failed after 1 attempt(s)"));
        assert!(job.index().documents.lock().unwrap().is_empty());
        assert!(!temp_dir.path().join("snapshot.csv").exists());
    }

    #[tokio::test]
    async fn test_load_only_pipeline_reads_existing_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snapshot.csv");
        std::fs::write(
            &path,
            "house_id,suburb,date,postcode,bedroom,bathroom,car,yearbuilt,propertycount\n\
             0,Abbotsford,2016-12-03,3067,2,1,1,1900,4019\n",
        )
        .unwrap();

        let pipeline = Pipeline::builder("load only")
            .stage("PostToElasticsearch", StageKind::Load, &[])
            .build()
            .unwrap();
        let extractor = FlakyExtractor {
            failures: AtomicU32::new(0),
            table: raw_table(),
        };
        let job = Job::new(pipeline, extractor, RecordingIndex::default(), &path);

        let report = job.run().await.unwrap();
        assert_eq!(report.extracted, None);
        assert_eq!(report.loaded, Some(1));
        assert_eq!(report.to_string(), "extracted -, cleaned -, loaded 1");
    }
}
