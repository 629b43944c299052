//! Pipeline descriptor for the ETL job
//!
//! A [`Pipeline`] is plain data: named stages with declared dependencies, a
//! trigger and a retry policy. Whatever executes it (the local runner in
//! [`crate::job`], or an external scheduler fed from [`Pipeline::to_yaml`])
//! reads the stage order from [`Pipeline::execution_order`].

use super::{RetryPolicy, Trigger};
use chrono::{NaiveDate, TimeDelta};
use eyre::{Context, Result, eyre};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// What a stage does when it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Extract,
    Clean,
    Load,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract => write!(f, "extract"),
            Self::Clean => write!(f, "clean"),
            Self::Load => write!(f, "load"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    name: String,
    kind: StageKind,
    depends_on: Vec<String>,
}

impl Stage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }
}

/// Validated pipeline descriptor
///
/// # Example
/// ```
/// use house_sales_etl::etl::{Pipeline, StageKind};
///
/// # fn example() -> eyre::Result<()> {
/// let pipeline = Pipeline::builder("nightly")
///     .stage("load", StageKind::Load, &["clean"])
///     .stage("extract", StageKind::Extract, &[])
///     .stage("clean", StageKind::Clean, &["extract"])
///     .build()?;
///
/// let order: Vec<_> = pipeline.execution_order().map(|s| s.name()).collect();
/// assert_eq!(order, ["extract", "clean", "load"]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    owner: Option<String>,
    stages: Vec<Stage>,
    order: Vec<usize>,
    trigger: Option<Trigger>,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Stages in declaration order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Stages in an order where every stage follows its dependencies
    pub fn execution_order(&self) -> impl Iterator<Item = &Stage> {
        self.order.iter().map(|&i| &self.stages[i])
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        self.trigger.as_ref()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Render the descriptor as YAML for an external scheduler
    pub fn to_yaml(&self) -> Result<String> {
        #[derive(Serialize)]
        struct TriggerDoc<'a> {
            cron: &'a str,
            timezone: &'static str,
            start: String,
        }

        #[derive(Serialize)]
        struct RetryDoc {
            retries: u32,
            delay_seconds: u64,
        }

        #[derive(Serialize)]
        struct PipelineDoc<'a> {
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            owner: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            trigger: Option<TriggerDoc<'a>>,
            retry: RetryDoc,
            stages: Vec<&'a Stage>,
        }

        let doc = PipelineDoc {
            name: &self.name,
            owner: self.owner.as_deref(),
            trigger: self.trigger.as_ref().map(|t| TriggerDoc {
                cron: t.expression(),
                timezone: "UTC",
                start: t.start().to_rfc3339(),
            }),
            retry: RetryDoc {
                retries: self.retry.retries,
                delay_seconds: self.retry.delay.as_secs(),
            },
            stages: self.execution_order().collect(),
        };

        serde_yaml::to_string(&doc).with_context(|| "Failed to serialize pipeline descriptor")
    }
}

/// Builder for [`Pipeline`]; validation happens in [`PipelineBuilder::build`]
#[derive(Debug)]
pub struct PipelineBuilder {
    name: String,
    owner: Option<String>,
    stages: Vec<Stage>,
    trigger: Option<Trigger>,
    retry: RetryPolicy,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            stages: Vec::new(),
            trigger: None,
            retry: RetryPolicy::none(),
        }
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Declare a stage that runs after every stage named in `depends_on`
    pub fn stage(mut self, name: impl Into<String>, kind: StageKind, depends_on: &[&str]) -> Self {
        self.stages.push(Stage {
            name: name.into(),
            kind,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Validate and build the pipeline
    ///
    /// # Errors
    /// Returns an error if there are no stages, a stage name repeats, a
    /// dependency names an unknown stage, or the dependencies form a cycle.
    pub fn build(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            eyre::bail!("Pipeline '{}' has no stages", self.name);
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.name.as_str(), i).is_some() {
                eyre::bail!("Stage '{}' is declared more than once", stage.name);
            }
        }

        for stage in &self.stages {
            for dep in &stage.depends_on {
                if !index.contains_key(dep.as_str()) {
                    eyre::bail!("Stage '{}' depends on unknown stage '{}'", stage.name, dep);
                }
            }
        }

        let order = topological_order(&self.stages, &index)?;

        Ok(Pipeline {
            name: self.name,
            owner: self.owner,
            stages: self.stages,
            order,
            trigger: self.trigger,
            retry: self.retry,
        })
    }
}

/// Repeatedly pick the first declared stage whose dependencies are done
fn topological_order(stages: &[Stage], index: &HashMap<&str, usize>) -> Result<Vec<usize>> {
    let mut done: HashSet<usize> = HashSet::new();
    let mut order = Vec::with_capacity(stages.len());

    while order.len() < stages.len() {
        let next = stages.iter().enumerate().find(|(i, stage)| {
            !done.contains(i)
                && stage
                    .depends_on
                    .iter()
                    .all(|dep| done.contains(&index[dep.as_str()]))
        });

        match next {
            Some((i, _)) => {
                done.insert(i);
                order.push(i);
            }
            None => {
                let stuck: Vec<&str> = stages
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !done.contains(i))
                    .map(|(_, s)| s.name.as_str())
                    .collect();
                eyre::bail!("Stage dependencies form a cycle: {}", stuck.join(", "));
            }
        }
    }

    Ok(order)
}

/// The daily house-sales job: GetData → CleaningData → PostToElasticsearch
///
/// Fires at 06:30 UTC every day. The start time is 2024-03-24 12:30 shifted
/// back by the fixed 7 hour offset. A failed stage is retried once after a
/// minute.
pub fn house_sales_pipeline() -> Result<Pipeline> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 24)
        .and_then(|d| d.and_hms_opt(12, 30, 0))
        .ok_or_else(|| eyre!("Invalid pipeline start date"))?
        .and_utc()
        - TimeDelta::hours(7);

    Pipeline::builder("DAG_milestone_3")
        .owner("destri")
        .trigger(Trigger::new("30 6 * * *", start)?)
        .retry(RetryPolicy::default())
        .stage("GetData", StageKind::Extract, &[])
        .stage("CleaningData", StageKind::Clean, &["GetData"])
        .stage("PostToElasticsearch", StageKind::Load, &["CleaningData"])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn test_house_sales_pipeline() {
        let pipeline = house_sales_pipeline().unwrap();
        assert_eq!(pipeline.name(), "DAG_milestone_3");
        assert_eq!(pipeline.owner(), Some("destri"));

        let kinds: Vec<_> = pipeline.execution_order().map(|s| s.kind()).collect();
        assert_eq!(kinds, [StageKind::Extract, StageKind::Clean, StageKind::Load]);

        let retry = pipeline.retry_policy();
        assert_eq!(retry.retries, 1);
        assert_eq!(retry.delay, Duration::from_secs(60));

        let trigger = pipeline.trigger().unwrap();
        assert_eq!(trigger.expression(), "30 6 * * *");
        assert_eq!(trigger.start(), Utc.with_ymd_and_hms(2024, 3, 24, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_declaration_order_kept_for_independent_stages() {
        let pipeline = Pipeline::builder("p")
            .stage("b", StageKind::Extract, &[])
            .stage("a", StageKind::Extract, &[])
            .stage("c", StageKind::Load, &["a", "b"])
            .build()
            .unwrap();
        let order: Vec<_> = pipeline.execution_order().map(|s| s.name()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = Pipeline::builder("empty").build().unwrap_err();
        assert!(err.to_string().contains("has no stages"));
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let err = Pipeline::builder("p")
            .stage("x", StageKind::Extract, &[])
            .stage("x", StageKind::Clean, &[])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let err = Pipeline::builder("p")
            .stage("load", StageKind::Load, &["clean"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown stage 'clean'"));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = Pipeline::builder("p")
            .stage("a", StageKind::Extract, &["b"])
            .stage("b", StageKind::Clean, &["a"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_yaml_descriptor() {
        let yaml = house_sales_pipeline().unwrap().to_yaml().unwrap();
        assert!(yaml.contains("name: DAG_milestone_3"));
        assert!(yaml.contains("30 6 * * *"));
        assert!(yaml.contains("delay_seconds: 60"));
        assert!(yaml.contains("kind: clean"));
        assert!(yaml.contains("- GetData"));
    }
}
