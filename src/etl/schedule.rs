//! When a pipeline fires, and how often a failed stage is retried

use chrono::{DateTime, TimeDelta, Utc};
use cron::Schedule;
use eyre::{Context, Result};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

/// Cron trigger with a start time
///
/// The expression uses the classic five fields (`minute hour day month
/// weekday`) and is evaluated in UTC. No fire time precedes `start`.
#[derive(Debug, Clone)]
pub struct Trigger {
    expression: String,
    schedule: Schedule,
    start: DateTime<Utc>,
}

impl Trigger {
    /// Parse a five-field cron expression
    ///
    /// # Errors
    /// Returns an error if the expression is not valid cron.
    pub fn new(expression: &str, start: DateTime<Utc>) -> Result<Self> {
        // The cron crate wants a leading seconds field
        let with_seconds = format!("0 {}", expression.trim());
        let schedule = Schedule::from_str(&with_seconds)
            .with_context(|| format!("Invalid cron expression '{}'", expression))?;
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
            start,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// The next `count` fire times strictly after `after`
    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let from = if after < self.start {
            self.start - TimeDelta::seconds(1)
        } else {
            after
        };
        self.schedule.after(&from).take(count).collect()
    }

    /// The next fire time strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.upcoming(after, 1).into_iter().next()
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' (UTC) starting {}",
            self.expression,
            self.start.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Fixed-delay retry policy applied to each stage independently
///
/// A stage is retried from scratch; no progress carries over between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `op`, retrying after `delay` up to `retries` times
    ///
    /// # Errors
    /// Returns the error of the final attempt.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    log::warn!(
                        "{} failed: {:#}; retry {}/{} in {:?}",
                        label,
                        e,
                        attempt,
                        self.retries,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    return Err(e.wrap_err(format!(
                        "{} failed after {} attempt(s)",
                        label,
                        attempt + 1
                    )));
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(60))
    }
}
