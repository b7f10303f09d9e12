//! Typed retry, fallback, and partial-result recovery.
//!
//! [`ErrorRecoveryManager`] wraps any extraction operation with a named
//! [`RecoveryStrategy`]: retryable failures are retried with exponential
//! backoff, exhausted retries fall back to an alternative operation, and
//! when both fail a [`PartialResult`] can be synthesized from
//! caller-supplied context. Every attempt outcome is appended to an
//! in-session record history that feeds the recovery statistics.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// A named retry policy.
///
/// The strategy itself is immutable; per-call attempt state lives inside
/// [`ErrorRecoveryManager::execute_with_recovery`], so one strategy can
/// be shared across calls without counter leakage.
#[derive(Debug, Clone)]
pub struct RecoveryStrategy {
    /// Strategy name, used for selection and statistics
    pub name: String,
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,
    /// Exponential backoff base; delay is `unit * factor^retry_count`
    pub backoff_factor: f64,
    /// Unit for one backoff step; one second reproduces the reference
    /// sleep of `backoff_factor^retry_count` seconds
    pub backoff_unit: Duration,
    /// Retryable error-kind names; `None` means everything is retryable
    retryable_kinds: Option<HashSet<&'static str>>,
}

impl RecoveryStrategy {
    /// Strategy for transient network failures.
    pub fn network() -> Self {
        Self {
            name: "network".to_string(),
            max_retries: 3,
            backoff_factor: 2.0,
            backoff_unit: Duration::from_secs(1),
            retryable_kinds: Some(["connection", "timeout", "dns"].into_iter().collect()),
        }
    }

    /// Strategy for filesystem failures.
    pub fn file() -> Self {
        Self {
            name: "file".to_string(),
            max_retries: 2,
            backoff_factor: 1.5,
            backoff_unit: Duration::from_secs(1),
            retryable_kinds: Some(["not_found", "permission", "io"].into_iter().collect()),
        }
    }

    /// Catch-all strategy: every error kind is retryable.
    pub fn default_strategy() -> Self {
        Self {
            name: "default".to_string(),
            max_retries: 3,
            backoff_factor: 2.0,
            backoff_unit: Duration::from_secs(1),
            retryable_kinds: None,
        }
    }

    /// Shrink the backoff unit, mainly for tests and latency-sensitive
    /// callers.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Whether this strategy considers the error worth retrying.
    pub fn is_retryable(&self, error: &Error) -> bool {
        match &self.retryable_kinds {
            Some(kinds) => kinds.contains(error.kind_name()),
            None => true,
        }
    }

    /// Backoff delay before retry number `retry_count`.
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        self.backoff_unit
            .mul_f64(self.backoff_factor.powi(retry_count as i32))
    }
}

/// Caller-supplied context for partial-result synthesis.
#[derive(Debug, Clone, Default)]
pub struct RecoveryContext {
    /// Best-effort data recovered before the failure
    pub partial_data: Option<Value>,
    /// Fraction of the work represented by `partial_data`
    pub success_ratio: Option<f64>,
    /// Free-form metadata copied onto the partial result
    pub metadata: HashMap<String, String>,
}

impl RecoveryContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach partial data.
    pub fn with_partial_data(mut self, data: Value) -> Self {
        self.partial_data = Some(data);
        self
    }

    /// Attach the success ratio of the partial data.
    pub fn with_success_ratio(mut self, ratio: f64) -> Self {
        self.success_ratio = Some(ratio);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Best-effort output retained when both primary and fallback fail.
#[derive(Debug, Clone, Serialize)]
pub struct PartialResult {
    /// Recovered data
    pub data: Value,
    /// Fraction of the work this data represents, in [0, 1]
    pub success_ratio: f64,
    /// Message of the error that forced the partial
    pub error: Option<String>,
    /// Synthesis time
    pub timestamp: DateTime<Utc>,
    /// Context metadata
    pub metadata: HashMap<String, String>,
}

impl PartialResult {
    /// Whether the partial covers enough of the work to be usable.
    ///
    /// # Examples
    ///
    /// ```
    /// use docstruct::recovery::PartialResult;
    ///
    /// let partial = PartialResult {
    ///     data: serde_json::json!([1, 2]),
    ///     success_ratio: 0.6,
    ///     error: None,
    ///     timestamp: chrono::Utc::now(),
    ///     metadata: Default::default(),
    /// };
    /// assert!(partial.is_usable(0.5));
    /// assert!(!partial.is_usable(0.7));
    /// ```
    pub fn is_usable(&self, min_ratio: f64) -> bool {
        self.success_ratio >= min_ratio
    }
}

/// One attempt outcome in the manager's history.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
    /// Error kind name, or "success"
    pub error_kind: String,
    /// Error or outcome message
    pub message: String,
    /// Strategy in effect
    pub strategy_name: String,
    /// Free-form context label supplied by the caller
    pub context: Option<String>,
}

/// How a recovered operation ultimately completed.
#[derive(Debug)]
pub enum RecoveryOutcome<T> {
    /// Primary operation succeeded after `attempts` retries
    Success {
        /// Result value
        value: T,
        /// Number of retries before success
        attempts: u32,
    },
    /// Fallback operation succeeded after the primary was exhausted
    Fallback {
        /// Result value
        value: T,
        /// Retries spent on the primary operation
        attempts: u32,
    },
    /// A partial result was synthesized from context
    Partial(PartialResult),
}

impl<T> RecoveryOutcome<T> {
    /// The successful value, if the primary or fallback produced one.
    pub fn into_value(self) -> Option<T> {
        match self {
            RecoveryOutcome::Success { value, .. } | RecoveryOutcome::Fallback { value, .. } => {
                Some(value)
            }
            RecoveryOutcome::Partial(_) => None,
        }
    }

    /// Retries spent on the primary operation.
    pub fn attempts(&self) -> u32 {
        match self {
            RecoveryOutcome::Success { attempts, .. }
            | RecoveryOutcome::Fallback { attempts, .. } => *attempts,
            RecoveryOutcome::Partial(_) => 0,
        }
    }
}

/// Aggregate outcome of a batch run.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Successful values by operation index
    pub successes: Vec<(usize, T)>,
    /// Partial results by operation index
    pub partials: Vec<(usize, PartialResult)>,
    /// Failures by operation index
    pub failures: Vec<(usize, Error)>,
    /// `(successes + partials) / total`, 1.0 for an empty batch
    pub success_rate: f64,
}

/// Recovery statistics over the session history.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryStatistics {
    /// Failed attempts recorded
    pub total_errors: usize,
    /// Successful operations recorded
    pub total_successes: usize,
    /// Partial results synthesized
    pub partial_results: usize,
    /// Histogram of error kinds
    pub error_types: HashMap<String, usize>,
    /// Histogram of strategies used
    pub strategies_used: HashMap<String, usize>,
}

/// Executes operations under named recovery strategies.
pub struct ErrorRecoveryManager {
    strategies: HashMap<String, RecoveryStrategy>,
    history: Vec<ErrorRecord>,
    total_successes: usize,
    partial_results: usize,
    strategies_used: HashMap<String, usize>,
}

impl Default for ErrorRecoveryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorRecoveryManager {
    /// Create a manager with the built-in "network", "file", and
    /// "default" strategies.
    pub fn new() -> Self {
        let mut strategies = HashMap::new();
        for strategy in [
            RecoveryStrategy::network(),
            RecoveryStrategy::file(),
            RecoveryStrategy::default_strategy(),
        ] {
            strategies.insert(strategy.name.clone(), strategy);
        }
        Self {
            strategies,
            history: Vec::new(),
            total_successes: 0,
            partial_results: 0,
            strategies_used: HashMap::new(),
        }
    }

    /// Register or replace a strategy.
    pub fn with_strategy(mut self, strategy: RecoveryStrategy) -> Self {
        self.strategies.insert(strategy.name.clone(), strategy);
        self
    }

    /// Execute `operation` under the named strategy.
    ///
    /// Retryable failures are retried up to the strategy's budget with
    /// exponential backoff. On exhaustion the `fallback` runs once; if
    /// that also fails, a [`PartialResult`] is synthesized when `context`
    /// carries partial data. Otherwise the original error propagates.
    ///
    /// One [`ErrorRecord`] is appended per failed attempt, and one
    /// `"success"` record when the operation or its fallback succeeds.
    pub fn execute_with_recovery<T, F>(
        &mut self,
        mut operation: F,
        strategy_name: &str,
        fallback: Option<Box<dyn FnOnce() -> Result<T>>>,
        context: Option<&RecoveryContext>,
    ) -> Result<RecoveryOutcome<T>>
    where
        F: FnMut() -> Result<T>,
    {
        let strategy = self
            .strategies
            .get(strategy_name)
            .cloned()
            .unwrap_or_else(RecoveryStrategy::default_strategy);
        *self
            .strategies_used
            .entry(strategy.name.clone())
            .or_insert(0) += 1;

        // Per-call attempt state; never stored on the shared strategy
        let mut attempts: u32 = 0;
        let final_error = loop {
            match operation() {
                Ok(value) => {
                    self.total_successes += 1;
                    self.record_success(
                        &strategy.name,
                        format!("succeeded after {} retries", attempts),
                    );
                    debug!(
                        "Operation succeeded under '{}' after {} retries",
                        strategy.name, attempts
                    );
                    return Ok(RecoveryOutcome::Success { value, attempts });
                }
                Err(err) => {
                    self.record_failure(&err, &strategy.name);
                    if strategy.is_retryable(&err) && attempts < strategy.max_retries {
                        let delay = strategy.backoff_delay(attempts);
                        warn!(
                            "Attempt {} failed under '{}': {} (retrying in {:?})",
                            attempts + 1,
                            strategy.name,
                            err,
                            delay
                        );
                        std::thread::sleep(delay);
                        attempts += 1;
                    } else {
                        break err;
                    }
                }
            }
        };

        if let Some(fallback) = fallback {
            match fallback() {
                Ok(value) => {
                    self.total_successes += 1;
                    self.record_success(&strategy.name, "fallback succeeded".to_string());
                    info!("Fallback succeeded under '{}'", strategy.name);
                    return Ok(RecoveryOutcome::Fallback { value, attempts });
                }
                Err(err) => {
                    self.record_failure(&err, &strategy.name);
                }
            }
        }

        if let Some(context) = context {
            if let Some(data) = &context.partial_data {
                let partial = PartialResult {
                    data: data.clone(),
                    success_ratio: context.success_ratio.unwrap_or(0.5),
                    error: Some(final_error.to_string()),
                    timestamp: Utc::now(),
                    metadata: context.metadata.clone(),
                };
                self.partial_results += 1;
                info!(
                    "Synthesized partial result (ratio {:.2}) under '{}'",
                    partial.success_ratio, strategy.name
                );
                return Ok(RecoveryOutcome::Partial(partial));
            }
        }

        Err(final_error)
    }

    /// Run a batch of operations sequentially under one strategy.
    ///
    /// With `continue_on_error` the batch records failures and keeps
    /// going; without it the first hard failure aborts the batch. The
    /// aggregate success rate is logged either way.
    pub fn execute_batch_with_recovery<T>(
        &mut self,
        operations: Vec<Box<dyn FnMut() -> Result<T>>>,
        strategy_name: &str,
        continue_on_error: bool,
        context: Option<&RecoveryContext>,
    ) -> Result<BatchReport<T>> {
        let total = operations.len();
        let mut report = BatchReport {
            successes: Vec::new(),
            partials: Vec::new(),
            failures: Vec::new(),
            success_rate: 1.0,
        };

        for (index, mut operation) in operations.into_iter().enumerate() {
            match self.execute_with_recovery(&mut *operation, strategy_name, None, context) {
                Ok(RecoveryOutcome::Success { value, .. })
                | Ok(RecoveryOutcome::Fallback { value, .. }) => {
                    report.successes.push((index, value));
                }
                Ok(RecoveryOutcome::Partial(partial)) => {
                    report.partials.push((index, partial));
                }
                Err(err) => {
                    if continue_on_error {
                        warn!("Batch item {} failed: {}", index, err);
                        report.failures.push((index, err));
                    } else {
                        warn!("Batch aborted at item {}: {}", index, err);
                        return Err(err);
                    }
                }
            }
        }

        if total > 0 {
            report.success_rate =
                (report.successes.len() + report.partials.len()) as f64 / total as f64;
        }
        info!(
            "Batch finished: {}/{} ok, {} partial, {} failed (success rate {:.0}%)",
            report.successes.len(),
            total,
            report.partials.len(),
            report.failures.len(),
            report.success_rate * 100.0
        );
        Ok(report)
    }

    fn record_failure(&mut self, error: &Error, strategy_name: &str) {
        self.history.push(ErrorRecord {
            timestamp: Utc::now(),
            error_kind: error.kind_name().to_string(),
            message: error.to_string(),
            strategy_name: strategy_name.to_string(),
            context: None,
        });
    }

    fn record_success(&mut self, strategy_name: &str, message: String) {
        self.history.push(ErrorRecord {
            timestamp: Utc::now(),
            error_kind: "success".to_string(),
            message,
            strategy_name: strategy_name.to_string(),
            context: None,
        });
    }

    /// Full attempt history for this session, successes included.
    pub fn history(&self) -> &[ErrorRecord] {
        &self.history
    }

    /// The most recent error records (last 10), successes excluded.
    pub fn recent_errors(&self) -> Vec<&ErrorRecord> {
        let errors: Vec<&ErrorRecord> = self
            .history
            .iter()
            .filter(|r| r.error_kind != "success")
            .collect();
        let start = errors.len().saturating_sub(10);
        errors[start..].to_vec()
    }

    /// Clear the session history and counters.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.total_successes = 0;
        self.partial_results = 0;
        self.strategies_used.clear();
    }

    /// Aggregate statistics over the session history.
    pub fn statistics(&self) -> RecoveryStatistics {
        let mut error_types = HashMap::new();
        let mut total_errors = 0;
        for record in &self.history {
            if record.error_kind == "success" {
                continue;
            }
            total_errors += 1;
            *error_types.entry(record.error_kind.clone()).or_insert(0) += 1;
        }

        RecoveryStatistics {
            total_errors,
            total_successes: self.total_successes,
            partial_results: self.partial_results,
            error_types,
            strategies_used: self.strategies_used.clone(),
        }
    }
}
