//! Reconciler options and the provider configuration block.
//!
//! Options can be built in code:
//!
//! ```
//! use hemmer_provider_datahub::config::ReconcilerOptions;
//! use std::time::Duration;
//!
//! let options = ReconcilerOptions::new().with_delete_timeout(Duration::from_secs(60));
//! assert_eq!(options.delete_timeout, Duration::from_secs(60));
//! ```
//!
//! or read from the provider configuration block:
//!
//! ```
//! use hemmer_provider_datahub::config::ReconcilerOptions;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! let options = ReconcilerOptions::from_config(&json!({"delete_timeout_seconds": 300})).unwrap();
//! assert_eq!(options.delete_timeout, Duration::from_secs(300));
//! ```

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::retry::ExponentialBackoff;
use crate::schema::{Attribute, Constraint, Diagnostic, Schema};
use crate::validation::validate;

/// Default budget for deleting a topic.
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Options controlling how the reconciler talks to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Wall-clock budget for a delete, including retries.
    /// Default: 3 minutes.
    pub delete_timeout: Duration,
    /// Delay schedule between delete attempts.
    pub backoff: ExponentialBackoff,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
            backoff: ExponentialBackoff::default(),
        }
    }
}

impl ReconcilerOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delete budget.
    pub fn with_delete_timeout(mut self, timeout: Duration) -> Self {
        self.delete_timeout = timeout;
        self
    }

    /// Set the retry backoff.
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Schema of the provider configuration block.
    pub fn config_schema() -> Schema {
        Schema::v0()
            .with_description("DataHub provider settings")
            .with_attribute(
                "delete_timeout_seconds",
                Attribute::optional_int64()
                    .with_description("How long to keep retrying a topic delete")
                    .with_constraint(Constraint::IntRange { min: 1, max: 3600 }),
            )
            .with_attribute(
                "retry_initial_backoff_ms",
                Attribute::optional_int64()
                    .with_description("First delay between delete attempts")
                    .with_constraint(Constraint::IntRange {
                        min: 1,
                        max: 60_000,
                    }),
            )
            .with_attribute(
                "retry_backoff_factor",
                Attribute::optional_int64()
                    .with_description("Growth factor between consecutive delays")
                    .with_constraint(Constraint::IntRange { min: 1, max: 10 }),
            )
            .with_attribute(
                "retry_max_backoff_ms",
                Attribute::optional_int64()
                    .with_description("Largest delay between delete attempts")
                    .with_constraint(Constraint::IntRange {
                        min: 1,
                        max: 300_000,
                    }),
            )
    }

    /// Validate a provider configuration block.
    pub fn validate_config(config: &Value) -> Vec<Diagnostic> {
        if config.is_null() {
            return Vec::new();
        }
        validate(&Self::config_schema(), config)
    }

    /// Build options from a provider configuration block.
    ///
    /// A null block yields the defaults. Unset keys keep their defaults.
    pub fn from_config(config: &Value) -> Result<Self, ProviderError> {
        if config.is_null() {
            return Ok(Self::default());
        }

        if let Some(diag) = Self::validate_config(config)
            .into_iter()
            .find(Diagnostic::is_error)
        {
            let detail = diag.detail.map(|d| format!(": {}", d)).unwrap_or_default();
            return Err(ProviderError::Configuration(format!(
                "{}{}",
                diag.summary, detail
            )));
        }

        let raw: RawConfig = serde_json::from_value(config.clone())?;
        let mut options = Self::default();
        if let Some(secs) = raw.delete_timeout_seconds {
            options.delete_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = raw.retry_initial_backoff_ms {
            options.backoff.initial = Duration::from_millis(ms);
        }
        if let Some(factor) = raw.retry_backoff_factor {
            options.backoff.factor = factor;
        }
        if let Some(ms) = raw.retry_max_backoff_ms {
            options.backoff.max = Duration::from_millis(ms);
        }

        if options.backoff.initial > options.backoff.max {
            return Err(ProviderError::Configuration(format!(
                "retry_initial_backoff_ms ({}) must not exceed retry_max_backoff_ms ({})",
                options.backoff.initial.as_millis(),
                options.backoff.max.as_millis()
            )));
        }

        Ok(options)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    delete_timeout_seconds: Option<u64>,
    retry_initial_backoff_ms: Option<u64>,
    retry_backoff_factor: Option<u32>,
    retry_max_backoff_ms: Option<u64>,
}
