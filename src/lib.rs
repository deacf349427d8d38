//! Hemmer provider for Alibaba Cloud DataHub topics.
//!
//! This crate reconciles the declared state of DataHub topics against the
//! remote service, following the Terraform resource lifecycle.
//!
//! # Overview
//!
//! - **Reconciler**: [`TopicReconciler`] implements create, read, update and
//!   delete for a single topic through an injected [`DatahubClient`]
//! - **Provider surface**: [`DatahubProvider`] exposes the reconciler through
//!   the JSON-state [`ProviderService`] trait, with plan and import
//! - **Schema types**: attribute types, constraints and diff policies used for
//!   validation and planning
//! - **Retry**: a bounded retry driver used by delete
//! - **Error types**: [`ProviderError`]
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use hemmer_provider_datahub::testing::FakeDatahubClient;
//! use hemmer_provider_datahub::{ReconcilerOptions, TopicConfig, TopicReconciler};
//!
//! # tokio_test::block_on(async {
//! let reconciler = TopicReconciler::new(
//!     Arc::new(FakeDatahubClient::new()),
//!     ReconcilerOptions::default(),
//! );
//!
//! let desired = TopicConfig::new("Proj", "Topic1", 4, 3, "TUPLE").with_field("f1", "STRING");
//! let record = reconciler.create(&desired).await.unwrap();
//! assert_eq!(record.identity(), "proj:topic1");
//!
//! let current = reconciler.read("proj:topic1").await.unwrap().unwrap();
//! assert_eq!(current.state.config.shard_count, 4);
//!
//! reconciler.delete("proj:topic1").await.unwrap();
//! assert!(reconciler.read("proj:topic1").await.unwrap().is_none());
//! # });
//! ```
//!
//! A real deployment implements [`DatahubClient`] over the DataHub HTTP API
//! and hands it to [`DatahubProvider::new`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod identity;
pub mod logging;
pub mod provider;
pub mod retry;
pub mod schema;
pub mod testing;
pub mod topic;
pub mod validation;

// Re-export main types at crate root
pub use client::{DatahubClient, DatahubError, RecordType, Topic, TopicUpdate};
pub use config::ReconcilerOptions;
pub use diff::AttributeChange;
pub use error::{Operation, ProviderError};
pub use identity::TopicId;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{DatahubProvider, ImportedResource, PlanResult, ProviderService};
pub use retry::{retry_until, ExponentialBackoff, RetryError, RetryOutcome};
pub use schema::ProviderSchema;
pub use topic::{ResourceRecord, TopicConfig, TopicReconciler, TopicState, RESOURCE_TYPE};
pub use validation::validate;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
