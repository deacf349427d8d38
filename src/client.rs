//! The remote DataHub API as seen by the reconciler.
//!
//! Transport and request marshaling live behind [`DatahubClient`]; the
//! reconciler only needs the four topic calls and two error predicates.
//! [`crate::testing::FakeDatahubClient`] is an in-memory implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How records written to a topic are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// Records follow a fixed field schema.
    Tuple,
    /// Records are opaque byte blobs.
    Blob,
}

impl RecordType {
    /// Every accepted wire name.
    pub const NAMES: [&'static str; 2] = ["TUPLE", "BLOB"];

    /// The wire name of this record type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tuple => "TUPLE",
            Self::Blob => "BLOB",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TUPLE" => Ok(Self::Tuple),
            "BLOB" => Ok(Self::Blob),
            other => Err(format!(
                "expected one of {:?}, got '{}'",
                Self::NAMES,
                other
            )),
        }
    }
}

/// Field types allowed in a TUPLE record schema.
pub const FIELD_TYPES: [&str; 5] = ["BIGINT", "DOUBLE", "BOOLEAN", "TIMESTAMP", "STRING"];

/// A topic as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Owning project.
    pub project_name: String,
    /// Topic name within the project.
    pub topic_name: String,
    /// Number of shards.
    pub shard_count: i64,
    /// Retention in days.
    pub life_cycle: i64,
    /// Free-form description.
    pub comment: String,
    /// Record shape.
    pub record_type: RecordType,
    /// Field name to field type; empty for BLOB topics.
    pub record_schema: BTreeMap<String, String>,
    /// Creation time, seconds since the Unix epoch.
    pub create_time: u64,
    /// Last modification time, seconds since the Unix epoch.
    pub last_modify_time: u64,
}

/// The mutable fields sent in a single update call.
///
/// Only fields that changed are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicUpdate {
    /// New retention in days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_cycle: Option<i64>,
    /// New comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TopicUpdate {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.life_cycle.is_none() && self.comment.is_none()
    }
}

/// The subset of the DataHub API used by the topic reconciler.
///
/// Implementations are expected to be stateless and reentrant; connection
/// handling is their concern.
#[async_trait::async_trait]
pub trait DatahubClient: Send + Sync + 'static {
    /// Error type returned by every call.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a topic.
    async fn create_topic(&self, topic: &Topic) -> Result<(), Self::Error>;

    /// Fetch a topic.
    async fn get_topic(&self, project: &str, topic: &str) -> Result<Topic, Self::Error>;

    /// Apply the set fields of `update` to a topic in one call.
    async fn update_topic(
        &self,
        project: &str,
        topic: &str,
        update: &TopicUpdate,
    ) -> Result<(), Self::Error>;

    /// Delete a topic.
    async fn delete_topic(&self, project: &str, topic: &str) -> Result<(), Self::Error>;

    /// Whether `err` means the project or topic does not exist.
    fn is_not_found(&self, err: &Self::Error) -> bool;

    /// Whether `err` is transient and the call may be retried.
    fn is_retryable(&self, err: &Self::Error) -> bool;
}

/// Error codes reported by the service when a target does not exist.
const NOT_FOUND_CODES: [&str; 3] = ["NoSuchProject", "NoSuchTopic", "NoSuchShard"];

/// Error codes reported for transient conditions.
const RETRYABLE_CODES: [&str; 3] = ["LimitExceeded", "InternalServerError", "ServiceUnavailable"];

/// An error reported by the DataHub service.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct DatahubError {
    /// Service error code, e.g. `NoSuchTopic`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Request id assigned by the service, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl DatahubError {
    /// Create an error with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    /// Attach the request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// A `NoSuchTopic` error for `project/topic`.
    pub fn no_such_topic(project: &str, topic: &str) -> Self {
        Self::new(
            "NoSuchTopic",
            format!("topic '{}/{}' does not exist", project, topic),
        )
    }

    /// Whether the code says the target does not exist.
    pub fn is_not_found(&self) -> bool {
        NOT_FOUND_CODES.contains(&self.code.as_str())
    }

    /// Whether the code names a transient condition, including throttling.
    pub fn is_retryable(&self) -> bool {
        RETRYABLE_CODES.contains(&self.code.as_str()) || self.code.contains("Throttl")
    }
}
