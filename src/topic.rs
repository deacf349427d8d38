//! The `alicloud_datahub_topic` resource.
//!
//! [`TopicReconciler`] drives a remote topic toward a declared
//! [`TopicConfig`] with four verbs:
//!
//! - **create** validates, creates the topic, then reads it back;
//! - **read** refreshes every attribute from the service, returning `None`
//!   once the topic is gone;
//! - **update** sends one combined call for the changed mutable attributes
//!   (`life_cycle`, `comment`) and always reads back;
//! - **delete** retries transient failures within a time budget and treats
//!   an already absent topic as success.
//!
//! Create, read and update never retry; transient failures of those verbs are
//! left to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::client::{DatahubClient, RecordType, Topic, TopicUpdate, FIELD_TYPES};
use crate::config::ReconcilerOptions;
use crate::diff::diff;
use crate::error::{BoxError, Operation, ProviderError};
use crate::identity::TopicId;
use crate::retry::{retry_until, RetryError, RetryOutcome};
use crate::schema::{Attribute, Constraint, Diagnostic, DiffPolicy, Schema};
use crate::validation::{diagnostic_to_error, validate, validate_strict};

/// Resource type name of topics.
pub const RESOURCE_TYPE: &str = "alicloud_datahub_topic";

/// Comment used when the operator does not set one.
pub const DEFAULT_COMMENT: &str = "topic added by terraform";

fn default_comment() -> String {
    DEFAULT_COMMENT.to_string()
}

fn record_type_is_not_tuple(proposed: &Map<String, Value>) -> bool {
    proposed.get("record_type").and_then(Value::as_str) != Some(RecordType::Tuple.as_str())
}

/// Schema of the topic resource.
pub fn topic_schema() -> Schema {
    Schema::v0()
        .with_description("A DataHub topic")
        .with_attribute(
            "project_name",
            Attribute::required_string()
                .with_description("Project owning the topic")
                .with_force_new()
                .with_constraint(Constraint::Identifier { min: 3, max: 32 })
                .with_diff(DiffPolicy::CaseInsensitive),
        )
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_description("Topic name")
                .with_force_new()
                .with_constraint(Constraint::Identifier { min: 1, max: 128 })
                .with_diff(DiffPolicy::CaseInsensitive),
        )
        .with_attribute(
            "shard_count",
            Attribute::required_int64()
                .with_force_new()
                .with_constraint(Constraint::IntRange { min: 1, max: 256 }),
        )
        .with_attribute(
            "life_cycle",
            Attribute::required_int64()
                .with_description("Retention in days")
                .with_constraint(Constraint::IntRange { min: 1, max: 7 }),
        )
        .with_attribute(
            "comment",
            Attribute::optional_string()
                .with_default(Value::String(default_comment()))
                .with_constraint(Constraint::StringLength { min: 0, max: 255 })
                .with_diff(DiffPolicy::CaseInsensitive),
        )
        .with_attribute(
            "record_type",
            Attribute::required_string()
                .with_force_new()
                .with_constraint(Constraint::one_of(&RecordType::NAMES)),
        )
        .with_attribute(
            "record_schema",
            Attribute::optional_string_map()
                .with_description("Field name to field type, TUPLE topics only")
                .with_force_new()
                .with_default(Value::Object(Map::new()))
                .with_constraint(Constraint::map_values_one_of(&FIELD_TYPES))
                .with_diff(DiffPolicy::IgnoreIf(record_type_is_not_tuple)),
        )
        .with_attribute("create_time", Attribute::computed_string())
        .with_attribute("last_modify_time", Attribute::computed_string())
}

/// Validate a topic configuration value, defaults applied.
///
/// Adds a TUPLE-specific check on top of the schema rules: a TUPLE topic
/// must declare at least one field.
pub fn validate_config_value(config: &Value) -> Vec<Diagnostic> {
    let schema = topic_schema();
    let config = schema.apply_defaults(config.clone());
    let mut diagnostics = validate(&schema, &config);

    let is_tuple = config.get("record_type").and_then(Value::as_str)
        == Some(RecordType::Tuple.as_str());
    let has_fields = config
        .get("record_schema")
        .and_then(Value::as_object)
        .map(|fields| !fields.is_empty())
        .unwrap_or(false);
    if is_tuple && !has_fields {
        diagnostics.push(
            Diagnostic::error("Invalid value for attribute 'record_schema'")
                .with_detail("a TUPLE topic must declare at least one field")
                .with_attribute("record_schema"),
        );
    }
    if !is_tuple && has_fields {
        diagnostics.push(
            Diagnostic::warning("Attribute 'record_schema' has no effect")
                .with_detail("fields are only sent for TUPLE topics")
                .with_attribute("record_schema"),
        );
    }

    diagnostics
}

/// The desired state of a topic as declared by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Owning project. Immutable, case-insensitive.
    pub project_name: String,
    /// Topic name. Immutable, case-insensitive.
    pub name: String,
    /// Number of shards. Immutable.
    pub shard_count: i64,
    /// Retention in days. Mutable.
    pub life_cycle: i64,
    /// Description. Mutable.
    #[serde(default = "default_comment")]
    pub comment: String,
    /// `TUPLE` or `BLOB`. Immutable.
    pub record_type: String,
    /// Field name to field type. Immutable, TUPLE only.
    #[serde(default)]
    pub record_schema: BTreeMap<String, String>,
}

impl TopicConfig {
    /// Create a config with the default comment and no fields.
    pub fn new(
        project_name: impl Into<String>,
        name: impl Into<String>,
        shard_count: i64,
        life_cycle: i64,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            name: name.into(),
            shard_count,
            life_cycle,
            comment: default_comment(),
            record_type: record_type.into(),
            record_schema: BTreeMap::new(),
        }
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Add a record schema field.
    pub fn with_field(mut self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.record_schema.insert(name.into(), field_type.into());
        self
    }

    /// Parse a config from JSON, applying defaults and validating first.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        if let Some(diag) = validate_config_value(value)
            .into_iter()
            .find(Diagnostic::is_error)
        {
            return Err(diagnostic_to_error(diag));
        }
        Ok(serde_json::from_value(topic_schema().apply_defaults(value.clone()))?)
    }

    /// Check every constraint.
    pub fn validate(&self) -> Result<(), ProviderError> {
        let value = serde_json::to_value(self)?;
        match validate_config_value(&value)
            .into_iter()
            .find(Diagnostic::is_error)
        {
            Some(diag) => Err(diagnostic_to_error(diag)),
            None => Ok(()),
        }
    }

    /// The identity this config will have once created.
    pub fn id(&self) -> TopicId {
        TopicId::new(&self.project_name, &self.name)
    }

    fn to_topic(&self) -> Result<Topic, ProviderError> {
        let record_type: RecordType = self
            .record_type
            .parse()
            .map_err(|msg: String| ProviderError::validation("record_type", msg))?;
        let record_schema = match record_type {
            RecordType::Tuple => self.record_schema.clone(),
            RecordType::Blob => BTreeMap::new(),
        };
        Ok(Topic {
            project_name: self.project_name.clone(),
            topic_name: self.name.clone(),
            shard_count: self.shard_count,
            life_cycle: self.life_cycle,
            comment: self.comment.clone(),
            record_type,
            record_schema,
            create_time: 0,
            last_modify_time: 0,
        })
    }
}

/// Everything known about a topic after a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicState {
    /// Configurable attributes, as reported by the service.
    #[serde(flatten)]
    pub config: TopicConfig,
    /// Creation time, human-readable.
    #[serde(default)]
    pub create_time: String,
    /// Last modification time, human-readable.
    #[serde(default)]
    pub last_modify_time: String,
}

/// The reconciler's local view of a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Normalised identity.
    pub id: TopicId,
    /// Last observed state.
    pub state: TopicState,
}

impl ResourceRecord {
    /// Build a record from a topic returned by the service.
    pub fn from_topic(topic: &Topic) -> Self {
        Self {
            id: TopicId::new(&topic.project_name, &topic.topic_name),
            state: TopicState {
                config: TopicConfig {
                    project_name: topic.project_name.clone(),
                    name: topic.topic_name.clone(),
                    shard_count: topic.shard_count,
                    life_cycle: topic.life_cycle,
                    comment: topic.comment.clone(),
                    record_type: topic.record_type.to_string(),
                    record_schema: topic.record_schema.clone(),
                },
                create_time: format_timestamp(topic.create_time),
                last_modify_time: format_timestamp(topic.last_modify_time),
            },
        }
    }

    /// The identity string, `project:topic` in lowercase.
    pub fn identity(&self) -> String {
        self.id.to_string()
    }

    /// Render as a JSON state with an `id` attribute.
    pub fn to_value(&self) -> Result<Value, ProviderError> {
        let mut value = serde_json::to_value(&self.state)?;
        if let Value::Object(ref mut map) = value {
            map.insert("id".to_string(), Value::String(self.identity()));
        }
        Ok(value)
    }

    /// Parse a JSON state written by [`ResourceRecord::to_value`].
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        let id = state_id(value)?;
        let schema = topic_schema();
        let value = schema.apply_defaults(value.clone());
        validate_strict(&schema, &value)?;
        let state: TopicState = serde_json::from_value(value)?;
        Ok(Self { id, state })
    }
}

/// Extract and parse the `id` attribute of a JSON state.
pub fn state_id(state: &Value) -> Result<TopicId, ProviderError> {
    let identity = state.get("id").and_then(Value::as_str).unwrap_or_default();
    TopicId::parse(identity)
}

/// Render epoch seconds as `YYYY-MM-DD HH:MM:SS +0000 UTC`.
pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S %z UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Reconciles topics against the service through an injected client.
pub struct TopicReconciler<C: DatahubClient> {
    client: Arc<C>,
    options: ReconcilerOptions,
}

impl<C: DatahubClient> TopicReconciler<C> {
    /// Create a reconciler over `client`.
    pub fn new(client: Arc<C>, options: ReconcilerOptions) -> Self {
        Self { client, options }
    }

    /// The injected client.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// The active options.
    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    /// Create the topic and read it back.
    #[instrument(skip_all, name = "topic.create", fields(identity = %desired.id()))]
    pub async fn create(&self, desired: &TopicConfig) -> Result<ResourceRecord, ProviderError> {
        desired.validate()?;
        let topic = desired.to_topic()?;
        let id = desired.id();

        if let Err(err) = self.client.create_topic(&topic).await {
            error!(error = %err, "Create failed");
            return Err(ProviderError::upstream(Operation::Create, id.to_string(), err));
        }
        info!(shards = topic.shard_count, record_type = %topic.record_type, "Topic created");

        self.read_id(&id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    /// Refresh a topic from the service.
    ///
    /// Returns `Ok(None)` when the topic no longer exists; the caller drops
    /// the record.
    #[instrument(skip(self), name = "topic.read")]
    pub async fn read(&self, identity: &str) -> Result<Option<ResourceRecord>, ProviderError> {
        let id = TopicId::parse(identity)?;
        self.read_id(&id).await
    }

    async fn read_id(&self, id: &TopicId) -> Result<Option<ResourceRecord>, ProviderError> {
        match self.client.get_topic(id.project(), id.topic()).await {
            Ok(topic) => {
                debug!(identity = %id, "Topic read");
                Ok(Some(ResourceRecord::from_topic(&topic)))
            },
            Err(err) if self.client.is_not_found(&err) => {
                warn!(identity = %id, "Topic no longer exists");
                Ok(None)
            },
            Err(err) => Err(ProviderError::upstream(Operation::Read, id.to_string(), err)),
        }
    }

    /// Bring the mutable attributes of `record` in line with `desired`.
    ///
    /// Changing an immutable attribute is rejected; the topic has to be
    /// replaced instead.
    #[instrument(skip_all, name = "topic.update", fields(identity = %record.id))]
    pub async fn update(
        &self,
        record: &ResourceRecord,
        desired: &TopicConfig,
    ) -> Result<ResourceRecord, ProviderError> {
        desired.validate()?;

        let schema = topic_schema();
        let prior = serde_json::to_value(&record.state.config)?;
        let proposed = serde_json::to_value(desired)?;
        let changes = diff(&schema, &prior, &proposed);

        let mut update = TopicUpdate::default();
        for change in &changes {
            match change.path.as_str() {
                "life_cycle" => update.life_cycle = Some(desired.life_cycle),
                "comment" => update.comment = Some(desired.comment.clone()),
                immutable => {
                    return Err(ProviderError::validation(
                        immutable,
                        "cannot be changed in place; the topic must be replaced",
                    ))
                },
            }
        }

        let id = &record.id;
        if update.is_empty() {
            debug!("No mutable attribute changed");
        } else {
            if let Err(err) = self
                .client
                .update_topic(id.project(), id.topic(), &update)
                .await
            {
                error!(error = %err, "Update failed");
                return Err(ProviderError::upstream(Operation::Update, id.to_string(), err));
            }
            info!(
                life_cycle = ?update.life_cycle,
                comment_changed = update.comment.is_some(),
                "Topic updated"
            );
        }

        self.read_id(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    /// Delete a topic, succeeding if it is already gone.
    #[instrument(skip(self), name = "topic.delete")]
    pub async fn delete(&self, identity: &str) -> Result<(), ProviderError> {
        let id = TopicId::parse(identity)?;
        let client: &C = &self.client;
        let backoff = self.options.backoff;
        let id_ref = &id;

        let result = retry_until(self.options.delete_timeout, |attempt| async move {
            let delay = backoff.delay(attempt);
            if let Err(err) = client.get_topic(id_ref.project(), id_ref.topic()).await {
                return classify(client, err, delay);
            }
            match client.delete_topic(id_ref.project(), id_ref.topic()).await {
                Ok(()) => RetryOutcome::Success(()),
                Err(err) => classify(client, err, delay),
            }
        })
        .await;

        match result {
            Ok(()) => {
                info!("Topic deleted");
                Ok(())
            },
            Err(RetryError::Fatal(err)) => {
                error!(error = %err, "Delete failed");
                Err(ProviderError::upstream(Operation::Delete, id.to_string(), err))
            },
            Err(RetryError::Timeout {
                elapsed,
                attempts,
                last_error,
            }) => {
                error!(elapsed = ?elapsed, attempts, "Delete retry budget exhausted");
                Err(ProviderError::Timeout {
                    operation: Operation::Delete,
                    identity: id.to_string(),
                    elapsed,
                    last_error: last_error.map(|err| Box::new(err) as BoxError),
                })
            },
        }
    }
}

fn classify<C: DatahubClient>(
    client: &C,
    err: C::Error,
    delay: Duration,
) -> RetryOutcome<(), C::Error> {
    if client.is_not_found(&err) {
        RetryOutcome::Success(())
    } else if client.is_retryable(&err) {
        warn!(error = %err, delay = ?delay, "Retryable error");
        RetryOutcome::RetryAfter { delay, cause: err }
    } else {
        RetryOutcome::Fatal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DatahubError;
    use crate::retry::ExponentialBackoff;
    use crate::testing::FakeDatahubClient;
    use tokio_test::{assert_err, assert_ok};

    fn reconciler() -> (Arc<FakeDatahubClient>, TopicReconciler<FakeDatahubClient>) {
        let client = Arc::new(FakeDatahubClient::new());
        let reconciler = TopicReconciler::new(Arc::clone(&client), ReconcilerOptions::default());
        (client, reconciler)
    }

    fn tuple_config() -> TopicConfig {
        TopicConfig::new("Proj", "Topic1", 4, 3, "TUPLE").with_field("f1", "STRING")
    }

    #[tokio::test]
    async fn test_create_scenario() {
        let (_client, reconciler) = reconciler();

        let record = reconciler.create(&tuple_config()).await.unwrap();
        assert_eq!(record.identity(), "proj:topic1");

        let read = reconciler.read("proj:topic1").await.unwrap().unwrap();
        assert_eq!(read.state.config.shard_count, 4);
        assert_eq!(read.state.config.life_cycle, 3);
    }

    #[tokio::test]
    async fn test_identity_ignores_input_case() {
        let (_client, reconciler) = reconciler();

        for (project, name) in [("PROJ", "TOPIC1"), ("pRoJ", "tOpIc2"), ("proj", "topic3")] {
            let config = TopicConfig::new(project, name, 1, 1, "BLOB");
            let record = reconciler.create(&config).await.unwrap();
            assert_eq!(
                record.identity(),
                format!("{}:{}", project.to_lowercase(), name.to_lowercase())
            );
        }
    }

    #[tokio::test]
    async fn test_read_after_create_matches_config() {
        let (_client, reconciler) = reconciler();
        let config = tuple_config().with_comment("Orders stream");

        let record = reconciler.create(&config).await.unwrap();
        let state = &record.state;
        assert!(state.config.project_name.eq_ignore_ascii_case(&config.project_name));
        assert!(state.config.name.eq_ignore_ascii_case(&config.name));
        assert_eq!(state.config.shard_count, config.shard_count);
        assert_eq!(state.config.life_cycle, config.life_cycle);
        assert!(state.config.comment.eq_ignore_ascii_case(&config.comment));
        assert_eq!(state.config.record_type, "TUPLE");
        assert_eq!(state.config.record_schema, config.record_schema);
        assert!(!state.create_time.is_empty());
        assert!(!state.last_modify_time.is_empty());
        assert!(state.create_time.ends_with("+0000 UTC"));
    }

    #[tokio::test]
    async fn test_create_applies_default_comment() {
        let (client, reconciler) = reconciler();
        reconciler
            .create(&TopicConfig::new("proj", "blobs", 2, 1, "BLOB"))
            .await
            .unwrap();

        let stored = client.topic("proj", "blobs").unwrap();
        assert_eq!(stored.comment, DEFAULT_COMMENT);
        assert_eq!(stored.record_type, RecordType::Blob);
    }

    #[tokio::test]
    async fn test_blob_topic_drops_record_schema() {
        let (client, reconciler) = reconciler();
        let config = TopicConfig::new("proj", "blobs", 2, 1, "BLOB").with_field("f1", "STRING");

        let record = reconciler.create(&config).await.unwrap();
        assert!(record.state.config.record_schema.is_empty());
        assert!(client.topic("proj", "blobs").unwrap().record_schema.is_empty());
    }

    #[tokio::test]
    async fn test_create_validation_fails_fast() {
        let cases = [
            (TopicConfig::new("proj", "t", 0, 3, "BLOB"), "shard_count"),
            (TopicConfig::new("proj", "t", 257, 3, "BLOB"), "shard_count"),
            (TopicConfig::new("proj", "t", 1, 8, "BLOB"), "life_cycle"),
            (TopicConfig::new("proj", "t", 1, 0, "BLOB"), "life_cycle"),
            (TopicConfig::new("proj", "t", 1, 1, "JSON"), "record_type"),
            (TopicConfig::new("pr", "t", 1, 1, "BLOB"), "project_name"),
            (TopicConfig::new("proj", "bad-name", 1, 1, "BLOB"), "name"),
            (
                TopicConfig::new("proj", "t", 1, 1, "BLOB").with_comment("x".repeat(256)),
                "comment",
            ),
            (TopicConfig::new("proj", "t", 1, 1, "TUPLE"), "record_schema"),
            (
                TopicConfig::new("proj", "t", 1, 1, "TUPLE").with_field("f1", "VARCHAR"),
                "record_schema",
            ),
        ];

        for (config, attribute) in cases {
            let (client, reconciler) = reconciler();
            let err = reconciler.create(&config).await.unwrap_err();
            assert_eq!(err.attribute(), Some(attribute), "config: {:?}", config);
            assert_eq!(client.calls().total(), 0);
        }
    }

    #[tokio::test]
    async fn test_create_upstream_failure_not_retried() {
        let (client, reconciler) = reconciler();
        client.fail_next_create(DatahubError::new("LimitExceeded", "quota"));

        let err = reconciler.create(&tuple_config()).await.unwrap_err();
        assert_eq!(err.operation(), Some(Operation::Create));
        assert!(err.to_string().contains("proj:topic1"));
        assert!(err.to_string().contains("create"));
        assert_eq!(client.calls().create, 1);
        assert_eq!(client.calls().get, 0);
    }

    #[tokio::test]
    async fn test_read_malformed_identity() {
        let (client, reconciler) = reconciler();

        for identity in ["proj", "proj:topic:extra", ":topic", "proj:", ""] {
            let err = reconciler.read(identity).await.unwrap_err();
            assert!(matches!(err, ProviderError::MalformedIdentity(_)));
        }
        assert_eq!(client.calls().get, 0);
    }

    #[tokio::test]
    async fn test_read_gone_returns_none() {
        let (client, reconciler) = reconciler();
        reconciler.create(&tuple_config()).await.unwrap();
        client.remove_topic("proj", "topic1");

        let read = assert_ok!(reconciler.read("proj:topic1").await);
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_read_upstream_failure() {
        let (client, reconciler) = reconciler();
        client.fail_next_get(DatahubError::new("InvalidParameter", "bad request"));

        let err = assert_err!(reconciler.read("proj:topic1").await);
        assert_eq!(err.operation(), Some(Operation::Read));
        assert!(err.to_string().contains("proj:topic1"));
    }

    #[tokio::test]
    async fn test_read_overwrites_from_remote() {
        let (client, reconciler) = reconciler();
        reconciler.create(&tuple_config()).await.unwrap();
        client.edit_topic("proj", "topic1", |topic| {
            topic.life_cycle = 6;
            topic.comment = "changed elsewhere".to_string();
            topic.last_modify_time += 60;
        });

        let read = reconciler.read("PROJ:TOPIC1").await.unwrap().unwrap();
        assert_eq!(read.identity(), "proj:topic1");
        assert_eq!(read.state.config.life_cycle, 6);
        assert_eq!(read.state.config.comment, "changed elsewhere");
        assert_ne!(read.state.create_time, read.state.last_modify_time);
    }

    #[tokio::test]
    async fn test_update_without_changes_skips_remote_update() {
        let (client, reconciler) = reconciler();
        let record = reconciler.create(&tuple_config()).await.unwrap();
        let before = client.calls();

        // Case-only differences are suppressed as well
        let desired = TopicConfig::new("PROJ", "topic1", 4, 3, "TUPLE")
            .with_field("f1", "STRING")
            .with_comment(DEFAULT_COMMENT.to_uppercase());
        let updated = reconciler.update(&record, &desired).await.unwrap();

        assert_eq!(client.calls().update, before.update);
        assert!(client.updates().is_empty());
        assert_eq!(updated, record);
    }

    #[tokio::test]
    async fn test_update_combines_changed_fields() {
        let (client, reconciler) = reconciler();
        let record = reconciler.create(&tuple_config()).await.unwrap();

        let desired = tuple_config().with_comment("retention bumped");
        let desired = TopicConfig {
            life_cycle: 7,
            ..desired
        };
        let updated = reconciler.update(&record, &desired).await.unwrap();

        assert_eq!(client.calls().update, 1);
        assert_eq!(
            client.updates(),
            vec![TopicUpdate {
                life_cycle: Some(7),
                comment: Some("retention bumped".to_string()),
            }]
        );
        assert_eq!(updated.state.config.life_cycle, 7);
        assert_eq!(updated.state.config.comment, "retention bumped");
    }

    #[tokio::test]
    async fn test_update_sends_only_changed_fields() {
        let (client, reconciler) = reconciler();
        let record = reconciler.create(&tuple_config()).await.unwrap();

        let desired = TopicConfig {
            life_cycle: 5,
            ..tuple_config()
        };
        reconciler.update(&record, &desired).await.unwrap();

        assert_eq!(
            client.updates(),
            vec![TopicUpdate {
                life_cycle: Some(5),
                comment: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_update_rejects_immutable_change() {
        let (client, reconciler) = reconciler();
        let record = reconciler.create(&tuple_config()).await.unwrap();

        let desired = TopicConfig {
            shard_count: 8,
            ..tuple_config()
        };
        let err = reconciler.update(&record, &desired).await.unwrap_err();
        assert_eq!(err.attribute(), Some("shard_count"));
        assert_eq!(client.calls().update, 0);
    }

    #[tokio::test]
    async fn test_update_failure_not_retried() {
        let (client, reconciler) = reconciler();
        let record = reconciler.create(&tuple_config()).await.unwrap();
        client.fail_next_update(DatahubError::new("ServiceUnavailable", "down"));

        let desired = TopicConfig {
            life_cycle: 2,
            ..tuple_config()
        };
        let err = reconciler.update(&record, &desired).await.unwrap_err();
        assert_eq!(err.operation(), Some(Operation::Update));
        assert_eq!(client.calls().update, 1);
    }

    #[tokio::test]
    async fn test_update_of_vanished_topic() {
        let (client, reconciler) = reconciler();
        let record = reconciler.create(&tuple_config()).await.unwrap();
        client.remove_topic("proj", "topic1");

        let err = reconciler.update(&record, &tuple_config()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_absent_topic_succeeds() {
        let (client, reconciler) = reconciler();

        assert_ok!(reconciler.delete("proj:missing").await);
        assert_eq!(client.calls().delete, 0);
    }

    #[tokio::test]
    async fn test_delete_existing_topic() {
        let (client, reconciler) = reconciler();
        reconciler.create(&tuple_config()).await.unwrap();

        assert_ok!(reconciler.delete("proj:topic1").await);
        assert!(client.topic("proj", "topic1").is_none());
        assert_eq!(reconciler.read("proj:topic1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_tolerates_concurrent_removal() {
        let (client, reconciler) = reconciler();
        reconciler.create(&tuple_config()).await.unwrap();
        client.fail_next_delete(DatahubError::no_such_topic("proj", "topic1"));

        assert_ok!(reconciler.delete("proj:topic1").await);
        assert_eq!(client.calls().delete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_retries_transient_errors() {
        let (client, reconciler) = reconciler();
        reconciler.create(&tuple_config()).await.unwrap();
        client.fail_next_get(DatahubError::new("ServiceUnavailable", "later"));
        client.fail_next_delete(DatahubError::new("LimitExceeded", "slow down"));

        assert_ok!(reconciler.delete("proj:topic1").await);
        assert_eq!(client.calls().delete, 2);
        assert!(client.topic("proj", "topic1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_times_out_on_endless_retryable_errors() {
        let client = Arc::new(FakeDatahubClient::new());
        let options = ReconcilerOptions::new()
            .with_delete_timeout(Duration::from_secs(180))
            .with_backoff(ExponentialBackoff::new().with_initial(Duration::from_secs(1)));
        let reconciler = TopicReconciler::new(Arc::clone(&client), options);
        reconciler.create(&tuple_config()).await.unwrap();
        client.fail_every_delete(DatahubError::new("LimitExceeded", "slow down"));

        let start = tokio::time::Instant::now();
        let err = reconciler.delete("proj:topic1").await.unwrap_err();

        assert!(err.is_timeout(), "expected timeout, got {:?}", err);
        assert_eq!(err.operation(), Some(Operation::Delete));
        assert!(err.to_string().contains("slow down"));
        assert!(start.elapsed() >= Duration::from_secs(180));
        assert!(client.calls().delete > 1);
        assert!(client.topic("proj", "topic1").is_some());
    }

    #[tokio::test]
    async fn test_delete_fatal_error_propagates() {
        let (client, reconciler) = reconciler();
        reconciler.create(&tuple_config()).await.unwrap();
        client.fail_next_delete(DatahubError::new("AuthorizationFailed", "denied"));

        let err = reconciler.delete("proj:topic1").await.unwrap_err();
        assert_eq!(err.operation(), Some(Operation::Delete));
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("AuthorizationFailed"));
        assert_eq!(client.calls().delete, 1);
    }

    #[tokio::test]
    async fn test_delete_malformed_identity() {
        let (_client, reconciler) = reconciler();
        let err = reconciler.delete("no-separator").await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedIdentity(_)));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 +0000 UTC");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 +0000 UTC");
    }

    #[test]
    fn test_record_json_roundtrip_keeps_id() {
        let topic = Topic {
            project_name: "Proj".to_string(),
            topic_name: "Topic1".to_string(),
            shard_count: 4,
            life_cycle: 3,
            comment: DEFAULT_COMMENT.to_string(),
            record_type: RecordType::Tuple,
            record_schema: BTreeMap::from([("f1".to_string(), "STRING".to_string())]),
            create_time: 1_700_000_000,
            last_modify_time: 1_700_000_000,
        };
        let record = ResourceRecord::from_topic(&topic);
        let value = record.to_value().unwrap();
        assert_eq!(value["id"], "proj:topic1");
        assert_eq!(value["record_schema"]["f1"], "STRING");

        assert_eq!(ResourceRecord::from_value(&value).unwrap(), record);
    }

    #[test]
    fn test_config_from_value_applies_defaults() {
        let config = TopicConfig::from_value(&serde_json::json!({
            "project_name": "proj",
            "name": "blobs",
            "shard_count": 1,
            "life_cycle": 1,
            "record_type": "BLOB"
        }))
        .unwrap();
        assert_eq!(config.comment, DEFAULT_COMMENT);
        assert!(config.record_schema.is_empty());

        let err = TopicConfig::from_value(&serde_json::json!({
            "project_name": "proj",
            "name": "blobs",
            "shard_count": "one",
            "life_cycle": 1,
            "record_type": "BLOB"
        }))
        .unwrap_err();
        assert_eq!(err.attribute(), Some("shard_count"));
    }

    #[test]
    fn test_blob_record_schema_is_a_warning() {
        let config = serde_json::to_value(
            TopicConfig::new("proj", "blobs", 2, 1, "BLOB").with_field("f1", "STRING"),
        )
        .unwrap();

        let diagnostics = validate_config_value(&config);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_error());
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("record_schema"));
        assert!(TopicConfig::from_value(&config).is_ok());

        let config = serde_json::to_value(TopicConfig::new("proj", "blobs", 2, 1, "BLOB")).unwrap();
        assert!(validate_config_value(&config).is_empty());
    }

    #[test]
    fn test_whole_float_is_a_validation_error() {
        let config = serde_json::json!({
            "project_name": "proj",
            "name": "blobs",
            "shard_count": 4.0,
            "life_cycle": 1,
            "record_type": "BLOB"
        });

        let diagnostics = validate_config_value(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("shard_count"));

        let err = TopicConfig::from_value(&config).unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
        assert_eq!(err.attribute(), Some("shard_count"));
    }

    #[test]
    fn test_record_from_value_rejects_whole_float() {
        let state = serde_json::json!({
            "id": "proj:blobs",
            "project_name": "proj",
            "name": "blobs",
            "shard_count": 1,
            "life_cycle": 3.0,
            "record_type": "BLOB"
        });

        let err = ResourceRecord::from_value(&state).unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
        assert_eq!(err.attribute(), Some("life_cycle"));
    }
}
