//! The host-facing provider surface.
//!
//! [`ProviderService`] is the JSON-state interface a host drives;
//! [`DatahubProvider`] implements it for the `alicloud_datahub_topic`
//! resource on top of [`TopicReconciler`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::client::DatahubClient;
use crate::config::ReconcilerOptions;
use crate::diff::{diff, requires_replace, AttributeChange};
use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::topic::{
    state_id, topic_schema, validate_config_value, ResourceRecord, TopicConfig, TopicReconciler,
    RESOURCE_TYPE,
};

/// The outcome of planning one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State the topic will have once the plan is applied; `Null` for a delete.
    pub planned_state: Value,
    /// Attributes that differ from the prior state.
    pub changes: Vec<AttributeChange>,
    /// Whether an immutable attribute changed.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Plan a new topic.
    pub fn create(planned_state: Value, changes: Vec<AttributeChange>) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace: false,
        }
    }

    /// Plan removal of an existing topic.
    pub fn destroy(changes: Vec<AttributeChange>) -> Self {
        Self {
            planned_state: Value::Null,
            changes,
            requires_replace: false,
        }
    }

    /// Plan a change to an existing topic. `requires_replace` only holds when
    /// there is something to change.
    pub fn change(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        let requires_replace = requires_replace && !changes.is_empty();
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Whether applying the plan would leave the topic untouched.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Names of the changed attributes, in schema order.
    pub fn changed_paths(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.path.as_str()).collect()
    }
}

/// A topic adopted into state by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// Always [`RESOURCE_TYPE`].
    pub resource_type: String,
    /// The record as it would be stored in state.
    pub state: Value,
}

impl ImportedResource {
    /// Build the import entry for a record read from the remote.
    pub fn from_record(record: &ResourceRecord) -> Result<Self, ProviderError> {
        Ok(Self {
            resource_type: RESOURCE_TYPE.to_string(),
            state: record.to_value()?,
        })
    }
}

/// Trait that provider implementations must implement.
///
/// States cross this boundary as JSON objects; an absent resource is
/// `Value::Null`.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema
    // =========================================================================

    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Names of the supported resource types, sorted.
    fn resource_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.schema().resources.keys().cloned().collect();
        types.sort();
        types
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider. Returns diagnostics (errors and warnings).
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }
}

/// Provider for DataHub topics.
pub struct DatahubProvider<C: DatahubClient> {
    client: Arc<C>,
    options: RwLock<ReconcilerOptions>,
}

impl<C: DatahubClient> DatahubProvider<C> {
    /// Create a provider with default options.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_options(client, ReconcilerOptions::default())
    }

    /// Create a provider with the given options.
    pub fn with_options(client: Arc<C>, options: ReconcilerOptions) -> Self {
        Self {
            client,
            options: RwLock::new(options),
        }
    }

    /// The options currently in effect.
    pub async fn options(&self) -> ReconcilerOptions {
        self.options.read().await.clone()
    }

    async fn reconciler(&self) -> TopicReconciler<C> {
        TopicReconciler::new(Arc::clone(&self.client), self.options().await)
    }

    fn check_type(resource_type: &str) -> Result<(), ProviderError> {
        if resource_type == RESOURCE_TYPE {
            Ok(())
        } else {
            Err(ProviderError::UnknownResource(resource_type.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl<C: DatahubClient> ProviderService for DatahubProvider<C> {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ReconcilerOptions::config_schema())
            .with_resource(RESOURCE_TYPE, topic_schema())
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(ReconcilerOptions::validate_config(&config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = ReconcilerOptions::validate_config(&config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let options = ReconcilerOptions::from_config(&config)?;
        info!(delete_timeout = ?options.delete_timeout, "Provider configured");
        *self.options.write().await = options;
        Ok(diagnostics)
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Self::check_type(resource_type)?;
        Ok(validate_config_value(&config))
    }

    #[instrument(skip_all, fields(resource_type = %resource_type))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        Self::check_type(resource_type)?;
        let schema = topic_schema();
        let prior = prior_state.filter(|state| !state.is_null());

        if proposed_state.is_null() {
            let prior = prior.unwrap_or(Value::Null);
            let changes = diff(&schema, &prior, &Value::Null);
            debug!(changes = changes.len(), "Planned delete");
            return Ok(PlanResult::destroy(changes));
        }

        let proposed = schema.apply_defaults(proposed_state);
        TopicConfig::from_value(&proposed)?;

        let Some(prior) = prior else {
            let changes = diff(&schema, &Value::Null, &proposed);
            debug!(changes = changes.len(), "Planned create");
            return Ok(PlanResult::create(proposed, changes));
        };

        let changes = diff(&schema, &prior, &proposed);
        let replace = requires_replace(&schema, &changes);

        // Suppressed differences keep the prior value; a replacement starts
        // without an id or computed attributes.
        let mut planned = proposed;
        if let (Value::Object(planned), Value::Object(prior)) = (&mut planned, &prior) {
            for name in schema.attributes.keys() {
                if changes.iter().any(|change| &change.path == name) {
                    continue;
                }
                if let Some(value) = prior.get(name) {
                    if !replace || !schema.attributes[name].flags.is_computed_only() {
                        planned.insert(name.clone(), value.clone());
                    }
                }
            }
            if !replace {
                if let Some(id) = prior.get("id") {
                    planned.insert("id".to_string(), id.clone());
                }
            }
        }

        debug!(changes = changes.len(), requires_replace = replace, "Planned update");
        Ok(PlanResult::change(planned, changes, replace))
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        Self::check_type(resource_type)?;
        let desired = TopicConfig::from_value(&planned_state)?;
        let record = self.reconciler().await.create(&desired).await?;
        record.to_value()
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        Self::check_type(resource_type)?;
        let id = state_id(&current_state)?;
        match self.reconciler().await.read(&id.to_string()).await? {
            Some(record) => record.to_value(),
            None => Ok(Value::Null),
        }
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        Self::check_type(resource_type)?;
        let record = ResourceRecord::from_value(&prior_state)?;
        let desired = TopicConfig::from_value(&planned_state)?;
        let record = self.reconciler().await.update(&record, &desired).await?;
        record.to_value()
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        Self::check_type(resource_type)?;
        let id = state_id(&current_state)?;
        self.reconciler().await.delete(&id.to_string()).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Self::check_type(resource_type)?;
        match self.reconciler().await.read(id).await? {
            Some(record) => Ok(vec![ImportedResource::from_record(&record)?]),
            None => Err(ProviderError::NotFound(id.to_lowercase())),
        }
    }
}
