//! Testing utilities.
//!
//! [`FakeDatahubClient`] is an in-memory [`DatahubClient`] with call counters
//! and scripted failures. [`ProviderTester`] drives any [`ProviderService`]
//! through plan and apply lifecycles without a host.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hemmer_provider_datahub::testing::{FakeDatahubClient, ProviderTester};
//! use hemmer_provider_datahub::DatahubProvider;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let client = Arc::new(FakeDatahubClient::new());
//! let tester = ProviderTester::new(DatahubProvider::new(Arc::clone(&client)));
//!
//! let state = tester
//!     .lifecycle_create(
//!         "alicloud_datahub_topic",
//!         json!({
//!             "project_name": "Proj",
//!             "name": "Topic1",
//!             "shard_count": 4,
//!             "life_cycle": 3,
//!             "record_type": "BLOB"
//!         }),
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(state["id"], "proj:topic1");
//! assert_eq!(client.calls().create, 1);
//! # });
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::client::{DatahubClient, DatahubError, Topic, TopicUpdate};
use crate::error::ProviderError;
use crate::provider::{ImportedResource, PlanResult, ProviderService};
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.resource_types()
    }

    /// Configure the provider.
    ///
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run plan → create → read and return the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created_state = self
            .create(resource_type, plan_result.planned_state)
            .await?;
        self.read(resource_type, created_state).await
    }

    /// Run plan → update → read and return the state after read.
    ///
    /// A plan that requires replacement is reported as an error instead of
    /// being applied in place.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        if plan_result.requires_replace {
            let schema = self.schema();
            let forced = schema
                .resources
                .get(resource_type)
                .and_then(|schema| {
                    plan_result
                        .changes
                        .iter()
                        .find(|change| change.forces_replacement(schema))
                })
                .map(|change| change.path.clone())
                .unwrap_or_default();
            return Err(ProviderError::validation(forced, "plan requires replacement"));
        }

        let updated_state = self
            .update(resource_type, prior_state, plan_result.planned_state)
            .await?;
        self.read(resource_type, updated_state).await
    }

    /// Run plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Run create → update → delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created_state = self.lifecycle_create(resource_type, initial_config).await?;
        let updated_state = self
            .lifecycle_update(resource_type, created_state, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated_state.clone())
            .await?;
        Ok(updated_state)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Fake client
// =========================================================================

/// Number of calls received per remote operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `create_topic` calls.
    pub create: usize,
    /// `get_topic` calls.
    pub get: usize,
    /// `update_topic` calls.
    pub update: usize,
    /// `delete_topic` calls.
    pub delete: usize,
}

impl CallCounts {
    /// Calls across all operations.
    pub fn total(&self) -> usize {
        self.create + self.get + self.update + self.delete
    }
}

const FAKE_EPOCH: u64 = 1_700_000_000;

#[derive(Debug, Default)]
struct FakeState {
    topics: BTreeMap<(String, String), Topic>,
    ticks: u64,
    calls: CallCounts,
    updates: Vec<TopicUpdate>,
    create_failures: VecDeque<DatahubError>,
    get_failures: VecDeque<DatahubError>,
    update_failures: VecDeque<DatahubError>,
    delete_failures: VecDeque<DatahubError>,
    delete_always_fails: Option<DatahubError>,
}

impl FakeState {
    fn now(&mut self) -> u64 {
        self.ticks += 1;
        FAKE_EPOCH + self.ticks
    }
}

fn key(project: &str, topic: &str) -> (String, String) {
    (project.to_lowercase(), topic.to_lowercase())
}

/// In-memory DataHub service.
///
/// Names are matched case-insensitively and stored as given. Timestamps
/// start at a fixed epoch and advance by one second per write. Scripted
/// failures are returned, in order, before the call touches any state.
#[derive(Debug, Default)]
pub struct FakeDatahubClient {
    state: Mutex<FakeState>,
}

impl FakeDatahubClient {
    /// Create an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a topic directly, bypassing call counters.
    pub fn insert_topic(&self, topic: Topic) {
        let mut state = self.lock();
        state
            .topics
            .insert(key(&topic.project_name, &topic.topic_name), topic);
    }

    /// Look up a stored topic.
    pub fn topic(&self, project: &str, topic: &str) -> Option<Topic> {
        self.lock().topics.get(&key(project, topic)).cloned()
    }

    /// Remove a topic as if someone deleted it out of band.
    pub fn remove_topic(&self, project: &str, topic: &str) -> Option<Topic> {
        self.lock().topics.remove(&key(project, topic))
    }

    /// Modify a stored topic out of band.
    pub fn edit_topic(&self, project: &str, topic: &str, edit: impl FnOnce(&mut Topic)) {
        if let Some(stored) = self.lock().topics.get_mut(&key(project, topic)) {
            edit(stored);
        }
    }

    /// Calls received so far.
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Every update payload received, in order.
    pub fn updates(&self) -> Vec<TopicUpdate> {
        self.lock().updates.clone()
    }

    /// Fail the next `create_topic` call with `err`.
    pub fn fail_next_create(&self, err: DatahubError) {
        self.lock().create_failures.push_back(err);
    }

    /// Fail the next `get_topic` call with `err`.
    pub fn fail_next_get(&self, err: DatahubError) {
        self.lock().get_failures.push_back(err);
    }

    /// Fail the next `update_topic` call with `err`.
    pub fn fail_next_update(&self, err: DatahubError) {
        self.lock().update_failures.push_back(err);
    }

    /// Fail the next `delete_topic` call with `err`.
    pub fn fail_next_delete(&self, err: DatahubError) {
        self.lock().delete_failures.push_back(err);
    }

    /// Fail every `delete_topic` call with `err`.
    pub fn fail_every_delete(&self, err: DatahubError) {
        self.lock().delete_always_fails = Some(err);
    }
}

#[async_trait::async_trait]
impl DatahubClient for FakeDatahubClient {
    type Error = DatahubError;

    async fn create_topic(&self, topic: &Topic) -> Result<(), DatahubError> {
        let mut state = self.lock();
        state.calls.create += 1;
        if let Some(err) = state.create_failures.pop_front() {
            return Err(err);
        }

        let key = key(&topic.project_name, &topic.topic_name);
        if state.topics.contains_key(&key) {
            return Err(DatahubError::new(
                "TopicAlreadyExist",
                format!("topic '{}/{}' already exists", key.0, key.1),
            ));
        }

        let now = state.now();
        let mut stored = topic.clone();
        stored.create_time = now;
        stored.last_modify_time = now;
        state.topics.insert(key, stored);
        Ok(())
    }

    async fn get_topic(&self, project: &str, topic: &str) -> Result<Topic, DatahubError> {
        let mut state = self.lock();
        state.calls.get += 1;
        if let Some(err) = state.get_failures.pop_front() {
            return Err(err);
        }

        state
            .topics
            .get(&key(project, topic))
            .cloned()
            .ok_or_else(|| DatahubError::no_such_topic(project, topic))
    }

    async fn update_topic(
        &self,
        project: &str,
        topic: &str,
        update: &TopicUpdate,
    ) -> Result<(), DatahubError> {
        let mut state = self.lock();
        state.calls.update += 1;
        state.updates.push(update.clone());
        if let Some(err) = state.update_failures.pop_front() {
            return Err(err);
        }

        let now = state.now();
        let stored = state
            .topics
            .get_mut(&key(project, topic))
            .ok_or_else(|| DatahubError::no_such_topic(project, topic))?;
        if let Some(life_cycle) = update.life_cycle {
            stored.life_cycle = life_cycle;
        }
        if let Some(comment) = &update.comment {
            stored.comment = comment.clone();
        }
        stored.last_modify_time = now;
        Ok(())
    }

    async fn delete_topic(&self, project: &str, topic: &str) -> Result<(), DatahubError> {
        let mut state = self.lock();
        state.calls.delete += 1;
        if let Some(err) = state.delete_failures.pop_front() {
            return Err(err);
        }
        if let Some(err) = &state.delete_always_fails {
            return Err(err.clone());
        }

        state
            .topics
            .remove(&key(project, topic))
            .map(|_| ())
            .ok_or_else(|| DatahubError::no_such_topic(project, topic))
    }

    fn is_not_found(&self, err: &DatahubError) -> bool {
        err.is_not_found()
    }

    fn is_retryable(&self, err: &DatahubError) -> bool {
        err.is_retryable()
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result indicates the resource will be created.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.is_noop(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(
        !plan.requires_replace,
        "Expected plan to create, not replace"
    );
}

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.is_noop(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changed_paths()
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan does not require resource replacement.
///
/// # Panics
///
/// Panics if the plan requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changed_paths()
    );
}

/// Assert that a plan does not have a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan has a change for the given path.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        !has_change,
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that some error diagnostic points at `attribute`.
///
/// # Panics
///
/// Panics if no error diagnostic names the attribute.
pub fn assert_error_on_attribute(diagnostics: &[Diagnostic], attribute: &str) {
    let found = diagnostics.iter().any(|d| {
        matches!(d.severity, DiagnosticSeverity::Error) && d.attribute.as_deref() == Some(attribute)
    });
    assert!(
        found,
        "Expected an error on '{}', but errors were on {:?}",
        attribute,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.attribute)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RecordType;
    use crate::provider::DatahubProvider;
    use crate::topic::RESOURCE_TYPE;
    use serde_json::json;
    use std::sync::Arc;

    fn tester() -> (Arc<FakeDatahubClient>, ProviderTester<DatahubProvider<FakeDatahubClient>>) {
        let client = Arc::new(FakeDatahubClient::new());
        let tester = ProviderTester::new(DatahubProvider::new(Arc::clone(&client)));
        (client, tester)
    }

    fn config() -> Value {
        json!({
            "project_name": "Proj",
            "name": "Topic1",
            "shard_count": 4,
            "life_cycle": 3,
            "record_type": "TUPLE",
            "record_schema": {"f1": "STRING"}
        })
    }

    #[tokio::test]
    async fn test_fake_client_round_trip() {
        let client = FakeDatahubClient::new();
        let topic = Topic {
            project_name: "Proj".to_string(),
            topic_name: "Topic1".to_string(),
            shard_count: 1,
            life_cycle: 1,
            comment: String::new(),
            record_type: RecordType::Blob,
            record_schema: BTreeMap::new(),
            create_time: 0,
            last_modify_time: 0,
        };

        client.create_topic(&topic).await.unwrap();
        let err = client.create_topic(&topic).await.unwrap_err();
        assert_eq!(err.code, "TopicAlreadyExist");

        let stored = client.get_topic("PROJ", "topic1").await.unwrap();
        assert_eq!(stored.topic_name, "Topic1");
        assert_eq!(stored.create_time, FAKE_EPOCH + 1);

        client.delete_topic("proj", "topic1").await.unwrap();
        let err = client.get_topic("proj", "topic1").await.unwrap_err();
        assert!(client.is_not_found(&err));
        assert_eq!(
            client.calls(),
            CallCounts {
                create: 2,
                get: 2,
                update: 0,
                delete: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_fake_client_scripted_failures() {
        let client = FakeDatahubClient::new();
        client.fail_next_get(DatahubError::new("ServiceUnavailable", "later"));

        let err = client.get_topic("proj", "t").await.unwrap_err();
        assert!(client.is_retryable(&err));
        let err = client.get_topic("proj", "t").await.unwrap_err();
        assert!(client.is_not_found(&err));
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let (_client, tester) = tester();
        assert!(tester.configure(json!({"delete_timeout_seconds": 30})).await.is_ok());

        let err = tester
            .configure(json!({"delete_timeout_seconds": -1}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(ref diags) if diags.len() == 1));
    }

    #[tokio::test]
    async fn test_tester_validate_resource_config() {
        let (_client, tester) = tester();
        assert!(tester
            .validate_resource_config(RESOURCE_TYPE, config())
            .await
            .is_ok());

        let mut invalid = config();
        invalid["record_type"] = json!("JSON");
        match tester.validate_resource_config(RESOURCE_TYPE, invalid).await {
            Err(TestError::Diagnostics(diags)) => assert_error_on_attribute(&diags, "record_type"),
            other => panic!("expected diagnostics, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tester_plans() {
        let (_client, tester) = tester();

        let plan = tester.plan_create(RESOURCE_TYPE, config()).await.unwrap();
        assert_plan_creates(&plan);
        assert_plan_changes_attribute(&plan, "record_schema");

        let state = tester.lifecycle_create(RESOURCE_TYPE, config()).await.unwrap();

        let plan = tester
            .plan_update(RESOURCE_TYPE, state.clone(), config())
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        let mut proposed = config();
        proposed["comment"] = json!("orders");
        let plan = tester
            .plan_update(RESOURCE_TYPE, state.clone(), proposed)
            .await
            .unwrap();
        assert_plan_updates_in_place(&plan);
        assert_plan_changes_attribute(&plan, "comment");
        assert_plan_does_not_change_attribute(&plan, "life_cycle");

        let mut proposed = config();
        proposed["record_type"] = json!("BLOB");
        let plan = tester
            .plan_update(RESOURCE_TYPE, state, proposed)
            .await
            .unwrap();
        assert_plan_replaces(&plan);
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let (client, tester) = tester();

        let mut updated = config();
        updated["life_cycle"] = json!(7);
        updated["comment"] = json!("a week of data");
        let final_state = tester
            .lifecycle_crud(RESOURCE_TYPE, config(), updated)
            .await
            .unwrap();

        assert_eq!(final_state["life_cycle"], 7);
        assert_eq!(final_state["comment"], "a week of data");
        assert_eq!(client.calls().update, 1);
        assert!(client.topic("proj", "topic1").is_none());
    }

    #[tokio::test]
    async fn test_tester_lifecycle_update_refuses_replacement() {
        let (client, tester) = tester();
        let state = tester.lifecycle_create(RESOURCE_TYPE, config()).await.unwrap();

        let mut proposed = config();
        proposed["shard_count"] = json!(16);
        let err = tester
            .lifecycle_update(RESOURCE_TYPE, state, proposed)
            .await
            .unwrap_err();
        assert_eq!(err.attribute(), Some("shard_count"));
        assert_eq!(client.calls().update, 0);
    }

    #[tokio::test]
    async fn test_tester_import() {
        let (_client, tester) = tester();
        tester.lifecycle_create(RESOURCE_TYPE, config()).await.unwrap();

        let imported = tester
            .import_resource(RESOURCE_TYPE, "proj:topic1")
            .await
            .unwrap();
        assert_eq!(imported[0].state["shard_count"], 4);
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected an error on 'life_cycle'")]
    fn test_assert_error_on_attribute_fails() {
        let diagnostics = vec![Diagnostic::error("Bad").with_attribute("comment")];
        assert_error_on_attribute(&diagnostics, "life_cycle");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Invalid value for attribute 'life_cycle'")
                .with_attribute("life_cycle"),
            Diagnostic::error("Missing required attribute 'name'").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("life_cycle"));
        assert!(display.contains("Missing required attribute"));
        assert!(display.contains("More info"));
    }
}
