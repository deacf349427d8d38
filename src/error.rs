//! Error types for the DataHub provider.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Boxed cause carried by upstream and timeout errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The reconciler verb that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Creating a topic.
    Create,
    /// Reading a topic.
    Read,
    /// Updating a topic in place.
    Update,
    /// Deleting a topic.
    Delete,
}

impl Operation {
    /// Lowercase verb used in messages and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the reconciler and the provider surface.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Desired state failed validation before any remote call was made.
    #[error("Validation error on '{attribute}': {message}")]
    Validation {
        /// The offending attribute.
        attribute: String,
        /// What is wrong with it.
        message: String,
    },

    /// The identity string does not split into two non-empty components.
    #[error("Malformed identity '{0}': re-import this resource using its 'project_name' and 'name' attributes")]
    MalformedIdentity(String),

    /// A call to the remote API failed.
    #[error("Failed to {operation} topic '{identity}': {source}")]
    Upstream {
        /// The verb being attempted.
        operation: Operation,
        /// The topic identity.
        identity: String,
        /// The client error.
        #[source]
        source: BoxError,
    },

    /// The retry budget was exhausted.
    #[error("Timed out after {elapsed:?} trying to {operation} topic '{identity}'{}", last_error_suffix(.last_error))]
    Timeout {
        /// The verb being attempted.
        operation: Operation,
        /// The topic identity.
        identity: String,
        /// Time spent before giving up.
        elapsed: Duration,
        /// The last retryable error observed, if any.
        last_error: Option<BoxError>,
    },

    /// The topic no longer exists.
    #[error("Topic not found: {0}")]
    NotFound(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn last_error_suffix(last_error: &Option<BoxError>) -> String {
    match last_error {
        Some(err) => format!("; last error: {}", err),
        None => String::new(),
    }
}

impl ProviderError {
    /// Build a validation error for `attribute`.
    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Wrap a client error raised while running `operation` on `identity`.
    pub fn upstream<E>(operation: Operation, identity: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream {
            operation,
            identity: identity.into(),
            source: Box::new(source),
        }
    }

    /// Get the error message as a string.
    ///
    /// Returns the variant's payload without the category prefix added by
    /// `Display`.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::MalformedIdentity(identity) => identity.clone(),
            Self::Upstream { source, .. } => source.to_string(),
            Self::Timeout { last_error, .. } => last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "retry budget exhausted".to_string()),
            Self::NotFound(msg) => msg.clone(),
            Self::UnknownResource(msg) => msg.clone(),
            Self::Configuration(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
        }
    }

    /// The attribute named by a validation error.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Validation { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    /// The operation that failed, for upstream and timeout errors.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Upstream { operation, .. } | Self::Timeout { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Whether the topic was confirmed absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether a retry budget ran out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DatahubError;

    #[test]
    fn test_error_display() {
        let err = ProviderError::validation("shard_count", "must be between 1 and 256, got 0");
        assert_eq!(
            format!("{}", err),
            "Validation error on 'shard_count': must be between 1 and 256, got 0"
        );

        let err = ProviderError::MalformedIdentity("proj".to_string());
        assert!(format!("{}", err).contains("'project_name' and 'name'"));

        let err = ProviderError::UnknownResource("custom_resource".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: custom_resource");
    }

    #[test]
    fn test_upstream_names_operation_and_identity() {
        let err = ProviderError::upstream(
            Operation::Create,
            "proj:topic1",
            DatahubError::new("TopicAlreadyExist", "topic exists"),
        );
        let display = err.to_string();
        assert!(display.contains("create"));
        assert!(display.contains("proj:topic1"));
        assert!(display.contains("TopicAlreadyExist"));
        assert_eq!(err.operation(), Some(Operation::Create));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_display() {
        let err = ProviderError::Timeout {
            operation: Operation::Delete,
            identity: "proj:topic1".to_string(),
            elapsed: Duration::from_secs(180),
            last_error: Some(Box::new(DatahubError::new("LimitExceeded", "slow down"))),
        };
        let display = err.to_string();
        assert!(display.starts_with("Timed out after 180s trying to delete topic 'proj:topic1'"));
        assert!(display.contains("slow down"));
        assert!(err.is_timeout());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("proj:topic1".to_string());
        assert_eq!(err.message(), "proj:topic1");

        let err = ProviderError::Configuration("invalid config".to_string());
        assert_eq!(err.message(), "invalid config");

        let err = ProviderError::validation("comment", "too long");
        assert_eq!(err.message(), "too long");
        assert_eq!(err.attribute(), Some("comment"));
    }
}
