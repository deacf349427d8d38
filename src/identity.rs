//! Composite identities for topics.
//!
//! A topic is addressed by its project and topic names. Both are
//! case-insensitive on the service side, so the identity recorded in state is
//! always the lowercase join of the two:
//!
//! ```
//! use hemmer_provider_datahub::identity::TopicId;
//!
//! let id = TopicId::new("Proj", "Topic1");
//! assert_eq!(id.to_string(), "proj:topic1");
//!
//! let parsed: TopicId = "proj:topic1".parse().unwrap();
//! assert_eq!(parsed, id);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;

/// Separator between the two identity components.
pub const SEPARATOR: &str = ":";

/// The normalised `(project, topic)` pair identifying a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicId {
    project: String,
    topic: String,
}

impl TopicId {
    /// Build an identity, lowercasing both components.
    pub fn new(project: &str, topic: &str) -> Self {
        Self {
            project: project.to_lowercase(),
            topic: topic.to_lowercase(),
        }
    }

    /// Parse an identity string of the form `project:topic`.
    ///
    /// Fails with [`ProviderError::MalformedIdentity`] unless the string
    /// contains exactly one separator with non-empty text on both sides.
    pub fn parse(identity: &str) -> Result<Self, ProviderError> {
        let mut parts = identity.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(project), Some(topic), None) if !project.is_empty() && !topic.is_empty() => {
                Ok(Self::new(project, topic))
            },
            _ => Err(ProviderError::MalformedIdentity(identity.to_string())),
        }
    }

    /// The lowercase project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The lowercase topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.project, SEPARATOR, self.topic)
    }
}

impl FromStr for TopicId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
