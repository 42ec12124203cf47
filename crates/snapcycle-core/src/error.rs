use thiserror::Error;

/// Canonical error type for snapshot lifecycle operations.
///
/// Every variant is fatal: the orchestrator short-circuits on the first
/// failure and the run reports a non-zero outcome. There is no retry layer
/// around mutations; only the wait-for-available step carries an internal,
/// bounded poll loop.
#[derive(Debug, Error)]
pub enum SnapError {
    /// A provider API call was rejected (auth, throttling, validation, ...).
    #[error("provider request `{operation}` failed: {message}")]
    Provider {
        /// Provider operation name (e.g. `"create_snapshot"`).
        operation: &'static str,
        /// Underlying provider error message.
        message: String,
    },

    /// Entity was not found at the provider, including a snapshot deleted
    /// from under a concurrent sweep.
    #[error("{entity} `{id}` was not found")]
    NotFound {
        /// Entity type name (e.g. `"snapshot"`).
        entity: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// The snapshot never reached the available status within the bounded
    /// wait, or reported a terminal failure status.
    #[error("snapshot `{name}` did not become available: {reason}")]
    WaitFailed {
        /// Snapshot identifier that was being waited on.
        name: String,
        /// Terminal status or timeout description.
        reason: String,
    },

    /// A required configuration value is absent or failed to parse.
    #[error("configuration error: {0}")]
    Config(String),

    /// The announcement message could not be delivered.
    #[error("publish to `{topic}` failed: {message}")]
    Publish {
        /// Destination topic ARN.
        topic: String,
        /// Underlying delivery error message.
        message: String,
    },
}

impl SnapError {
    /// Creates a `Provider` variant.
    #[must_use]
    pub fn provider(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            operation,
            message: message.into(),
        }
    }

    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a `WaitFailed` variant.
    #[must_use]
    pub fn wait_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WaitFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Config` variant.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a `Publish` variant.
    #[must_use]
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

/// Convenient result alias for lifecycle operations.
pub type SnapResult<T> = Result<T, SnapError>;
