//! Snapshot naming, status, and tag types.
//!
//! The snapshot entity itself is owned by the provider; these types carry
//! only what one run needs in flight: the generated name, the listing
//! record, the parsed status, and the tag set.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ClusterId, SnapshotArn};

/// Tag key marking snapshots created by this automation.
///
/// Its presence is the sole authorization signal for automated deletion;
/// snapshots without it are permanently exempt from the retention sweep.
pub const PROVENANCE_TAG_KEY: &str = "lambda_automatic";

/// Tag value paired with [`PROVENANCE_TAG_KEY`].
pub const PROVENANCE_TAG_VALUE: &str = "true";

/// Snapshot identifier, unique within a cluster.
///
/// Constructed as the cluster identifier concatenated with a
/// second-granularity timestamp (`%Y-%m-%d-%H-%M-%S`, no spaces or colons).
/// Two runs within the same second collide; that gap is accepted and the
/// provider rejects the duplicate create.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotName(String);

impl SnapshotName {
    /// Derives the snapshot name for `cluster` at instant `at`.
    ///
    /// Pure function of its inputs: names generated in the same second are
    /// identical, names a second apart are distinct.
    #[must_use]
    pub fn at(cluster: &ClusterId, at: DateTime<Utc>) -> Self {
        Self(format!("{}{}", cluster, at.format("%Y-%m-%d-%H-%M-%S")))
    }

    /// Wraps an identifier already known to the provider.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot lifecycle status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// Snapshot is still being created.
    Creating,
    /// Snapshot is usable; tagging and sharing may proceed.
    Available,
    /// Provider reported a terminal failure.
    Failed,
    /// Snapshot is being deleted.
    Deleting,
    /// Status string this automation does not recognize.
    Unknown(String),
}

impl SnapshotStatus {
    /// Parses the provider's status string.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "creating" => Self::Creating,
            "available" => Self::Available,
            "failed" => Self::Failed,
            "deleting" => Self::Deleting,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// True once the snapshot may be tagged and shared.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// True when waiting any longer cannot succeed.
    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Deleting)
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => write!(f, "creating"),
            Self::Available => write!(f, "available"),
            Self::Failed => write!(f, "failed"),
            Self::Deleting => write!(f, "deleting"),
            Self::Unknown(other) => write!(f, "{other}"),
        }
    }
}

/// One manual snapshot as returned by the listing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Snapshot identifier (used for deletion).
    pub name: SnapshotName,
    /// Provider-assigned ARN (used for tag lookups).
    pub arn: SnapshotArn,
    /// Provider-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A key-value tag attached to a provider resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Creates a tag.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The provenance tag this automation stamps on every snapshot it
    /// creates.
    #[must_use]
    pub fn provenance() -> Self {
        Self::new(PROVENANCE_TAG_KEY, PROVENANCE_TAG_VALUE)
    }
}

/// True when `tags` contains the provenance key.
///
/// Only the key is inspected, matching the original automation: the value is
/// informational.
#[must_use]
pub fn has_provenance_tag(tags: &[Tag]) -> bool {
    tags.iter().any(|tag| tag.key == PROVENANCE_TAG_KEY)
}
