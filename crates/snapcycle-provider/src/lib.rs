//! Provider access layer for the snapshot lifecycle automation.
//!
//! Two capability traits cover everything the lifecycle needs from the
//! cloud provider, with two backends each:
//! - AWS (production): RDS cluster snapshots + SNS topics
//! - Mock (testing): in-memory provider with failure injection and call
//!   history
//!
//! Every call is a synchronous request/response round trip; the traits
//! expose no batching or streaming. The wait-until-available behavior is
//! built on top of [`SnapshotStore::snapshot_status`] by the lifecycle
//! layer, so tests can fake it without real time delays.

mod aws;
mod mock;

pub use aws::{AwsProviderConfig, RdsSnapshotStore, SnsTopicPublisher};
pub use mock::{MockProvider, ProviderCall, PublishedMessage};

use async_trait::async_trait;

use snapcycle_core::{
    AccountId, ClusterId, MessageId, SnapResult, SnapshotArn, SnapshotName, SnapshotRecord,
    SnapshotStatus, Tag, TopicArn,
};

/// Snapshot operations consumed from the provider.
///
/// # Error Handling
///
/// All methods return `SnapResult<T>`:
/// - `SnapError::Provider` - the API call was rejected (auth, throttling,
///   validation, ...)
/// - `SnapError::NotFound` - the referenced snapshot does not exist,
///   including one deleted by a concurrent sweep
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Requests a new manual snapshot of `cluster` under `name`.
    ///
    /// The provider assigns and returns the ARN immediately, before the
    /// snapshot is usable; the ARN is the stable handle for every
    /// subsequent step.
    async fn create_snapshot(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
    ) -> SnapResult<SnapshotArn>;

    /// Fetches the current lifecycle status of one snapshot.
    async fn snapshot_status(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
    ) -> SnapResult<SnapshotStatus>;

    /// Attaches `tags` to the resource identified by `arn`.
    async fn add_tags(&self, arn: &SnapshotArn, tags: &[Tag]) -> SnapResult<()>;

    /// Adds `accounts` to the snapshot's restore allow-list.
    ///
    /// Additive: accounts already authorized are preserved.
    async fn authorize_restore(
        &self,
        name: &SnapshotName,
        accounts: &[AccountId],
    ) -> SnapResult<()>;

    /// Lists all manual-type snapshots of `cluster`.
    ///
    /// The type filter is applied provider-side; automated/system snapshots
    /// never appear in the result.
    async fn list_manual_snapshots(&self, cluster: &ClusterId)
        -> SnapResult<Vec<SnapshotRecord>>;

    /// Fetches the tag set of the resource identified by `arn`.
    async fn list_tags(&self, arn: &SnapshotArn) -> SnapResult<Vec<Tag>>;

    /// Deletes one snapshot by identifier.
    async fn delete_snapshot(&self, name: &SnapshotName) -> SnapResult<()>;
}

/// Outbound notification publishing.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Publishes `body` with string `attributes` to `topic`, returning the
    /// provider-assigned message identifier.
    ///
    /// Single attempt; delivery failures surface as `SnapError::Publish`.
    async fn publish(
        &self,
        topic: &TopicArn,
        body: &str,
        attributes: &[(&str, &str)],
    ) -> SnapResult<MessageId>;
}
