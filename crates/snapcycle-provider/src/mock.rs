//! In-memory mock provider for testing.
//!
//! Simulates the snapshot store and topic publisher without real cloud
//! dependencies:
//!
//! - **Seeded snapshots**: pre-populate existing manual snapshots with a
//!   chosen age and tag set
//! - **Creation delay**: report `creating` for a configurable number of
//!   status polls before turning `available`, so wait-loop ordering can be
//!   exercised without real delays
//! - **Failure injection**: force any named operation to fail
//! - **Call history**: every operation is recorded for ordering assertions

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use snapcycle_core::{
    AccountId, ClusterId, MessageId, SnapError, SnapResult, SnapshotArn, SnapshotName,
    SnapshotRecord, SnapshotStatus, Tag, TopicArn,
};

use crate::{SnapshotStore, TopicPublisher};

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    /// Operation name, matching the trait method.
    pub operation: &'static str,
    /// Primary subject of the call (snapshot name, ARN, or topic).
    pub subject: String,
}

/// A message captured by the mock publisher.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: TopicArn,
    pub body: String,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct MockSnapshot {
    cluster: ClusterId,
    name: SnapshotName,
    arn: SnapshotArn,
    created_at: DateTime<Utc>,
    tags: Vec<Tag>,
    shared_accounts: Vec<AccountId>,
    remaining_creating_polls: u32,
    terminal_status: Option<SnapshotStatus>,
}

#[derive(Default)]
struct MockState {
    snapshots: Vec<MockSnapshot>,
    calls: Vec<ProviderCall>,
    published: Vec<PublishedMessage>,
    fail_operations: HashSet<&'static str>,
    creating_polls_for_new: u32,
    next_message_seq: u64,
}

/// Mock implementation of both provider traits.
///
/// Cloning shares state, so a test can hand the same provider to the
/// lifecycle under test and keep a handle for assertions.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<RwLock<MockState>>,
}

impl MockProvider {
    /// Creates an empty mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New snapshots report `creating` for the first `polls` status calls.
    #[must_use]
    pub fn with_creating_polls(self, polls: u32) -> Self {
        self.state.write().creating_polls_for_new = polls;
        self
    }

    /// Forces every call to `operation` to fail with a provider error.
    #[must_use]
    pub fn with_failing_operation(self, operation: &'static str) -> Self {
        self.state.write().fail_operations.insert(operation);
        self
    }

    /// Seeds an existing available manual snapshot.
    pub fn seed_snapshot(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
        created_at: DateTime<Utc>,
        tags: Vec<Tag>,
    ) {
        let mut state = self.state.write();
        let arn = Self::arn_for(name);
        state.snapshots.push(MockSnapshot {
            cluster: cluster.clone(),
            name: name.clone(),
            arn,
            created_at,
            tags,
            shared_accounts: Vec::new(),
            remaining_creating_polls: 0,
            terminal_status: None,
        });
    }

    /// Forces status polls for `name` to report a terminal status once the
    /// creating polls are exhausted.
    pub fn mark_terminal(&self, name: &SnapshotName, status: SnapshotStatus) {
        let mut state = self.state.write();
        if let Some(snapshot) = state.snapshots.iter_mut().find(|s| &s.name == name) {
            snapshot.terminal_status = Some(status);
        }
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.read().calls.clone()
    }

    /// Returns recorded operation names in order.
    #[must_use]
    pub fn operation_sequence(&self) -> Vec<&'static str> {
        self.state.read().calls.iter().map(|c| c.operation).collect()
    }

    /// Returns every captured publication in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.read().published.clone()
    }

    /// True when a snapshot with `name` currently exists.
    #[must_use]
    pub fn contains_snapshot(&self, name: &SnapshotName) -> bool {
        self.state.read().snapshots.iter().any(|s| &s.name == name)
    }

    /// Tags currently attached to `name`, if it exists.
    #[must_use]
    pub fn tags_of(&self, name: &SnapshotName) -> Option<Vec<Tag>> {
        self.state
            .read()
            .snapshots
            .iter()
            .find(|s| &s.name == name)
            .map(|s| s.tags.clone())
    }

    /// Accounts currently authorized to restore from `name`, if it exists.
    #[must_use]
    pub fn shared_accounts_of(&self, name: &SnapshotName) -> Option<Vec<AccountId>> {
        self.state
            .read()
            .snapshots
            .iter()
            .find(|s| &s.name == name)
            .map(|s| s.shared_accounts.clone())
    }

    fn arn_for(name: &SnapshotName) -> SnapshotArn {
        SnapshotArn::new(format!("arn:aws:rds:mock:000000000000:cluster-snapshot:{name}"))
    }

    fn record(state: &mut MockState, operation: &'static str, subject: impl Into<String>) {
        state.calls.push(ProviderCall {
            operation,
            subject: subject.into(),
        });
    }

    fn check_failure(state: &MockState, operation: &'static str) -> SnapResult<()> {
        if state.fail_operations.contains(operation) {
            Err(SnapError::provider(operation, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SnapshotStore for MockProvider {
    async fn create_snapshot(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
    ) -> SnapResult<SnapshotArn> {
        let mut state = self.state.write();
        Self::record(&mut state, "create_snapshot", name.as_str());
        Self::check_failure(&state, "create_snapshot")?;

        if state.snapshots.iter().any(|s| &s.name == name) {
            return Err(SnapError::provider(
                "create_snapshot",
                format!("snapshot `{name}` already exists"),
            ));
        }

        let arn = Self::arn_for(name);
        let remaining = state.creating_polls_for_new;
        state.snapshots.push(MockSnapshot {
            cluster: cluster.clone(),
            name: name.clone(),
            arn: arn.clone(),
            created_at: Utc::now(),
            tags: Vec::new(),
            shared_accounts: Vec::new(),
            remaining_creating_polls: remaining,
            terminal_status: None,
        });

        Ok(arn)
    }

    async fn snapshot_status(
        &self,
        _cluster: &ClusterId,
        name: &SnapshotName,
    ) -> SnapResult<SnapshotStatus> {
        let mut state = self.state.write();
        Self::record(&mut state, "snapshot_status", name.as_str());
        Self::check_failure(&state, "snapshot_status")?;

        let snapshot = state
            .snapshots
            .iter_mut()
            .find(|s| &s.name == name)
            .ok_or_else(|| SnapError::not_found("snapshot", name.as_str()))?;

        if snapshot.remaining_creating_polls > 0 {
            snapshot.remaining_creating_polls -= 1;
            Ok(SnapshotStatus::Creating)
        } else if let Some(status) = snapshot.terminal_status.clone() {
            Ok(status)
        } else {
            Ok(SnapshotStatus::Available)
        }
    }

    async fn add_tags(&self, arn: &SnapshotArn, tags: &[Tag]) -> SnapResult<()> {
        let mut state = self.state.write();
        Self::record(&mut state, "add_tags", arn.as_str());
        Self::check_failure(&state, "add_tags")?;

        let snapshot = state
            .snapshots
            .iter_mut()
            .find(|s| &s.arn == arn)
            .ok_or_else(|| SnapError::not_found("resource", arn.as_str()))?;

        snapshot.tags.extend_from_slice(tags);
        Ok(())
    }

    async fn authorize_restore(
        &self,
        name: &SnapshotName,
        accounts: &[AccountId],
    ) -> SnapResult<()> {
        let mut state = self.state.write();
        Self::record(&mut state, "authorize_restore", name.as_str());
        Self::check_failure(&state, "authorize_restore")?;

        let snapshot = state
            .snapshots
            .iter_mut()
            .find(|s| &s.name == name)
            .ok_or_else(|| SnapError::not_found("snapshot", name.as_str()))?;

        // ValuesToAdd semantics: additive, existing grants preserved.
        for account in accounts {
            if !snapshot.shared_accounts.contains(account) {
                snapshot.shared_accounts.push(account.clone());
            }
        }
        Ok(())
    }

    async fn list_manual_snapshots(
        &self,
        cluster: &ClusterId,
    ) -> SnapResult<Vec<SnapshotRecord>> {
        let mut state = self.state.write();
        Self::record(&mut state, "list_manual_snapshots", cluster.as_str());
        Self::check_failure(&state, "list_manual_snapshots")?;

        Ok(state
            .snapshots
            .iter()
            .filter(|s| &s.cluster == cluster)
            .map(|s| SnapshotRecord {
                name: s.name.clone(),
                arn: s.arn.clone(),
                created_at: s.created_at,
            })
            .collect())
    }

    async fn list_tags(&self, arn: &SnapshotArn) -> SnapResult<Vec<Tag>> {
        let mut state = self.state.write();
        Self::record(&mut state, "list_tags", arn.as_str());
        Self::check_failure(&state, "list_tags")?;

        state
            .snapshots
            .iter()
            .find(|s| &s.arn == arn)
            .map(|s| s.tags.clone())
            .ok_or_else(|| SnapError::not_found("resource", arn.as_str()))
    }

    async fn delete_snapshot(&self, name: &SnapshotName) -> SnapResult<()> {
        let mut state = self.state.write();
        Self::record(&mut state, "delete_snapshot", name.as_str());
        Self::check_failure(&state, "delete_snapshot")?;

        let before = state.snapshots.len();
        state.snapshots.retain(|s| &s.name != name);
        if state.snapshots.len() == before {
            return Err(SnapError::not_found("snapshot", name.as_str()));
        }
        Ok(())
    }
}

#[async_trait]
impl TopicPublisher for MockProvider {
    async fn publish(
        &self,
        topic: &TopicArn,
        body: &str,
        attributes: &[(&str, &str)],
    ) -> SnapResult<MessageId> {
        let mut state = self.state.write();
        Self::record(&mut state, "publish", topic.as_str());
        if state.fail_operations.contains("publish") {
            return Err(SnapError::publish(topic.as_str(), "injected failure"));
        }

        state.published.push(PublishedMessage {
            topic: topic.clone(),
            body: body.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        state.next_message_seq += 1;
        Ok(MessageId::new(format!(
            "mock-message-{}",
            state.next_message_seq
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_status_honors_creating_polls() {
        let mock = MockProvider::new().with_creating_polls(2);
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");

        mock.create_snapshot(&cluster, &name).await.unwrap();

        assert_eq!(
            mock.snapshot_status(&cluster, &name).await.unwrap(),
            SnapshotStatus::Creating
        );
        assert_eq!(
            mock.snapshot_status(&cluster, &name).await.unwrap(),
            SnapshotStatus::Creating
        );
        assert_eq!(
            mock.snapshot_status(&cluster, &name).await.unwrap(),
            SnapshotStatus::Available
        );
        assert_eq!(
            mock.calls()[0],
            ProviderCall {
                operation: "create_snapshot",
                subject: "db1-snap".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let mock = MockProvider::new();
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");

        mock.create_snapshot(&cluster, &name).await.unwrap();
        assert!(mock.create_snapshot(&cluster, &name).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_snapshot_is_not_found() {
        let mock = MockProvider::new();
        let name = SnapshotName::new("gone");

        let err = mock.delete_snapshot(&name).await.unwrap_err();
        assert!(matches!(err, SnapError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mock = MockProvider::new().with_failing_operation("create_snapshot");
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");

        let err = mock.create_snapshot(&cluster, &name).await.unwrap_err();
        assert!(matches!(err, SnapError::Provider { .. }));
        assert!(!mock.contains_snapshot(&name));
    }

    #[tokio::test]
    async fn test_authorize_restore_is_additive() {
        let mock = MockProvider::new();
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");
        mock.create_snapshot(&cluster, &name).await.unwrap();

        mock.authorize_restore(&name, &[AccountId::new("111")])
            .await
            .unwrap();
        mock.authorize_restore(&name, &[AccountId::new("222"), AccountId::new("111")])
            .await
            .unwrap();

        assert_eq!(
            mock.shared_accounts_of(&name).unwrap(),
            vec![AccountId::new("111"), AccountId::new("222")]
        );
    }
}
