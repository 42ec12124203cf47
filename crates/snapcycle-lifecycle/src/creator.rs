//! Snapshot creation: create, wait until available, tag, share.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::info;

use snapcycle_core::{
    AccountId, ClusterId, SnapError, SnapResult, SnapshotArn, SnapshotName, Tag, WaitConfig,
};
use snapcycle_provider::SnapshotStore;

/// Creates one snapshot and prepares it for cross-account restore.
pub struct SnapshotCreator {
    store: Arc<dyn SnapshotStore>,
    wait: WaitConfig,
}

impl SnapshotCreator {
    /// Creates a creator over `store` with the given wait bounds.
    pub fn new(store: Arc<dyn SnapshotStore>, wait: WaitConfig) -> Self {
        Self { store, wait }
    }

    /// Creates the snapshot, waits for it to become available, stamps the
    /// provenance tag, and grants restore access to `accounts`.
    ///
    /// The tag and share steps are never attempted before an available
    /// status has been observed. The first failing step aborts; a partially
    /// tagged or shared snapshot is left in whatever state it reached.
    ///
    /// # Errors
    ///
    /// - `SnapError::Provider` if any API call is rejected
    /// - `SnapError::WaitFailed` if the snapshot reports a terminal status
    ///   or does not become available within the configured bound
    pub async fn create_and_share(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
        accounts: &[AccountId],
    ) -> SnapResult<SnapshotArn> {
        let arn = self.store.create_snapshot(cluster, name).await?;
        info!(cluster = %cluster, snapshot = %name, arn = %arn, "snapshot creation requested");

        info!(cluster = %cluster, snapshot = %name, "waiting for snapshot to become available");
        self.wait_until_available(cluster, name).await?;
        info!(cluster = %cluster, snapshot = %name, "snapshot is available");

        self.store.add_tags(&arn, &[Tag::provenance()]).await?;
        info!(snapshot = %name, "provenance tag applied");

        self.store.authorize_restore(name, accounts).await?;
        info!(
            snapshot = %name,
            accounts = accounts.len(),
            "restore access granted to target accounts"
        );

        Ok(arn)
    }

    /// Bounded poll loop against the provider's status endpoint.
    ///
    /// Polls at least once; intermediate statuses never escape. Returns only
    /// on an available status, a terminal failure status, or deadline
    /// expiry.
    async fn wait_until_available(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
    ) -> SnapResult<()> {
        let deadline = Instant::now() + self.wait.max_wait();

        loop {
            let status = self.store.snapshot_status(cluster, name).await?;

            if status.is_available() {
                return Ok(());
            }

            if status.is_terminal_failure() {
                return Err(SnapError::wait_failed(
                    name.as_str(),
                    format!("provider reported terminal status `{status}`"),
                ));
            }

            if Instant::now() >= deadline {
                return Err(SnapError::wait_failed(
                    name.as_str(),
                    format!(
                        "still `{status}` after {}s",
                        self.wait.max_wait().as_secs()
                    ),
                ));
            }

            tokio::time::sleep(self.wait.poll_interval()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapcycle_core::SnapshotStatus;
    use snapcycle_provider::MockProvider;

    fn fast_wait() -> WaitConfig {
        WaitConfig {
            poll_interval_ms: 1,
            max_wait_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_tag_and_share_only_after_available() {
        let mock = MockProvider::new().with_creating_polls(3);
        let creator = SnapshotCreator::new(Arc::new(mock.clone()), fast_wait());
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");

        creator
            .create_and_share(&cluster, &name, &[AccountId::new("111")])
            .await
            .unwrap();

        assert_eq!(
            mock.operation_sequence(),
            vec![
                "create_snapshot",
                "snapshot_status",
                "snapshot_status",
                "snapshot_status",
                "snapshot_status",
                "add_tags",
                "authorize_restore",
            ]
        );
    }

    #[tokio::test]
    async fn test_provenance_tag_and_restore_grant_applied() {
        let mock = MockProvider::new();
        let creator = SnapshotCreator::new(Arc::new(mock.clone()), fast_wait());
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");
        let accounts = [AccountId::new("123456789012")];

        let arn = creator
            .create_and_share(&cluster, &name, &accounts)
            .await
            .unwrap();

        assert!(arn.as_str().ends_with("db1-snap"));
        assert_eq!(mock.tags_of(&name).unwrap(), vec![Tag::provenance()]);
        assert_eq!(mock.shared_accounts_of(&name).unwrap(), accounts.to_vec());
    }

    #[tokio::test]
    async fn test_wait_timeout_skips_tag_and_share() {
        let mock = MockProvider::new().with_creating_polls(u32::MAX);
        let creator = SnapshotCreator::new(
            Arc::new(mock.clone()),
            WaitConfig {
                poll_interval_ms: 1,
                max_wait_secs: 0,
            },
        );
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");

        let err = creator
            .create_and_share(&cluster, &name, &[AccountId::new("111")])
            .await
            .unwrap_err();

        assert!(matches!(err, SnapError::WaitFailed { .. }));
        let sequence = mock.operation_sequence();
        assert!(!sequence.contains(&"add_tags"));
        assert!(!sequence.contains(&"authorize_restore"));
    }

    #[tokio::test]
    async fn test_terminal_failure_status_fails_the_wait() {
        let mock = MockProvider::new();
        let creator = SnapshotCreator::new(Arc::new(mock.clone()), fast_wait());
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");

        let store: Arc<dyn SnapshotStore> = Arc::new(mock.clone());
        store.create_snapshot(&cluster, &name).await.unwrap();
        mock.mark_terminal(&name, SnapshotStatus::Failed);

        let err = creator
            .wait_until_available(&cluster, &name)
            .await
            .unwrap_err();
        assert!(matches!(err, SnapError::WaitFailed { .. }));
    }

    #[tokio::test]
    async fn test_create_failure_aborts_immediately() {
        let mock = MockProvider::new().with_failing_operation("create_snapshot");
        let creator = SnapshotCreator::new(Arc::new(mock.clone()), fast_wait());
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-snap");

        let err = creator
            .create_and_share(&cluster, &name, &[AccountId::new("111")])
            .await
            .unwrap_err();

        assert!(matches!(err, SnapError::Provider { .. }));
        assert_eq!(mock.operation_sequence(), vec!["create_snapshot"]);
    }
}
