//! Tag-filtered, age-based retention sweep.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use snapcycle_core::{ClusterId, RetentionPolicy, SnapResult, SnapshotName};
use snapcycle_provider::SnapshotStore;

/// Outcome of one sweep pass, for logging and assertions.
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Number of manual snapshots the listing returned.
    pub examined: usize,
    /// Snapshots deleted this pass, in processing order.
    pub deleted: Vec<SnapshotName>,
}

/// Deletes expired provenance-tagged snapshots of one cluster.
pub struct RetentionSweeper {
    store: Arc<dyn SnapshotStore>,
}

impl RetentionSweeper {
    /// Creates a sweeper over `store`.
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Runs one sweep pass.
    ///
    /// Lists the cluster's manual snapshots (the type filter is applied
    /// provider-side), captures a single `now` for the whole pass, then per
    /// snapshot fetches the tag set and deletes it iff it is provenance-
    /// tagged and at least `retention_days` whole days old. Untagged
    /// snapshots are never deleted, regardless of age.
    ///
    /// Strict-fail: the first listing, tag-fetch, or deletion error aborts
    /// the remainder of the pass. Snapshots left behind stay eligible and
    /// are picked up by the next run.
    ///
    /// # Errors
    ///
    /// - `SnapError::Provider` if any API call is rejected
    /// - `SnapError::NotFound` if a snapshot vanishes mid-sweep (e.g. a
    ///   concurrent sweep deleted it first)
    pub async fn sweep(
        &self,
        cluster: &ClusterId,
        policy: RetentionPolicy,
    ) -> SnapResult<SweepReport> {
        let snapshots = self.store.list_manual_snapshots(cluster).await?;

        // One clock reading for the whole pass keeps age comparisons
        // consistent even when tag fetches are slow.
        let now = Utc::now();
        let mut deleted = Vec::new();

        for snapshot in &snapshots {
            let tags = self.store.list_tags(&snapshot.arn).await?;

            if !policy.is_eligible(now, snapshot.created_at, &tags) {
                debug!(
                    snapshot = %snapshot.name,
                    created_at = %snapshot.created_at,
                    "snapshot retained"
                );
                continue;
            }

            info!(
                snapshot = %snapshot.name,
                created_at = %snapshot.created_at,
                retention_days = policy.retention_days,
                "deleting expired snapshot"
            );
            self.store.delete_snapshot(&snapshot.name).await?;
            deleted.push(snapshot.name.clone());
        }

        info!(
            cluster = %cluster,
            examined = snapshots.len(),
            deleted = deleted.len(),
            "retention sweep finished"
        );

        Ok(SweepReport {
            examined: snapshots.len(),
            deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use snapcycle_core::{SnapError, Tag};
    use snapcycle_provider::MockProvider;

    fn sweeper_over(mock: &MockProvider) -> RetentionSweeper {
        RetentionSweeper::new(Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_expired_tagged_snapshot_is_deleted() {
        let mock = MockProvider::new();
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-old");
        mock.seed_snapshot(
            &cluster,
            &name,
            Utc::now() - Duration::days(10),
            vec![Tag::provenance()],
        );

        let report = sweeper_over(&mock)
            .sweep(&cluster, RetentionPolicy::new(7))
            .await
            .unwrap();

        assert_eq!(report.examined, 1);
        assert_eq!(report.deleted, vec![name.clone()]);
        assert!(!mock.contains_snapshot(&name));
    }

    #[tokio::test]
    async fn test_untagged_snapshot_is_never_deleted() {
        let mock = MockProvider::new();
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-manual-backup");
        mock.seed_snapshot(&cluster, &name, Utc::now() - Duration::days(365), vec![]);

        let report = sweeper_over(&mock)
            .sweep(&cluster, RetentionPolicy::new(7))
            .await
            .unwrap();

        assert!(report.deleted.is_empty());
        assert!(mock.contains_snapshot(&name));
    }

    #[tokio::test]
    async fn test_young_tagged_snapshot_is_retained() {
        let mock = MockProvider::new();
        let cluster = ClusterId::new("db1");
        let name = SnapshotName::new("db1-recent");
        mock.seed_snapshot(
            &cluster,
            &name,
            Utc::now() - Duration::days(3),
            vec![Tag::provenance()],
        );

        let report = sweeper_over(&mock)
            .sweep(&cluster, RetentionPolicy::new(7))
            .await
            .unwrap();

        assert!(report.deleted.is_empty());
        assert!(mock.contains_snapshot(&name));
    }

    #[tokio::test]
    async fn test_boundary_age_is_inclusive() {
        let mock = MockProvider::new();
        let cluster = ClusterId::new("db1");
        let at_threshold = SnapshotName::new("db1-at-threshold");
        let just_under = SnapshotName::new("db1-just-under");
        let now = Utc::now();
        mock.seed_snapshot(
            &cluster,
            &at_threshold,
            now - Duration::days(7) - Duration::minutes(1),
            vec![Tag::provenance()],
        );
        mock.seed_snapshot(
            &cluster,
            &just_under,
            now - Duration::days(7) + Duration::hours(1),
            vec![Tag::provenance()],
        );

        let report = sweeper_over(&mock)
            .sweep(&cluster, RetentionPolicy::new(7))
            .await
            .unwrap();

        assert_eq!(report.deleted, vec![at_threshold]);
        assert!(mock.contains_snapshot(&just_under));
    }

    #[tokio::test]
    async fn test_deletion_failure_aborts_remaining_sweep() {
        let mock = MockProvider::new().with_failing_operation("delete_snapshot");
        let cluster = ClusterId::new("db1");
        let first = SnapshotName::new("db1-old-a");
        let second = SnapshotName::new("db1-old-b");
        let aged = Utc::now() - Duration::days(30);
        mock.seed_snapshot(&cluster, &first, aged, vec![Tag::provenance()]);
        mock.seed_snapshot(&cluster, &second, aged, vec![Tag::provenance()]);

        let err = sweeper_over(&mock)
            .sweep(&cluster, RetentionPolicy::new(7))
            .await
            .unwrap_err();

        assert!(matches!(err, SnapError::Provider { .. }));
        // Strict-fail: only one deletion was attempted.
        let deletes = mock
            .operation_sequence()
            .iter()
            .filter(|op| **op == "delete_snapshot")
            .count();
        assert_eq!(deletes, 1);
        assert!(mock.contains_snapshot(&first));
        assert!(mock.contains_snapshot(&second));
    }

    #[tokio::test]
    async fn test_other_clusters_are_not_listed() {
        let mock = MockProvider::new();
        let cluster = ClusterId::new("db1");
        let other = ClusterId::new("db2");
        let foreign = SnapshotName::new("db2-old");
        mock.seed_snapshot(
            &other,
            &foreign,
            Utc::now() - Duration::days(30),
            vec![Tag::provenance()],
        );

        let report = sweeper_over(&mock)
            .sweep(&cluster, RetentionPolicy::new(7))
            .await
            .unwrap();

        assert_eq!(report.examined, 0);
        assert!(mock.contains_snapshot(&foreign));
    }
}
