//! Fixed-order sequencing of one lifecycle run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use snapcycle_core::{
    MessageId, RunnerConfig, SnapResult, SnapshotArn, SnapshotName,
};
use snapcycle_provider::{SnapshotStore, TopicPublisher};

use crate::creator::SnapshotCreator;
use crate::publisher::NotificationPublisher;
use crate::sweeper::{RetentionSweeper, SweepReport};

/// Terminal outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Identifier of the snapshot created this run.
    pub snapshot: SnapshotName,
    /// ARN of the snapshot created this run.
    pub arn: SnapshotArn,
    /// Identifier of the announcement message.
    pub message_id: MessageId,
    /// Result of the retention sweep.
    pub sweep: SweepReport,
}

impl RunOutcome {
    /// Fixed completion value the process reports on success.
    pub const COMPLETION_MARKER: &'static str = "Finished";
}

/// Runs creator → publisher → sweeper exactly once.
///
/// Holds no state beyond the validated configuration; the snapshot name and
/// ARN are threaded between the first two steps and returned in the
/// [`RunOutcome`]. Any failing step short-circuits the run.
pub struct Orchestrator {
    store: Arc<dyn SnapshotStore>,
    publisher: Arc<dyn TopicPublisher>,
    config: RunnerConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `SnapError::Config` if any configured value is invalid.
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        publisher: Arc<dyn TopicPublisher>,
        config: RunnerConfig,
    ) -> SnapResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            publisher,
            config,
        })
    }

    /// Runs one invocation, deriving the snapshot name from the current
    /// clock.
    pub async fn run(&self) -> SnapResult<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    /// Runs one invocation with an explicit clock reading for the snapshot
    /// name (second granularity).
    pub async fn run_at(&self, now: DateTime<Utc>) -> SnapResult<RunOutcome> {
        let name = SnapshotName::at(&self.config.cluster_id, now);
        info!(
            cluster = %self.config.cluster_id,
            snapshot = %name,
            "starting snapshot lifecycle run"
        );

        let creator = SnapshotCreator::new(self.store.clone(), self.config.wait.clone());
        let arn = creator
            .create_and_share(
                &self.config.cluster_id,
                &name,
                &self.config.target_account_ids,
            )
            .await?;

        let publisher = NotificationPublisher::new(self.publisher.clone());
        let message_id = publisher
            .announce(&self.config.topic_arn, &name, &arn)
            .await?;

        let sweeper = RetentionSweeper::new(self.store.clone());
        let sweep = sweeper
            .sweep(&self.config.cluster_id, self.config.retention)
            .await?;

        info!(
            snapshot = %name,
            deleted = sweep.deleted.len(),
            "snapshot lifecycle run complete"
        );

        Ok(RunOutcome {
            snapshot: name,
            arn,
            message_id,
            sweep,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapcycle_core::{AccountId, ClusterId, RetentionPolicy, SnapError, TopicArn, WaitConfig};
    use snapcycle_provider::MockProvider;

    fn test_config(cluster: &str) -> RunnerConfig {
        RunnerConfig {
            region: "eu-west-1".to_string(),
            cluster_id: ClusterId::new(cluster),
            target_account_ids: vec![AccountId::new("123456789012")],
            topic_arn: TopicArn::new("arn:aws:sns:eu-west-1:123456789012:snapshots"),
            retention: RetentionPolicy::new(7),
            wait: WaitConfig {
                poll_interval_ms: 1,
                max_wait_secs: 5,
            },
        }
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_up_front() {
        let mock = MockProvider::new();
        let mut config = test_config("db1");
        config.target_account_ids.clear();

        let err = Orchestrator::new(Arc::new(mock.clone()), Arc::new(mock), config).unwrap_err();
        assert!(matches!(err, SnapError::Config(_)));
    }

    #[tokio::test]
    async fn test_run_threads_name_and_arn_through_all_steps() {
        let mock = MockProvider::new();
        let orchestrator = Orchestrator::new(
            Arc::new(mock.clone()),
            Arc::new(mock.clone()),
            test_config("db1"),
        )
        .unwrap();

        let outcome = orchestrator.run().await.unwrap();

        assert!(outcome.snapshot.as_str().starts_with("db1"));
        assert!(outcome.arn.as_str().ends_with(outcome.snapshot.as_str()));
        let published = mock.published();
        assert_eq!(published[0].attributes[0].1, outcome.snapshot.as_str());
        assert_eq!(published[0].attributes[1].1, outcome.arn.as_str());
        // The snapshot created this run is listed by the sweep but far too
        // young to delete.
        assert_eq!(outcome.sweep.examined, 1);
        assert!(outcome.sweep.deleted.is_empty());
    }
}
