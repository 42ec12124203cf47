//! Availability announcement for downstream consumers.

use std::sync::Arc;

use tracing::info;

use snapcycle_core::{MessageId, SnapResult, SnapshotArn, SnapshotName, TopicArn};
use snapcycle_provider::TopicPublisher;

/// Fixed literal prefixing the message body, followed by the snapshot ARN.
pub const MESSAGE_BODY_PREFIX: &str = "Copy snapshot";

/// Publishes the structured announcement for a newly available snapshot.
pub struct NotificationPublisher {
    publisher: Arc<dyn TopicPublisher>,
}

impl NotificationPublisher {
    /// Creates a publisher over the given topic backend.
    pub fn new(publisher: Arc<dyn TopicPublisher>) -> Self {
        Self { publisher }
    }

    /// Announces the snapshot on `topic`.
    ///
    /// The body is [`MESSAGE_BODY_PREFIX`] followed by the ARN; the two
    /// string attributes `snapshot_identifier` and `snapshot_arn` echo the
    /// identifiers of the snapshot created in this run. Single attempt: a
    /// delivery failure aborts the run even though the snapshot itself
    /// already exists.
    ///
    /// # Errors
    ///
    /// Returns `SnapError::Publish` if delivery fails.
    pub async fn announce(
        &self,
        topic: &TopicArn,
        name: &SnapshotName,
        arn: &SnapshotArn,
    ) -> SnapResult<MessageId> {
        let body = format!("{MESSAGE_BODY_PREFIX}{arn}");
        let attributes = [
            ("snapshot_identifier", name.as_str()),
            ("snapshot_arn", arn.as_str()),
        ];

        let message_id = self.publisher.publish(topic, &body, &attributes).await?;
        info!(topic = %topic, snapshot = %name, message_id = %message_id, "announcement published");

        Ok(message_id)
    }
}
