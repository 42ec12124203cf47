//! AWS implementations of the provider traits.
//!
//! `RdsSnapshotStore` drives RDS cluster snapshot APIs; `SnsTopicPublisher`
//! delivers the availability announcement over SNS. Both are built from one
//! regioned SDK config resolved through the standard credential chain.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use chrono::{DateTime, Utc};
use tracing::warn;

use snapcycle_core::{
    AccountId, ClusterId, MessageId, SnapError, SnapResult, SnapshotArn, SnapshotName,
    SnapshotRecord, SnapshotStatus, Tag, TopicArn,
};

use crate::{SnapshotStore, TopicPublisher};

/// Name of the snapshot attribute holding the restore allow-list.
const RESTORE_ATTRIBUTE: &str = "restore";

/// AWS provider configuration.
#[derive(Debug, Clone)]
pub struct AwsProviderConfig {
    /// AWS region (e.g. "eu-west-1").
    pub region: String,
}

impl AwsProviderConfig {
    /// Creates a config for the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    /// Resolves SDK configuration through the standard credential chain.
    pub async fn load(&self) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .load()
            .await
    }
}

/// True when an SDK error message names the not-found error class.
///
/// The SDK surfaces modeled faults in the rendered message
/// (e.g. `DBClusterSnapshotNotFoundFault`); inspecting it avoids matching on
/// every generated fault type.
fn is_not_found(message: &str) -> bool {
    message.contains("NotFound") || message.contains("not found")
}

/// RDS-backed snapshot store.
pub struct RdsSnapshotStore {
    client: aws_sdk_rds::Client,
}

impl RdsSnapshotStore {
    /// Creates a store for the configured region.
    pub async fn new(config: &AwsProviderConfig) -> Self {
        Self::from_shared(&config.load().await)
    }

    /// Creates a store from already-resolved SDK configuration.
    pub fn from_shared(shared: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_rds::Client::new(shared),
        }
    }
}

#[async_trait]
impl SnapshotStore for RdsSnapshotStore {
    async fn create_snapshot(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
    ) -> SnapResult<SnapshotArn> {
        let out = self
            .client
            .create_db_cluster_snapshot()
            .db_cluster_identifier(cluster.as_str())
            .db_cluster_snapshot_identifier(name.as_str())
            .send()
            .await
            .map_err(|e| SnapError::provider("create_snapshot", e.to_string()))?;

        out.db_cluster_snapshot()
            .and_then(|s| s.db_cluster_snapshot_arn())
            .map(SnapshotArn::from)
            .ok_or_else(|| {
                SnapError::provider("create_snapshot", "response carried no snapshot ARN")
            })
    }

    async fn snapshot_status(
        &self,
        cluster: &ClusterId,
        name: &SnapshotName,
    ) -> SnapResult<SnapshotStatus> {
        let out = self
            .client
            .describe_db_cluster_snapshots()
            .db_cluster_identifier(cluster.as_str())
            .db_cluster_snapshot_identifier(name.as_str())
            .send()
            .await
            .map_err(|e| {
                let message = e.to_string();
                if is_not_found(&message) {
                    SnapError::not_found("snapshot", name.as_str())
                } else {
                    SnapError::provider("snapshot_status", message)
                }
            })?;

        let snapshot = out
            .db_cluster_snapshots()
            .first()
            .ok_or_else(|| SnapError::not_found("snapshot", name.as_str()))?;

        Ok(SnapshotStatus::parse(snapshot.status().unwrap_or_default()))
    }

    async fn add_tags(&self, arn: &SnapshotArn, tags: &[Tag]) -> SnapResult<()> {
        let mut request = self.client.add_tags_to_resource().resource_name(arn.as_str());

        for tag in tags {
            request = request.tags(
                aws_sdk_rds::types::Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| SnapError::provider("add_tags", e.to_string()))?;

        Ok(())
    }

    async fn authorize_restore(
        &self,
        name: &SnapshotName,
        accounts: &[AccountId],
    ) -> SnapResult<()> {
        self.client
            .modify_db_cluster_snapshot_attribute()
            .db_cluster_snapshot_identifier(name.as_str())
            .attribute_name(RESTORE_ATTRIBUTE)
            .set_values_to_add(Some(
                accounts.iter().map(|a| a.as_str().to_string()).collect(),
            ))
            .send()
            .await
            .map_err(|e| SnapError::provider("authorize_restore", e.to_string()))?;

        Ok(())
    }

    async fn list_manual_snapshots(
        &self,
        cluster: &ClusterId,
    ) -> SnapResult<Vec<SnapshotRecord>> {
        let type_filter = aws_sdk_rds::types::Filter::builder()
            .name("snapshot-type")
            .values("manual")
            .build();

        let out = self
            .client
            .describe_db_cluster_snapshots()
            .db_cluster_identifier(cluster.as_str())
            .filters(type_filter)
            .send()
            .await
            .map_err(|e| SnapError::provider("list_manual_snapshots", e.to_string()))?;

        let mut records = Vec::new();
        for snapshot in out.db_cluster_snapshots() {
            let (Some(name), Some(arn), Some(created)) = (
                snapshot.db_cluster_snapshot_identifier(),
                snapshot.db_cluster_snapshot_arn(),
                snapshot.snapshot_create_time(),
            ) else {
                warn!(
                    cluster = %cluster,
                    "skipping listed snapshot with incomplete metadata"
                );
                continue;
            };

            let Some(created_at) =
                DateTime::<Utc>::from_timestamp(created.secs(), created.subsec_nanos())
            else {
                warn!(
                    cluster = %cluster,
                    snapshot = name,
                    "skipping listed snapshot with unrepresentable creation time"
                );
                continue;
            };

            records.push(SnapshotRecord {
                name: SnapshotName::new(name),
                arn: SnapshotArn::from(arn),
                created_at,
            });
        }

        Ok(records)
    }

    async fn list_tags(&self, arn: &SnapshotArn) -> SnapResult<Vec<Tag>> {
        let out = self
            .client
            .list_tags_for_resource()
            .resource_name(arn.as_str())
            .send()
            .await
            .map_err(|e| {
                let message = e.to_string();
                if is_not_found(&message) {
                    SnapError::not_found("resource", arn.as_str())
                } else {
                    SnapError::provider("list_tags", message)
                }
            })?;

        Ok(out
            .tag_list()
            .iter()
            .filter_map(|tag| match (tag.key(), tag.value()) {
                (Some(key), Some(value)) => Some(Tag::new(key, value)),
                _ => None,
            })
            .collect())
    }

    async fn delete_snapshot(&self, name: &SnapshotName) -> SnapResult<()> {
        self.client
            .delete_db_cluster_snapshot()
            .db_cluster_snapshot_identifier(name.as_str())
            .send()
            .await
            .map_err(|e| {
                let message = e.to_string();
                if is_not_found(&message) {
                    SnapError::not_found("snapshot", name.as_str())
                } else {
                    SnapError::provider("delete_snapshot", message)
                }
            })?;

        Ok(())
    }
}

/// SNS-backed topic publisher.
pub struct SnsTopicPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsTopicPublisher {
    /// Creates a publisher for the configured region.
    pub async fn new(config: &AwsProviderConfig) -> Self {
        Self::from_shared(&config.load().await)
    }

    /// Creates a publisher from already-resolved SDK configuration.
    pub fn from_shared(shared: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sns::Client::new(shared),
        }
    }
}

#[async_trait]
impl TopicPublisher for SnsTopicPublisher {
    async fn publish(
        &self,
        topic: &TopicArn,
        body: &str,
        attributes: &[(&str, &str)],
    ) -> SnapResult<MessageId> {
        let mut request = self
            .client
            .publish()
            .topic_arn(topic.as_str())
            .message(body);

        for (key, value) in attributes {
            let attribute = aws_sdk_sns::types::MessageAttributeValue::builder()
                .data_type("String")
                .string_value(*value)
                .build()
                .map_err(|e| SnapError::publish(topic.as_str(), e.to_string()))?;
            request = request.message_attributes(*key, attribute);
        }

        let out = request
            .send()
            .await
            .map_err(|e| SnapError::publish(topic.as_str(), e.to_string()))?;

        out.message_id()
            .map(MessageId::from)
            .ok_or_else(|| SnapError::publish(topic.as_str(), "response carried no message id"))
    }
}
