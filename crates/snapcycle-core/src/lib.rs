//! Core domain types for the snapcycle snapshot lifecycle automation.

pub mod config;
pub mod error;
pub mod ids;
pub mod retention;
pub mod snapshot;

pub use config::{RunnerConfig, WaitConfig};
pub use error::{SnapError, SnapResult};
pub use ids::{AccountId, ClusterId, MessageId, SnapshotArn, TopicArn};
pub use retention::RetentionPolicy;
pub use snapshot::{
    has_provenance_tag, SnapshotName, SnapshotRecord, SnapshotStatus, Tag, PROVENANCE_TAG_KEY,
    PROVENANCE_TAG_VALUE,
};
