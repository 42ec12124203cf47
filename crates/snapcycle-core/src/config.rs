//! Run configuration.
//!
//! All parameters are supplied once at the process boundary, validated, and
//! passed inward as an immutable struct. Component logic never reads the
//! ambient environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SnapError, SnapResult};
use crate::ids::{AccountId, ClusterId, TopicArn};
use crate::retention::RetentionPolicy;

/// Bounded poll parameters for the wait-until-available step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Delay between status polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum total time to wait, in seconds, before giving up.
    pub max_wait_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            max_wait_secs: 1_800,
        }
    }
}

impl WaitConfig {
    /// Delay between status polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Maximum total wait.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Provider region for all API calls.
    pub region: String,

    /// Target database cluster.
    pub cluster_id: ClusterId,

    /// Accounts granted restore access on the new snapshot.
    pub target_account_ids: Vec<AccountId>,

    /// Destination topic for the availability announcement.
    pub topic_arn: TopicArn,

    /// Age cutoff for the retention sweep.
    pub retention: RetentionPolicy,

    /// Poll parameters for the wait-until-available step.
    #[serde(default)]
    pub wait: WaitConfig,
}

impl RunnerConfig {
    /// Validates boundary-supplied values before any provider call is made.
    ///
    /// # Errors
    ///
    /// Returns `SnapError::Config` naming the first offending field.
    pub fn validate(&self) -> SnapResult<()> {
        if self.region.is_empty() {
            return Err(SnapError::config("region must not be empty"));
        }

        if self.cluster_id.as_str().is_empty() {
            return Err(SnapError::config("cluster id must not be empty"));
        }

        if self.target_account_ids.is_empty() {
            return Err(SnapError::config(
                "at least one target account id is required",
            ));
        }

        if self
            .target_account_ids
            .iter()
            .any(|id| id.as_str().is_empty())
        {
            return Err(SnapError::config("target account ids must not be empty"));
        }

        if self.topic_arn.as_str().is_empty() {
            return Err(SnapError::config("topic ARN must not be empty"));
        }

        if self.wait.poll_interval_ms == 0 && self.wait.max_wait_secs > 0 {
            return Err(SnapError::config("wait.poll_interval_ms must be > 0"));
        }

        Ok(())
    }
}
