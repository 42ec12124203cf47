//! Retention policy for the tag-filtered age-based deletion sweep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::{has_provenance_tag, Tag};

/// Age cutoff for automated snapshot deletion.
///
/// A snapshot is eligible iff it has reached `retention_days` whole days of
/// age AND it carries the provenance tag. Age is measured in whole days
/// truncated from hours, so a snapshot exactly `retention_days` days old is
/// eligible and one a second younger is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Minimum age in whole days before a tagged snapshot may be deleted.
    pub retention_days: u32,
}

impl RetentionPolicy {
    /// Creates a policy with the given day threshold.
    #[must_use]
    pub fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }

    /// Whole-day age of a snapshot created at `created_at`, as seen at `now`.
    ///
    /// Truncates, never rounds: 167 hours is 6 days. Negative ages (clock
    /// skew, snapshot "from the future") clamp to zero.
    #[must_use]
    pub fn age_in_days(now: DateTime<Utc>, created_at: DateTime<Utc>) -> u32 {
        let hours = (now - created_at).num_hours();
        if hours <= 0 {
            0
        } else {
            (hours / 24) as u32
        }
    }

    /// True when the snapshot has reached the retention threshold.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, created_at: DateTime<Utc>) -> bool {
        Self::age_in_days(now, created_at) >= self.retention_days
    }

    /// Full eligibility predicate: expired AND provenance-tagged.
    ///
    /// The tag check is a strict safety invariant; snapshots created by any
    /// other means must never be deleted here, regardless of age.
    #[must_use]
    pub fn is_eligible(&self, now: DateTime<Utc>, created_at: DateTime<Utc>, tags: &[Tag]) -> bool {
        self.is_expired(now, created_at) && has_provenance_tag(tags)
    }
}
