//! Snapshot lifecycle orchestration.
//!
//! One run is a strictly linear sequence:
//!
//! ```text
//! SnapshotCreator ──▶ NotificationPublisher ──▶ RetentionSweeper
//!  create                announce                list manual snapshots
//!  wait until available                          filter: provenance tag
//!  tag provenance                                        AND age >= cutoff
//!  authorize restore                             delete eligible
//! ```
//!
//! There is no branching beyond halt-on-error: the first failing step aborts
//! the run and nothing compensates for work already done. A failure after
//! creation leaves an unannounced snapshot; a failure mid-sweep leaves the
//! remaining expired snapshots for the next run.

pub mod creator;
pub mod orchestrator;
pub mod publisher;
pub mod sweeper;

pub use creator::SnapshotCreator;
pub use orchestrator::{Orchestrator, RunOutcome};
pub use publisher::{NotificationPublisher, MESSAGE_BODY_PREFIX};
pub use sweeper::{RetentionSweeper, SweepReport};
