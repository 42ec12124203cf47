//! One-shot snapshot lifecycle runner.
//!
//! Reads all run parameters at startup (flags or environment), performs a
//! single create → wait → tag → share → announce → sweep pass, prints the
//! completion marker on success, and exits non-zero with a diagnostic on
//! the first failure.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use snapcycle_core::{
    AccountId, ClusterId, RetentionPolicy, RunnerConfig, SnapResult, TopicArn, WaitConfig,
};
use snapcycle_lifecycle::{Orchestrator, RunOutcome};
use snapcycle_provider::{AwsProviderConfig, RdsSnapshotStore, SnsTopicPublisher};

#[derive(Parser, Debug)]
#[command(name = "snapcycle-runner")]
#[command(about = "One-shot cluster snapshot lifecycle run", long_about = None)]
#[command(version)]
struct Cli {
    /// AWS region for all API calls
    #[arg(long, env = "SNAPCYCLE_REGION")]
    region: String,

    /// Identifier of the target database cluster
    #[arg(long, env = "SNAPCYCLE_CLUSTER_ID")]
    cluster_id: String,

    /// Comma-separated account ids granted restore access
    #[arg(long, env = "SNAPCYCLE_TARGET_ACCOUNT_IDS", value_delimiter = ',')]
    target_account_ids: Vec<String>,

    /// ARN of the notification topic
    #[arg(long, env = "SNAPCYCLE_TOPIC_ARN")]
    topic_arn: String,

    /// Age cutoff in whole days for the retention sweep
    #[arg(long, env = "SNAPCYCLE_RETENTION_DAYS")]
    retention_days: u32,

    /// Delay between availability polls, in milliseconds
    #[arg(long, env = "SNAPCYCLE_POLL_INTERVAL_MS", default_value = "30000")]
    poll_interval_ms: u64,

    /// Maximum time to wait for the snapshot to become available, in seconds
    #[arg(long, env = "SNAPCYCLE_MAX_WAIT_SECS", default_value = "1800")]
    max_wait_secs: u64,
}

impl Cli {
    fn into_config(self) -> RunnerConfig {
        RunnerConfig {
            region: self.region,
            cluster_id: ClusterId::new(self.cluster_id),
            target_account_ids: self
                .target_account_ids
                .into_iter()
                .map(AccountId::new)
                .collect(),
            topic_arn: TopicArn::new(self.topic_arn),
            retention: RetentionPolicy::new(self.retention_days),
            wait: WaitConfig {
                poll_interval_ms: self.poll_interval_ms,
                max_wait_secs: self.max_wait_secs,
            },
        }
    }
}

async fn run(config: RunnerConfig) -> SnapResult<RunOutcome> {
    let aws = AwsProviderConfig::new(config.region.clone());
    let shared = aws.load().await;

    let store = Arc::new(RdsSnapshotStore::from_shared(&shared));
    let publisher = Arc::new(SnsTopicPublisher::from_shared(&shared));

    let orchestrator = Orchestrator::new(store, publisher, config)?;
    orchestrator.run().await
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();

    match run(config).await {
        Ok(outcome) => {
            info!(
                snapshot = %outcome.snapshot,
                arn = %outcome.arn,
                message_id = %outcome.message_id,
                examined = outcome.sweep.examined,
                deleted = outcome.sweep.deleted.len(),
                "run complete"
            );
            println!("{}", RunOutcome::COMPLETION_MARKER);
        }
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            eprintln!("snapcycle-runner: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_maps_into_config() {
        let cli = Cli::parse_from([
            "snapcycle-runner",
            "--region",
            "eu-west-1",
            "--cluster-id",
            "db1",
            "--target-account-ids",
            "111122223333,444455556666",
            "--topic-arn",
            "arn:aws:sns:eu-west-1:111122223333:snapshots",
            "--retention-days",
            "7",
        ]);

        let config = cli.into_config();
        assert_eq!(config.cluster_id, ClusterId::new("db1"));
        assert_eq!(
            config.target_account_ids,
            vec![AccountId::new("111122223333"), AccountId::new("444455556666")]
        );
        assert_eq!(config.retention.retention_days, 7);
        assert_eq!(config.wait.poll_interval_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_numeric_retention_is_rejected_at_parse() {
        let result = Cli::try_parse_from([
            "snapcycle-runner",
            "--region",
            "eu-west-1",
            "--cluster-id",
            "db1",
            "--target-account-ids",
            "111122223333",
            "--topic-arn",
            "arn:aws:sns:eu-west-1:111122223333:snapshots",
            "--retention-days",
            "soon",
        ]);

        assert!(result.is_err());
    }
}
