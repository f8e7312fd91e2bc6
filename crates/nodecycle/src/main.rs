//! nodecycle — refreshes preemptible nodes and rebalances autoscaled
//! on-demand capacity in a managed cluster.
//!
//! The binary works off a cluster snapshot file: `plan` runs selection
//! only and prints what a run would touch, `rehearse` executes the full
//! cordon/drain/terminate cycle against an in-memory simulation of the
//! snapshot.
//!
//! # Usage
//!
//! ```text
//! nodecycle plan --snapshot cluster.json
//! nodecycle rehearse --snapshot cluster.json --pacing-secs 0
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use nodecycle_optimizer::{Optimizer, OptimizerOptions, RunOutcome};
use nodecycle_refresh::{RefreshConfig, cancel_pair};
use nodecycle_report::{Reporter, render_text};
use nodecycle_select::{SelectionPolicy, select_targets};

use nodecycle::sim::{ClusterSnapshot, SimGateway};

#[derive(Parser)]
#[command(name = "nodecycle", about = "Cluster node refresh")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run selection against a snapshot and print the targets, without
    /// executing anything.
    Plan {
        /// Cluster snapshot file (JSON).
        #[arg(long)]
        snapshot: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Execute a full refresh cycle against an in-memory simulation of
    /// the snapshot.
    Rehearse {
        /// Cluster snapshot file (JSON).
        #[arg(long)]
        snapshot: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Seconds to wait between processing targets.
        #[arg(long, default_value = "0")]
        pacing_secs: u64,

        /// Slack bot token for the run report.
        #[arg(long, env = "NODECYCLE_SLACK_TOKEN", hide_env_values = true)]
        slack_token: Option<String>,

        /// Slack channel for the run report.
        #[arg(long, env = "NODECYCLE_SLACK_CHANNEL")]
        slack_channel: Option<String>,
    },
}

#[derive(clap::Args)]
struct PolicyArgs {
    /// Preemptible capacity floor below which no preemptible node is
    /// refreshed.
    #[arg(long, env = "NODECYCLE_MIN_PREEMPTIBLE_NODES", default_value = "0")]
    min_preemptible_nodes: u32,

    /// Whether a preemptible node is eligible for refresh.
    #[arg(
        long,
        env = "NODECYCLE_REFRESH_PREEMPTIBLE",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    refresh_preemptible: bool,

    /// Whether an autoscaled on-demand node is eligible for refresh.
    #[arg(
        long,
        env = "NODECYCLE_REFRESH_ONDEMAND",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    refresh_ondemand: bool,
}

impl PolicyArgs {
    fn to_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            minimum_preemptible_nodes: self.min_preemptible_nodes,
            refresh_preemptible: self.refresh_preemptible,
            refresh_ondemand: self.refresh_ondemand,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nodecycle=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Plan { snapshot, policy } => run_plan(&snapshot, &policy),
        Command::Rehearse {
            snapshot,
            policy,
            pacing_secs,
            slack_token,
            slack_channel,
        } => {
            run_rehearse(
                &snapshot,
                &policy,
                Duration::from_secs(pacing_secs),
                slack_token,
                slack_channel,
            )
            .await
        }
    }
}

fn run_plan(path: &PathBuf, policy: &PolicyArgs) -> anyhow::Result<()> {
    let snapshot = ClusterSnapshot::load(path)?;
    info!(
        cluster = %snapshot.cluster.name,
        nodes = snapshot.nodes.len(),
        "loaded snapshot"
    );

    let mut outcome = RunOutcome {
        cluster: Some(snapshot.cluster.clone()),
        nodes: snapshot.nodes.clone(),
        ..RunOutcome::default()
    };
    match select_targets(&snapshot.cluster, &snapshot.nodes, &policy.to_policy()) {
        Ok(selection) => outcome.selection = Some(selection),
        Err(e) => outcome.error = Some(e.into()),
    }

    print!("{}", render_text(&outcome, Duration::ZERO));
    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_rehearse(
    path: &PathBuf,
    policy: &PolicyArgs,
    pacing: Duration,
    slack_token: Option<String>,
    slack_channel: Option<String>,
) -> anyhow::Result<()> {
    let snapshot = ClusterSnapshot::load(path)?;
    info!(
        cluster = %snapshot.cluster.name,
        nodes = snapshot.nodes.len(),
        "loaded snapshot, starting rehearsal"
    );

    let sim = SimGateway::new(snapshot);
    let options = OptimizerOptions {
        policy: policy.to_policy(),
        refresh: RefreshConfig {
            pacing,
            ..RefreshConfig::default()
        },
    };
    let optimizer = Optimizer::new(&sim, &sim, options);

    // Ctrl-C flips the cancellation signal; the run rolls back cordons
    // and returns instead of dying mid-flight.
    let (cancel_tx, mut cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling run");
            let _ = cancel_tx.send(true);
        }
    });

    let started = Instant::now();
    let outcome = optimizer.run(&mut cancel).await;
    let elapsed = started.elapsed();

    info!(
        deleted = ?sim.deleted_nodes(),
        stopped = ?sim.stopped_instances(),
        still_cordoned = ?sim.cordoned_nodes(),
        "rehearsal finished"
    );
    print!("{}", render_text(&outcome, elapsed));

    let reporter = Reporter::from_credentials(slack_token, slack_channel);
    if let Err(e) = reporter.report(&outcome, elapsed).await {
        warn!(error = %e, "failed to deliver run report");
    }

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
