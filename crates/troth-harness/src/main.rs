//! Matrix runner binary.
//!
//! Runs the full implemented configuration matrix against a simulated peer
//! pair and reports every prediction mismatch and timeout.
//!
//! # Usage
//!
//! ```bash
//! # Default run (seed 0)
//! troth-matrix
//!
//! # Reproduce a failing run
//! troth-matrix --seed 424242 --log-level debug
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use troth_core::{MatrixConfig, MatrixDriver, SecurityPeer};
use troth_harness::{SimEnv, SimPeer};

/// SSP association-model conformance matrix
#[derive(Parser, Debug)]
#[command(name = "troth-matrix")]
#[command(about = "Run the SSP pairing conformance matrix against simulated peers")]
#[command(version)]
struct Args {
    /// RNG seed for the simulated peers
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Bound on every in-scenario event wait, in milliseconds
    #[arg(long, default_value = "5000")]
    event_timeout_ms: u64,

    /// Bound on the post-removal link settle wait, in milliseconds
    #[arg(long, default_value = "1000")]
    settle_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(seed = args.seed, "troth matrix starting");

    let env = SimEnv::with_seed(args.seed);
    let (initiator, responder) = SimPeer::linked_pair(env.clone());

    let config = MatrixConfig {
        event_timeout: Duration::from_millis(args.event_timeout_ms),
        settle_timeout: Duration::from_millis(args.settle_timeout_ms),
        ..MatrixConfig::default()
    };
    let driver = MatrixDriver::new(env, config);

    let initiator: std::sync::Arc<dyn SecurityPeer> = initiator;
    let responder: std::sync::Arc<dyn SecurityPeer> = responder;
    let report = match driver.run(initiator, responder).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("matrix run aborted: {}", e);
            return ExitCode::FAILURE;
        },
    };

    for (point, result) in &report.failures {
        for failure in &result.failures {
            tracing::error!(
                index = point.index,
                init_io = ?point.initiator.io,
                resp_io = ?point.responder.io,
                "{failure}"
            );
        }
    }

    if report.passed() {
        tracing::info!(total = report.total, "all matrix points passed");
        ExitCode::SUCCESS
    } else {
        tracing::error!(
            total = report.total,
            failed = report.failures.len(),
            mismatches = report.mismatch_count(),
            timeouts = report.timeout_count(),
            "matrix run failed"
        );
        ExitCode::FAILURE
    }
}
