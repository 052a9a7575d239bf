//! `notigate-worker` -- eligibility gate over stdin/stdout.
//!
//! Reads one candidate envelope per stdin line and writes each eligible
//! candidate as one JSON line to stdout. Logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable                 | Required | Default     | Description                          |
//! |--------------------------|----------|-------------|--------------------------------------|
//! | `GATE_RULE_SET`          | no       | `canonical` | `canonical`, `base` or `tree`        |
//! | `GATE_RULE_TREE_PATH`    | for tree | --          | JSON decision tree file              |
//! | `GATE_BUS_CAPACITY`      | no       | `1024`      | Candidate bus buffer, at most 2^20   |
//! | `GATE_DISPATCH_CAPACITY` | no       | `256`       | Gate to output buffer, at most 2^20  |

use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notigate_worker::config::GateConfig;
use notigate_worker::intake;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notigate_worker=info,notigate_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = GateConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid gate configuration");
        std::process::exit(1);
    });

    tracing::info!(
        rule_set = config.rule_set.name(),
        bus_capacity = config.bus_capacity,
        dispatch_capacity = config.dispatch_capacity,
        "Starting notigate-worker",
    );

    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();

    match intake::run(reader, &mut writer, config).await {
        Ok(summary) => {
            tracing::info!(
                lines = summary.lines,
                rejected = summary.rejected,
                written = summary.written,
                suppressed = summary.gate.suppressed,
                "Intake finished"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Intake failed");
            std::process::exit(1);
        }
    }
}
