//! Newline-delimited JSON intake.
//!
//! Reads one [`CandidateEvent`] per line, publishes it on a
//! [`CandidateBus`], lets the [`EligibilityGate`] decide, and writes every
//! eligible candidate back out as one JSON line. Malformed lines are logged
//! and skipped.

use notigate_events::{CandidateBus, CandidateEvent, EligibilityGate, GateSummary};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::GateConfig;
use crate::error::WorkerResult;

/// Totals for one intake run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeSummary {
    /// Non-blank lines read.
    pub lines: u64,
    /// Lines that did not parse as a candidate.
    pub rejected: u64,
    /// Eligible candidates written to the output.
    pub written: u64,
    pub gate: GateSummary,
}

/// Run the intake pipeline until `reader` reaches EOF.
pub async fn run<R, W>(
    reader: R,
    writer: &mut W,
    config: GateConfig,
) -> WorkerResult<IntakeSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let bus = CandidateBus::new(config.bus_capacity);
    let (dispatch_tx, dispatch_rx) = mpsc::channel(config.dispatch_capacity);

    let gate = EligibilityGate::new(config.rule_set, dispatch_tx)
        .with_drain_signal(bus.drain_signal());
    let gate_handle = tokio::spawn(gate.run(bus.subscribe(), CancellationToken::new()));

    let (read, written) = tokio::join!(
        read_candidates(reader, bus),
        write_eligible(dispatch_rx, writer)
    );
    let gate = gate_handle.await?;
    let (lines, rejected) = read?;

    Ok(IntakeSummary {
        lines,
        rejected,
        written: written?,
        gate,
    })
}

/// Publish every parsable line; the bus is dropped at EOF, closing the gate.
async fn read_candidates<R>(reader: R, bus: CandidateBus) -> WorkerResult<(u64, u64)>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut read = 0u64;
    let mut rejected = 0u64;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        read += 1;

        match CandidateEvent::from_json(line) {
            Ok(event) => bus.publish_when_ready(event).await,
            Err(e) => {
                rejected += 1;
                tracing::warn!(line = read, error = %e, "Rejected malformed candidate");
            }
        }
    }

    Ok((read, rejected))
}

async fn write_eligible<W>(
    mut rx: mpsc::Receiver<CandidateEvent>,
    writer: &mut W,
) -> WorkerResult<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(event) = rx.recv().await {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        written += 1;
    }
    writer.flush().await?;
    Ok(written)
}
