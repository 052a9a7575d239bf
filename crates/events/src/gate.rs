//! Eligibility gate between the candidate bus and delivery.
//!
//! [`EligibilityGate`] subscribes to the [`CandidateBus`](crate::bus::CandidateBus),
//! evaluates every candidate against its [`RuleSet`], and forwards the
//! eligible ones to the dispatch channel. Delivery itself happens downstream.

use std::sync::Arc;

use notigate_core::eligibility::Assessment;
use notigate_core::RuleSet;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio_util::sync::CancellationToken;

use crate::bus::CandidateEvent;

/// Counters reported when the gate stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateSummary {
    pub received: u64,
    pub forwarded: u64,
    pub suppressed: u64,
    pub lagged: u64,
}

pub struct EligibilityGate {
    rules: RuleSet,
    dispatch: mpsc::Sender<CandidateEvent>,
    drained: Option<Arc<Notify>>,
}

impl EligibilityGate {
    pub fn new(rules: RuleSet, dispatch: mpsc::Sender<CandidateEvent>) -> Self {
        Self {
            rules,
            dispatch,
            drained: None,
        }
    }

    /// Notify `drained` after each receive and once more on shutdown.
    ///
    /// Pair with [`CandidateBus::drain_signal`](crate::bus::CandidateBus::drain_signal)
    /// so a publisher waiting in `publish_when_ready` wakes up.
    pub fn with_drain_signal(mut self, drained: Arc<Notify>) -> Self {
        self.drained = Some(drained);
        self
    }

    /// Assess one candidate without forwarding it.
    pub fn check(&self, event: &CandidateEvent) -> Assessment {
        self.rules.assess(&event.input)
    }

    /// Run the gate loop.
    ///
    /// Exits when the bus is closed, `cancel` fires, or the dispatch receiver
    /// is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<CandidateEvent>,
        cancel: CancellationToken,
    ) -> GateSummary {
        let mut summary = GateSummary::default();
        tracing::info!(rule_set = self.rules.name(), "Eligibility gate started");

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Eligibility gate cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };
            self.signal_drained();

            match received {
                Ok(event) => {
                    summary.received += 1;
                    if !self.handle(event, &mut summary).await {
                        tracing::warn!("Dispatch channel closed, eligibility gate shutting down");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    summary.lagged += n;
                    tracing::warn!(skipped = n, "Eligibility gate lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Candidate bus closed, eligibility gate shutting down");
                    break;
                }
            }
        }

        // The buffered candidates leave with the receiver.
        drop(receiver);
        self.signal_drained();

        tracing::info!(
            received = summary.received,
            forwarded = summary.forwarded,
            suppressed = summary.suppressed,
            lagged = summary.lagged,
            "Eligibility gate stopped"
        );
        summary
    }

    fn signal_drained(&self) {
        if let Some(drained) = &self.drained {
            drained.notify_one();
        }
    }

    /// Returns `false` once the dispatch side has gone away.
    async fn handle(&self, event: CandidateEvent, summary: &mut GateSummary) -> bool {
        let assessment = self.check(&event);

        if let Some(reason) = assessment.reason {
            summary.suppressed += 1;
            tracing::debug!(
                recipient_id = event.recipient_id,
                message_ref = event.message_ref.as_deref().unwrap_or("-"),
                threaded = event.input.threading.is_threaded(),
                reason = %reason,
                "Candidate suppressed"
            );
            return true;
        }

        tracing::debug!(
            recipient_id = event.recipient_id,
            message_ref = event.message_ref.as_deref().unwrap_or("-"),
            threaded = event.input.threading.is_threaded(),
            "Candidate eligible"
        );
        if self.dispatch.send(event).await.is_err() {
            return false;
        }
        summary.forwarded += 1;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use notigate_core::eligibility::SuppressionReason;
    use notigate_core::{EligibilityInput, NotificationPreference};

    use super::*;
    use crate::bus::CandidateBus;

    fn candidate(recipient_id: i64, input: EligibilityInput) -> CandidateEvent {
        CandidateEvent::new(recipient_id, input)
    }

    #[test]
    fn check_reports_reason() {
        let (tx, _rx) = mpsc::channel(1);
        let gate = EligibilityGate::new(RuleSet::Canonical, tx);
        let muted =
            EligibilityInput::new(NotificationPreference::Everything).with_channel_muted(true);

        let assessment = gate.check(&candidate(1, muted));
        assert_eq!(assessment.reason, Some(SuppressionReason::ChannelMuted));
    }

    #[tokio::test]
    async fn forwards_only_eligible_candidates() {
        let bus = CandidateBus::default();
        let (tx, mut rx) = mpsc::channel(8);
        let gate = EligibilityGate::new(RuleSet::Canonical, tx);
        let handle = tokio::spawn(gate.run(bus.subscribe(), CancellationToken::new()));

        let everything = EligibilityInput::new(NotificationPreference::Everything);
        bus.publish(candidate(1, everything));
        bus.publish(candidate(2, everything.with_do_not_disturb(true)));
        bus.publish(candidate(3, everything.with_preference(NotificationPreference::Nothing)));
        bus.publish(candidate(
            4,
            everything
                .with_do_not_disturb(true)
                .with_do_not_disturb_overridden(true),
        ));
        drop(bus);

        let summary = handle.await.unwrap();
        assert_eq!(summary.received, 4);
        assert_eq!(summary.forwarded, 2);
        assert_eq!(summary.suppressed, 2);

        let mut forwarded = Vec::new();
        while let Some(event) = rx.recv().await {
            forwarded.push(event.recipient_id);
        }
        assert_eq!(forwarded, vec![1, 4]);
    }

    #[tokio::test]
    async fn base_rule_set_drops_mentions_tier() {
        let bus = CandidateBus::default();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(
            EligibilityGate::new(RuleSet::Base, tx).run(bus.subscribe(), CancellationToken::new()),
        );

        let mentioned =
            EligibilityInput::new(NotificationPreference::Mentions).with_at_mention(true);
        bus.publish(candidate(1, mentioned));
        drop(bus);

        let summary = handle.await.unwrap();
        assert_eq!(summary.suppressed, 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn lagged_gate_counts_skipped_and_keeps_going() {
        let bus = CandidateBus::new(2);
        let receiver = bus.subscribe();
        let everything = EligibilityInput::new(NotificationPreference::Everything);
        for id in 1..=5 {
            bus.publish(candidate(id, everything));
        }

        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(
            EligibilityGate::new(RuleSet::Canonical, tx).run(receiver, CancellationToken::new()),
        );
        drop(bus);

        let summary = handle.await.unwrap();
        assert_eq!(summary.lagged, 3);
        assert_eq!(summary.received, 2);
        assert_eq!(summary.forwarded, 2);

        let mut forwarded = Vec::new();
        while let Some(event) = rx.recv().await {
            forwarded.push(event.recipient_id);
        }
        assert_eq!(forwarded, vec![4, 5]);
    }

    #[tokio::test]
    async fn drain_signal_fires_per_receive_and_on_shutdown() {
        let bus = CandidateBus::new(1);
        let drained = bus.drain_signal();
        let (tx, _rx) = mpsc::channel(8);
        let gate =
            EligibilityGate::new(RuleSet::Canonical, tx).with_drain_signal(bus.drain_signal());
        let receiver = bus.subscribe();

        bus.publish(candidate(1, EligibilityInput::new(NotificationPreference::Everything)));
        let handle = tokio::spawn(gate.run(receiver, CancellationToken::new()));
        drained.notified().await;

        bus.publish_when_ready(candidate(
            2,
            EligibilityInput::new(NotificationPreference::Mentions),
        ))
        .await;
        drop(bus);

        let summary = handle.await.unwrap();
        assert_eq!(summary.received, 2);
        assert_eq!(summary.lagged, 0);
    }

    #[tokio::test]
    async fn cancellation_stops_the_gate() {
        let bus = CandidateBus::default();
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            EligibilityGate::new(RuleSet::Canonical, tx).run(bus.subscribe(), cancel.clone()),
        );

        cancel.cancel();
        let summary = handle.await.unwrap();
        assert_eq!(summary, GateSummary::default());
    }

    #[tokio::test]
    async fn dropped_dispatch_receiver_stops_the_gate() {
        let bus = CandidateBus::default();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let gate = EligibilityGate::new(RuleSet::Canonical, tx);
        let handle = tokio::spawn(gate.run(bus.subscribe(), CancellationToken::new()));

        bus.publish(candidate(
            1,
            EligibilityInput::new(NotificationPreference::Everything),
        ));

        let summary = handle.await.unwrap();
        assert_eq!(summary.received, 1);
        assert_eq!(summary.forwarded, 0);
    }
}
