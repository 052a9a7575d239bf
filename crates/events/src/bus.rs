//! In-process candidate bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`CandidateBus`] is the publish/subscribe hub for [`CandidateEvent`]s.
//! It is designed to be shared via `Arc<CandidateBus>` across the application.

use chrono::Utc;
use notigate_core::types::{DbId, Timestamp};
use notigate_core::{CoreError, EligibilityInput};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Notify};

// ---------------------------------------------------------------------------
// CandidateEvent
// ---------------------------------------------------------------------------

/// A message event that may turn into a notification for one recipient.
///
/// Constructed via [`CandidateEvent::new`] and optionally tagged with
/// [`with_message_ref`](CandidateEvent::with_message_ref).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvent {
    /// The user who would receive the notification.
    pub recipient_id: DbId,

    /// Optional reference to the originating message, e.g. `"C024/1712345"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ref: Option<String>,

    /// Signal snapshot assembled for this recipient.
    pub input: EligibilityInput,

    /// When the candidate was received (UTC). Defaults to now when absent.
    #[serde(default = "Utc::now")]
    pub received_at: Timestamp,
}

impl CandidateEvent {
    pub fn new(recipient_id: DbId, input: EligibilityInput) -> Self {
        Self {
            recipient_id,
            message_ref: None,
            input,
            received_at: Utc::now(),
        }
    }

    pub fn with_message_ref(mut self, message_ref: impl Into<String>) -> Self {
        self.message_ref = Some(message_ref.into());
        self
    }

    /// Parse one JSON envelope, rejecting anything the input model rejects.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// CandidateBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for candidate events.
///
/// ```rust
/// use notigate_core::{EligibilityInput, NotificationPreference};
/// use notigate_events::bus::{CandidateBus, CandidateEvent};
///
/// let bus = CandidateBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(CandidateEvent::new(
///     7,
///     EligibilityInput::new(NotificationPreference::Everything),
/// ));
/// ```
pub struct CandidateBus {
    sender: broadcast::Sender<CandidateEvent>,
    capacity: usize,
    drained: Arc<Notify>,
}

impl CandidateBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed candidates are dropped
    /// and slow receivers observe `RecvError::Lagged`. Panics if `capacity`
    /// is zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            drained: Arc::new(Notify::new()),
        }
    }

    /// Publish a candidate to all current subscribers.
    ///
    /// With no subscribers the candidate is silently dropped.
    pub fn publish(&self, event: CandidateEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Publish once the buffer has room, so no subscriber lags.
    ///
    /// Waits on the [`drain_signal`](Self::drain_signal); a consumer must
    /// notify it after every receive or this never wakes while the buffer
    /// is full.
    pub async fn publish_when_ready(&self, event: CandidateEvent) {
        while self.pending() >= self.capacity {
            self.drained.notified().await;
        }
        self.publish(event);
    }

    /// Handle a consumer notifies after taking a candidate off the bus.
    pub fn drain_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.drained)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CandidateEvent> {
        self.sender.subscribe()
    }

    /// Candidates still queued for the slowest subscriber.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CandidateBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
