//! Eligibility evaluation. Pure logic, no I/O.
//!
//! Two revisions of the rule set are provided:
//!
//! - [`evaluate`]: the current rules, with the mentions-only tier and the
//!   `threads_everything` override.
//! - [`evaluate_base`]: the earlier two-tier rules, where only
//!   [`NotificationPreference::Everything`] lets a notification through.
//!
//! The hard blocks (suppressed broadcast, do-not-disturb, muted channel) are
//! shared by both. [`assess`] and [`assess_base`] return the same verdicts
//! together with the first rule that suppressed the notification.

use std::fmt;

use serde::Serialize;

use crate::types::{EligibilityInput, NotificationPreference};

// ---------------------------------------------------------------------------
// Suppression reasons
// ---------------------------------------------------------------------------

/// Why a candidate notification was not eligible.
///
/// Variants are listed in evaluation order; when several rules fire, the
/// earliest one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    /// A broadcast reached a recipient who opted out of broadcasts.
    SuppressedBroadcast,
    /// The recipient is in do-not-disturb and the sender did not override it.
    DoNotDisturb,
    /// The channel is muted and the event is not in a subscribed thread.
    ChannelMuted,
    /// Mentions-only tier, no `threads_everything`, and no @-mention.
    MentionsOnly,
    /// The recipient's tier does not allow this channel's notifications.
    ChannelOff,
    /// A configured decision tree ended in `dont_notify`.
    DecisionTree,
}

impl SuppressionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionReason::SuppressedBroadcast => "suppressed_broadcast",
            SuppressionReason::DoNotDisturb => "do_not_disturb",
            SuppressionReason::ChannelMuted => "channel_muted",
            SuppressionReason::MentionsOnly => "mentions_only",
            SuppressionReason::ChannelOff => "channel_off",
            SuppressionReason::DecisionTree => "decision_tree",
        }
    }
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict for one candidate, plus the reason when it was suppressed.
///
/// `reason` is `None` exactly when `eligible` is `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub eligible: bool,
    pub reason: Option<SuppressionReason>,
}

impl Assessment {
    pub(crate) fn eligible() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    pub(crate) fn suppressed(reason: SuppressionReason) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn broadcast_suppressed(input: &EligibilityInput) -> bool {
    input.broadcast && input.suppress_broadcast
}

fn do_not_disturb_blocks(input: &EligibilityInput) -> bool {
    input.do_not_disturb && !input.do_not_disturb_overridden
}

/// A thread subscription is the only way past a channel mute.
fn mute_blocks(input: &EligibilityInput) -> bool {
    input.channel_muted && !input.threading.is_subscribed()
}

fn mentions_only_blocks(input: &EligibilityInput) -> bool {
    let mentions_only = match input.channel_notification_preference {
        NotificationPreference::Mentions => !input.threads_everything,
        NotificationPreference::Everything | NotificationPreference::Nothing => false,
    };
    mentions_only && !input.at_mention
}

fn hard_block(input: &EligibilityInput) -> Option<SuppressionReason> {
    if broadcast_suppressed(input) {
        Some(SuppressionReason::SuppressedBroadcast)
    } else if do_not_disturb_blocks(input) {
        Some(SuppressionReason::DoNotDisturb)
    } else if mute_blocks(input) {
        Some(SuppressionReason::ChannelMuted)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Current rules
// ---------------------------------------------------------------------------

/// Decide whether the candidate should notify the recipient.
///
/// Suppressed if any of these hold:
/// 1. a broadcast reaches a recipient who suppresses broadcasts;
/// 2. do-not-disturb is on and the sender did not override it;
/// 3. the channel is muted and the event is not in a subscribed thread;
/// 4. the tier is mentions-only, `threads_everything` is off, and the event
///    does not @-mention the recipient.
///
/// Otherwise the recipient is notified unless the tier is `Nothing`.
pub fn evaluate(input: &EligibilityInput) -> bool {
    if broadcast_suppressed(input)
        || do_not_disturb_blocks(input)
        || mute_blocks(input)
        || mentions_only_blocks(input)
    {
        return false;
    }

    match input.channel_notification_preference {
        NotificationPreference::Everything | NotificationPreference::Mentions => true,
        NotificationPreference::Nothing => false,
    }
}

/// [`evaluate`] with the first suppressing rule attached.
pub fn assess(input: &EligibilityInput) -> Assessment {
    if let Some(reason) = hard_block(input) {
        return Assessment::suppressed(reason);
    }
    if mentions_only_blocks(input) {
        return Assessment::suppressed(SuppressionReason::MentionsOnly);
    }

    match input.channel_notification_preference {
        NotificationPreference::Everything | NotificationPreference::Mentions => {
            Assessment::eligible()
        }
        NotificationPreference::Nothing => Assessment::suppressed(SuppressionReason::ChannelOff),
    }
}

// ---------------------------------------------------------------------------
// Base rules
// ---------------------------------------------------------------------------

/// The two-tier rules: hard blocks only, and the tier must be `Everything`.
///
/// `Mentions` did not exist in this revision; it is treated like any other
/// tier that is not `Everything` and never notifies.
pub fn evaluate_base(input: &EligibilityInput) -> bool {
    if broadcast_suppressed(input) || do_not_disturb_blocks(input) || mute_blocks(input) {
        return false;
    }

    match input.channel_notification_preference {
        NotificationPreference::Everything => true,
        NotificationPreference::Mentions | NotificationPreference::Nothing => false,
    }
}

/// [`evaluate_base`] with the first suppressing rule attached.
pub fn assess_base(input: &EligibilityInput) -> Assessment {
    if let Some(reason) = hard_block(input) {
        return Assessment::suppressed(reason);
    }

    match input.channel_notification_preference {
        NotificationPreference::Everything => Assessment::eligible(),
        NotificationPreference::Mentions | NotificationPreference::Nothing => {
            Assessment::suppressed(SuppressionReason::ChannelOff)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
