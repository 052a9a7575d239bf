//! Eligibility input snapshot and its closed enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Recipient ids match the upstream user table's BIGSERIAL keys.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// ---------------------------------------------------------------------------
// ThreadingState
// ---------------------------------------------------------------------------

/// Whether the event is inside a thread, and whether the recipient follows it.
///
/// Serialized as `{"type": "Threaded", "subscribed": true}` or
/// `{"type": "Unthreaded", "subscribed": false}`. An unthreaded state that
/// claims a subscription is rejected at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireThreading", into = "WireThreading")]
pub enum ThreadingState {
    Unthreaded,
    Threaded { subscribed: bool },
}

impl ThreadingState {
    /// Subscription only exists inside a thread; unthreaded is never subscribed.
    pub fn is_subscribed(&self) -> bool {
        match self {
            ThreadingState::Unthreaded => false,
            ThreadingState::Threaded { subscribed } => *subscribed,
        }
    }

    pub fn is_threaded(&self) -> bool {
        matches!(self, ThreadingState::Threaded { .. })
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
enum WireThreading {
    Unthreaded {
        #[serde(default)]
        subscribed: bool,
    },
    Threaded {
        subscribed: bool,
    },
}

impl TryFrom<WireThreading> for ThreadingState {
    type Error = CoreError;

    fn try_from(wire: WireThreading) -> Result<Self, Self::Error> {
        match wire {
            WireThreading::Unthreaded { subscribed: false } => Ok(ThreadingState::Unthreaded),
            WireThreading::Unthreaded { subscribed: true } => Err(CoreError::Validation(
                "an unthreaded message cannot have a thread subscription".into(),
            )),
            WireThreading::Threaded { subscribed } => Ok(ThreadingState::Threaded { subscribed }),
        }
    }
}

impl From<ThreadingState> for WireThreading {
    fn from(state: ThreadingState) -> Self {
        match state {
            ThreadingState::Unthreaded => WireThreading::Unthreaded { subscribed: false },
            ThreadingState::Threaded { subscribed } => WireThreading::Threaded { subscribed },
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationPreference
// ---------------------------------------------------------------------------

/// The recipient's notification tier for a channel.
///
/// The tiers are not a linear scale; every rule matches on them exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPreference {
    Everything,
    Mentions,
    Nothing,
}

impl NotificationPreference {
    pub const ALL: [NotificationPreference; 3] = [
        NotificationPreference::Everything,
        NotificationPreference::Mentions,
        NotificationPreference::Nothing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPreference::Everything => "everything",
            NotificationPreference::Mentions => "mentions",
            NotificationPreference::Nothing => "nothing",
        }
    }
}

impl fmt::Display for NotificationPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationPreference {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationPreference::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown notification preference: '{s}'. \
                     Valid values: everything, mentions, nothing"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// EligibilityInput
// ---------------------------------------------------------------------------

/// Every signal the evaluator looks at for one candidate notification.
///
/// All fields are mandatory. Callers assemble a fresh value per candidate
/// from the channel, presence, preference and message-parsing layers; the
/// `with_*` methods derive a modified copy from a base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EligibilityInput {
    /// The recipient muted the channel.
    pub channel_muted: bool,

    /// Thread membership and subscription of the event.
    pub threading: ThreadingState,

    /// The recipient is inside a do-not-disturb window.
    pub do_not_disturb: bool,

    /// The sender marked the message as worth breaking through do-not-disturb.
    pub do_not_disturb_overridden: bool,

    /// The message is a broadcast such as `@channel`.
    pub broadcast: bool,

    /// The recipient opted out of broadcast notifications.
    pub suppress_broadcast: bool,

    /// The recipient's tier for this channel.
    pub channel_notification_preference: NotificationPreference,

    /// Everything in subscribed threads notifies, even on the mentions tier.
    pub threads_everything: bool,

    /// The event @-mentions the recipient.
    pub at_mention: bool,

    /// The event is a comment on a file the recipient owns. Not consulted by
    /// any rule.
    pub comment_on_file_owned_by_user: bool,
}

impl EligibilityInput {
    /// A quiet base record: no flags set, unthreaded, with the given tier.
    pub fn new(preference: NotificationPreference) -> Self {
        Self {
            channel_muted: false,
            threading: ThreadingState::Unthreaded,
            do_not_disturb: false,
            do_not_disturb_overridden: false,
            broadcast: false,
            suppress_broadcast: false,
            channel_notification_preference: preference,
            threads_everything: false,
            at_mention: false,
            comment_on_file_owned_by_user: false,
        }
    }

    /// Parse a JSON snapshot; every field must be present and recognized.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_channel_muted(mut self, muted: bool) -> Self {
        self.channel_muted = muted;
        self
    }

    pub fn with_threading(mut self, threading: ThreadingState) -> Self {
        self.threading = threading;
        self
    }

    pub fn with_do_not_disturb(mut self, dnd: bool) -> Self {
        self.do_not_disturb = dnd;
        self
    }

    pub fn with_do_not_disturb_overridden(mut self, overridden: bool) -> Self {
        self.do_not_disturb_overridden = overridden;
        self
    }

    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }

    pub fn with_suppress_broadcast(mut self, suppress: bool) -> Self {
        self.suppress_broadcast = suppress;
        self
    }

    pub fn with_preference(mut self, preference: NotificationPreference) -> Self {
        self.channel_notification_preference = preference;
        self
    }

    pub fn with_threads_everything(mut self, threads_everything: bool) -> Self {
        self.threads_everything = threads_everything;
        self
    }

    pub fn with_at_mention(mut self, at_mention: bool) -> Self {
        self.at_mention = at_mention;
        self
    }

    pub fn with_comment_on_file_owned_by_user(mut self, comment: bool) -> Self {
        self.comment_on_file_owned_by_user = comment;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn full_json(threading: &str, preference: &str) -> String {
        format!(
            r#"{{
                "channelMuted": false,
                "threading": {threading},
                "doNotDisturb": true,
                "doNotDisturbOverridden": false,
                "broadcast": false,
                "suppressBroadcast": false,
                "channelNotificationPreference": "{preference}",
                "threadsEverything": true,
                "atMention": false,
                "commentOnFileOwnedByUser": true
            }}"#
        )
    }

    // -- ThreadingState -------------------------------------------------------

    #[test]
    fn unthreaded_is_never_subscribed() {
        assert!(!ThreadingState::Unthreaded.is_subscribed());
        assert!(!ThreadingState::Unthreaded.is_threaded());
    }

    #[test]
    fn threaded_reports_its_subscription() {
        assert!(ThreadingState::Threaded { subscribed: true }.is_subscribed());
        assert!(!ThreadingState::Threaded { subscribed: false }.is_subscribed());
        assert!(ThreadingState::Threaded { subscribed: false }.is_threaded());
    }

    #[test]
    fn threading_serializes_with_type_tag() {
        let json = serde_json::to_value(ThreadingState::Threaded { subscribed: true }).unwrap();
        assert_eq!(json["type"], "Threaded");
        assert_eq!(json["subscribed"], true);

        let json = serde_json::to_value(ThreadingState::Unthreaded).unwrap();
        assert_eq!(json["type"], "Unthreaded");
        assert_eq!(json["subscribed"], false);
    }

    #[test]
    fn unthreaded_without_subscribed_member_is_accepted() {
        let state: ThreadingState = serde_json::from_str(r#"{"type": "Unthreaded"}"#).unwrap();
        assert_eq!(state, ThreadingState::Unthreaded);
    }

    #[test]
    fn unthreaded_with_subscription_is_rejected() {
        let result =
            serde_json::from_str::<ThreadingState>(r#"{"type": "Unthreaded", "subscribed": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn threading_with_unknown_member_is_rejected() {
        let result = serde_json::from_str::<ThreadingState>(
            r#"{"type": "Threaded", "subscribed": true, "extra": 1}"#,
        );
        assert!(result.is_err());
        let result =
            serde_json::from_str::<ThreadingState>(r#"{"type": "Unthreaded", "extra": 1}"#);
        assert!(result.is_err());
    }

    // -- NotificationPreference -----------------------------------------------

    #[test]
    fn preference_parses_lowercase_names() {
        assert_eq!(
            "everything".parse::<NotificationPreference>().unwrap(),
            NotificationPreference::Everything
        );
        assert_eq!(
            "mentions".parse::<NotificationPreference>().unwrap(),
            NotificationPreference::Mentions
        );
        assert_eq!(
            "nothing".parse::<NotificationPreference>().unwrap(),
            NotificationPreference::Nothing
        );
    }

    #[test]
    fn unknown_preference_rejected() {
        assert_matches!(
            "sometimes".parse::<NotificationPreference>(),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            "Everything".parse::<NotificationPreference>(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn preference_display_matches_wire_name() {
        for p in NotificationPreference::ALL {
            assert_eq!(p.to_string(), serde_json::to_value(p).unwrap());
        }
    }

    // -- EligibilityInput -----------------------------------------------------

    #[test]
    fn new_input_is_quiet() {
        let input = EligibilityInput::new(NotificationPreference::Mentions);
        assert!(!input.channel_muted);
        assert_eq!(input.threading, ThreadingState::Unthreaded);
        assert!(!input.do_not_disturb);
        assert!(!input.broadcast);
        assert!(!input.at_mention);
        assert_eq!(
            input.channel_notification_preference,
            NotificationPreference::Mentions
        );
    }

    #[test]
    fn builder_overrides_only_the_named_field() {
        let base = EligibilityInput::new(NotificationPreference::Everything);
        let muted = base.with_channel_muted(true);
        assert!(muted.channel_muted);
        assert_eq!(muted.with_channel_muted(false), base);
    }

    #[test]
    fn from_json_parses_full_record() {
        let threading = r#"{"type": "Threaded", "subscribed": true}"#;
        let input = EligibilityInput::from_json(&full_json(threading, "mentions")).unwrap();
        assert_eq!(input.threading, ThreadingState::Threaded { subscribed: true });
        assert_eq!(
            input.channel_notification_preference,
            NotificationPreference::Mentions
        );
        assert!(input.do_not_disturb);
        assert!(input.threads_everything);
        assert!(input.comment_on_file_owned_by_user);
    }

    #[test]
    fn from_json_rejects_unknown_tier() {
        let result = EligibilityInput::from_json(&full_json(r#"{"type": "Unthreaded"}"#, "loud"));
        assert_matches!(result, Err(CoreError::Json(_)));
    }

    #[test]
    fn from_json_rejects_missing_field() {
        let result = EligibilityInput::from_json(r#"{"channelMuted": true}"#);
        assert_matches!(result, Err(CoreError::Json(_)));
    }

    #[test]
    fn from_json_rejects_unknown_field() {
        let json = full_json(r#"{"type": "Unthreaded"}"#, "everything")
            .replacen('{', r#"{"urgent": true,"#, 1);
        assert_matches!(EligibilityInput::from_json(&json), Err(CoreError::Json(_)));
    }

    #[test]
    fn serialization_uses_camel_case_names() {
        let input = EligibilityInput::new(NotificationPreference::Nothing);
        let json = serde_json::to_value(input).unwrap();
        assert_eq!(json["channelNotificationPreference"], "nothing");
        assert_eq!(json["doNotDisturbOverridden"], false);
        assert_eq!(json["commentOnFileOwnedByUser"], false);
        assert_eq!(json["threading"]["type"], "Unthreaded");
    }
}
