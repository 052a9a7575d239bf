#![allow(dead_code)]

use notigate_core::{EligibilityInput, NotificationPreference, ThreadingState};

/// A record that notifies under the current rules: every signal leans
/// toward sending.
pub fn tend_to_send() -> EligibilityInput {
    EligibilityInput {
        channel_muted: false,
        threading: ThreadingState::Unthreaded,
        do_not_disturb: false,
        do_not_disturb_overridden: true,
        broadcast: true,
        suppress_broadcast: false,
        channel_notification_preference: NotificationPreference::Everything,
        threads_everything: true,
        at_mention: true,
        comment_on_file_owned_by_user: true,
    }
}

/// A record where every signal leans toward suppressing.
pub fn tend_not_to_send() -> EligibilityInput {
    EligibilityInput {
        channel_muted: true,
        threading: ThreadingState::Threaded { subscribed: false },
        do_not_disturb: true,
        do_not_disturb_overridden: false,
        broadcast: false,
        suppress_broadcast: true,
        channel_notification_preference: NotificationPreference::Nothing,
        threads_everything: false,
        at_mention: false,
        comment_on_file_owned_by_user: false,
    }
}

/// A named expectation built from overrides on a base record.
///
/// The base leans the opposite way to the expectation, so a scenario only
/// passes if its overrides are what decide the outcome.
pub struct Scenario {
    pub title: &'static str,
    pub expect_to_send: bool,
    pub overrides: fn(EligibilityInput) -> EligibilityInput,
}

impl Scenario {
    pub fn input(&self) -> EligibilityInput {
        let base = if self.expect_to_send {
            tend_not_to_send()
        } else {
            tend_to_send()
        };
        (self.overrides)(base)
    }
}

pub const THREADING_STATES: [ThreadingState; 3] = [
    ThreadingState::Unthreaded,
    ThreadingState::Threaded { subscribed: false },
    ThreadingState::Threaded { subscribed: true },
];

/// Every distinct input: eight flags, three threading states, three tiers.
pub fn all_inputs() -> Vec<EligibilityInput> {
    let mut inputs = Vec::with_capacity(256 * 9);
    for bits in 0u16..256 {
        let flag = |n: u16| bits & (1 << n) != 0;
        for threading in THREADING_STATES {
            for tier in NotificationPreference::ALL {
                inputs.push(EligibilityInput {
                    channel_muted: flag(0),
                    threading,
                    do_not_disturb: flag(1),
                    do_not_disturb_overridden: flag(2),
                    broadcast: flag(3),
                    suppress_broadcast: flag(4),
                    channel_notification_preference: tier,
                    threads_everything: flag(5),
                    at_mention: flag(6),
                    comment_on_file_owned_by_user: flag(7),
                });
            }
        }
    }
    inputs
}
