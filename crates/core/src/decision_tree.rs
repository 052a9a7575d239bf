//! Eligibility rules as a tree of binary predicate nodes.
//!
//! Each [`DecisionNode::Branch`] tests one [`Predicate`] against the input
//! and continues into its `yes` or `no` subtree; each [`DecisionNode::Leaf`]
//! ends evaluation with an [`Action`]. Trees are built bottom-up: every check
//! takes the subtree to continue with once the check passes.
//!
//! Trees round-trip through JSON, so a rule set can be supplied as data:
//!
//! ```json
//! {"branch": {"predicate": "channel_muted",
//!             "yes": {"leaf": "dont_notify"},
//!             "no":  {"leaf": "notify"}}}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EligibilityInput, NotificationPreference};

/// Deepest tree accepted from external JSON.
pub const MAX_TREE_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Actions and predicates
// ---------------------------------------------------------------------------

/// Terminal outcome of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Notify,
    DontNotify,
}

impl Action {
    pub fn is_notify(&self) -> bool {
        matches!(self, Action::Notify)
    }
}

/// A boolean question about an [`EligibilityInput`].
///
/// `comment_on_file_owned_by_user` has no predicate; no rule consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    ChannelMuted,
    DoNotDisturb,
    DndOverride,
    Broadcast,
    SuppressedBroadcast,
    ThreadMessageAndUserSubscribed,
    ThreadsEverything,
    AtMention,
    /// Holds when the channel tier equals the given tier.
    Preference(NotificationPreference),
}

impl Predicate {
    pub fn holds(&self, input: &EligibilityInput) -> bool {
        match self {
            Predicate::ChannelMuted => input.channel_muted,
            Predicate::DoNotDisturb => input.do_not_disturb,
            Predicate::DndOverride => input.do_not_disturb_overridden,
            Predicate::Broadcast => input.broadcast,
            Predicate::SuppressedBroadcast => input.suppress_broadcast,
            Predicate::ThreadMessageAndUserSubscribed => input.threading.is_subscribed(),
            Predicate::ThreadsEverything => input.threads_everything,
            Predicate::AtMention => input.at_mention,
            Predicate::Preference(tier) => input.channel_notification_preference == *tier,
        }
    }
}

// ---------------------------------------------------------------------------
// DecisionNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionNode {
    Leaf(Action),
    Branch {
        predicate: Predicate,
        yes: Box<DecisionNode>,
        no: Box<DecisionNode>,
    },
}

impl DecisionNode {
    pub fn notify() -> Self {
        DecisionNode::Leaf(Action::Notify)
    }

    pub fn dont_notify() -> Self {
        DecisionNode::Leaf(Action::DontNotify)
    }

    /// Binary branch combinator: dispatch on `predicate` into `yes` or `no`.
    pub fn branch(predicate: Predicate, yes: DecisionNode, no: DecisionNode) -> Self {
        DecisionNode::Branch {
            predicate,
            yes: Box::new(yes),
            no: Box::new(no),
        }
    }

    /// Walk from the root to a leaf and return its action.
    pub fn decide(&self, input: &EligibilityInput) -> Action {
        let mut node = self;
        loop {
            match node {
                DecisionNode::Leaf(action) => return *action,
                DecisionNode::Branch { predicate, yes, no } => {
                    node = if predicate.holds(input) { yes } else { no };
                }
            }
        }
    }

    pub fn evaluate(&self, input: &EligibilityInput) -> bool {
        self.decide(input).is_notify()
    }

    /// Number of nodes on the longest root-to-leaf path, counting the leaf.
    pub fn depth(&self) -> usize {
        match self {
            DecisionNode::Leaf(_) => 1,
            DecisionNode::Branch { yes, no, .. } => 1 + yes.depth().max(no.depth()),
        }
    }

    /// Parse a tree from JSON and check it against [`MAX_TREE_DEPTH`].
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let tree: DecisionNode = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let depth = self.depth();
        if depth > MAX_TREE_DEPTH {
            return Err(CoreError::Validation(format!(
                "decision tree depth {depth} exceeds the maximum of {MAX_TREE_DEPTH}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// A muted channel continues only inside a subscribed thread.
fn mute_check(next: DecisionNode) -> DecisionNode {
    DecisionNode::branch(
        Predicate::ChannelMuted,
        DecisionNode::branch(
            Predicate::ThreadMessageAndUserSubscribed,
            next.clone(),
            DecisionNode::dont_notify(),
        ),
        next,
    )
}

fn dnd_check(next: DecisionNode) -> DecisionNode {
    DecisionNode::branch(
        Predicate::DoNotDisturb,
        DecisionNode::branch(Predicate::DndOverride, next.clone(), DecisionNode::dont_notify()),
        next,
    )
}

fn broadcast_check(next: DecisionNode) -> DecisionNode {
    DecisionNode::branch(
        Predicate::Broadcast,
        DecisionNode::branch(
            Predicate::SuppressedBroadcast,
            DecisionNode::dont_notify(),
            next.clone(),
        ),
        next,
    )
}

/// Hard blocks, gated by the mute check, around `tier`.
fn hard_blocks(tier: DecisionNode) -> DecisionNode {
    mute_check(dnd_check(broadcast_check(tier)))
}

/// The two-tier rules: notify only on the `Everything` tier.
pub fn base_tree() -> DecisionNode {
    hard_blocks(DecisionNode::branch(
        Predicate::Preference(NotificationPreference::Everything),
        DecisionNode::notify(),
        DecisionNode::dont_notify(),
    ))
}

/// The current rules, including the mentions tier and `threads_everything`.
pub fn canonical_tree() -> DecisionNode {
    let mentions = DecisionNode::branch(
        Predicate::ThreadsEverything,
        DecisionNode::notify(),
        DecisionNode::branch(
            Predicate::AtMention,
            DecisionNode::notify(),
            DecisionNode::dont_notify(),
        ),
    );
    let other_tiers = DecisionNode::branch(
        Predicate::Preference(NotificationPreference::Nothing),
        DecisionNode::dont_notify(),
        DecisionNode::notify(),
    );

    hard_blocks(DecisionNode::branch(
        Predicate::Preference(NotificationPreference::Mentions),
        mentions,
        other_tiers,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
