//! Notification eligibility core.
//!
//! Pure logic with no I/O: given a snapshot of channel, presence, message and
//! preference signals for one recipient, decide whether a notification should
//! be delivered.
//!
//! - [`types`]: the input snapshot and its closed enumerations.
//! - [`eligibility`]: flat boolean evaluators and reason-reporting assessment.
//! - [`decision_tree`]: the same rules expressed as a tree of binary
//!   predicate nodes, loadable from JSON.
//! - [`rule_set`]: selection between the evaluators at runtime.

pub mod decision_tree;
pub mod eligibility;
pub mod error;
pub mod rule_set;
pub mod types;

pub use decision_tree::{base_tree, canonical_tree, Action, DecisionNode, Predicate};
pub use eligibility::{assess, assess_base, evaluate, evaluate_base, Assessment, SuppressionReason};
pub use error::CoreError;
pub use rule_set::RuleSet;
pub use types::{DbId, EligibilityInput, NotificationPreference, ThreadingState, Timestamp};
