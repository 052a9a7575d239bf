//! Runtime choice of which eligibility rules to apply.

use std::path::Path;

use crate::decision_tree::DecisionNode;
use crate::eligibility::{self, Assessment, SuppressionReason};
use crate::error::CoreError;
use crate::types::EligibilityInput;

pub const RULE_SET_CANONICAL: &str = "canonical";
pub const RULE_SET_BASE: &str = "base";
pub const RULE_SET_TREE: &str = "tree";

/// All valid rule set names.
pub const VALID_RULE_SETS: &[&str] = &[RULE_SET_CANONICAL, RULE_SET_BASE, RULE_SET_TREE];

/// The rules a gate evaluates candidates with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RuleSet {
    /// [`eligibility::evaluate`].
    #[default]
    Canonical,
    /// [`eligibility::evaluate_base`].
    Base,
    /// A decision tree, typically loaded from a JSON file.
    Tree(DecisionNode),
}

impl RuleSet {
    /// Resolve a rule set by name. `tree` reads and validates the JSON file
    /// at `tree_path`, which is then required.
    pub fn load(name: &str, tree_path: Option<&Path>) -> Result<Self, CoreError> {
        match name {
            RULE_SET_CANONICAL => Ok(RuleSet::Canonical),
            RULE_SET_BASE => Ok(RuleSet::Base),
            RULE_SET_TREE => {
                let path = tree_path.ok_or_else(|| {
                    CoreError::Validation("rule set 'tree' requires a tree file path".into())
                })?;
                let json = std::fs::read_to_string(path)?;
                Ok(RuleSet::Tree(DecisionNode::from_json(&json)?))
            }
            other => Err(CoreError::Validation(format!(
                "Unknown rule set: '{other}'. Valid rule sets: {}",
                VALID_RULE_SETS.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleSet::Canonical => RULE_SET_CANONICAL,
            RuleSet::Base => RULE_SET_BASE,
            RuleSet::Tree(_) => RULE_SET_TREE,
        }
    }

    pub fn evaluate(&self, input: &EligibilityInput) -> bool {
        match self {
            RuleSet::Canonical => eligibility::evaluate(input),
            RuleSet::Base => eligibility::evaluate_base(input),
            RuleSet::Tree(tree) => tree.evaluate(input),
        }
    }

    /// Trees carry no per-rule reasons; a rejecting tree reports
    /// [`SuppressionReason::DecisionTree`].
    pub fn assess(&self, input: &EligibilityInput) -> Assessment {
        match self {
            RuleSet::Canonical => eligibility::assess(input),
            RuleSet::Base => eligibility::assess_base(input),
            RuleSet::Tree(tree) => {
                if tree.evaluate(input) {
                    Assessment::eligible()
                } else {
                    Assessment::suppressed(SuppressionReason::DecisionTree)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
