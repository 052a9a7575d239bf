use std::path::PathBuf;

use notigate_core::rule_set::RULE_SET_CANONICAL;
use notigate_core::{CoreError, RuleSet};

/// Default broadcast buffer between intake and the gate.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Default buffer between the gate and the output writer.
pub const DEFAULT_DISPATCH_CAPACITY: usize = 256;

/// Largest accepted value for either channel capacity.
pub const MAX_CAPACITY: usize = 1 << 20;

/// Gate configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Rules applied to every candidate.
    pub rule_set: RuleSet,
    /// Broadcast channel capacity (default: `1024`).
    pub bus_capacity: usize,
    /// Dispatch channel capacity (default: `256`).
    pub dispatch_capacity: usize,
}

impl GateConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default     |
    /// |--------------------------|-------------|
    /// | `GATE_RULE_SET`          | `canonical` |
    /// | `GATE_RULE_TREE_PATH`    | --          |
    /// | `GATE_BUS_CAPACITY`      | `1024`      |
    /// | `GATE_DISPATCH_CAPACITY` | `256`       |
    ///
    /// `GATE_RULE_TREE_PATH` is required when `GATE_RULE_SET=tree`. Capacities
    /// must be between 1 and [`MAX_CAPACITY`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let rule_set_name = lookup("GATE_RULE_SET").unwrap_or_else(|| RULE_SET_CANONICAL.into());
        let tree_path = lookup("GATE_RULE_TREE_PATH").map(PathBuf::from);
        let rule_set = RuleSet::load(rule_set_name.trim(), tree_path.as_deref())?;

        let bus_capacity = parse_capacity(
            "GATE_BUS_CAPACITY",
            lookup("GATE_BUS_CAPACITY"),
            DEFAULT_BUS_CAPACITY,
        )?;
        let dispatch_capacity = parse_capacity(
            "GATE_DISPATCH_CAPACITY",
            lookup("GATE_DISPATCH_CAPACITY"),
            DEFAULT_DISPATCH_CAPACITY,
        )?;

        Ok(Self {
            rule_set,
            bus_capacity,
            dispatch_capacity,
        })
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rule_set: RuleSet::Canonical,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
        }
    }
}

fn parse_capacity(key: &str, value: Option<String>, default: usize) -> Result<usize, CoreError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(CoreError::Validation(format!("{key} must be greater than 0"))),
        Ok(n) if n > MAX_CAPACITY => Err(CoreError::Validation(format!(
            "{key} must be at most {MAX_CAPACITY}, got {n}"
        ))),
        Ok(n) => Ok(n),
        Err(_) => Err(CoreError::Validation(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
