//! Violations produced while comparing claimed capabilities with granted ones.
use std::fmt;

use thiserror::Error;

use super::types::{Capability, ConstraintValue};

/// A single reason why a claim is not backed by a grant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    /// No granted capability is even comparable to the claim.
    #[error("Claimed capability \"{claim}\" is unavailable")]
    InvalidClaim { claim: Capability },

    /// A comparable grant exists but this constraint exceeds what it imposes.
    #[error(
        "Claimed capability \"{claim}\" with constraint {name}={claimed} violates imposed {imposed} restriction"
    )]
    InvalidConstraint {
        name: String,
        claim: Capability,
        claimed: ConstraintValue,
        imposed: ConstraintValue,
    },

    /// Claimed and imposed values are of different kinds (limit vs scope).
    #[error(
        "Claimed capability \"{claim}\" with constraint {name}={claimed} constraint that is not comparable to imposed {imposed} restriction"
    )]
    IncomparableConstraint {
        name: String,
        claim: Capability,
        claimed: ConstraintValue,
        imposed: ConstraintValue,
    },
}

/// Aggregate of every violation found for a set of claims.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct EscalationError {
    pub violations: Vec<Violation>,
}

impl EscalationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for EscalationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Claimed capabilities are not met:")?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}
