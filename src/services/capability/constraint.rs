//! Single-constraint comparison.
//!
//! The two directions of "absent" are deliberately asymmetric:
//! - an absent *imposed* value is no restriction, so the claim holds;
//! - an absent *claimed* value is maximally permissive (an unbounded limit, or the empty
//!   scope) and therefore violates any imposed value.
use super::error::Violation;
use super::types::{Capability, ConstraintValue};

/// Where a comparison happens: the constraint name and the capability it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintContext<'a> {
    pub name: &'a str,
    pub claim: &'a Capability,
}

impl<'a> ConstraintContext<'a> {
    pub fn new(name: &'a str, claim: &'a Capability) -> Self {
        Self { name, claim }
    }

    fn invalid(&self, claimed: ConstraintValue, imposed: ConstraintValue) -> Violation {
        Violation::InvalidConstraint {
            name: self.name.to_string(),
            claim: self.claim.clone(),
            claimed,
            imposed,
        }
    }

    fn incomparable(&self, claimed: ConstraintValue, imposed: ConstraintValue) -> Violation {
        Violation::IncomparableConstraint {
            name: self.name.to_string(),
            claim: self.claim.clone(),
            claimed,
            imposed,
        }
    }
}

/// Compares a claimed value against the value imposed by a grant.
pub fn check_constraint(
    claimed: Option<&ConstraintValue>,
    imposed: Option<&ConstraintValue>,
    cx: ConstraintContext<'_>,
) -> Result<(), Violation> {
    match imposed {
        None => Ok(()),
        Some(ConstraintValue::Limit(limit)) => check_limit(claimed, *limit, cx),
        Some(ConstraintValue::Scope(scope)) => check_scope(claimed, scope, cx),
    }
}

/// Numeric limit: holds iff `claimed <= imposed`.
pub fn check_limit(
    claimed: Option<&ConstraintValue>,
    imposed: f64,
    cx: ConstraintContext<'_>,
) -> Result<(), Violation> {
    let imposed_value = ConstraintValue::Limit(imposed);
    match claimed {
        None => Err(cx.invalid(ConstraintValue::Limit(f64::INFINITY), imposed_value)),
        Some(ConstraintValue::Limit(n)) if *n > imposed => {
            Err(cx.invalid(ConstraintValue::Limit(*n), imposed_value))
        }
        Some(ConstraintValue::Limit(_)) => Ok(()),
        Some(other) => Err(cx.incomparable(other.clone(), imposed_value)),
    }
}

/// Scope path: holds iff equal, or the claim lives under the imposed scope.
pub fn check_scope(
    claimed: Option<&ConstraintValue>,
    imposed: &str,
    cx: ConstraintContext<'_>,
) -> Result<(), Violation> {
    let imposed_value = ConstraintValue::Scope(imposed.to_string());
    match claimed {
        None => Err(cx.invalid(ConstraintValue::Scope(String::new()), imposed_value)),
        Some(ConstraintValue::Scope(path)) => {
            if path == imposed || path.starts_with(&normalize_scope(imposed)) {
                Ok(())
            } else {
                Err(cx.invalid(ConstraintValue::Scope(path.clone()), imposed_value))
            }
        }
        Some(other) => Err(cx.incomparable(other.clone(), imposed_value)),
    }
}

/// `"/a"` -> `"/a/"`, so that `"/a"` covers `"/a/b"` but not `"/ab"`.
pub fn normalize_scope(scope: &str) -> String {
    if scope.ends_with('/') {
        scope.to_string()
    } else {
        format!("{scope}/")
    }
}
