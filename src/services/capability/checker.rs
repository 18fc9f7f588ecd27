//! Claimed-vs-granted capability checking.
use tracing::trace;

use super::constraint::{ConstraintContext, check_constraint};
use super::error::{EscalationError, Violation};
use super::types::{Capability, ID};

/// Every claim must be satisfied by at least one grant.
///
/// Violations of all failing claims are collected into one error; a failing claim does
/// not stop the remaining claims from being checked.
pub fn check_all(claims: &[Capability], granted: &[Capability]) -> Result<(), EscalationError> {
    let mut violations = Vec::new();
    for claim in claims {
        if let Err(mut found) = check_one(claim, granted) {
            violations.append(&mut found);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(EscalationError::new(violations))
    }
}

/// Checks a single claim against the grants.
///
/// Grants that are not comparable (different `cap`, or an `id` outside the grant's scope)
/// are skipped silently. The first comparable grant whose constraints all hold satisfies
/// the claim. Comparable grants that fail contribute their violations, and scanning
/// continues because a later grant may still satisfy the claim. When nothing is comparable
/// the result is a single `InvalidClaim`.
pub fn check_one(claim: &Capability, granted: &[Capability]) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();
    for grant in granted.iter().filter(|grant| is_comparable(claim, grant)) {
        match check_constraints(claim, grant) {
            Ok(()) => return Ok(()),
            Err(mut found) => {
                trace!(claim = %claim, grant = %grant, "comparable grant does not satisfy claim");
                violations.append(&mut found);
            }
        }
    }

    if violations.is_empty() {
        Err(vec![Violation::InvalidClaim {
            claim: claim.clone(),
        }])
    } else {
        Err(violations)
    }
}

/// Same operation, and the claim's `id` sits within the grant's `id` scope.
pub fn is_comparable(claim: &Capability, grant: &Capability) -> bool {
    if claim.cap != grant.cap {
        return false;
    }
    match &grant.id {
        None => true,
        Some(imposed) => check_constraint(
            claim.id.as_ref(),
            Some(imposed),
            ConstraintContext::new(ID, grant),
        )
        .is_ok(),
    }
}

/// Runs every constraint the claim carries (including `id`) against the grant.
fn check_constraints(claim: &Capability, grant: &Capability) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    if claim.id.is_some()
        && let Err(v) = check_constraint(
            claim.id.as_ref(),
            grant.id.as_ref(),
            ConstraintContext::new(ID, claim),
        )
    {
        violations.push(v);
    }

    for (name, claimed) in &claim.constraints {
        let cx = ConstraintContext::new(name, claim);
        if let Err(v) = check_constraint(Some(claimed), grant.constraints.get(name), cx) {
            violations.push(v);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::capability::types::{ConstraintValue, STORAGE_LIMIT};
    use pretty_assertions::assert_eq;

    #[test]
    fn exceeded_limit_yields_one_invalid_constraint() {
        let claim = Capability::new("POST", "/x").with(STORAGE_LIMIT, 100u64);
        let granted = [Capability::new("POST", "/x").with(STORAGE_LIMIT, 10u64)];

        let err = check_all(&[claim.clone()], &granted).unwrap_err();

        assert_eq!(
            err.violations,
            vec![Violation::InvalidConstraint {
                name: STORAGE_LIMIT.into(),
                claim,
                claimed: ConstraintValue::Limit(100.0),
                imposed: ConstraintValue::Limit(10.0),
            }]
        );
    }

    #[test]
    fn a_later_grant_can_satisfy_the_claim() {
        let granted = [
            Capability::new("POST", "/a").with(STORAGE_LIMIT, 1u64),
            Capability::new("POST", "/a").with(STORAGE_LIMIT, 1000u64),
        ];
        let claim = Capability::new("POST", "/a").with(STORAGE_LIMIT, 500u64);

        assert!(check_all(&[claim], &granted).is_ok());
    }

    #[test]
    fn first_satisfying_grant_wins() {
        let granted = [
            Capability::new("POST", "/a").with(STORAGE_LIMIT, 1000u64),
            Capability::new("POST", "/a").with(STORAGE_LIMIT, 1u64),
        ];
        let claim = Capability::new("POST", "/a/b").with(STORAGE_LIMIT, 500u64);

        assert_eq!(check_one(&claim, &granted), Ok(()));
    }

    #[test]
    fn failing_comparable_grants_report_all_their_violations() {
        let granted = [
            Capability::new("POST", "/a").with(STORAGE_LIMIT, 1u64),
            Capability::new("POST", "/a").with(STORAGE_LIMIT, 2u64),
        ];
        let claim = Capability::new("POST", "/a").with(STORAGE_LIMIT, 500u64);

        let violations = check_one(&claim, &granted).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert!(
            violations
                .iter()
                .all(|v| matches!(v, Violation::InvalidConstraint { name, .. } if name == STORAGE_LIMIT))
        );
    }

    #[test]
    fn nothing_comparable_is_an_invalid_claim() {
        let granted = [
            Capability::new("LIST", "/a"),
            Capability::new("POST", "/b"),
            Capability::new("POST", "/ab"),
        ];
        let claim = Capability::new("POST", "/a");

        assert_eq!(
            check_one(&claim, &granted),
            Err(vec![Violation::InvalidClaim { claim }])
        );
    }

    #[test]
    fn claim_without_id_is_never_comparable_to_a_scoped_grant() {
        let mut claim = Capability::new("LIST", "/a");
        claim.id = None;
        assert!(!is_comparable(&claim, &Capability::new("LIST", "/a")));
    }

    #[test]
    fn grant_without_id_covers_any_scope() {
        let mut grant = Capability::new("LIST", "/");
        grant.id = None;
        assert!(is_comparable(&Capability::new("LIST", "/anything"), &grant));
    }

    #[test]
    fn numeric_id_is_incomparable_with_a_scoped_grant() {
        let mut claim = Capability::new("LIST", "/a");
        claim.id = Some(ConstraintValue::Limit(5.0));
        let grant = Capability::new("LIST", "/");

        assert_eq!(
            check_constraint(
                claim.id.as_ref(),
                grant.id.as_ref(),
                ConstraintContext::new(ID, &grant)
            ),
            Err(Violation::IncomparableConstraint {
                name: ID.into(),
                claim: grant.clone(),
                claimed: ConstraintValue::Limit(5.0),
                imposed: ConstraintValue::Scope("/".into()),
            })
        );
        assert!(!is_comparable(&claim, &grant));
        assert_eq!(
            check_one(&claim, &[grant]),
            Err(vec![Violation::InvalidClaim { claim }])
        );
    }

    #[test]
    fn constraints_the_claim_omits_are_not_checked() {
        let granted = [Capability::new("POST", "/a").with(STORAGE_LIMIT, 10u64)];
        let claim = Capability::new("POST", "/a");

        assert!(check_all(&[claim], &granted).is_ok());
    }

    #[test]
    fn violations_of_all_claims_are_aggregated() {
        let granted = [Capability::new("POST", "/a").with(STORAGE_LIMIT, 10u64)];
        let claims = [
            Capability::new("POST", "/a").with(STORAGE_LIMIT, 11u64),
            Capability::new("LIST", "/a"),
            Capability::new("POST", "/a/ok").with(STORAGE_LIMIT, 1u64),
        ];

        let err = check_all(&claims, &granted).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(matches!(
            err.violations[0],
            Violation::InvalidConstraint { .. }
        ));
        assert!(matches!(err.violations[1], Violation::InvalidClaim { .. }));
    }

    #[test]
    fn mixed_kind_constraint_is_reported_as_incomparable() {
        let granted = [Capability::new("POST", "/a").with(STORAGE_LIMIT, 10u64)];
        let claim = Capability::new("POST", "/a").with(STORAGE_LIMIT, "ten");

        let err = check_all(&[claim], &granted).unwrap_err();
        assert!(matches!(
            err.violations.as_slice(),
            [Violation::IncomparableConstraint { .. }]
        ));
    }
}
