//! Final accept/reject decision, based on who issued the root of the chain.
use tracing::info;

use crate::services::capability::{self, Capability, STORAGE_LIMIT};
use crate::services::ucan::Ucan;

use super::audit::ChainLink;
use super::error::AuthError;
use super::store::IssuerSet;

/// Trust tier of an accepted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustTier {
    /// The chain is rooted in the service's own key.
    Service,
    /// A third-party root whose capabilities fit the service defaults.
    Sandboxed,
}

/// The capabilities `authorize` grants to `did`.
pub fn default_capabilities(did: &str, storage_limit: f64) -> Vec<Capability> {
    let scope = format!("/uploads/{did}/");
    vec![
        Capability::new("POST", scope.clone()).with(STORAGE_LIMIT, storage_limit),
        // can only list uploads for the given user
        Capability::new("LIST", scope),
    ]
}

/// Root policy inputs.
#[derive(Debug, Clone, Copy)]
pub struct TrustPolicy<'a> {
    pub service_did: &'a str,
    pub blocked: &'a IssuerSet,
    pub sandbox: &'a IssuerSet,
    pub storage_limit: f64,
}

/// Decides whether a chain that already passed audit and check is accepted.
///
/// - rooted in the service → accepted
/// - root issuer blocked → rejected (blocking revokes everything that issuer rooted)
/// - root capabilities fit the defaults for the root's audience → accepted, and the issuer
///   is recorded as sandboxed
/// - otherwise → rejected
pub fn resolve(root: &ChainLink, policy: TrustPolicy<'_>) -> Result<TrustTier, AuthError> {
    let issuer = root.token.issuer();

    if issuer == policy.service_did {
        return Ok(TrustTier::Service);
    }
    if policy.blocked.contains(issuer) {
        return Err(AuthError::IssuerBlocked {
            issuer: issuer.to_string(),
        });
    }
    if is_compatible(&root.token, policy.storage_limit) {
        if policy.sandbox.insert(issuer) {
            info!(issuer = %issuer, root = %root.cid, "issuer placed in sandbox");
        }
        return Ok(TrustTier::Sandboxed);
    }
    Err(AuthError::NotValid {
        issuer: issuer.to_string(),
    })
}

/// Would this root still be in bounds had the service issued it?
fn is_compatible(root: &Ucan, storage_limit: f64) -> bool {
    let defaults = default_capabilities(root.audience(), storage_limit);
    capability::check_all(root.capabilities(), &defaults).is_ok()
}
