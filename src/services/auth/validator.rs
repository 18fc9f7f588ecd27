//! Token validation: leaf pre-checks, then signatures and capability narrowing along the chain.
use axum::http::{HeaderMap, header};
use tracing::debug;

use crate::services::capability;
use crate::services::ucan::{Ucan, did};

use super::error::AuthError;

/// `Authorization: Bearer <token>` → decoded token. Anything unusable is `None`.
pub fn parse_header(headers: &HeaderMap) -> Option<Ucan> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim_start().strip_prefix("Bearer")?.trim();
    if token.is_empty() {
        return None;
    }
    match Ucan::decode(token) {
        Ok(ucan) => Some(ucan),
        Err(err) => {
            debug!(error = %err, "unparseable bearer token");
            None
        }
    }
}

/// Checks on the leaf token only, before any chain work.
///
/// - the token decoded
/// - it is addressed to this service (`aud`)
/// - it has not expired
pub fn precheck(token: Option<Ucan>, service_did: &str, now: i64) -> Result<Ucan, AuthError> {
    let token = token.ok_or(AuthError::MissingAuthorization)?;

    if token.audience() != service_did {
        return Err(AuthError::AudienceMismatch {
            expected: service_did.to_string(),
            actual: token.audience().to_string(),
        });
    }
    if token.is_expired(now) {
        return Err(AuthError::Expired);
    }
    Ok(token)
}

/// Verifies every link's signature and that each link's capabilities stay within its proof's.
///
/// Walks leaf → root and stops at the first failure. Root tokens end the walk
/// successfully once their self-signature verifies.
pub fn check(token: &Ucan, max_depth: usize) -> Result<(), AuthError> {
    let mut current = token.clone();
    let mut depth = 1;

    loop {
        verify_signature(&current)?;

        let Some(encoded) = current.proof() else {
            return Ok(());
        };
        depth += 1;
        if depth > max_depth {
            return Err(AuthError::ChainTooLong { limit: max_depth });
        }

        let proof = Ucan::decode(encoded).map_err(AuthError::InvalidProof)?;
        if current.issuer() != proof.audience() {
            return Err(AuthError::IssuerAudienceMismatch {
                issuer: current.issuer().to_string(),
                audience: proof.audience().to_string(),
            });
        }
        capability::check_all(current.capabilities(), proof.capabilities())?;

        current = proof;
    }
}

fn verify_signature(token: &Ucan) -> Result<(), AuthError> {
    let signature = token.signature().ok_or(AuthError::SignatureMissing)?;
    if token.header().alg != "EdDSA" {
        debug!(alg = %token.header().alg, "unsupported signature algorithm");
        return Err(AuthError::SignatureInvalid);
    }

    match did::verify(token.issuer(), token.signing_input(), signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::SignatureInvalid),
        Err(err) => {
            debug!(error = %err, issuer = %token.issuer(), "cannot resolve issuer key");
            Err(AuthError::SignatureInvalid)
        }
    }
}
