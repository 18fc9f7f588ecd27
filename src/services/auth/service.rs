//! AuthService: per-request orchestration plus token issuance and revocation.
use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, info};

use crate::services::capability::{self, Capability, EscalationError};
use crate::services::clock::Clock;
use crate::services::ucan::{EdKeypair, Ucan, UcanBuilder};

use super::audit::audit;
use super::error::AuthError;
use super::store::{IssuedTokenCache, IssuerSet, RevocationStore};
use super::trust::{TrustPolicy, TrustTier, default_capabilities, resolve};
use super::validator::{check, parse_header, precheck};

/// Knobs that shape validation and issuance.
#[derive(Debug, Clone, Copy)]
pub struct AuthPolicy {
    // Lifetime of tokens minted by `authorize`, seconds.
    pub token_ttl_seconds: i64,
    // Maximum number of tokens in a chain, leaf included.
    pub max_chain_depth: usize,
    // `storageLimit` of the default POST capability.
    pub storage_limit: f64,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            token_ttl_seconds: 24 * 60 * 60,
            max_chain_depth: 32,
            // ~32 TiB
            storage_limit: 32.0 * 1.1e12,
        }
    }
}

/// A token that passed every check, plus what we learned about its chain.
#[derive(Debug, Clone)]
pub struct ValidatedUcan {
    pub token: Ucan,
    pub root_cid: String,
    pub root_issuer: String,
    pub tier: TrustTier,
}

/// Owns all mutable auth state for the process.
///
/// - Key material is intentionally not printable via Debug.
pub struct AuthService {
    keypair: EdKeypair,
    clock: Arc<dyn Clock>,
    policy: AuthPolicy,
    revoked: Arc<dyn RevocationStore>,
    blocked_issuers: IssuerSet,
    sandbox: IssuerSet,
    issued: IssuedTokenCache,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("did", &self.keypair.did())
            .field("policy", &self.policy)
            .field("blocked_issuers", &self.blocked_issuers.len())
            .field("sandbox", &self.sandbox.len())
            .finish()
    }
}

impl AuthService {
    pub fn new(
        keypair: EdKeypair,
        clock: Arc<dyn Clock>,
        policy: AuthPolicy,
        revoked: Arc<dyn RevocationStore>,
        blocked_issuers: IssuerSet,
    ) -> Self {
        Self {
            keypair,
            clock,
            policy,
            revoked,
            blocked_issuers,
            sandbox: IssuerSet::new(),
            issued: IssuedTokenCache::new(),
        }
    }

    /// The service's own principal.
    pub fn did(&self) -> &str {
        self.keypair.did()
    }

    /// Validates the bearer token in `headers`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<ValidatedUcan, AuthError> {
        self.validate(parse_header(headers))
    }

    /// precheck → audit → check → resolve.
    pub fn validate(&self, token: Option<Ucan>) -> Result<ValidatedUcan, AuthError> {
        let token = precheck(token, self.did(), self.clock.now())?;
        let root = audit(&token, self.revoked.as_ref(), self.policy.max_chain_depth)?;
        check(&token, self.policy.max_chain_depth)?;

        let tier = resolve(
            &root,
            TrustPolicy {
                service_did: self.did(),
                blocked: &self.blocked_issuers,
                sandbox: &self.sandbox,
                storage_limit: self.policy.storage_limit,
            },
        )?;

        debug!(issuer = %token.issuer(), root = %root.cid, ?tier, "token validated");
        Ok(ValidatedUcan {
            root_issuer: root.token.issuer().to_string(),
            root_cid: root.cid,
            token,
            tier,
        })
    }

    /// Token granting the default capabilities to `did`.
    ///
    /// Minted once per principal and reused until the process restarts. A cached token
    /// is handed out as-is, even when it has since expired.
    // TODO: evict cached tokens that are expired or about to expire instead of reusing them.
    pub fn authorize(&self, did: &str) -> Result<String, AuthError> {
        let (token, minted) = self.issued.get_or_try_insert_with(did, || {
            let ucan = UcanBuilder::new(&self.keypair)
                .audience(did)
                .capabilities(default_capabilities(did, self.policy.storage_limit))
                .lifetime(self.policy.token_ttl_seconds)
                .sign(self.clock.now())
                .map_err(AuthError::Encoding)?;
            info!(audience = %did, exp = ucan.expires_at(), "issued default capability token");
            Ok::<_, AuthError>(ucan.encoded().to_string())
        })?;

        if !minted {
            debug!(audience = %did, "reusing cached capability token");
        }
        Ok(token)
    }

    /// Revokes the token with content identifier `cid`. Never fails.
    pub fn revoke(&self, cid: &str) -> String {
        if self.revoked.revoke(cid) {
            info!(cid = %cid, "token revoked");
        } else {
            debug!(cid = %cid, "token already revoked");
        }
        cid.to_string()
    }

    /// Checks a specific operation against an already validated token.
    pub fn claim(capability: &Capability, token: &Ucan) -> Result<(), EscalationError> {
        capability::check_all(std::slice::from_ref(capability), token.capabilities())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::store::MemoryRevocationStore;
    use crate::services::auth::testing::{
        NOW, alice, bob, delegate, list, mallory, service_key, upload,
    };
    use crate::services::capability::STORAGE_LIMIT;
    use crate::services::clock::FixedClock;
    use crate::services::ucan::identify;
    use axum::http::{HeaderValue, header};
    use pretty_assertions::assert_eq;

    fn service_with(blocked: IssuerSet) -> AuthService {
        AuthService::new(
            service_key(),
            Arc::new(FixedClock(NOW)),
            AuthPolicy {
                storage_limit: 1_000.0,
                ..AuthPolicy::default()
            },
            Arc::new(MemoryRevocationStore::new()),
            blocked,
        )
    }

    fn service() -> AuthService {
        service_with(IssuerSet::new())
    }

    fn headers(token: &Ucan) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.encoded())).unwrap(),
        );
        headers
    }

    #[test]
    fn authorize_returns_the_cached_token() {
        let service = service();
        let alice = alice();

        let first = service.authorize(alice.did()).unwrap();
        let second = service.authorize(alice.did()).unwrap();
        assert_eq!(first, second);

        let token = Ucan::decode(&first).unwrap();
        assert_eq!(token.issuer(), service.did());
        assert_eq!(token.audience(), alice.did());
        assert_eq!(token.expires_at(), NOW + 24 * 60 * 60);
        assert_eq!(
            token.capabilities(),
            default_capabilities(alice.did(), 1_000.0).as_slice()
        );
    }

    #[test]
    fn authorized_token_delegated_back_authenticates() {
        let service = service();
        let alice = alice();
        let root = Ucan::decode(&service.authorize(alice.did()).unwrap()).unwrap();
        let leaf = delegate(&alice, service.did(), vec![upload(alice.did(), 10)], Some(&root));

        let validated = service.authenticate(&headers(&leaf)).unwrap();

        assert_eq!(validated.tier, TrustTier::Service);
        assert_eq!(validated.root_issuer, service.did());
        assert_eq!(validated.root_cid, identify(root.encoded().as_bytes()));
        assert_eq!(validated.token, leaf);
    }

    #[test]
    fn missing_header_is_missing_authorization() {
        let err = service().authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthorization));
        assert_eq!(err.to_string(), "Authorization header is required");
    }

    #[test]
    fn revoking_a_middle_link_rejects_the_leaf() {
        let service = service();
        let (alice, bob) = (alice(), bob());
        let root = delegate(&service_key(), alice.did(), vec![upload(alice.did(), 100)], None);
        let mid = delegate(&alice, bob.did(), vec![upload(alice.did(), 50)], Some(&root));
        let leaf = delegate(&bob, service.did(), vec![upload(alice.did(), 10)], Some(&mid));
        assert!(service.authenticate(&headers(&leaf)).is_ok());

        let mid_cid = identify(mid.encoded().as_bytes());
        assert_eq!(service.revoke(&mid_cid), mid_cid);

        match service.authenticate(&headers(&leaf)) {
            Err(AuthError::Revoked { cid }) => assert_eq!(cid, mid_cid),
            other => panic!("expected revoked, got {other:?}"),
        }
    }

    #[test]
    fn revoke_is_idempotent() {
        let service = service();
        assert_eq!(service.revoke("bafyx"), "bafyx");
        assert_eq!(service.revoke("bafyx"), "bafyx");
        assert!(service.revoked.is_revoked("bafyx"));
    }

    #[test]
    fn blocked_root_issuer_rejects_a_valid_chain() {
        let mallory = mallory();
        let service = service_with([mallory.did()].into_iter().collect());
        let root = delegate(&mallory, mallory.did(), vec![list(mallory.did())], None);
        let leaf = delegate(&mallory, service.did(), vec![list(mallory.did())], Some(&root));

        let err = service.authenticate(&headers(&leaf)).unwrap_err();
        assert!(matches!(err, AuthError::IssuerBlocked { .. }));
        assert_eq!(
            err.to_string(),
            "Token or one of the proofs in chain had been revoked"
        );
    }

    #[test]
    fn compatible_unknown_issuer_is_accepted_and_sandboxed() {
        let service = service();
        let (mallory, alice) = (mallory(), alice());
        let root = delegate(&mallory, alice.did(), vec![upload(alice.did(), 10)], None);
        let leaf = delegate(&alice, service.did(), vec![upload(alice.did(), 5)], Some(&root));
        assert!(!service.sandbox.contains(mallory.did()));

        let validated = service.authenticate(&headers(&leaf)).unwrap();

        assert_eq!(validated.tier, TrustTier::Sandboxed);
        assert!(service.sandbox.contains(mallory.did()));
    }

    #[test]
    fn incompatible_unknown_issuer_is_not_valid() {
        let service = service();
        let mallory = mallory();
        let root = delegate(&mallory, service.did(), vec![upload(mallory.did(), 5_000)], None);

        let err = service.authenticate(&headers(&root)).unwrap_err();
        assert!(matches!(err, AuthError::NotValid { .. }));
        assert!(!service.sandbox.contains(mallory.did()));
    }

    #[test]
    fn expired_leaf_is_rejected_before_chain_work() {
        let service = service();
        let alice = alice();
        let leaf = UcanBuilder::new(&alice)
            .audience(service.did())
            .expires_at(NOW)
            .sign(NOW - 10)
            .unwrap();

        assert!(matches!(
            service.authenticate(&headers(&leaf)),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn claim_checks_one_operation_against_the_token() {
        let alice = alice();
        let token = delegate(&alice, "did:key:zService", vec![upload(alice.did(), 100)], None);
        let within = Capability::new("POST", format!("/uploads/{}/car", alice.did()))
            .with(STORAGE_LIMIT, 99u64);
        let above = within.clone().with(STORAGE_LIMIT, 101u64);
        let listing = Capability::new("LIST", format!("/uploads/{}/", alice.did()));

        assert!(AuthService::claim(&within, &token).is_ok());
        assert!(AuthService::claim(&above, &token).is_err());
        assert!(AuthService::claim(&listing, &token).is_err());
    }
}
