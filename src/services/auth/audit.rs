//! Revocation audit of a delegation chain.
use tracing::debug;

use crate::services::ucan::{Ucan, identify};

use super::error::AuthError;
use super::store::RevocationStore;

/// A token in the chain together with its content identifier.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub token: Ucan,
    pub cid: String,
}

/// Walks the chain leaf → root and fails on the first revoked link.
///
/// Each link is identified from its encoded form as presented (the leaf string, then
/// each raw `prf` string), which is what a revoker would have hashed. On success the
/// returned link is the root of the chain.
pub fn audit(
    token: &Ucan,
    revoked: &dyn RevocationStore,
    max_depth: usize,
) -> Result<ChainLink, AuthError> {
    let mut cursor = check_link(token.clone(), revoked)?;
    let mut depth = 1;

    while let Some(proof) = cursor.token.proof() {
        depth += 1;
        if depth > max_depth {
            return Err(AuthError::ChainTooLong { limit: max_depth });
        }

        let cid = identify(proof.as_bytes());
        if revoked.is_revoked(&cid) {
            return Err(AuthError::Revoked { cid });
        }
        let token = Ucan::decode(proof).map_err(AuthError::InvalidProof)?;
        cursor = ChainLink { token, cid };
    }

    debug!(root = %cursor.cid, depth, "proof chain audited");
    Ok(cursor)
}

fn check_link(token: Ucan, revoked: &dyn RevocationStore) -> Result<ChainLink, AuthError> {
    let cid = identify(token.encoded().as_bytes());
    if revoked.is_revoked(&cid) {
        return Err(AuthError::Revoked { cid });
    }
    Ok(ChainLink { token, cid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::store::MemoryRevocationStore;
    use crate::services::auth::testing::{NOW, alice, bob, delegate, service_key, upload};
    use crate::services::ucan::UcanBuilder;
    use pretty_assertions::assert_eq;

    struct Chain {
        root: Ucan,
        mid: Ucan,
        leaf: Ucan,
    }

    // service -> alice -> bob -> service
    fn chain() -> Chain {
        let (service, alice, bob) = (service_key(), alice(), bob());
        let root = delegate(&service, alice.did(), vec![upload(alice.did(), 100)], None);
        let mid = delegate(&alice, bob.did(), vec![upload(alice.did(), 50)], Some(&root));
        let leaf = delegate(&bob, service.did(), vec![upload(alice.did(), 10)], Some(&mid));
        Chain { root, mid, leaf }
    }

    #[test]
    fn unrevoked_chain_yields_its_root() {
        let chain = chain();
        let store = MemoryRevocationStore::new();

        let root = audit(&chain.leaf, &store, 8).unwrap();

        assert_eq!(root.token, chain.root);
        assert_eq!(root.cid, identify(chain.root.encoded().as_bytes()));
    }

    #[test]
    fn revoked_middle_link_is_named() {
        let chain = chain();
        let store = MemoryRevocationStore::new();
        let mid_cid = identify(chain.mid.encoded().as_bytes());
        store.revoke(&mid_cid);

        match audit(&chain.leaf, &store, 8) {
            Err(AuthError::Revoked { cid }) => assert_eq!(cid, mid_cid),
            other => panic!("expected revoked, got {other:?}"),
        }
    }

    #[test]
    fn revoked_leaf_fails_before_walking() {
        let chain = chain();
        let store = MemoryRevocationStore::new();
        let leaf_cid = identify(chain.leaf.encoded().as_bytes());
        store.revoke(&leaf_cid);
        store.revoke(&identify(chain.root.encoded().as_bytes()));

        match audit(&chain.leaf, &store, 8) {
            Err(AuthError::Revoked { cid }) => assert_eq!(cid, leaf_cid),
            other => panic!("expected revoked, got {other:?}"),
        }
    }

    #[test]
    fn chain_longer_than_the_bound_is_rejected() {
        let chain = chain();
        let store = MemoryRevocationStore::new();

        assert!(audit(&chain.leaf, &store, 3).is_ok());
        assert!(matches!(
            audit(&chain.leaf, &store, 2),
            Err(AuthError::ChainTooLong { limit: 2 })
        ));
    }

    #[test]
    fn undecodable_proof_is_an_invalid_proof() {
        let store = MemoryRevocationStore::new();
        let token = UcanBuilder::new(&alice())
            .audience(service_key().did())
            .proof("not-a-token")
            .lifetime(3600)
            .sign(NOW)
            .unwrap();

        assert!(matches!(
            audit(&token, &store, 8),
            Err(AuthError::InvalidProof(_))
        ));
    }

    #[test]
    fn revoked_garbage_proof_is_reported_as_revoked() {
        let store = MemoryRevocationStore::new();
        let token = UcanBuilder::new(&alice())
            .audience(service_key().did())
            .proof("not-a-token")
            .lifetime(3600)
            .sign(NOW)
            .unwrap();
        let cid = identify(b"not-a-token");
        store.revoke(&cid);

        match audit(&token, &store, 8) {
            Err(AuthError::Revoked { cid: found }) => assert_eq!(found, cid),
            other => panic!("expected revoked, got {other:?}"),
        }
    }
}
