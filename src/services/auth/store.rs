//! Process-wide auth state: revocations, issuer sets and the issued-token cache.
//!
//! Every mutation is an idempotent insert; nothing is ever removed while the process runs.
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

/// Set of revoked content identifiers.
///
/// Membership must have no false negatives for anything previously revoked. A
/// probabilistic store is acceptable as long as it only errs towards "revoked".
pub trait RevocationStore: Send + Sync {
    /// Records `cid`. Returns `true` if it was not revoked before.
    fn revoke(&self, cid: &str) -> bool;

    fn is_revoked(&self, cid: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    revoked: DashSet<String>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationStore for MemoryRevocationStore {
    fn revoke(&self, cid: &str) -> bool {
        self.revoked.insert(cid.to_string())
    }

    fn is_revoked(&self, cid: &str) -> bool {
        self.revoked.contains(cid)
    }
}

/// A set of principal DIDs (blocked issuers, sandboxed issuers).
#[derive(Debug, Default)]
pub struct IssuerSet {
    issuers: DashSet<String>,
}

impl IssuerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the issuer was newly added.
    pub fn insert(&self, did: &str) -> bool {
        self.issuers.insert(did.to_string())
    }

    pub fn contains(&self, did: &str) -> bool {
        self.issuers.contains(did)
    }

    pub fn len(&self) -> usize {
        self.issuers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issuers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IssuerSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            issuers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Tokens minted by `authorize`, keyed by audience DID.
///
/// An optimisation only: cached tokens keep their own `exp` and are never refreshed.
#[derive(Debug, Default)]
pub struct IssuedTokenCache {
    tokens: DashMap<String, String>,
}

impl IssuedTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, did: &str) -> Option<String> {
        self.tokens.get(did).map(|entry| entry.value().clone())
    }

    /// Returns the cached token for `did`, minting one with `issue` on first use.
    ///
    /// If two requests race, the first insert wins and both callers get that token.
    pub fn get_or_try_insert_with<E>(
        &self,
        did: &str,
        issue: impl FnOnce() -> Result<String, E>,
    ) -> Result<(String, bool), E> {
        if let Some(token) = self.get(did) {
            return Ok((token, false));
        }
        let token = issue()?;
        match self.tokens.entry(did.to_string()) {
            Entry::Occupied(entry) => Ok((entry.get().clone(), false)),
            Entry::Vacant(entry) => {
                entry.insert(token.clone());
                Ok((token, true))
            }
        }
    }
}
