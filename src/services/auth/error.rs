/*
 * Responsibility
 * - token 検証で起こりうる失敗の分類 (taxonomy)
 * - どれも request 単位で完結し、retry はしない
 * - HTTP への変換 (401) は crate::error::AppError 側で行う
 */
use thiserror::Error;

use crate::services::capability::EscalationError;
use crate::services::ucan::UcanError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingAuthorization,

    #[error("Authorization is invalid, it is addressed for {actual} instead of {expected}")]
    AudienceMismatch { expected: String, actual: String },

    #[error("Authorization token has expired")]
    Expired,

    #[error("Token with CID {cid} in proof chain has been revoked")]
    Revoked { cid: String },

    #[error("Token has no signature")]
    SignatureMissing,

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token issuer {issuer} does not match its proof's audience {audience}")]
    IssuerAudienceMismatch { issuer: String, audience: String },

    #[error(transparent)]
    Escalation(#[from] EscalationError),

    #[error("Token or one of the proofs in chain had been revoked")]
    IssuerBlocked { issuer: String },

    #[error("Token is not valid")]
    NotValid { issuer: String },

    #[error("Proof chain is longer than {limit} tokens")]
    ChainTooLong { limit: usize },

    #[error("Proof in chain is malformed: {0}")]
    InvalidProof(#[source] UcanError),

    #[error("failed to issue token: {0}")]
    Encoding(#[source] UcanError),
}

impl AuthError {
    /// `false` only for server-side failures; everything else is a 401.
    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, Self::Encoding(_))
    }
}
