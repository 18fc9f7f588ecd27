/*
 * Responsibility
 * - did / auth / revoke endpoint の response 型
 */
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DidResponse {
    pub did: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// Encoded token granting the default capabilities.
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevokeResponse {
    /// Content identifier that is now revoked.
    pub revoked: String,
}
