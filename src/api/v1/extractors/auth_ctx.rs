/*
 * Responsibility
 * - 検証済み UCAN を handler に渡す (AuthCtx / AuthCtxExtractor)
 * - access middleware が request extensions に入れたものを取り出すだけ
 *
 * Notes
 * - 署名 / chain / revocation の検証は middleware/services 側の責務
 * - 個々の操作 (POST/LIST) の可否は handler が AuthService::claim で確認する
 */
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{TrustTier, ValidatedUcan};
use crate::services::ucan::Ucan;
use crate::state::AppState;

/// - `ucan.token` は leaf token (capability の claim 先)
/// - `ucan.root_cid` は監査/相関用
/// - `ucan.tier` は chain の root が service か sandbox 扱いの第三者か
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub ucan: ValidatedUcan,
}

impl AuthCtx {
    pub fn new(ucan: ValidatedUcan) -> Self {
        Self { ucan }
    }

    pub fn token(&self) -> &Ucan {
        &self.ucan.token
    }

    /// The principal that presented the token.
    pub fn issuer(&self) -> &str {
        self.ucan.token.issuer()
    }

    pub fn tier(&self) -> TrustTier {
        self.ucan.tier
    }
}

/// `AuthCtx` が無い = access middleware を通っていない route。
/// token が無いときと同じ 401 (JSON) を返す。
pub struct AuthCtxExtractor(pub AuthCtx);

impl FromRequestParts<AppState> for AuthCtxExtractor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthCtx>() {
            Some(ctx) => Ok(Self(ctx.clone())),
            None => {
                tracing::error!(uri = %parts.uri, "no AuthCtx: route is missing the access middleware");
                Err(AppError::unauthorized("Authorization header is required"))
            }
        }
    }
}
