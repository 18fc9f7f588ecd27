//! UCAN (Bearer) 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <token>` を AuthService::authenticate に渡す
//!   (audience / expiry → revocation audit → 署名と権限の chain 検証 → root の trust 判定)
//! - 失敗は warn でログし 401 (message は AuthError のもの)
//! - 個々の操作の claim は handler 側で行う

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// 認証が必要な route に middleware を適用する。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/uploads/{*path}", post(upload));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ucan = match state.auth.authenticate(req.headers()) {
        Ok(ucan) => ucan,
        Err(err) => {
            tracing::warn!(
                error = %err,
                method = %req.method(),
                uri = %req.uri(),
                "ucan authentication failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        issuer = %ucan.token.issuer(),
        root_issuer = %ucan.root_issuer,
        root = %ucan.root_cid,
        tier = ?ucan.tier,
        "request authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(ucan));

    Ok(next.run(req).await)
}
