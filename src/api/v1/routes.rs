/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /did, /auth, /revoke は public
 * - /uploads は Bearer (UCAN) 必須。route 単位で access middleware を適用する
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::authorize,
    did::did,
    health::health,
    revoke::revoke,
    uploads::{list_uploads, upload},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/did", get(did))
        .route("/auth/{did}", post(authorize))
        .route("/revoke/{cid}", post(revoke));

    let protected = Router::new().route("/uploads/{*path}", get(list_uploads).post(upload));
    let protected = middleware::auth::access::apply(protected, state);

    public.merge(protected)
}
