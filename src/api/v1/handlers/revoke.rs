/*
 * Responsibility
 * - POST /revoke/{cid}: token の CID を revocation set に追加する
 * - 以降、その token を chain に含む request はすべて 401
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::v1::dto::auth::RevokeResponse;
use crate::state::AppState;

pub async fn revoke(State(state): State<AppState>, Path(cid): Path<String>) -> Json<RevokeResponse> {
    let revoked = state.auth.revoke(&cid);
    Json(RevokeResponse { revoked })
}
