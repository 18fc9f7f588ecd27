/*
 * Responsibility
 * - POST /auth/{did}: did 宛ての default capability token を発行 (cache 済みなら再利用)
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::v1::dto::auth::TokenResponse;
use crate::error::AppError;
use crate::state::AppState;

pub async fn authorize(
    State(state): State<AppState>,
    Path(did): Path<String>,
) -> Result<Json<TokenResponse>, AppError> {
    if !did.starts_with("did:") {
        return Err(AppError::bad_request("INVALID_DID", "expected a DID"));
    }

    let token = state.auth.authorize(&did)?;
    Ok(Json(TokenResponse { token }))
}
