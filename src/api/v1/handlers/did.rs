/*
 * Responsibility
 * - GET /did: service の did を返す
 * - client はこの did を audience にして token を委任する
 */
use axum::{
    Json,
    extract::State,
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
};

use crate::api::v1::dto::auth::DidResponse;
use crate::error::AppError;
use crate::state::AppState;

pub const DID_HEADER: &str = "x-did";

pub async fn did(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let did = state.auth.did().to_string();
    let value = HeaderValue::from_str(&did).map_err(|_| AppError::Internal)?;

    Ok((
        [(HeaderName::from_static(DID_HEADER), value)],
        Json(DidResponse { did }),
    ))
}
