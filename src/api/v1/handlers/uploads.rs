/*
 * Responsibility
 * - POST /uploads/{*path}: body サイズを storageLimit として claim
 * - GET  /uploads/{*path}: LIST を claim
 * - path は claim の id になるので、`.` / `..` / 空 segment は 400 で弾く
 * - 認証 (chain 検証) は middleware 済み。ここでは操作単位の claim だけを行う
 * - archive の保存自体は外部の責務 (ここでは行わない)
 */
use axum::{Json, body::Bytes, extract::Path};

use crate::api::v1::dto::uploads::{ListResponse, UploadResponse};
use crate::api::v1::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::services::capability::{Capability, STORAGE_LIMIT};

/// Resource scope claimed for `path`.
///
/// Scopes are compared as string prefixes, so a path must not be able to climb out of
/// the prefix it starts with. `path` arrives percent-decoded: `..%2F` is caught as well.
/// A single trailing `/` is kept so that directory listings stay addressable.
fn upload_scope(path: &str) -> Result<String, AppError> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let escapes = trimmed
        .split('/')
        .any(|segment| matches!(segment, "" | "." | "..") || segment.contains('\\'));

    if escapes {
        return Err(AppError::bad_request(
            "INVALID_PATH",
            format!("upload path {path:?} must not contain empty, '.' or '..' segments"),
        ));
    }
    Ok(format!("/uploads/{path}"))
}

pub async fn upload(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(path): Path<String>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let size = body.len() as u64;
    let capability = Capability::new("POST", upload_scope(&path)?).with(STORAGE_LIMIT, size);

    if let Err(err) = AuthService::claim(&capability, ctx.token()) {
        tracing::warn!(issuer = %ctx.issuer(), capability = %capability, "upload claim rejected");
        return Err(err.into());
    }

    tracing::info!(issuer = %ctx.issuer(), path = %path, size, tier = ?ctx.tier(), "upload authorized");
    Ok(Json(UploadResponse {
        path,
        size,
        issuer: ctx.issuer().to_string(),
    }))
}

pub async fn list_uploads(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(path): Path<String>,
) -> Result<Json<ListResponse>, AppError> {
    let capability = Capability::new("LIST", upload_scope(&path)?);

    if let Err(err) = AuthService::claim(&capability, ctx.token()) {
        tracing::warn!(issuer = %ctx.issuer(), capability = %capability, "list claim rejected");
        return Err(err.into());
    }

    Ok(Json(ListResponse {
        path,
        issuer: ctx.issuer().to_string(),
    }))
}
