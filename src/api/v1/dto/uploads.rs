use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub path: String,
    /// Body length in bytes, the amount claimed against `storageLimit`.
    pub size: u64,
    pub issuer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub path: String,
    pub issuer: String,
}
