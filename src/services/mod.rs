/*
 * Responsibility
 * - HTTP から独立したドメインロジック
 * - capability 比較 / token codec / 認可パイプライン
 */
pub mod auth;
pub mod capability;
pub mod clock;
pub mod ucan;
