/*
 * Responsibility
 * - request の Bearer token を検証し、ValidatedUcan を返す (authenticate)
 * - default capability token の発行 (authorize) と revoke
 * - 検証パイプライン: precheck → audit → check → trust resolve
 */
pub mod audit;
pub mod error;
pub mod factory;
pub mod service;
pub mod store;
pub mod trust;
pub mod validator;

#[cfg(test)]
mod testing;

pub use error::AuthError;
pub use factory::build_auth_service;
pub use service::{AuthPolicy, AuthService, ValidatedUcan};
pub use store::{IssuerSet, MemoryRevocationStore};
pub use trust::TrustTier;
