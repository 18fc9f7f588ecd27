/// Factory: build `AuthService` from application `Config`.
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{AuthPolicy, AuthService, IssuerSet, MemoryRevocationStore};
use crate::services::clock::SystemClock;
use crate::services::ucan::EdKeypair;

pub fn build_auth_service(config: &Config) -> Result<Arc<AuthService>, AppError> {
    let keypair = load_service_key(config)?;
    tracing::info!(did = %keypair.did(), "service key loaded");

    let blocked: IssuerSet = config.blocked_issuers.iter().map(String::as_str).collect();
    if !blocked.is_empty() {
        tracing::info!(count = blocked.len(), "blocked issuers configured");
    }

    let auth = AuthService::new(
        keypair,
        Arc::new(SystemClock),
        AuthPolicy {
            token_ttl_seconds: config.auth_token_ttl_seconds,
            max_chain_depth: config.max_chain_depth,
            storage_limit: config.default_storage_limit,
        },
        Arc::new(MemoryRevocationStore::new()),
        blocked,
    );

    Ok(Arc::new(auth))
}

/// `SERVICE_SECRET_KEY` wins; otherwise the key file, created on first start.
fn load_service_key(config: &Config) -> Result<EdKeypair, AppError> {
    if let Some(secret) = config.service_secret_key.as_deref() {
        return EdKeypair::from_secret_key(secret).map_err(|err| {
            tracing::error!(error = %err, "SERVICE_SECRET_KEY is not a valid ed25519 key");
            AppError::Internal
        });
    }

    load_or_create_key_file(&config.service_key_path)
}

fn load_or_create_key_file(path: &Path) -> Result<EdKeypair, AppError> {
    match fs::read_to_string(path) {
        Ok(contents) => EdKeypair::from_secret_key(&contents).map_err(|err| {
            tracing::error!(error = %err, path = %path.display(), "invalid service key file");
            AppError::Internal
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            let keypair = EdKeypair::generate().map_err(|err| {
                tracing::error!(error = %err, "failed to generate service key");
                AppError::Internal
            })?;
            fs::write(path, keypair.export()).map_err(|err| {
                tracing::error!(error = %err, path = %path.display(), "failed to write service key");
                AppError::Internal
            })?;
            tracing::info!(path = %path.display(), "generated new service key");
            Ok(keypair)
        }
        Err(err) => {
            tracing::error!(error = %err, path = %path.display(), "failed to read service key");
            Err(AppError::Internal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::AuthError;
    use crate::services::ucan::UcanBuilder;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ucan-gateway-{}-{name}.key", std::process::id()))
    }

    #[test]
    fn secret_key_from_config_wins() {
        let expected = EdKeypair::from_seed([9; 32]);
        let config = Config {
            service_secret_key: Some(expected.export()),
            service_key_path: scratch_path("unused"),
            ..Config::default()
        };

        let service = build_auth_service(&config).unwrap();

        assert_eq!(service.did(), expected.did());
        assert!(!config.service_key_path.exists());
    }

    #[test]
    fn key_file_is_created_once_and_reused() {
        let path = scratch_path("created");
        let _ = fs::remove_file(&path);

        let first = load_or_create_key_file(&path).unwrap();
        let second = load_or_create_key_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(first.did(), second.did());
    }

    #[test]
    fn garbage_key_file_is_an_error() {
        let path = scratch_path("garbage");
        fs::write(&path, "not a key").unwrap();

        let result = load_or_create_key_file(&path);
        fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(AppError::Internal)));
    }

    #[test]
    fn blocked_issuers_come_from_config() {
        let service_key = EdKeypair::from_seed([9; 32]);
        let blocked = EdKeypair::from_seed([10; 32]);
        let config = Config {
            service_secret_key: Some(service_key.export()),
            blocked_issuers: vec![blocked.did().to_string()],
            ..Config::default()
        };
        let service = build_auth_service(&config).unwrap();

        let token = UcanBuilder::new(&blocked)
            .audience(service_key.did())
            .lifetime(60)
            .sign(chrono::Utc::now().timestamp())
            .unwrap();

        assert!(matches!(
            service.validate(Some(token)),
            Err(AuthError::IssuerBlocked { .. })
        ));
    }
}
