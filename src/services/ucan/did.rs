//! Ed25519 principals addressed as `did:key`.
use base58::{FromBase58, ToBase58};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

const DID_KEY_PREFIX: &str = "did:key:z";
const ED25519_PUB: [u8; 2] = [0xed, 0x01];

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("not an ed25519 did:key: {0}")]
    UnsupportedDid(String),
    #[error("invalid ed25519 public key in {0}")]
    InvalidPublicKey(String),
    #[error("invalid secret key encoding")]
    InvalidSecretKey,
    #[error("failed to generate key material: {0}")]
    Entropy(String),
}

/// The service's (or a client's) signing key.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct EdKeypair {
    signing_key: SigningKey,
    did: String,
}

impl std::fmt::Debug for EdKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdKeypair").field("did", &self.did).finish()
    }
}

impl EdKeypair {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let did = did_of(&signing_key.verifying_key());
        Self { signing_key, did }
    }

    /// Fresh key from OS entropy.
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed).map_err(|e| KeyError::Entropy(e.to_string()))?;
        Ok(Self::from_seed(seed))
    }

    /// Accepts base64 of either the 32-byte seed or the 64-byte `secret || public` pair.
    pub fn from_secret_key(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| KeyError::InvalidSecretKey)?;

        match bytes.len() {
            32 => {
                let seed: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| KeyError::InvalidSecretKey)?;
                Ok(Self::from_seed(seed))
            }
            64 => {
                let pair: [u8; 64] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| KeyError::InvalidSecretKey)?;
                let signing_key =
                    SigningKey::from_keypair_bytes(&pair).map_err(|_| KeyError::InvalidSecretKey)?;
                let did = did_of(&signing_key.verifying_key());
                Ok(Self { signing_key, did })
            }
            _ => Err(KeyError::InvalidSecretKey),
        }
    }

    /// base64 of the 64-byte `secret || public` pair.
    pub fn export(&self) -> String {
        STANDARD.encode(self.signing_key.to_keypair_bytes())
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.signing_key.sign(data).to_bytes().to_vec()
    }
}

fn did_of(key: &VerifyingKey) -> String {
    let mut raw = Vec::with_capacity(34);
    raw.extend_from_slice(&ED25519_PUB);
    raw.extend_from_slice(key.as_bytes());
    format!("{}{}", DID_KEY_PREFIX, raw.to_base58())
}

/// Resolves a `did:key` to its Ed25519 verifying key.
pub fn verifier_for(did: &str) -> Result<VerifyingKey, KeyError> {
    let encoded = did
        .strip_prefix(DID_KEY_PREFIX)
        .ok_or_else(|| KeyError::UnsupportedDid(did.to_string()))?;
    let decoded = encoded
        .from_base58()
        .map_err(|_| KeyError::UnsupportedDid(did.to_string()))?;

    if decoded.len() != 34 || decoded[..2] != ED25519_PUB {
        return Err(KeyError::UnsupportedDid(did.to_string()));
    }

    let key: [u8; 32] = decoded[2..]
        .try_into()
        .map_err(|_| KeyError::InvalidPublicKey(did.to_string()))?;
    VerifyingKey::from_bytes(&key).map_err(|_| KeyError::InvalidPublicKey(did.to_string()))
}

/// `true` iff `signature` over `data` was produced by the key behind `did`.
pub fn verify(did: &str, data: &[u8], signature: &[u8]) -> Result<bool, KeyError> {
    let key = verifier_for(did)?;
    let Ok(signature) = Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(key.verify(data, &signature).is_ok())
}
