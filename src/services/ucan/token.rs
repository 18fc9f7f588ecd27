//! `header.payload.signature` tokens carrying capabilities and an optional proof.
//!
//! A decoded [`Ucan`] keeps the exact encoded form it came from. Signatures are checked
//! against the presented `header.payload` bytes and content identifiers are computed over
//! the presented token string, never over a re-encoding.
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::capability::Capability;

#[derive(Debug, Error)]
pub enum UcanError {
    #[error("token must have three dot separated parts")]
    Format,
    #[error("invalid base64url in token {0}")]
    Base64(&'static str),
    #[error("invalid token {part}: {source}")]
    Json {
        part: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode token: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UcanHeader {
    pub alg: String,
    #[serde(default)]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ucv: Option<String>,
}

/// Token claims. Field order matches the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UcanPayload {
    pub aud: String,
    #[serde(default)]
    pub att: Vec<Capability>,
    pub exp: i64,
    #[serde(default)]
    pub fct: Vec<serde_json::Value>,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    // The parent token, nested in full (not a reference).
    #[serde(default)]
    pub prf: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ucan {
    header: UcanHeader,
    payload: UcanPayload,
    signature: Option<Vec<u8>>,
    signed_len: usize,
    encoded: String,
}

impl Ucan {
    pub fn decode(encoded: &str) -> Result<Self, UcanError> {
        let mut parts = encoded.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(UcanError::Format);
        };

        let signed_len = header.len() + 1 + payload.len();
        let header: UcanHeader = decode_json(header, "header")?;
        let payload: UcanPayload = decode_json(payload, "payload")?;
        let signature = match signature.trim_end_matches('=') {
            "" => None,
            sig => Some(
                URL_SAFE_NO_PAD
                    .decode(sig)
                    .map_err(|_| UcanError::Base64("signature"))?,
            ),
        };

        Ok(Self {
            header,
            payload,
            signature,
            signed_len,
            encoded: encoded.to_string(),
        })
    }

    /// Assembles a token from already encoded parts (used by the builder).
    pub(crate) fn from_parts(
        header: UcanHeader,
        payload: UcanPayload,
        signing_input: String,
        signature: Vec<u8>,
    ) -> Self {
        let signed_len = signing_input.len();
        let encoded = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(&signature));
        Self {
            header,
            payload,
            signature: Some(signature),
            signed_len,
            encoded,
        }
    }

    pub fn header(&self) -> &UcanHeader {
        &self.header
    }

    pub fn issuer(&self) -> &str {
        &self.payload.iss
    }

    pub fn audience(&self) -> &str {
        &self.payload.aud
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.payload.att
    }

    pub fn expires_at(&self) -> i64 {
        self.payload.exp
    }

    /// Encoded parent token, if this token was delegated.
    pub fn proof(&self) -> Option<&str> {
        self.payload.prf.as_deref()
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// The `header.payload` bytes the signature covers.
    pub fn signing_input(&self) -> &[u8] {
        &self.encoded.as_bytes()[..self.signed_len]
    }

    /// The token exactly as it was presented (or built).
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Expired once `now` reaches `exp`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.payload.exp <= now
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(
    part: &str,
    name: &'static str,
) -> Result<T, UcanError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part.trim_end_matches('='))
        .map_err(|_| UcanError::Base64(name))?;
    serde_json::from_slice(&bytes).map_err(|source| UcanError::Json { part: name, source })
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String, UcanError> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}
