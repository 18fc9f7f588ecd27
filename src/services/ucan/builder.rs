use crate::services::capability::Capability;

use super::did::EdKeypair;
use super::token::{Ucan, UcanError, UcanHeader, UcanPayload, encode_json};

pub const UCAN_VERSION: &str = "0.8.0";

/// Builds and signs a token.
///
/// ```ignore
/// let token = UcanBuilder::new(&keypair)
///     .audience(user_did)
///     .capabilities(caps)
///     .lifetime(24 * 60 * 60)
///     .sign(now)?;
/// ```
#[derive(Debug, Clone)]
pub struct UcanBuilder<'a> {
    issuer: &'a EdKeypair,
    audience: String,
    capabilities: Vec<Capability>,
    expiration: Expiration,
    proof: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Expiration {
    Lifetime(i64),
    #[cfg(test)]
    At(i64),
}

impl<'a> UcanBuilder<'a> {
    pub fn new(issuer: &'a EdKeypair) -> Self {
        Self {
            issuer,
            audience: String::new(),
            capabilities: Vec::new(),
            expiration: Expiration::Lifetime(30),
            proof: None,
        }
    }

    pub fn audience(mut self, did: impl Into<String>) -> Self {
        self.audience = did.into();
        self
    }

    pub fn capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    #[cfg(test)]
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Seconds from the signing time.
    pub fn lifetime(mut self, seconds: i64) -> Self {
        self.expiration = Expiration::Lifetime(seconds);
        self
    }

    #[cfg(test)]
    pub fn expires_at(mut self, exp: i64) -> Self {
        self.expiration = Expiration::At(exp);
        self
    }

    /// Delegate from `proof` (an encoded token addressed to this issuer).
    #[cfg(test)]
    pub fn proof(mut self, proof: impl Into<String>) -> Self {
        self.proof = Some(proof.into());
        self
    }

    pub fn sign(self, now: i64) -> Result<Ucan, UcanError> {
        let header = UcanHeader {
            alg: "EdDSA".to_string(),
            typ: Some("JWT".to_string()),
            ucv: Some(UCAN_VERSION.to_string()),
        };
        let exp = match self.expiration {
            Expiration::Lifetime(seconds) => now + seconds,
            #[cfg(test)]
            Expiration::At(exp) => exp,
        };
        let payload = UcanPayload {
            aud: self.audience,
            att: self.capabilities,
            exp,
            fct: Vec::new(),
            iss: self.issuer.did().to_string(),
            nbf: None,
            prf: self.proof,
        };

        let signing_input = format!("{}.{}", encode_json(&header)?, encode_json(&payload)?);
        let signature = self.issuer.sign(signing_input.as_bytes());

        Ok(Ucan::from_parts(header, payload, signing_input, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::capability::STORAGE_LIMIT;
    use crate::services::ucan::did;
    use pretty_assertions::assert_eq;

    fn sample() -> Ucan {
        let issuer = EdKeypair::from_seed([9; 32]);
        UcanBuilder::new(&issuer)
            .audience("did:key:zAudience")
            .capability(Capability::new("POST", "/uploads/a/").with(STORAGE_LIMIT, 10u64))
            .lifetime(60)
            .sign(1_000)
            .unwrap()
    }

    #[test]
    fn built_token_decodes_to_the_same_token() {
        let token = sample();
        let decoded = Ucan::decode(token.encoded()).unwrap();

        assert_eq!(decoded, token);
        assert_eq!(decoded.expires_at(), 1_060);
        assert_eq!(decoded.audience(), "did:key:zAudience");
        assert_eq!(decoded.proof(), None);
    }

    #[test]
    fn signature_covers_header_and_payload() {
        let token = sample();
        let signature = token.signature().unwrap();

        assert!(did::verify(token.issuer(), token.signing_input(), signature).unwrap());
        assert_eq!(
            token.signing_input().len(),
            token.encoded().rfind('.').unwrap()
        );
    }

    #[test]
    fn unsigned_token_decodes_without_signature() {
        let token = sample();
        let encoded = token.encoded();
        let unsigned = &encoded[..=encoded.rfind('.').unwrap()];

        let decoded = Ucan::decode(unsigned).unwrap();
        assert_eq!(decoded.signature(), None);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(matches!(Ucan::decode("abc"), Err(UcanError::Format)));
        assert!(matches!(Ucan::decode("a.b.c.d"), Err(UcanError::Format)));
        assert!(matches!(
            Ucan::decode("!!.e30.sig"),
            Err(UcanError::Base64("header"))
        ));
        // `e30` is `{}`: a header without `alg`.
        assert!(matches!(
            Ucan::decode("e30.e30."),
            Err(UcanError::Json { part: "header", .. })
        ));
    }

    #[test]
    fn expiry_is_inclusive_of_now() {
        let token = sample();
        assert!(!token.is_expired(1_059));
        assert!(token.is_expired(1_060));
    }
}
