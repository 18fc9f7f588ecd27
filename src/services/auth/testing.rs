//! Fixtures shared by the auth tests: fixed keys, a fixed clock and chain builders.
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::services::capability::{Capability, STORAGE_LIMIT};
use crate::services::ucan::{EdKeypair, Ucan, UcanBuilder};

pub const NOW: i64 = 1_700_000_000;

pub fn service_key() -> EdKeypair {
    EdKeypair::from_seed([1; 32])
}

pub fn alice() -> EdKeypair {
    EdKeypair::from_seed([2; 32])
}

pub fn bob() -> EdKeypair {
    EdKeypair::from_seed([3; 32])
}

pub fn mallory() -> EdKeypair {
    EdKeypair::from_seed([4; 32])
}

pub fn upload(did: &str, limit: u64) -> Capability {
    Capability::new("POST", format!("/uploads/{did}/")).with(STORAGE_LIMIT, limit)
}

pub fn list(did: &str) -> Capability {
    Capability::new("LIST", format!("/uploads/{did}/"))
}

/// Signs a token valid for an hour around [`NOW`].
pub fn delegate(
    issuer: &EdKeypair,
    audience: &str,
    capabilities: Vec<Capability>,
    proof: Option<&Ucan>,
) -> Ucan {
    let builder = UcanBuilder::new(issuer)
        .audience(audience)
        .capabilities(capabilities)
        .lifetime(3600);
    let builder = match proof {
        Some(proof) => builder.proof(proof.encoded()),
        None => builder,
    };
    builder.sign(NOW).unwrap()
}

/// Signs `header.payload` with `signer` and decodes the result.
pub fn sign_raw(signing_input: &[u8], signer: &EdKeypair) -> Ucan {
    let input = std::str::from_utf8(signing_input).unwrap();
    let signature = URL_SAFE_NO_PAD.encode(signer.sign(signing_input));
    Ucan::decode(&format!("{input}.{signature}")).unwrap()
}

/// `token` with its header and payload untouched but signed by `signer`.
pub fn forge(token: &Ucan, signer: &EdKeypair) -> Ucan {
    sign_raw(token.signing_input(), signer)
}
