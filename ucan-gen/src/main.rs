use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use base58::ToBase58;
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use clap::Parser;
use ed25519_dalek::{Signer, SigningKey};
use ipld_core::cid::{Cid, multihash::Multihash};
use sha2::{Digest, Sha256};

/// Mint a UCAN (header.payload.signature) signed with an Ed25519 key.
///
/// This tool is intentionally minimal and self-contained:
/// - Loads the issuer key from a file holding base64 of the seed or the `secret || public` pair
///   (the same format as the gateway's `service.key`)
/// - Builds the header (alg=EdDSA, typ=JWT, ucv=0.8.0) and payload (aud, att, exp, fct, iss, prf)
/// - Signs "base64url(header).base64url(payload)" with Ed25519
/// - Outputs:
///   - the token
///   - the issuer DID (did:key)
///   - the token CID (what `/api/v1/revoke/{cid}` expects)
#[derive(Parser, Debug)]
#[command(name = "ucan-gen", version, about)]
struct Args {
    /// File with the issuer's base64 Ed25519 secret key
    #[arg(long, value_name = "FILE")]
    issuer_key: PathBuf,

    /// Create the key file with a fresh key when it does not exist
    #[arg(long, default_value_t = false)]
    generate_key: bool,

    /// Audience DID (for a request to the gateway: the DID from GET /api/v1/did)
    #[arg(long)]
    audience: String,

    /// Capability as JSON, e.g. '{"cap":"POST","id":"/uploads/did:key:z.../","storageLimit":1024}'.
    /// Repeatable.
    #[arg(long = "capability", value_name = "JSON")]
    capabilities: Vec<String>,

    /// Encoded parent token this one is delegated from
    #[arg(long)]
    proof: Option<String>,

    /// Lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    lifetime: i64,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

const UCAN_VERSION: &str = "0.8.0";
const ED25519_PUB: [u8; 2] = [0xed, 0x01];
const RAW: u64 = 0x55;
const SHA2_256: u64 = 0x12;

fn b64url_json(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_string(value)?.as_bytes()))
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_secs() as i64
}

fn did_key(signing_key: &SigningKey) -> String {
    let mut raw = ED25519_PUB.to_vec();
    raw.extend_from_slice(signing_key.verifying_key().as_bytes());
    format!("did:key:z{}", raw.to_base58())
}

fn cid(token: &str) -> Result<String, Box<dyn std::error::Error>> {
    let digest = Sha256::digest(token.as_bytes());
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)?;
    Ok(Cid::new_v1(RAW, hash).to_string())
}

fn load_key(args: &Args) -> Result<SigningKey, Box<dyn std::error::Error>> {
    if !args.issuer_key.exists() {
        if !args.generate_key {
            return Err(format!(
                "{} does not exist (pass --generate-key to create it)",
                args.issuer_key.display()
            )
            .into());
        }
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed).map_err(|e| e.to_string())?;
        let key = SigningKey::from_bytes(&seed);
        fs::write(&args.issuer_key, STANDARD.encode(key.to_keypair_bytes()))?;
        eprintln!("generated {}", args.issuer_key.display());
        return Ok(key);
    }

    let bytes = STANDARD.decode(fs::read_to_string(&args.issuer_key)?.trim())?;
    match bytes.len() {
        32 => Ok(SigningKey::from_bytes(bytes.as_slice().try_into()?)),
        64 => Ok(SigningKey::from_keypair_bytes(bytes.as_slice().try_into()?)?),
        n => Err(format!("expected a 32 or 64 byte key, got {n} bytes").into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let signing_key = load_key(&args)?;
    let issuer = did_key(&signing_key);

    let mut att = Vec::with_capacity(args.capabilities.len());
    for raw in &args.capabilities {
        let capability: serde_json::Value = serde_json::from_str(raw)?;
        if !capability.get("cap").is_some_and(|c| c.is_string()) {
            return Err(format!("capability needs a string \"cap\": {raw}").into());
        }
        att.push(capability);
    }

    let header = serde_json::json!({
        "alg": "EdDSA",
        "typ": "JWT",
        "ucv": UCAN_VERSION,
    });

    // Keys in alphabetical order, matching the gateway's own tokens.
    let mut claims = serde_json::Map::new();
    claims.insert("aud".to_string(), args.audience.clone().into());
    claims.insert("att".to_string(), serde_json::Value::Array(att));
    claims.insert("exp".to_string(), (now_unix() + args.lifetime).into());
    claims.insert("fct".to_string(), serde_json::Value::Array(Vec::new()));
    claims.insert("iss".to_string(), issuer.clone().into());
    if let Some(proof) = args.proof.clone() {
        claims.insert("prf".to_string(), proof.into());
    }

    let signing_input = format!(
        "{}.{}",
        b64url_json(&header)?,
        b64url_json(&serde_json::Value::Object(claims))?
    );
    let sig = signing_key.sign(signing_input.as_bytes());
    let token = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(sig.to_bytes()));

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    println!("UCAN: {}", token);
    println!("issuer: {}", issuer);
    println!("cid: {}", cid(&token)?);

    Ok(())
}
