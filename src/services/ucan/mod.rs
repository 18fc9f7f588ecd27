/*
 * Responsibility
 * - token (header.payload.signature) の decode / build
 * - did:key の鍵 (署名・検証) と content identifier (CID) の計算
 * - 署名やハッシュの実装はここに閉じ込める (auth 側は契約だけを使う)
 */
pub mod builder;
pub mod cid;
pub mod did;
pub mod token;

pub use builder::UcanBuilder;
pub use cid::identify;
pub use did::EdKeypair;
pub use token::{Ucan, UcanError};
