//! # Base58 / Base64-URL
//!
//! アドレスと識別子の文字列表現。
//!
//! - Base58: 紛らわしい文字（0, O, I, l）を除いたアルファベット。
//!   先頭のゼロバイトは先頭の `'1'` として保存される。
//! - Base64-URL: `+`→`-`, `/`→`_` に置換し、末尾の `=` は常に取り除く。

use base64::Engine;

use crate::CryptoError;

/// Base64-URLエンジン（パディングなし）
fn b64url() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
}

/// バイト列をBase58文字列にエンコードする。
pub fn base58_encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Base58文字列をデコードする。
/// アルファベット外の文字は文字と位置を含むエラーになる。
pub fn base58_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    bs58::decode(s).into_vec().map_err(|e| match e {
        bs58::decode::Error::InvalidCharacter { character, index } => {
            CryptoError::InvalidBase58Character {
                character,
                position: index,
            }
        }
        other => CryptoError::Base58(other.to_string()),
    })
}

/// バイト列をパディングなしのBase64-URL文字列にエンコードする。
pub fn base64url_encode(bytes: &[u8]) -> String {
    b64url().encode(bytes)
}

/// Base64-URL文字列をデコードする。
/// パディングの有無はどちらも受け付ける。
pub fn base64url_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    b64url()
        .decode(s.trim_end_matches('='))
        .map_err(|e| CryptoError::Base64(e.to_string()))
}
