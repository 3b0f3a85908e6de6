//! # arbundle 暗号処理
//!
//! データアイテムの署名に必要な暗号プリミティブとエンコーディングを実装する。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 署名ペイロード | Deep Hash（SHA-384） |
//! | 署名 | Ed25519（signatureType = 2） |
//! | データアイテムID | SHA-256(署名) |
//! | アドレス | Base58 |
//! | ID・署名の文字列表現 | Base64-URL（パディングなし） |

pub mod deep_hash;
pub mod encoding;
pub mod signer;

use sha2::{Digest, Sha256};

pub use deep_hash::{deep_hash, DeepHashDigest, DEEP_HASH_LENGTH};
pub use encoding::{base58_decode, base58_encode, base64url_decode, base64url_encode};
pub use signer::{
    signature_config, verify_signature, BundleSigner, SignatureConfig, SolanaSigner,
    SIGNATURE_CONFIGS, SOLANA_SIGNATURE_TYPE,
};

pub use ed25519_dalek::{
    Signature as Ed25519Signature, SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
};

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Base58アルファベット外の文字
    #[error("不正なBase58文字 '{character}'（位置 {position}）")]
    InvalidBase58Character {
        /// 不正な文字
        character: char,
        /// 文字列中の位置（0始まり）
        position: usize,
    },
    /// Base58デコードエラー（文字以外の理由）
    #[error("Base58デコードに失敗しました: {0}")]
    Base58(String),
    /// Base64-URLデコードエラー
    #[error("Base64-URLデコードに失敗しました: {0}")]
    Base64(String),
    /// 鍵素材の長さが不正
    #[error("鍵の長さが不正です: {actual}バイト（{expected}）")]
    InvalidKeyLength {
        /// 期待される長さの説明
        expected: &'static str,
        /// 実際の長さ
        actual: usize,
    },
    /// 鍵素材の形式が不正
    #[error("鍵の形式が不正です: {0}")]
    InvalidKeyFormat(String),
    /// 64バイト鍵の秘密鍵部と公開鍵部が一致しない
    #[error("秘密鍵と公開鍵が対応していません")]
    KeyPairMismatch,
    /// 署名タイプが未対応
    #[error("未対応の署名タイプ: {0}")]
    UnsupportedSignatureType(u16),
    /// 署名長が署名タイプの定義と一致しない
    #[error("署名の長さが不正です: 期待値 {expected}バイト, 実際 {actual}バイト")]
    InvalidSignatureLength {
        /// 署名タイプが定める長さ
        expected: usize,
        /// 実際の長さ
        actual: usize,
    },
    /// 署名検証エラー
    #[error("署名検証に失敗しました")]
    SignatureVerifyError,
}

/// SHA-256ハッシュ計算。
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256の既知ベクタ（空入力）
    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
