//! # 署名者
//!
//! 署名タイプごとの長さ定義テーブルと、データアイテムに署名する鍵プロバイダの抽象。
//!
//! ## 署名タイプ
//!
//! | `signatureType` | 名前 | 署名長 | 公開鍵長 |
//! |-----------------|------|--------|----------|
//! | 2 | solana (Ed25519) | 64 | 32 |
//!
//! エンコーダと署名者はどちらもこのテーブルから長さを引く。
//! 署名タイプを追加する場合は [`SIGNATURE_CONFIGS`] に1行足す。

use ed25519_dalek::{Signer, Verifier};

use crate::encoding::{base58_decode, base58_encode};
use crate::{CryptoError, Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey};

/// Ed25519（Solanaウォレット鍵）の署名タイプ
pub const SOLANA_SIGNATURE_TYPE: u16 = 2;

/// 署名タイプごとの長さ定義。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureConfig {
    /// データアイテム先頭2バイトに書かれる識別子
    pub signature_type: u16,
    /// 署名領域の長さ
    pub signature_length: usize,
    /// owner領域（公開鍵）の長さ
    pub public_key_length: usize,
    /// 表示名
    pub name: &'static str,
}

/// 対応する署名タイプの一覧。
pub const SIGNATURE_CONFIGS: &[SignatureConfig] = &[SignatureConfig {
    signature_type: SOLANA_SIGNATURE_TYPE,
    signature_length: 64,
    public_key_length: 32,
    name: "solana",
}];

/// 署名タイプから長さ定義を取得する。
pub fn signature_config(signature_type: u16) -> Result<&'static SignatureConfig, CryptoError> {
    SIGNATURE_CONFIGS
        .iter()
        .find(|c| c.signature_type == signature_type)
        .ok_or(CryptoError::UnsupportedSignatureType(signature_type))
}

/// データアイテムに署名する鍵プロバイダ。
///
/// 鍵素材は構築後読み取り専用で、並行するアップロードから同時に呼ばれ得る。
pub trait BundleSigner: Send + Sync {
    /// 署名タイプ（[`SIGNATURE_CONFIGS`] のいずれか）
    fn signature_type(&self) -> u16;

    /// owner領域に書かれる公開鍵
    fn public_key(&self) -> Vec<u8>;

    /// メッセージ（Deep Hashダイジェスト）に対する生の署名
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// 署名タイプに応じて署名を検証する。
pub fn verify_signature(
    signature_type: u16,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let config = signature_config(signature_type)?;
    if signature.len() != config.signature_length {
        return Err(CryptoError::InvalidSignatureLength {
            expected: config.signature_length,
            actual: signature.len(),
        });
    }

    match signature_type {
        SOLANA_SIGNATURE_TYPE => {
            let pk: [u8; 32] = public_key
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: "公開鍵は32バイト",
                    actual: public_key.len(),
                })?;
            let verifying_key = Ed25519VerifyingKey::from_bytes(&pk)
                .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            let sig = Ed25519Signature::from_slice(signature)
                .map_err(|_| CryptoError::SignatureVerifyError)?;
            verifying_key
                .verify(message, &sig)
                .map_err(|_| CryptoError::SignatureVerifyError)
        }
        other => Err(CryptoError::UnsupportedSignatureType(other)),
    }
}

/// Solanaウォレット鍵によるEd25519署名者。
///
/// 64バイト（秘密鍵 ‖ 公開鍵）または32バイト（秘密鍵のみ）の鍵素材を受け付ける。
/// 秘密鍵のみの場合、公開鍵はEd25519鍵生成関数で導出する。
pub struct SolanaSigner {
    signing_key: Ed25519SigningKey,
}

impl SolanaSigner {
    /// Ed25519秘密鍵から構築する。
    pub fn new(signing_key: Ed25519SigningKey) -> Self {
        Self { signing_key }
    }

    /// 32バイトまたは64バイトの鍵素材から構築する。
    /// 64バイトの場合は後半の公開鍵が秘密鍵から導出したものと一致する必要がある。
    pub fn from_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        let signing_key = match key.len() {
            32 => {
                let mut secret = [0u8; 32];
                secret.copy_from_slice(key);
                Ed25519SigningKey::from_bytes(&secret)
            }
            64 => {
                let mut keypair = [0u8; 64];
                keypair.copy_from_slice(key);
                Ed25519SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|_| CryptoError::KeyPairMismatch)?
            }
            actual => {
                return Err(CryptoError::InvalidKeyLength {
                    expected: "秘密鍵は32バイトまたは64バイト",
                    actual,
                })
            }
        };
        Ok(Self::new(signing_key))
    }

    /// Base58文字列（Solanaウォレットのエクスポート形式）から構築する。
    pub fn from_base58(s: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&base58_decode(s.trim())?)
    }

    /// JSONバイト配列（Solana CLIのキーペアファイル形式）から構築する。
    pub fn from_json_array(s: &str) -> Result<Self, CryptoError> {
        let bytes: Vec<u8> =
            serde_json::from_str(s).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Base58エンコードされた公開鍵（ウォレットアドレス）
    pub fn address(&self) -> String {
        base58_encode(self.signing_key.verifying_key().as_bytes())
    }
}

impl BundleSigner for SolanaSigner {
    fn signature_type(&self) -> u16 {
        SOLANA_SIGNATURE_TYPE
    }

    fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [u8; 32] = [42u8; 32];

    /// 32バイト鍵から公開鍵が導出され、64バイト鍵と同じ署名者になることを確認
    #[test]
    fn test_from_private_half_derives_public_key() {
        let from_secret = SolanaSigner::from_bytes(&SEED).unwrap();
        let public_key = from_secret.public_key();
        assert_eq!(public_key.len(), 32);

        let mut keypair = SEED.to_vec();
        keypair.extend_from_slice(&public_key);
        let from_keypair = SolanaSigner::from_bytes(&keypair).unwrap();
        assert_eq!(from_keypair.public_key(), public_key);
    }

    /// 64バイト鍵の公開鍵部が一致しない場合は拒否されることを確認
    #[test]
    fn test_keypair_mismatch_rejected() {
        let mut keypair = SEED.to_vec();
        keypair.extend_from_slice(&[1u8; 32]);
        assert!(matches!(
            SolanaSigner::from_bytes(&keypair),
            Err(CryptoError::KeyPairMismatch)
        ));
    }

    /// 32/64以外の長さは長さ付きで拒否されることを確認
    #[test]
    fn test_invalid_key_length() {
        match SolanaSigner::from_bytes(&[0u8; 31]) {
            Err(CryptoError::InvalidKeyLength { actual, .. }) => assert_eq!(actual, 31),
            other => panic!("想定外の結果: {:?}", other.err()),
        }
    }

    /// Ed25519は決定的で、同じダイジェストへの署名が一致し検証に成功することを確認
    #[test]
    fn test_deterministic_signature_verifies() {
        let signer = SolanaSigner::from_bytes(&SEED).unwrap();
        let digest = crate::deep_hash(&[b"hello".as_slice()]);

        let sig1 = signer.sign(&digest).unwrap();
        let sig2 = signer.sign(&digest).unwrap();
        assert_eq!(sig1.len(), 64);
        assert_eq!(sig1, sig2);

        verify_signature(SOLANA_SIGNATURE_TYPE, &signer.public_key(), &digest, &sig1).unwrap();

        let mut tampered = digest;
        tampered[0] ^= 1;
        assert!(
            verify_signature(SOLANA_SIGNATURE_TYPE, &signer.public_key(), &tampered, &sig1)
                .is_err(),
            "改ざんされたメッセージの検証が成功してしまった"
        );
    }

    /// Base58形式とJSON配列形式の鍵読み込みが同じ署名者になることを確認
    #[test]
    fn test_key_formats() {
        let signer = SolanaSigner::new(Ed25519SigningKey::generate(&mut rand::rngs::OsRng));
        let mut keypair = signer.signing_key.to_bytes().to_vec();
        keypair.extend_from_slice(&signer.public_key());

        let from_b58 = SolanaSigner::from_base58(&base58_encode(&keypair)).unwrap();
        assert_eq!(from_b58.address(), signer.address());

        let json = serde_json::to_string(&keypair).unwrap();
        let from_json = SolanaSigner::from_json_array(&json).unwrap();
        assert_eq!(from_json.public_key(), signer.public_key());

        assert!(SolanaSigner::from_json_array("[1, 2, 3]").is_err());
    }

    /// 未対応の署名タイプと長さ不一致の署名が拒否されることを確認
    #[test]
    fn test_signature_config_lookup() {
        let config = signature_config(SOLANA_SIGNATURE_TYPE).unwrap();
        assert_eq!(config.signature_length, 64);
        assert_eq!(config.public_key_length, 32);

        assert!(matches!(
            signature_config(99),
            Err(CryptoError::UnsupportedSignatureType(99))
        ));
        assert!(matches!(
            verify_signature(SOLANA_SIGNATURE_TYPE, &[0u8; 32], b"m", &[0u8; 63]),
            Err(CryptoError::InvalidSignatureLength {
                expected: 64,
                actual: 63
            })
        ));
    }
}
