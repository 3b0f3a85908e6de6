//! # データアイテム
//!
//! バンドル形式のデータアイテムを構築・署名・パースする。
//!
//! ## バイナリレイアウト（リトルエンディアン）
//! ```text
//! [2B: signatureType]
//! [署名: signatureTypeが定める長さ（Ed25519は64B）]
//! [owner: signatureTypeが定める長さ（Ed25519は32B）]
//! [1B: target有無][0 or 32B: target]
//! [1B: anchor有無][0 or 32B: anchor]
//! [8B: タグ数][8B: タグブロック長][タグブロック]
//! [データ]
//! ```
//!
//! ## ライフサイクル
//! 1. 未署名で構築（署名領域はゼロ埋め）
//! 2. 各領域から署名対象のDeep Hashを計算
//! 3. 外部で署名し、署名領域に1度だけ書き込む
//! 4. 以降 `id = Base64URL(SHA-256(署名))` が確定し、変更不可

use std::ops::Range;

use arbundle_crypto::{
    base64url_encode, deep_hash, sha256, signature_config, verify_signature, BundleSigner,
    DeepHashDigest, SignatureConfig,
};
use arbundle_types::Tag;

use crate::tags::{decode_tags, encode_tags, DEFAULT_MAX_TAGS_BYTES};
use crate::BundleError;

/// Deep Hashに渡すアイテム種別のリテラル
const DATA_ITEM_TYPE: &[u8] = b"dataitem";
/// Deep Hashに渡すアイテムバージョンのリテラル
const DATA_ITEM_VERSION: &[u8] = b"1";

/// targetの長さ
pub const TARGET_LENGTH: usize = 32;
/// anchorの長さ
pub const ANCHOR_LENGTH: usize = 32;

/// 署名タイプ(2B)
const SIGNATURE_TYPE_LENGTH: usize = 2;
/// タグヘッダ（タグ数8B + タグブロック長8B）
const TAG_HEADER_LENGTH: usize = 16;

/// データアイテム構築時のオプション。
#[derive(Debug, Clone)]
pub struct DataItemOptions {
    /// 32バイトのtarget（省略可）
    pub target: Option<Vec<u8>>,
    /// 32バイトのanchor（省略可）
    pub anchor: Option<Vec<u8>>,
    /// タグ（順序は保持される）
    pub tags: Vec<Tag>,
    /// タグブロックの上限（バイト）
    pub max_tags_bytes: usize,
}

impl Default for DataItemOptions {
    fn default() -> Self {
        Self {
            target: None,
            anchor: None,
            tags: Vec::new(),
            max_tags_bytes: DEFAULT_MAX_TAGS_BYTES,
        }
    }
}

/// Deep Hashが消費する各領域のバッファ内の位置。
/// 構築時またはパース時に1度だけ計算する。
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    signature: Range<usize>,
    owner: Range<usize>,
    /// target値（無い場合は空範囲）
    target: Range<usize>,
    /// anchor値（無い場合は空範囲）
    anchor: Range<usize>,
    tag_count: u64,
    /// タグブロック本体（ヘッダを除く）
    tags: Range<usize>,
    data: Range<usize>,
}

/// 1つのデータアイテム。署名後は変更できない。
#[derive(Debug, Clone)]
pub struct DataItem {
    bytes: Vec<u8>,
    config: &'static SignatureConfig,
    layout: Layout,
    signed: bool,
}

/// `bytes[*offset..]` に `src` を書き込み、書き込んだ範囲を返す。
fn put(bytes: &mut [u8], offset: &mut usize, src: &[u8]) -> Range<usize> {
    let range = *offset..*offset + src.len();
    bytes[range.clone()].copy_from_slice(src);
    *offset = range.end;
    range
}

/// 有無フラグ付きの固定長フィールドを検証する。
fn check_optional_field(
    field: &'static str,
    value: Option<&[u8]>,
    expected: usize,
) -> Result<usize, BundleError> {
    match value {
        Some(v) if v.len() != expected => Err(BundleError::InvalidFieldLength {
            field,
            expected,
            actual: v.len(),
        }),
        Some(_) => Ok(expected),
        None => Ok(0),
    }
}

impl DataItem {
    /// 未署名のデータアイテムを構築する。
    ///
    /// バッファ長は書き込み前に全て確定させ、以降リサイズしない。
    pub fn new_unsigned(
        data: &[u8],
        owner: &[u8],
        signature_type: u16,
        options: &DataItemOptions,
    ) -> Result<Self, BundleError> {
        let config = signature_config(signature_type)?;
        if owner.len() != config.public_key_length {
            return Err(BundleError::InvalidFieldLength {
                field: "owner",
                expected: config.public_key_length,
                actual: owner.len(),
            });
        }
        let target_len =
            check_optional_field("target", options.target.as_deref(), TARGET_LENGTH)?;
        let anchor_len =
            check_optional_field("anchor", options.anchor.as_deref(), ANCHOR_LENGTH)?;
        let tag_bytes = encode_tags(&options.tags, options.max_tags_bytes)?;

        let total = SIGNATURE_TYPE_LENGTH
            + config.signature_length
            + config.public_key_length
            + 1
            + target_len
            + 1
            + anchor_len
            + TAG_HEADER_LENGTH
            + tag_bytes.len()
            + data.len();

        let mut bytes = vec![0u8; total];
        let mut offset = 0;

        put(&mut bytes, &mut offset, &signature_type.to_le_bytes());
        let signature = offset..offset + config.signature_length;
        offset = signature.end;
        let owner = put(&mut bytes, &mut offset, owner);

        let target = match options.target.as_deref() {
            Some(t) => {
                put(&mut bytes, &mut offset, &[1]);
                put(&mut bytes, &mut offset, t)
            }
            None => {
                put(&mut bytes, &mut offset, &[0]);
                offset..offset
            }
        };
        let anchor = match options.anchor.as_deref() {
            Some(a) => {
                put(&mut bytes, &mut offset, &[1]);
                put(&mut bytes, &mut offset, a)
            }
            None => {
                put(&mut bytes, &mut offset, &[0]);
                offset..offset
            }
        };

        let tag_count = options.tags.len() as u64;
        put(&mut bytes, &mut offset, &tag_count.to_le_bytes());
        put(&mut bytes, &mut offset, &(tag_bytes.len() as u64).to_le_bytes());
        let tags = put(&mut bytes, &mut offset, &tag_bytes);
        let data = put(&mut bytes, &mut offset, data);
        debug_assert_eq!(offset, total);

        Ok(Self {
            bytes,
            config,
            layout: Layout {
                signature,
                owner,
                target,
                anchor,
                tag_count,
                tags,
                data,
            },
            signed: false,
        })
    }

    /// 署名者の公開鍵・署名タイプで未署名のデータアイテムを構築する。
    pub fn for_signer(
        data: &[u8],
        signer: &dyn BundleSigner,
        options: &DataItemOptions,
    ) -> Result<Self, BundleError> {
        Self::new_unsigned(data, &signer.public_key(), signer.signature_type(), options)
    }

    /// 完成済みのバイト列をパースする。
    /// 各フラグ・長さを検証し、Deep Hashの対象範囲を再計算する。
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, BundleError> {
        let mut reader = Reader::new(&bytes);

        let signature_type = reader.read_u16("signatureType")?;
        let config = signature_config(signature_type)?;
        let signature = reader.take(config.signature_length, "signature")?;
        let owner = reader.take(config.public_key_length, "owner")?;
        let target = reader.read_optional(TARGET_LENGTH, "target")?;
        let anchor = reader.read_optional(ANCHOR_LENGTH, "anchor")?;
        let tag_count = reader.read_u64("tagCount")?;
        let tag_len = reader.read_u64("tagLength")?;
        let tag_len = usize::try_from(tag_len).map_err(|_| {
            BundleError::Malformed(format!("タグブロック長が大きすぎます: {tag_len}"))
        })?;
        let tags = reader.take(tag_len, "tags")?;
        let data = reader.pos..bytes.len();

        if tag_count == 0 && !tags.is_empty() {
            return Err(BundleError::Malformed(format!(
                "タグ数0に対してタグブロックが {} バイトあります",
                tags.len()
            )));
        }

        let signed = bytes[signature.clone()].iter().any(|b| *b != 0);
        Ok(Self {
            bytes,
            config,
            layout: Layout {
                signature,
                owner,
                target,
                anchor,
                tag_count,
                tags,
                data,
            },
            signed,
        })
    }

    /// 署名タイプ
    pub fn signature_type(&self) -> u16 {
        self.config.signature_type
    }

    /// 署名タイプの長さ定義
    pub fn signature_config(&self) -> &'static SignatureConfig {
        self.config
    }

    /// 署名領域（未署名の場合はゼロ埋め）
    pub fn signature(&self) -> &[u8] {
        &self.bytes[self.layout.signature.clone()]
    }

    /// 署名者の公開鍵
    pub fn owner(&self) -> &[u8] {
        &self.bytes[self.layout.owner.clone()]
    }

    /// target（無い場合はNone）
    pub fn target(&self) -> Option<&[u8]> {
        let range = self.layout.target.clone();
        (!range.is_empty()).then(|| &self.bytes[range])
    }

    /// anchor（無い場合はNone）
    pub fn anchor(&self) -> Option<&[u8]> {
        let range = self.layout.anchor.clone();
        (!range.is_empty()).then(|| &self.bytes[range])
    }

    /// タグヘッダに記録されたタグ数
    pub fn tag_count(&self) -> u64 {
        self.layout.tag_count
    }

    /// エンコード済みのタグブロック
    pub fn raw_tags(&self) -> &[u8] {
        &self.bytes[self.layout.tags.clone()]
    }

    /// タグブロックをデコードする。
    pub fn tags(&self) -> Result<Vec<Tag>, BundleError> {
        decode_tags(self.raw_tags())
    }

    /// ペイロード本体
    pub fn data(&self) -> &[u8] {
        &self.bytes[self.layout.data.clone()]
    }

    /// 署名済みか
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// バイナリ全体
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// バイナリ全体の長さ
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// バイナリが空か（構築・パース済みのアイテムでは常にfalse）
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// バイナリ全体を取り出す。
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// 署名対象のDeep Hashを計算する。
    ///
    /// チャンク順: `"dataitem"`, `"1"`, 署名タイプ(10進), owner, target, anchor, タグ, データ
    pub fn signature_data(&self) -> DeepHashDigest {
        let signature_type = self.config.signature_type.to_string();
        let chunks: [&[u8]; 8] = [
            DATA_ITEM_TYPE,
            DATA_ITEM_VERSION,
            signature_type.as_bytes(),
            self.owner(),
            &self.bytes[self.layout.target.clone()],
            &self.bytes[self.layout.anchor.clone()],
            self.raw_tags(),
            self.data(),
        ];
        deep_hash(&chunks)
    }

    /// 署名を書き込む。1度だけ可能で、長さは署名タイプの定義と一致する必要がある。
    pub fn set_signature(&mut self, signature: &[u8]) -> Result<(), BundleError> {
        if self.signed {
            return Err(BundleError::AlreadySigned);
        }
        if signature.len() != self.config.signature_length {
            return Err(BundleError::InvalidFieldLength {
                field: "signature",
                expected: self.config.signature_length,
                actual: signature.len(),
            });
        }
        self.bytes[self.layout.signature.clone()].copy_from_slice(signature);
        self.signed = true;
        Ok(())
    }

    /// Deep Hashの計算・署名・書き込みを行い、確定したIDを返す。
    pub fn sign(&mut self, signer: &dyn BundleSigner) -> Result<String, BundleError> {
        if signer.signature_type() != self.config.signature_type {
            return Err(BundleError::SignerMismatch(format!(
                "署名タイプ {} のアイテムに署名タイプ {} の署名者",
                self.config.signature_type,
                signer.signature_type()
            )));
        }
        if signer.public_key() != self.owner() {
            return Err(BundleError::SignerMismatch(
                "署名者の公開鍵がownerと一致しません".to_string(),
            ));
        }
        if self.signed {
            return Err(BundleError::AlreadySigned);
        }

        let message = self.signature_data();
        let signature = signer.sign(&message)?;
        self.set_signature(&signature)?;
        self.id()
    }

    /// 生のID（SHA-256(署名)）。未署名の場合はエラー。
    pub fn raw_id(&self) -> Result<[u8; 32], BundleError> {
        if !self.signed {
            return Err(BundleError::NotSigned);
        }
        Ok(sha256(self.signature()))
    }

    /// Base64-URLエンコードされたID。未署名の場合はエラー。
    pub fn id(&self) -> Result<String, BundleError> {
        Ok(base64url_encode(&self.raw_id()?))
    }

    /// ownerの公開鍵で署名を検証する。
    /// タグブロックが宣言されたタグ数と一致することも確認する。
    pub fn verify(&self) -> Result<(), BundleError> {
        if !self.signed {
            return Err(BundleError::NotSigned);
        }
        if self.layout.tag_count > 0 {
            let tags = self.tags()?;
            if tags.len() as u64 != self.layout.tag_count {
                return Err(BundleError::Malformed(format!(
                    "タグ数が一致しません: ヘッダ {}, 実際 {}",
                    self.layout.tag_count,
                    tags.len()
                )));
            }
        }
        verify_signature(
            self.config.signature_type,
            self.owner(),
            &self.signature_data(),
            self.signature(),
        )?;
        Ok(())
    }
}

/// パース用の読み取りカーソル。範囲のみを返し、バッファは借用しない。
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<Range<usize>, BundleError> {
        let remaining = self.bytes.len() - self.pos;
        if len > remaining {
            return Err(BundleError::Truncated {
                field,
                needed: len,
                remaining,
            });
        }
        let range = self.pos..self.pos + len;
        self.pos = range.end;
        Ok(range)
    }

    fn read_u16(&mut self, field: &'static str) -> Result<u16, BundleError> {
        let range = self.take(2, field)?;
        Ok(u16::from_le_bytes([self.bytes[range.start], self.bytes[range.start + 1]]))
    }

    fn read_u64(&mut self, field: &'static str) -> Result<u64, BundleError> {
        let range = self.take(8, field)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes[range]);
        Ok(u64::from_le_bytes(buf))
    }

    /// 有無フラグ付きの固定長フィールド。無い場合は空範囲を返す。
    fn read_optional(
        &mut self,
        len: usize,
        field: &'static str,
    ) -> Result<Range<usize>, BundleError> {
        let flag = self.take(1, field)?;
        match self.bytes[flag.start] {
            0 => Ok(self.pos..self.pos),
            1 => self.take(len, field),
            other => Err(BundleError::Malformed(format!(
                "{field} の有無フラグが不正です: {other}"
            ))),
        }
    }
}
