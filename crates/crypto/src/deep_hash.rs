//! # Deep Hash
//!
//! 順序に依存するハッシュ縮約。データアイテムの署名対象を計算する。
//!
//! ```text
//! blob(b)  = H( H("blob" ‖ len(b)) ‖ H(b) )
//! list(xs) = fold( H("list" ‖ len(xs)), |acc, x| H(acc ‖ blob(x)) )
//! ```
//!
//! `H` はSHA-384、`len` はASCII10進数（先頭ゼロなし）。
//! ラベル文字列・10進表記・合成順序のいずれかが異なるとノードは署名を拒否する。

use sha2::{Digest, Sha384};

/// Deep Hashの出力長（SHA-384）
pub const DEEP_HASH_LENGTH: usize = 48;

/// Deep Hashのダイジェスト
pub type DeepHashDigest = [u8; DEEP_HASH_LENGTH];

fn finalize(hasher: Sha384) -> DeepHashDigest {
    let mut out = [0u8; DEEP_HASH_LENGTH];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// `H(label ‖ decimal(len))`
fn tag_hash(label: &[u8], len: usize) -> DeepHashDigest {
    let mut hasher = Sha384::new();
    hasher.update(label);
    hasher.update(len.to_string().as_bytes());
    finalize(hasher)
}

/// `H(left ‖ right)` を1つのハッシュインスタンスで計算する。
fn pair_hash(left: &DeepHashDigest, right: &DeepHashDigest) -> DeepHashDigest {
    let mut hasher = Sha384::new();
    hasher.update(left);
    hasher.update(right);
    finalize(hasher)
}

fn blob_hash(data: &[u8]) -> DeepHashDigest {
    let tag = tag_hash(b"blob", data.len());
    let data_hash = finalize(Sha384::new_with_prefix(data));
    pair_hash(&tag, &data_hash)
}

fn list_hash<I>(count: usize, item_hashes: I) -> DeepHashDigest
where
    I: IntoIterator<Item = DeepHashDigest>,
{
    item_hashes
        .into_iter()
        .fold(tag_hash(b"list", count), |acc, item| pair_hash(&acc, &item))
}

/// バイト列のリストのDeep Hashを計算する。
///
/// データアイテムの署名対象はこの関数に以下の順でチャンクを渡して得る:
/// `"dataitem"`, `"1"`, 署名タイプの10進文字列, owner, target, anchor, タグ, データ
pub fn deep_hash<C: AsRef<[u8]>>(chunks: &[C]) -> DeepHashDigest {
    list_hash(chunks.len(), chunks.iter().map(|c| blob_hash(c.as_ref())))
}
