//! # arbundle Core
//!
//! バンドル形式のデータアイテムのバイナリエンコーダ。
//!
//! ## 処理フロー
//! 1. タグリストを可変長バイナリにエンコードする（[`tags`]）
//! 2. 署名領域をゼロ埋めした未署名アイテムを構築する（[`DataItem::new_unsigned`]）
//! 3. 各領域からDeep Hashを計算し署名する（[`DataItem::sign`]）
//! 4. 完成したバイト列をノードへ送信する

pub mod data_item;
pub mod tags;

use arbundle_crypto::CryptoError;

pub use data_item::{DataItem, DataItemOptions, ANCHOR_LENGTH, TARGET_LENGTH};
pub use tags::{decode_tags, encode_tags, DEFAULT_MAX_TAGS_BYTES};

/// Coreモジュールのエラー型
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// タグブロックが上限を超えた
    #[error("タグブロックのサイズが上限を超えました: {size} > {max} バイト")]
    TagsTooLarge {
        /// エンコード後のサイズ
        size: usize,
        /// 上限値
        max: usize,
    },
    /// 固定長フィールドの長さが不正
    #[error("{field} の長さが不正です: 期待値 {expected}バイト, 実際 {actual}バイト")]
    InvalidFieldLength {
        /// フィールド名
        field: &'static str,
        /// 期待される長さ
        expected: usize,
        /// 実際の長さ
        actual: usize,
    },
    /// パース中にバイト列が途切れた
    #[error("{field} の読み取り中に終端に達しました: 必要 {needed}バイト, 残り {remaining}バイト")]
    Truncated {
        /// フィールド名
        field: &'static str,
        /// 必要なバイト数
        needed: usize,
        /// 残りのバイト数
        remaining: usize,
    },
    /// バイト列の構造が不正
    #[error("データアイテムの形式が不正です: {0}")]
    Malformed(String),
    /// タグブロックのデコード失敗
    #[error("タグブロックのデコードに失敗しました: {0}")]
    InvalidTagEncoding(String),
    /// 署名済みのアイテムへの再署名
    #[error("データアイテムは既に署名済みです")]
    AlreadySigned,
    /// 未署名のアイテムに対するID取得・検証
    #[error("データアイテムが署名されていません")]
    NotSigned,
    /// 署名者とアイテムの不一致
    #[error("署名者がデータアイテムと一致しません: {0}")]
    SignerMismatch(String),
    /// 暗号処理エラー
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
