//! # アップロードクライアントのエラー型
//!
//! - 検証エラー: 空ペイロード、タグ上限超過、フィールド長・鍵長の不正（通信前に検出）
//! - 通信エラー: 非2xxステータス（ステータス・理由・ボディをそのまま保持）
//! - エンコーディングエラー: Base58不正文字、固定長フィールドの過不足
//!
//! レシートのパース失敗はエラーにしない（HTTP層でアップロードは成功しているため）。

use arbundle_core::BundleError;
use arbundle_crypto::CryptoError;

/// アップロードクライアントのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// 空のペイロード
    #[error("ペイロードが空です")]
    EmptyPayload,
    /// データアイテムの構築・署名エラー
    #[error(transparent)]
    Bundle(#[from] BundleError),
    /// 鍵素材・エンコーディングのエラー
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// ノードが非2xxステータスを返した
    #[error("ノードがエラーを返しました: HTTP {status} {reason}: {body}")]
    Transport {
        /// HTTPステータスコード
        status: u16,
        /// ステータスの理由句
        reason: String,
        /// レスポンスボディ
        body: String,
    },
    /// HTTPリクエスト自体の失敗（接続・TLS等）
    #[error("HTTPリクエストに失敗: {0}")]
    Http(String),
    /// 照会APIのレスポンスが解釈できない
    #[error("レスポンスの形式が不正です: {0}")]
    InvalidResponse(String),
    /// 設定値が不正
    #[error("設定が不正です: {0}")]
    Config(String),
}
