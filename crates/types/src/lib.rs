//! # arbundle 共有型定義
//!
//! データアイテムのアップロードで使用するデータ構造をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - Base58: Solanaアドレス、公開鍵（人間が読みやすく、紛らわしい文字を除外）
//! - Base64-URL（パディングなし）: データアイテムID、署名等のバイナリデータ

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// タグ
// ---------------------------------------------------------------------------

/// データアイテムに付与する名前/値のペア。
/// ストレージネットワーク上のインデックスに使用される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// タグ名（UTF-8）
    pub name: String,
    /// タグ値（UTF-8）
    pub value: String,
}

impl Tag {
    /// 新しいタグを作成する。
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// ゲートウェイがコンテンツを配信する際に参照するタグ名。
pub const CONTENT_TYPE_TAG: &str = "Content-Type";

// ---------------------------------------------------------------------------
// アップロード結果
// ---------------------------------------------------------------------------

/// ノードが受理時に返す署名付きレシート。
/// 全フィールドが欠落し得るため、全てOptionalとして扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    /// 受理されたデータアイテムのID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// レシートに署名したノードの公開鍵
    #[serde(default, rename = "public", skip_serializing_if = "Option::is_none")]
    pub signer_public_key: Option<String>,
    /// ノードによる署名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// このブロック高までにネットワークへ投入されることの保証
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_height: Option<u64>,
    /// 受理時刻（UNIXミリ秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// レシート形式のバージョン
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// バリデータ署名の一覧
    #[serde(default)]
    pub validator_signatures: Vec<ValidatorSignature>,
}

impl UploadReceipt {
    /// レシートとして扱うのに必要なフィールド（id, public, signature）が揃っているか。
    pub fn is_complete(&self) -> bool {
        self.id.as_deref().is_some_and(|s| !s.is_empty())
            && self.signer_public_key.is_some()
            && self.signature.is_some()
    }
}

/// バリデータによるレシートへの署名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSignature {
    /// バリデータのアドレス
    #[serde(default)]
    pub address: String,
    /// 署名
    #[serde(default)]
    pub signature: String,
}

/// アップロード1件の結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// 呼び出し元が指定したファイル名
    pub file_name: String,
    /// コンテンツのMIMEタイプ
    pub content_type: String,
    /// 確定したトランザクションID（レシート → ノードID → ローカルIDの順で解決）
    pub transaction_id: String,
    /// ゲートウェイ経由の公開URI
    pub uri: String,
    /// ノードのレシート（パースできた場合のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<UploadReceipt>,
}

// ---------------------------------------------------------------------------
// 照会API
// ---------------------------------------------------------------------------

/// `GET /account/balance/{currency}` のレスポンス。
/// `balance` は10進数文字列だが、数値で返すノードもあるため両方を受け付ける。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// 最小通貨単位での残高
    pub balance: serde_json::Value,
}
