//! # アップロードクライアント設定
//!
//! 環境変数からの設定読み込みと、ゲートウェイURI生成関数の定義。

use std::sync::Arc;

use arbundle_core::DEFAULT_MAX_TAGS_BYTES;

use crate::error::UploadError;

/// デフォルトのバンドルノード
pub const DEFAULT_NODE_URL: &str = "https://node1.irys.xyz";
/// デフォルトの支払い通貨
pub const DEFAULT_CURRENCY: &str = "solana";
/// デフォルトの公開ゲートウェイ
pub const DEFAULT_GATEWAY_URL: &str = "https://arweave.net";

/// トランザクションIDから公開URIを生成する関数。
pub type GatewayUriBuilder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// `{gateway_url}/{transaction_id}` 形式のURIを生成する関数を作る。
pub fn gateway_uri_builder(gateway_url: &str) -> GatewayUriBuilder {
    let base = gateway_url.trim_end_matches('/').to_string();
    Arc::new(move |transaction_id: &str| format!("{base}/{transaction_id}"))
}

/// アップロードクライアントの設定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    /// バンドルノードのベースURL
    pub node_url: String,
    /// 支払い通貨の識別子（URLパスに使用）
    pub currency: String,
    /// タグブロックの上限（バイト）
    pub max_tags_bytes: usize,
    /// 公開ゲートウェイのベースURL
    pub gateway_url: String,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            max_tags_bytes: DEFAULT_MAX_TAGS_BYTES,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
        }
    }
}

impl UploaderConfig {
    /// 環境変数から構築する。未設定の項目はデフォルト値を使う。
    ///
    /// - `ARBUNDLE_NODE_URL`
    /// - `ARBUNDLE_CURRENCY`
    /// - `ARBUNDLE_MAX_TAGS_BYTES`
    /// - `ARBUNDLE_GATEWAY_URL`
    pub fn from_env() -> Result<Self, UploadError> {
        let node_url =
            std::env::var("ARBUNDLE_NODE_URL").unwrap_or_else(|_| DEFAULT_NODE_URL.to_string());
        let currency =
            std::env::var("ARBUNDLE_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());
        let gateway_url = std::env::var("ARBUNDLE_GATEWAY_URL")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());
        let max_tags_bytes = match std::env::var("ARBUNDLE_MAX_TAGS_BYTES") {
            Ok(v) => v.parse().map_err(|e| {
                UploadError::Config(format!("ARBUNDLE_MAX_TAGS_BYTESが不正です ({v}): {e}"))
            })?,
            Err(_) => DEFAULT_MAX_TAGS_BYTES,
        };

        Ok(Self {
            node_url,
            currency,
            max_tags_bytes,
            gateway_url,
        })
    }

    /// 末尾のスラッシュを除いたノードURL
    pub(crate) fn node_base(&self) -> &str {
        self.node_url.trim_end_matches('/')
    }
}
