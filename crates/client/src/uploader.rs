//! # バンドルノードへのアップロード
//!
//! 1回のアップロードは以下を一直線に実行し、どこで失敗してもその時点でエラーを返す。
//! 内部でのリトライや部分成功の状態はない。
//!
//! ```text
//! BUILD → HASH → SIGN → FINALIZE → SEND → PARSE → DONE
//! ```
//!
//! SEND以降のノードとの通信は [`NodeClient`] が行う。

use std::sync::Arc;

use arbundle_core::{DataItem, DataItemOptions};
use arbundle_crypto::{base58_encode, BundleSigner};
use arbundle_types::{Tag, UploadResult, CONTENT_TYPE_TAG};
use num_bigint::BigUint;

use crate::config::{gateway_uri_builder, GatewayUriBuilder, UploaderConfig};
use crate::content_type::content_type_for;
use crate::error::UploadError;
use crate::node::NodeClient;
use crate::receipt::{resolve_transaction_id, IdSource};
use crate::transport::HttpTransport;

/// バンドルノードへのアップロードクライアント。
///
/// 呼び出し間で共有する可変状態はなく、複数のアップロードを並行に実行できる。
pub struct BundleUploader {
    node: NodeClient,
    signer: Arc<dyn BundleSigner>,
    gateway_uri: GatewayUriBuilder,
}

impl BundleUploader {
    /// reqwestトランスポートと `{gateway_url}/{id}` 形式のURI生成で構築する。
    pub fn new(config: UploaderConfig, signer: Arc<dyn BundleSigner>) -> Self {
        let gateway_uri = gateway_uri_builder(&config.gateway_url);
        Self {
            node: NodeClient::new(config),
            signer,
            gateway_uri,
        }
    }

    /// HTTPトランスポートを差し替える。
    pub fn with_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.node = self.node.with_transport(transport);
        self
    }

    /// ゲートウェイURIの生成関数を差し替える。
    pub fn with_gateway_uri(
        mut self,
        builder: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.gateway_uri = Arc::new(builder);
        self
    }

    /// 設定
    pub fn config(&self) -> &UploaderConfig {
        self.node.config()
    }

    /// ノードクライアント
    pub fn node(&self) -> &NodeClient {
        &self.node
    }

    /// Base58エンコードされた署名者の公開鍵（残高照会のアドレス）
    pub fn address(&self) -> String {
        base58_encode(&self.signer.public_key())
    }

    /// BUILD〜FINALIZE: 署名済みのデータアイテムを作る。ネットワークには触れない。
    pub fn build_signed_item(
        &self,
        payload: &[u8],
        tags: &[Tag],
    ) -> Result<DataItem, UploadError> {
        // BUILD
        if payload.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        let options = DataItemOptions {
            tags: tags.to_vec(),
            max_tags_bytes: self.config().max_tags_bytes,
            ..Default::default()
        };
        let mut item = DataItem::for_signer(payload, self.signer.as_ref(), &options)?;
        tracing::debug!(bytes = item.len(), tags = tags.len(), "未署名のデータアイテムを構築");

        // HASH
        let message = item.signature_data();

        // SIGN
        let signature = self.signer.sign(&message)?;

        // FINALIZE
        item.set_signature(&signature)?;
        item.verify()?;
        tracing::debug!(data_item_id = %item.id()?, "データアイテムに署名");

        Ok(item)
    }

    /// ペイロードに署名してノードへ送信し、トランザクションIDと公開URIを返す。
    ///
    /// `Content-Type` タグが無い場合はファイル名から推定したものを追加する。
    pub async fn upload(
        &self,
        payload: &[u8],
        tags: Vec<Tag>,
        file_name: &str,
    ) -> Result<UploadResult, UploadError> {
        let (content_type, tags) = with_content_type(tags, file_name);
        let item = self.build_signed_item(payload, &tags)?;
        let local_id = item.id()?;

        // SEND
        tracing::info!(
            data_item_id = %local_id,
            bytes = item.len(),
            file_name,
            "データアイテムを送信"
        );
        let response = self.node.post_item(item.into_bytes()).await?;

        // PARSE
        let resolved = resolve_transaction_id(&response.body, &local_id);
        match resolved.source {
            IdSource::Receipt | IdSource::NodeId | IdSource::NestedDataId | IdSource::PlainText
                if resolved.transaction_id != local_id =>
            {
                tracing::warn!(
                    data_item_id = %local_id,
                    transaction_id = %resolved.transaction_id,
                    source = ?resolved.source,
                    "ノードが返したIDがローカルIDと異なります"
                );
            }
            IdSource::Local => {
                tracing::warn!(
                    data_item_id = %local_id,
                    "レシートを解釈できないためローカルIDを使用します"
                );
            }
            _ => {}
        }

        let uri = (self.gateway_uri)(&resolved.transaction_id);
        tracing::info!(
            transaction_id = %resolved.transaction_id,
            uri = %uri,
            "アップロード完了"
        );

        Ok(UploadResult {
            file_name: file_name.to_string(),
            content_type,
            transaction_id: resolved.transaction_id,
            uri,
            receipt: resolved.receipt,
        })
    }

    /// 指定バイト数の保存価格（通貨の最小単位）を取得する。
    pub async fn get_price(&self, byte_length: u64) -> Result<BigUint, UploadError> {
        self.node.get_price(byte_length).await
    }

    /// 署名者アドレスの残高（通貨の最小単位）を取得する。
    pub async fn get_balance(&self) -> Result<BigUint, UploadError> {
        self.node.get_balance(&self.address()).await
    }
}

/// `Content-Type` タグを解決し、無ければファイル名から推定して末尾に追加する。
fn with_content_type(mut tags: Vec<Tag>, file_name: &str) -> (String, Vec<Tag>) {
    if let Some(tag) = tags
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(CONTENT_TYPE_TAG))
    {
        return (tag.value.clone(), tags);
    }
    let content_type = content_type_for(file_name).to_string();
    tags.push(Tag::new(CONTENT_TYPE_TAG, content_type.clone()));
    (content_type, tags)
}
