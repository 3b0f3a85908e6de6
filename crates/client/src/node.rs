//! # バンドルノードAPI
//!
//! 署名鍵を必要としないノードへの要求。価格照会・残高照会・データアイテムの送信を行う。
//!
//! - `POST {node}/tx/{currency}`: データアイテムの生バイト列
//! - `GET {node}/price/{currency}/{bytes}`: 10進整数のテキスト
//! - `GET {node}/account/balance/{currency}?address={base58}`: `{"balance": "..."}`

use arbundle_types::BalanceResponse;
use num_bigint::BigUint;

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport};

/// データアイテムのContent-Type
const OCTET_STREAM: &str = "application/octet-stream";

/// バンドルノードのHTTPクライアント。
pub struct NodeClient {
    config: UploaderConfig,
    transport: Box<dyn HttpTransport>,
}

impl NodeClient {
    /// reqwestトランスポートで構築する。
    pub fn new(config: UploaderConfig) -> Self {
        Self {
            config,
            transport: Box::new(ReqwestTransport::new()),
        }
    }

    /// HTTPトランスポートを差し替える。
    pub fn with_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    /// 設定
    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// 署名済みデータアイテムの生バイト列を送信する。非2xxは通信エラーになる。
    pub async fn post_item(&self, item: Vec<u8>) -> Result<HttpResponse, UploadError> {
        let url = format!("{}/tx/{}", self.config.node_base(), self.config.currency);
        self.transport
            .post(
                &url,
                &[("Content-Type", OCTET_STREAM), ("Accept", "application/json")],
                item,
            )
            .await?
            .error_for_status()
    }

    /// 指定バイト数の保存価格（通貨の最小単位）を取得する。
    pub async fn get_price(&self, byte_length: u64) -> Result<BigUint, UploadError> {
        let url = format!(
            "{}/price/{}/{byte_length}",
            self.config.node_base(),
            self.config.currency
        );
        let response = self.transport.get(&url).await?.error_for_status()?;
        let text = response.body_text();
        parse_integer(text.trim(), "価格")
    }

    /// Base58アドレスの残高（通貨の最小単位）を取得する。
    pub async fn get_balance(&self, address: &str) -> Result<BigUint, UploadError> {
        let url = format!(
            "{}/account/balance/{}?address={address}",
            self.config.node_base(),
            self.config.currency,
        );
        let response = self.transport.get(&url).await?.error_for_status()?;
        let parsed: BalanceResponse = serde_json::from_slice(&response.body).map_err(|e| {
            UploadError::InvalidResponse(format!("残高レスポンス ({}): {e}", response.body_text()))
        })?;
        match &parsed.balance {
            serde_json::Value::String(s) => parse_integer(s.trim(), "残高"),
            serde_json::Value::Number(n) => parse_integer(&n.to_string(), "残高"),
            other => Err(UploadError::InvalidResponse(format!(
                "残高が数値ではありません: {other}"
            ))),
        }
    }
}

/// 10進整数をパースする。ASCII数字以外（符号・区切り文字を含む）は拒否する。
fn parse_integer(s: &str, what: &str) -> Result<BigUint, UploadError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UploadError::InvalidResponse(format!(
            "{what}が10進整数ではありません: {s:?}"
        )));
    }
    BigUint::parse_bytes(s.as_bytes(), 10).ok_or_else(|| {
        UploadError::InvalidResponse(format!("{what}が10進整数ではありません: {s:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockTransport;

    fn test_node(transport: &MockTransport) -> NodeClient {
        let config = UploaderConfig {
            node_url: "http://node.test/".to_string(),
            ..Default::default()
        };
        NodeClient::new(config).with_transport(transport.clone())
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("0", "価格").unwrap(), BigUint::from(0u32));
        assert_eq!(
            parse_integer("340282366920938463463374607431768211456", "価格")
                .unwrap()
                .to_string(),
            "340282366920938463463374607431768211456"
        );
        for malformed in ["", "1_000", "+5", "-5", "12 34", "0x10", "1.5", "１２"] {
            assert!(
                matches!(parse_integer(malformed, "価格"), Err(UploadError::InvalidResponse(_))),
                "{malformed:?}"
            );
        }
    }

    /// 64ビットを超える価格がパースできることを確認
    #[tokio::test]
    async fn test_get_price() {
        let transport = MockTransport::default();
        transport.respond(200, "OK", b"123456789012345678901234567890\n");
        let node = test_node(&transport);

        let price = node.get_price(1024).await.unwrap();
        assert_eq!(price.to_string(), "123456789012345678901234567890");
        assert_eq!(transport.requests()[0].url, "http://node.test/price/solana/1024");
    }

    /// 価格照会のエラー系
    #[tokio::test]
    async fn test_get_price_errors() {
        let transport = MockTransport::default();
        transport
            .respond(500, "Internal Server Error", b"boom")
            .respond(200, "OK", b"not a number")
            .respond(200, "OK", b"1_000");
        let node = test_node(&transport);

        assert!(matches!(
            node.get_price(1).await,
            Err(UploadError::Transport { status: 500, .. })
        ));
        assert!(matches!(node.get_price(1).await, Err(UploadError::InvalidResponse(_))));
        assert!(matches!(node.get_price(1).await, Err(UploadError::InvalidResponse(_))));
    }

    /// 残高が文字列・数値の両方で受け付けられ、符号付きや非数値は拒否されることを確認
    #[tokio::test]
    async fn test_get_balance() {
        let transport = MockTransport::default();
        transport
            .respond(200, "OK", br#"{"balance":"42000000000"}"#)
            .respond(200, "OK", br#"{"balance":7}"#)
            .respond(200, "OK", br#"{"balance":"+5"}"#)
            .respond(200, "OK", br#"{"balance":null}"#);
        let node = test_node(&transport);

        assert_eq!(
            node.get_balance("addr").await.unwrap(),
            BigUint::from(42_000_000_000u64)
        );
        assert_eq!(node.get_balance("addr").await.unwrap(), BigUint::from(7u32));
        assert!(matches!(
            node.get_balance("addr").await,
            Err(UploadError::InvalidResponse(_))
        ));
        assert!(matches!(
            node.get_balance("addr").await,
            Err(UploadError::InvalidResponse(_))
        ));
        assert_eq!(
            transport.requests()[0].url,
            "http://node.test/account/balance/solana?address=addr"
        );
    }

    /// 送信がヘッダ付きの1回のPOSTであることを確認
    #[tokio::test]
    async fn test_post_item() {
        let transport = MockTransport::default();
        transport
            .respond(200, "OK", b"{}")
            .respond(413, "Payload Too Large", b"payload too large");
        let node = test_node(&transport);

        let response = node.post_item(vec![1, 2, 3]).await.unwrap();
        assert_eq!(response.body, b"{}");
        assert!(matches!(
            node.post_item(vec![4]).await,
            Err(UploadError::Transport { status: 413, .. })
        ));

        let requests = transport.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].url, "http://node.test/tx/solana");
        assert_eq!(requests[0].body, vec![1, 2, 3]);
        assert!(requests[0]
            .headers
            .contains(&("Content-Type".to_string(), "application/octet-stream".to_string())));
    }
}
