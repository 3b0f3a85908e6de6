//! # HTTPトランスポート
//!
//! ノードへの生バイトPOSTと小さなテキスト/JSONのGETを抽象化する。
//! コネクションプール・TLS・タイムアウトは実装側の責務で、リトライは行わない。
//! reqwestによる実装は `reqwest_client` サブモジュールを参照。

mod reqwest_client;

pub use reqwest_client::ReqwestTransport;

use crate::error::UploadError;

/// HTTPレスポンス。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTPステータスコード
    pub status: u16,
    /// ステータスの理由句（例: "Payload Too Large"）
    pub reason: String,
    /// レスポンスボディ
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// 2xxか
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// ボディをUTF-8文字列として取得する（不正なバイトは置換）。
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// 非2xxの場合にステータス・理由・ボディを含む通信エラーに変換する。
    pub fn error_for_status(self) -> Result<Self, UploadError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(UploadError::Transport {
            status: self.status,
            reason: self.reason.clone(),
            body: self.body_text(),
        })
    }
}

/// HTTPトランスポートの抽象インターフェース。
///
/// 1回の呼び出しにつき1リクエストのみ送信する。
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// 生バイト列をPOSTする。
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<HttpResponse, UploadError>;

    /// GETする。
    async fn get(&self, url: &str) -> Result<HttpResponse, UploadError>;
}
