//! reqwestによる [`HttpTransport`] 実装。

use super::{HttpResponse, HttpTransport};
use crate::error::UploadError;

/// reqwestによるHTTPトランスポート。
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// デフォルト設定のクライアントで構築する。
    pub fn new() -> Self {
        Self::default()
    }

    /// タイムアウト等を設定済みのクライアントで構築する。
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

async fn read_response(
    url: &str,
    result: Result<reqwest::Response, reqwest::Error>,
) -> Result<HttpResponse, UploadError> {
    let resp = result.map_err(|e| UploadError::Http(format!("{url}: {e}")))?;
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| UploadError::Http(format!("レスポンスボディの読み取りに失敗 ({url}): {e}")))?
        .to_vec();
    Ok(HttpResponse {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<HttpResponse, UploadError> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        read_response(url, request.send().await).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, UploadError> {
        read_response(url, self.client.get(url).send().await).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// テスト用モックHTTPサーバーを起動する。
    async fn start_mock_server(app: axum::Router) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        port
    }

    /// POSTでボディとヘッダがそのまま届き、ステータスと理由句が返ることを確認
    #[tokio::test]
    async fn test_post_raw_bytes() {
        use axum::http::{HeaderMap, StatusCode};

        let app = axum::Router::new().route(
            "/echo",
            axum::routing::post(|headers: HeaderMap, body: axum::body::Bytes| async move {
                assert_eq!(headers["content-type"], "application/octet-stream");
                assert_eq!(headers["accept"], "application/json");
                (StatusCode::ACCEPTED, body)
            }),
        );
        let port = start_mock_server(app).await;

        let transport = ReqwestTransport::new();
        let response = transport
            .post(
                &format!("http://127.0.0.1:{port}/echo"),
                &[
                    ("Content-Type", "application/octet-stream"),
                    ("Accept", "application/json"),
                ],
                vec![0, 1, 2, 255],
            )
            .await
            .unwrap();

        assert_eq!(response.status, 202);
        assert_eq!(response.reason, "Accepted");
        assert_eq!(response.body, vec![0, 1, 2, 255]);
    }

    /// GETで非2xxでもレスポンスが返り、エラー化は呼び出し側で行うことを確認
    #[tokio::test]
    async fn test_get_non_success() {
        use axum::http::StatusCode;

        let app = axum::Router::new().route(
            "/missing",
            axum::routing::get(|| async { (StatusCode::NOT_FOUND, "no such account") }),
        );
        let port = start_mock_server(app).await;

        let response = ReqwestTransport::new()
            .get(&format!("http://127.0.0.1:{port}/missing"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body_text(), "no such account");
        assert!(response.error_for_status().is_err());
    }

    /// 接続失敗はHttpエラーになることを確認
    #[tokio::test]
    async fn test_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = ReqwestTransport::new()
            .get(&format!("http://127.0.0.1:{port}/"))
            .await;
        assert!(matches!(result, Err(UploadError::Http(_))));
    }
}
