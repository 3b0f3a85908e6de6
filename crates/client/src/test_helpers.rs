//! テスト用のHTTPトランスポート。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::UploadError;
use crate::transport::{HttpResponse, HttpTransport};

/// 送信されたリクエストの記録
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// 用意したレスポンスを順に返し、リクエストを記録するモックトランスポート。
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn respond(&self, status: u16, reason: &str, body: &[u8]) -> &Self {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            reason: reason.to_string(),
            body: body.to_vec(),
        });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<HttpResponse, UploadError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| UploadError::Http("レスポンスが用意されていません".to_string()))
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<HttpResponse, UploadError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        });
        self.next_response()
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, UploadError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        });
        self.next_response()
    }
}
