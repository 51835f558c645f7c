// 测试用传输实现：记录请求，按顺序返回预设响应

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{MultipartField, Transport};
use crate::core::{SdkError, SdkResult};

/// 记录下来的请求
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: RecordedBody,
}

#[derive(Debug, Clone)]
pub(crate) enum RecordedBody {
    Empty,
    Xml(String),
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart(Vec<MultipartField>),
}

#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<SdkResult<Vec<u8>>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预设一个成功响应
    pub fn respond(self, body: &str) -> Self {
        self.push(Ok(body.as_bytes().to_vec()));
        self
    }

    /// 预设一个传输失败
    pub fn fail(self, message: &str) -> Self {
        self.push(Err(SdkError::TransportError(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, response: SdkResult<Vec<u8>>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    fn record(&self, method: &'static str, url: &str, body: RecordedBody) -> SdkResult<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                method,
                url: url.to_string(),
                body,
            });
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| Err(SdkError::TransportError("no mock response".to_string())))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_xml(&self, url: &str, body: String) -> SdkResult<Vec<u8>> {
        self.record("POST", url, RecordedBody::Xml(body))
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> SdkResult<Vec<u8>> {
        self.record("POST", url, RecordedBody::Json(body.clone()))
    }

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> SdkResult<Vec<u8>> {
        self.record("POST", url, RecordedBody::Form(form.to_vec()))
    }

    async fn post_multipart(&self, url: &str, fields: Vec<MultipartField>) -> SdkResult<Vec<u8>> {
        self.record("POST", url, RecordedBody::Multipart(fields))
    }

    async fn get(&self, url: &str) -> SdkResult<Vec<u8>> {
        self.record("GET", url, RecordedBody::Empty)
    }
}
