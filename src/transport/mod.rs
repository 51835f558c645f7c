// Transport module
// 传输层
//
// 签名与信封逻辑只依赖 Transport trait；
// 默认实现 HttpTransport 基于 reqwest，可选双向TLS（企业付款、红包）

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::core::SdkResult;

/// multipart 表单字段
#[derive(Debug, Clone)]
pub struct MultipartField {
    pub name: String,
    /// 有文件名时作为文件上传
    pub filename: Option<String>,
    pub value: Vec<u8>,
}

impl MultipartField {
    /// 文件字段
    pub fn file(name: impl Into<String>, filename: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            value,
        }
    }

    /// 普通文本字段
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            value: value.into().into_bytes(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// HTTP 传输接口
///
/// 所有方法返回原始响应体；网络或TLS失败返回 `TransportError`，不做重试
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST XML 文档
    async fn post_xml(&self, url: &str, body: String) -> SdkResult<Vec<u8>>;

    /// POST JSON
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> SdkResult<Vec<u8>>;

    /// POST application/x-www-form-urlencoded
    async fn post_form(&self, url: &str, form: &[(String, String)]) -> SdkResult<Vec<u8>>;

    /// POST multipart/form-data
    async fn post_multipart(&self, url: &str, fields: Vec<MultipartField>) -> SdkResult<Vec<u8>>;

    /// GET
    async fn get(&self, url: &str) -> SdkResult<Vec<u8>>;
}

/// 日志中去掉查询串（可能包含 access_token）
pub(crate) fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_field_kinds() {
        let file = MultipartField::file("media", "a.png", vec![1, 2, 3]);
        assert!(file.is_file());
        let text = MultipartField::text("appid", "1104");
        assert!(!text.is_file());
        assert_eq!(text.value, b"1104");
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://api.q.qq.com/x?access_token=secret"),
            "https://api.q.qq.com/x"
        );
        assert_eq!(redact_url("https://a.b/c"), "https://a.b/c");
    }
}
