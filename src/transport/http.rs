// reqwest 传输实现
// reqwest based transport
//
// reqwest::Client 内部带连接池，可跨任务并发复用

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::{redact_url, MultipartField, Transport};
use crate::core::{SdkError, SdkResult};

/// 默认请求超时
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP传输
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// 普通HTTPS客户端
    pub fn new() -> SdkResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// 指定超时的HTTPS客户端
    pub fn with_timeout(timeout: Duration) -> SdkResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;
        Ok(Self { client })
    }

    /// 双向TLS客户端
    ///
    /// # 参数
    ///
    /// * `cert_pem` - 商户证书 PEM
    /// * `key_pem` - 商户证书私钥 PEM
    pub fn with_identity(cert_pem: &[u8], key_pem: &[u8]) -> SdkResult<Self> {
        let mut pem = Vec::with_capacity(cert_pem.len() + key_pem.len() + 1);
        pem.extend_from_slice(cert_pem);
        pem.push(b'\n');
        pem.extend_from_slice(key_pem);

        let identity = reqwest::Identity::from_pem(&pem)
            .map_err(|e| SdkError::ConfigError(format!("加载商户证书失败: {}", e)))?;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SdkError::ConfigError(format!("创建TLS客户端失败: {}", e)))?;

        tracing::info!("[Transport] 已加载商户证书，启用双向TLS");
        Ok(Self { client })
    }

    /// 使用调用方已构建好的客户端
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn read_body(url: &str, response: reqwest::Response) -> SdkResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            tracing::error!("[Transport] {} 返回HTTP状态 {}", redact_url(url), status);
            return Err(SdkError::TransportError(format!(
                "http status {} from {}",
                status,
                redact_url(url)
            )));
        }
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_xml(&self, url: &str, body: String) -> SdkResult<Vec<u8>> {
        tracing::debug!("[Transport] POST XML {}", redact_url(url));
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(body)
            .send()
            .await?;
        Self::read_body(url, response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> SdkResult<Vec<u8>> {
        tracing::debug!("[Transport] POST JSON {}", redact_url(url));
        let response = self.client.post(url).json(body).send().await?;
        Self::read_body(url, response).await
    }

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> SdkResult<Vec<u8>> {
        tracing::debug!("[Transport] POST FORM {}", redact_url(url));
        let response = self.client.post(url).form(form).send().await?;
        Self::read_body(url, response).await
    }

    async fn post_multipart(&self, url: &str, fields: Vec<MultipartField>) -> SdkResult<Vec<u8>> {
        tracing::debug!("[Transport] POST MULTIPART {}", redact_url(url));
        let mut form = Form::new();
        for field in fields {
            let part = match field.filename {
                Some(filename) => Part::bytes(field.value).file_name(filename),
                None => Part::bytes(field.value),
            };
            form = form.part(field.name, part);
        }
        let response = self.client.post(url).multipart(form).send().await?;
        Self::read_body(url, response).await
    }

    async fn get(&self, url: &str) -> SdkResult<Vec<u8>> {
        tracing::debug!("[Transport] GET {}", redact_url(url));
        let response = self.client.get(url).send().await?;
        Self::read_body(url, response).await
    }
}
