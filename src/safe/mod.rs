//! 内容安全模块
//!
//! 小程序内容安全接口（图片、文本、异步多媒体）和回调IP查询。
//! 所有接口都以 access_token 作为查询参数，响应为 errcode/errmsg 形式的JSON，
//! errcode 非 0 时返回 `BusinessError`。

mod token;

pub use token::{AccessTokenProvider, StaticAccessToken};

use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use url::Url;

use crate::core::{Endpoints, ErrorCodeTable, SdkResult, DEFAULT_ERROR_CODES};
use crate::pay::ResponseEnvelope;
use crate::transport::{redact_url, HttpTransport, MultipartField, Transport};

#[derive(Debug, Default, Deserialize)]
struct IpList {
    #[serde(default)]
    ip_list: Vec<String>,
}

/// 内容安全客户端
#[derive(Clone)]
pub struct Safe {
    app_id: String,
    endpoints: Endpoints,
    transport: Arc<dyn Transport>,
    token: Arc<dyn AccessTokenProvider>,
    error_codes: ErrorCodeTable,
}

impl std::fmt::Debug for Safe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Safe")
            .field("app_id", &self.app_id)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl Safe {
    pub fn new(app_id: impl Into<String>, token: Arc<dyn AccessTokenProvider>) -> SdkResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);
        Ok(Self::with_transport(app_id, token, transport))
    }

    pub fn with_transport(
        app_id: impl Into<String>,
        token: Arc<dyn AccessTokenProvider>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            endpoints: Endpoints::default(),
            transport,
            token,
            error_codes: (*DEFAULT_ERROR_CODES).clone(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_error_codes(mut self, error_codes: ErrorCodeTable) -> Self {
        self.error_codes = error_codes;
        self
    }

    /// 图片内容检测
    ///
    /// # 参数
    ///
    /// * `filename` - 文件名
    /// * `bytes` - 图片内容
    pub async fn img_sec_check(&self, filename: &str, bytes: Vec<u8>) -> SdkResult<()> {
        let url = self.signed_url(&self.endpoints.img_sec_check).await?;
        let fields = vec![
            MultipartField::file("media", filename, bytes),
            MultipartField::text("appid", self.app_id.as_str()),
        ];
        let raw = self.transport.post_multipart(&url, fields).await?;
        self.classify::<IgnoredAny>("ImgSecCheck", &url, &raw)?;
        Ok(())
    }

    /// 文本内容检测
    pub async fn msg_sec_check(&self, content: &str) -> SdkResult<()> {
        let url = self.signed_url(&self.endpoints.msg_sec_check).await?;
        let body = serde_json::json!({
            "appid": self.app_id,
            "content": content,
        });
        let raw = self.transport.post_json(&url, &body).await?;
        self.classify::<IgnoredAny>("MsgSecCheck", &url, &raw)?;
        Ok(())
    }

    /// 异步多媒体检测，结果由平台异步推送
    ///
    /// # 参数
    ///
    /// * `media_url` - 媒体地址
    /// * `media_type` - 媒体类型
    pub async fn media_check_async(&self, media_url: &str, media_type: &str) -> SdkResult<()> {
        let url = self.signed_url(&self.endpoints.media_check_async).await?;
        let body = serde_json::json!({
            "appid": self.app_id,
            "media_url": media_url,
            "media_type": media_type,
        });
        let raw = self.transport.post_json(&url, &body).await?;
        self.classify::<IgnoredAny>("MediaCheckAsync", &url, &raw)?;
        Ok(())
    }

    /// 回调服务器IP列表
    pub async fn callback_ip(&self) -> SdkResult<Vec<String>> {
        let url = self.signed_url(&self.endpoints.callback_ip).await?;
        let raw = self.transport.get(&url).await?;
        let list = self.classify::<IpList>("GetCallbackIp", &url, &raw)?;
        Ok(list.ip_list)
    }

    async fn signed_url(&self, base: &str) -> SdkResult<String> {
        let token = self.token.access_token().await?;
        let url = Url::parse_with_params(base, &[("access_token", token.as_str())])?;
        Ok(url.to_string())
    }

    fn classify<P: DeserializeOwned>(&self, api: &str, url: &str, raw: &[u8]) -> SdkResult<P> {
        tracing::debug!("[Safe] {} 响应: {}", api, String::from_utf8_lossy(raw));
        let result = ResponseEnvelope::<P>::from_errcode_json(raw)
            .and_then(|envelope| envelope.into_result(&self.error_codes));
        if let Err(e) = &result {
            tracing::warn!("[Safe] {} 失败: {}, {}", api, redact_url(url), e);
        }
        result
    }
}
