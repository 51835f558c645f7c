//! 支付模块
//!
//! 提供QQ钱包支付相关接口：
//!
//! - 统一下单（JSAPI / APP / 小程序），生成前端调起支付参数
//! - 企业付款到余额（双向TLS）
//! - 现金红包（双向TLS）
//! - 支付结果通知解析与应答
//!
//! 每个接口都是同一条流程：组装请求 → 签名 → 序列化 → 发送 → 解码 → 归类
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use qqchat_sdk::pay::{OrderParams, Pay};
//!
//! let pay = Pay::new(config)?;
//! let prepay_id = pay.prepay_id_by_app(&params).await?;
//! let app_params = pay.app_pay_params(&prepay_id)?;
//! ```

pub mod envelope;
mod notify;
mod order;
mod transfer;
pub mod types;
pub mod xml;

pub use envelope::ResponseEnvelope;
pub use types::*;

use std::sync::Arc;

use crate::core::{Endpoints, ErrorCodeTable, MerchantConfig, SdkResult, DEFAULT_ERROR_CODES};
use crate::sign::{Signable, SigningContext, TagScheme};
use crate::transport::{HttpTransport, Transport};

/// 支付客户端
///
/// 只持有不可变配置和传输句柄，可在多个任务间共享
#[derive(Clone)]
pub struct Pay {
    config: Arc<MerchantConfig>,
    endpoints: Endpoints,
    transport: Arc<dyn Transport>,
    /// 双向TLS传输，配置了商户证书时才有
    tls_transport: Option<Arc<dyn Transport>>,
    error_codes: ErrorCodeTable,
}

impl std::fmt::Debug for Pay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pay")
            .field("config", &self.config)
            .field("endpoints", &self.endpoints)
            .field("tls", &self.tls_transport.is_some())
            .finish()
    }
}

impl Pay {
    /// 创建支付客户端
    ///
    /// 配置了商户证书和私钥时同时创建双向TLS传输
    pub fn new(config: MerchantConfig) -> SdkResult<Self> {
        config.validate()?;

        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);
        let tls_transport: Option<Arc<dyn Transport>> =
            if config.cert_pem.is_empty() && config.key_pem.is_empty() {
                None
            } else {
                config.validate_for_transfer()?;
                Some(Arc::new(HttpTransport::with_identity(
                    config.cert_pem.as_bytes(),
                    config.key_pem.as_bytes(),
                )?))
            };

        tracing::info!(
            "[Pay] 创建支付客户端: mch_id={}, tls={}",
            config.mch_id,
            tls_transport.is_some()
        );

        Ok(Self {
            config: Arc::new(config),
            endpoints: Endpoints::default(),
            transport,
            tls_transport,
            error_codes: (*DEFAULT_ERROR_CODES).clone(),
        })
    }

    /// 使用自定义传输（两类接口共用同一个传输）
    pub fn with_transport(config: MerchantConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            endpoints: Endpoints::default(),
            tls_transport: Some(transport.clone()),
            transport,
            error_codes: (*DEFAULT_ERROR_CODES).clone(),
        }
    }

    /// 替换双向TLS传输
    pub fn with_tls_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.tls_transport = Some(transport);
        self
    }

    /// 替换接口地址
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// 替换错误码表
    pub fn with_error_codes(mut self, error_codes: ErrorCodeTable) -> Self {
        self.error_codes = error_codes;
        self
    }

    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    /// 按XML字段名签名
    pub fn sign_xml<R: Signable + ?Sized>(&self, record: &R) -> SdkResult<String> {
        self.signer(TagScheme::Xml).sign(record)
    }

    /// 按JSON字段名签名
    pub fn sign_json<R: Signable + ?Sized>(&self, record: &R) -> SdkResult<String> {
        self.signer(TagScheme::Json).sign(record)
    }

    fn signer(&self, scheme: TagScheme) -> SigningContext<'_> {
        SigningContext::new(&self.config.pay_key, scheme).with_sign_type(self.config.sign_type)
    }

    fn tls(&self) -> SdkResult<&Arc<dyn Transport>> {
        self.tls_transport.as_ref().ok_or_else(|| {
            crate::core::SdkError::ConfigError("企业付款/红包需要商户证书和私钥".to_string())
        })
    }
}
