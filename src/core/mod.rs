// Core module - errors, merchant configuration and endpoint table
// 核心模块：错误类型、商户配置、接口地址

mod error_codes;
pub use error_codes::{ErrorCodeTable, DEFAULT_ERROR_CODES};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sign::SignType;

/// SDK errors
///
/// 错误分为四层：传输失败、响应无法解析、协议层失败（return_code）、业务层失败（result_code）
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Decode error: {reason}")]
    DecodeError {
        reason: String,
        /// 原始响应体，便于排查
        raw_body: Vec<u8>,
    },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Business error: [{code}] {message}")]
    BusinessError { code: String, message: String },

    #[error("Unsupported field type for `{field}`: {type_name}")]
    UnsupportedFieldType {
        field: String,
        type_name: &'static str,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Signature mismatch")]
    SignatureMismatch,
}

impl SdkError {
    /// 构造解析错误，保留原始响应体
    pub fn decode(reason: impl Into<String>, raw_body: &[u8]) -> Self {
        SdkError::DecodeError {
            reason: reason.into(),
            raw_body: raw_body.to_vec(),
        }
    }

    /// 原始响应体的文本形式（仅 DecodeError 有）
    pub fn raw_body_lossy(&self) -> Option<String> {
        match self {
            SdkError::DecodeError { raw_body, .. } => {
                Some(String::from_utf8_lossy(raw_body).into_owned())
            }
            _ => None,
        }
    }

    /// 是否为业务层失败（调用方通常可以处理，例如余额不足）
    pub fn is_business(&self) -> bool {
        matches!(self, SdkError::BusinessError { .. })
    }
}

impl std::convert::From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        SdkError::TransportError(e.to_string())
    }
}

impl std::convert::From<url::ParseError> for SdkError {
    fn from(e: url::ParseError) -> Self {
        SdkError::ConfigError(format!("invalid url: {}", e))
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

/// Merchant identity and credentials
/// 商户配置（只读，进程内共享，显式传入各客户端）
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantConfig {
    /// 应用 AppID
    pub app_id: String,
    /// 商户号
    pub mch_id: String,
    /// 支付密钥（签名用）
    pub pay_key: String,
    /// 支付结果通知地址
    pub notify_url: String,
    /// 操作员账号（企业付款用）
    pub op_user_id: String,
    /// 操作员密码（MD5 后的值，企业付款用）
    pub op_user_passwd: String,
    /// 商户证书 PEM
    pub cert_pem: String,
    /// 商户证书私钥 PEM
    pub key_pem: String,
    /// 签名算法
    pub sign_type: SignType,
}

impl std::fmt::Debug for MerchantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchantConfig")
            .field("app_id", &self.app_id)
            .field("mch_id", &self.mch_id)
            .field("notify_url", &self.notify_url)
            .field("op_user_id", &self.op_user_id)
            .field("sign_type", &self.sign_type)
            .finish_non_exhaustive()
    }
}

impl MerchantConfig {
    /// 从JSON字符串解析商户配置
    ///
    /// # 参数
    ///
    /// * `json` - JSON格式的配置
    ///
    /// # 返回
    ///
    /// 解析后的 `MerchantConfig`
    pub fn from_json(json: &str) -> SdkResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SdkError::ConfigError(format!("解析商户配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验签名所需的基础字段
    pub fn validate(&self) -> SdkResult<()> {
        if self.mch_id.is_empty() {
            return Err(SdkError::ConfigError("mch_id 不能为空".to_string()));
        }
        if self.pay_key.is_empty() {
            return Err(SdkError::ConfigError("pay_key 不能为空".to_string()));
        }
        Ok(())
    }

    /// 校验双向TLS所需的证书材料（企业付款、发红包）
    pub fn validate_for_transfer(&self) -> SdkResult<()> {
        self.validate()?;
        if self.cert_pem.is_empty() || self.key_pem.is_empty() {
            return Err(SdkError::ConfigError(
                "企业付款/红包需要商户证书和私钥".to_string(),
            ));
        }
        Ok(())
    }
}

/// API endpoint table
/// 接口地址表，默认指向正式环境
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// 统一下单
    pub unified_order: String,
    /// 企业付款到余额
    pub mch_transfer: String,
    /// 现金红包
    pub send_red: String,
    /// 图片内容安全
    pub img_sec_check: String,
    /// 文本内容安全
    pub msg_sec_check: String,
    /// 异步多媒体内容安全
    pub media_check_async: String,
    /// 回调IP列表
    pub callback_ip: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            unified_order: "https://qpay.qq.com/cgi-bin/pay/qpay_unified_order.cgi".to_string(),
            mch_transfer: "https://api.qpay.qq.com/cgi-bin/epay/qpay_epay_b2c.cgi".to_string(),
            send_red: "https://api.qpay.qq.com/cgi-bin/hongbao/qpay_hb_mch_send.cgi".to_string(),
            img_sec_check: "https://api.q.qq.com/api/json/security/ImgSecCheck".to_string(),
            msg_sec_check: "https://api.q.qq.com/api/json/security/MsgSecCheck".to_string(),
            media_check_async: "https://api.q.qq.com/api/json/security/MediaCheckAsync".to_string(),
            callback_ip: "https://api.weixin.qq.com/cgi-bin/getcallbackip".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merchant_config_from_json() {
        let json = r#"{
            "app_id": "1104",
            "mch_id": "M1",
            "pay_key": "K1",
            "notify_url": "https://example.com/notify"
        }"#;

        let config = MerchantConfig::from_json(json).unwrap();
        assert_eq!(config.app_id, "1104");
        assert_eq!(config.mch_id, "M1");
        assert_eq!(config.sign_type, SignType::Md5);
        assert!(config.op_user_id.is_empty());
    }

    #[test]
    fn test_merchant_config_requires_key() {
        let err = MerchantConfig::from_json(r#"{"mch_id": "M1"}"#).unwrap_err();
        assert!(matches!(err, SdkError::ConfigError(_)));
    }

    #[test]
    fn test_transfer_requires_certificate() {
        let config = MerchantConfig {
            mch_id: "M1".to_string(),
            pay_key: "K1".to_string(),
            ..Default::default()
        };
        assert!(config.validate_for_transfer().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = MerchantConfig {
            mch_id: "M1".to_string(),
            pay_key: "super-secret".to_string(),
            ..Default::default()
        };
        let text = format!("{:?}", config);
        assert!(!text.contains("super-secret"));
    }

    #[test]
    fn test_decode_error_keeps_raw_body() {
        let err = SdkError::decode("bad xml", b"<xml><oops");
        assert_eq!(err.raw_body_lossy().as_deref(), Some("<xml><oops"));
        assert!(!err.is_business());
    }
}
