// 签名摘要算法
//
// 默认 MD5；远端同样支持 HMAC-SHA256（以商户密钥为 HMAC 密钥）
// 两者都输出大写十六进制

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::core::{SdkError, SdkResult};

/// 签名类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignType {
    #[default]
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "HMAC-SHA256")]
    HmacSha256,
}

impl SignType {
    /// 接口中 sign_type / signType 字段的取值
    pub fn as_str(&self) -> &'static str {
        match self {
            SignType::Md5 => "MD5",
            SignType::HmacSha256 => "HMAC-SHA256",
        }
    }

    /// 计算摘要
    ///
    /// # 参数
    ///
    /// * `canonical` - 规范串（已包含 `&key=`）
    /// * `secret_key` - 商户密钥，仅 HMAC 使用
    ///
    /// # 返回
    ///
    /// 大写十六进制签名
    pub fn digest(&self, canonical: &str, secret_key: &str) -> SdkResult<String> {
        match self {
            SignType::Md5 => Ok(format!("{:X}", md5::compute(canonical.as_bytes()))),
            SignType::HmacSha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(secret_key.as_bytes())
                    .map_err(|e| SdkError::ConfigError(format!("HMAC错误: {}", e)))?;
                mac.update(canonical.as_bytes());
                Ok(hex::encode_upper(mac.finalize().into_bytes()))
            }
        }
    }
}

impl std::fmt::Display for SignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
