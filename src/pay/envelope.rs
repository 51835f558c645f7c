// 响应信封
// Response envelope
//
// 两层状态：
// - 外层（协议层）：return_code/return_msg，或 JSON 的 retcode/retmsg
// - 内层（业务层）：result_code/err_code/err_code_des，或 JSON 的 errcode/errmsg
//
// 外层失败 → ProtocolError；外层成功、内层失败 → BusinessError；都成功 → 负载

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::FromFields;
use crate::core::{ErrorCodeTable, SdkError, SdkResult};

const SUCCESS: &str = "SUCCESS";

/// 解码后的响应，只能被消费一次
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<P> {
    pub outer_ok: bool,
    pub outer_status: String,
    pub outer_message: String,
    pub inner_ok: bool,
    pub inner_status: String,
    pub err_code: String,
    pub err_message: String,
    pub payload: P,
    /// 原始响应体
    pub raw: Vec<u8>,
}

impl<P> ResponseEnvelope<P> {
    /// 归类为成功负载或错误
    pub fn into_result(self, codes: &ErrorCodeTable) -> SdkResult<P> {
        if !(self.outer_ok && self.inner_ok) {
            tracing::debug!("[Envelope] 原始响应: {}", String::from_utf8_lossy(&self.raw));
        }

        if !self.outer_ok {
            let message = if self.outer_message.is_empty() {
                codes.resolve(&self.outer_status, &self.outer_status)
            } else {
                self.outer_message
            };
            return Err(SdkError::ProtocolError { message });
        }

        if !self.inner_ok {
            let code = if self.err_code.is_empty() {
                self.inner_status
            } else {
                self.err_code
            };
            let message = codes.resolve(&code, &self.err_message);
            return Err(SdkError::BusinessError { code, message });
        }

        Ok(self.payload)
    }
}

impl<P: FromFields> ResponseEnvelope<P> {
    /// 从XML字段表构建
    ///
    /// 缺少 return_code 视为无法解析；外层成功但缺少 result_code 视为业务失败
    pub fn from_fields(fields: &IndexMap<String, String>, raw: &[u8]) -> SdkResult<Self> {
        let outer_status = fields
            .get("return_code")
            .map(|s| s.trim().to_string())
            .ok_or_else(|| SdkError::decode("响应缺少 return_code", raw))?;
        let inner_status = fields
            .get("result_code")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        Ok(Self {
            outer_ok: outer_status.eq_ignore_ascii_case(SUCCESS),
            outer_message: fields.get("return_msg").cloned().unwrap_or_default(),
            inner_ok: inner_status.eq_ignore_ascii_case(SUCCESS),
            err_code: fields.get("err_code").cloned().unwrap_or_default(),
            err_message: fields.get("err_code_des").cloned().unwrap_or_default(),
            payload: P::from_fields(fields),
            raw: raw.to_vec(),
            outer_status,
            inner_status,
        })
    }

    /// 解码XML响应体
    pub fn from_xml(raw: &[u8]) -> SdkResult<Self> {
        let fields = super::xml::decode(raw)?;
        Self::from_fields(&fields, raw)
    }
}

impl<P: DeserializeOwned> ResponseEnvelope<P> {
    /// retcode/retmsg 形式的JSON响应（红包）
    ///
    /// 只有协议层状态，retcode 为 0 表示成功
    pub fn from_retcode_json(raw: &[u8]) -> SdkResult<Self> {
        let value = parse_json(raw)?;
        let outer_status = value
            .get("retcode")
            .map(status_text)
            .ok_or_else(|| SdkError::decode("响应缺少 retcode", raw))?;
        let outer_message = value
            .get("retmsg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let payload = payload_from(value, raw)?;

        Ok(Self {
            outer_ok: outer_status == "0",
            outer_status,
            outer_message,
            inner_ok: true,
            inner_status: String::new(),
            err_code: String::new(),
            err_message: String::new(),
            payload,
            raw: raw.to_vec(),
        })
    }

    /// errcode/errmsg 形式的JSON响应（内容安全、回调IP）
    ///
    /// 能解析即视为协议层成功；errcode 缺省为 0，非 0 为业务失败
    pub fn from_errcode_json(raw: &[u8]) -> SdkResult<Self> {
        let value = parse_json(raw)?;
        let err_code = value
            .get("errcode")
            .or_else(|| value.get("errCode"))
            .map(status_text)
            .unwrap_or_else(|| "0".to_string());
        let err_message = value
            .get("errmsg")
            .or_else(|| value.get("errMsg"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let payload = payload_from(value, raw)?;

        Ok(Self {
            outer_ok: true,
            outer_status: String::new(),
            outer_message: String::new(),
            inner_ok: err_code == "0",
            inner_status: err_code.clone(),
            err_code,
            err_message,
            payload,
            raw: raw.to_vec(),
        })
    }
}

fn parse_json(raw: &[u8]) -> SdkResult<Value> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| SdkError::decode(format!("JSON解析失败: {}", e), raw))?;
    if !value.is_object() {
        return Err(SdkError::decode("响应不是JSON对象", raw));
    }
    Ok(value)
}

fn payload_from<P: DeserializeOwned>(value: Value, raw: &[u8]) -> SdkResult<P> {
    serde_json::from_value(value)
        .map_err(|e| SdkError::decode(format!("响应字段解析失败: {}", e), raw))
}

fn status_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_ERROR_CODES;
    use crate::pay::types::{PrepayOrder, RedEnvelopeResult};

    fn classify(raw: &str) -> SdkResult<PrepayOrder> {
        ResponseEnvelope::<PrepayOrder>::from_xml(raw.as_bytes())?.into_result(&DEFAULT_ERROR_CODES)
    }

    #[test]
    fn test_both_success_returns_payload() {
        let order = classify(
            "<xml><return_code>SUCCESS</return_code><result_code>SUCCESS</result_code><prepay_id>P1</prepay_id></xml>",
        )
        .unwrap();
        assert_eq!(order.prepay_id, "P1");
    }

    #[test]
    fn test_inner_failure_is_business_error() {
        let err = classify(
            "<xml><return_code>SUCCESS</return_code><result_code>FAIL</result_code><err_code>NOTENOUGH</err_code><err_code_des>balance</err_code_des></xml>",
        )
        .unwrap_err();
        match err {
            SdkError::BusinessError { code, message } => {
                assert_eq!(code, "NOTENOUGH");
                assert_eq!(Some(message.as_str()), DEFAULT_ERROR_CODES.message_for("NOTENOUGH"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_code_passes_remote_message() {
        let err = classify(
            "<xml><return_code>SUCCESS</return_code><result_code>FAIL</result_code><err_code>BRAND_NEW</err_code><err_code_des>remote says</err_code_des></xml>",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SdkError::BusinessError { ref message, .. } if message == "remote says"
        ));
    }

    #[test]
    fn test_outer_failure_is_protocol_error() {
        let err = classify("<xml><return_code>FAIL</return_code><return_msg>签名错误</return_msg></xml>")
            .unwrap_err();
        assert!(matches!(
            err,
            SdkError::ProtocolError { ref message } if message == "签名错误"
        ));
    }

    #[test]
    fn test_missing_result_code_is_business_error() {
        let err = classify("<xml><return_code>SUCCESS</return_code></xml>").unwrap_err();
        assert!(err.is_business());
    }

    #[test]
    fn test_missing_return_code_is_decode_error() {
        let err = classify("<xml><prepay_id>P1</prepay_id></xml>").unwrap_err();
        assert!(matches!(err, SdkError::DecodeError { .. }));
    }

    #[test]
    fn test_envelope_keeps_raw_body() {
        let raw = "<xml><return_code>SUCCESS</return_code><result_code>SUCCESS</result_code></xml>";
        let envelope = ResponseEnvelope::<PrepayOrder>::from_xml(raw.as_bytes()).unwrap();
        assert_eq!(envelope.raw, raw.as_bytes());

        let body = br#"{"retcode":"0","listid":"L1"}"#;
        let envelope = ResponseEnvelope::<RedEnvelopeResult>::from_retcode_json(body).unwrap();
        assert_eq!(envelope.raw, body.to_vec());

        let body = br#"{"errcode":0}"#;
        let envelope = ResponseEnvelope::<Value>::from_errcode_json(body).unwrap();
        assert_eq!(envelope.raw, body.to_vec());
    }

    #[test]
    fn test_undecodable_body_keeps_raw() {
        let err = classify("<html>502 Bad Gateway").unwrap_err();
        assert_eq!(err.raw_body_lossy().as_deref(), Some("<html>502 Bad Gateway"));
    }

    #[test]
    fn test_retcode_json() {
        let ok = ResponseEnvelope::<RedEnvelopeResult>::from_retcode_json(
            br#"{"retcode":"0","retmsg":"ok","listid":"L1"}"#,
        )
        .unwrap()
        .into_result(&DEFAULT_ERROR_CODES)
        .unwrap();
        assert_eq!(ok.listid, "L1");

        let err = ResponseEnvelope::<RedEnvelopeResult>::from_retcode_json(
            br#"{"retcode":66227001,"retmsg":"limit"}"#,
        )
        .unwrap()
        .into_result(&DEFAULT_ERROR_CODES)
        .unwrap_err();
        assert!(matches!(err, SdkError::ProtocolError { ref message } if message == "limit"));
    }

    #[test]
    fn test_errcode_json() {
        let ok = ResponseEnvelope::<Value>::from_errcode_json(br#"{"errCode":0,"errMsg":"ok"}"#)
            .unwrap()
            .into_result(&DEFAULT_ERROR_CODES);
        assert!(ok.is_ok());

        let err = ResponseEnvelope::<Value>::from_errcode_json(br#"{"errcode":87014,"errmsg":"risky"}"#)
            .unwrap()
            .into_result(&DEFAULT_ERROR_CODES)
            .unwrap_err();
        match err {
            SdkError::BusinessError { code, .. } => assert_eq!(code, "87014"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_json_rejects_non_object() {
        assert!(matches!(
            ResponseEnvelope::<Value>::from_errcode_json(b"not json"),
            Err(SdkError::DecodeError { .. })
        ));
    }
}
