// 支付结果通知
// Payment notification

use super::envelope::ResponseEnvelope;
use super::types::{NotifyResult, NotifyReturn};
use super::{xml, Pay};
use crate::core::{SdkError, SdkResult};
use crate::sign::TagScheme;

impl Pay {
    /// 解析支付结果通知
    ///
    /// 协议层成功时先验签，再按业务状态归类；签名不符返回 `SignatureMismatch`
    pub fn parse_notify(&self, body: &[u8]) -> SdkResult<NotifyResult> {
        let fields = xml::decode(body)?;
        let envelope = ResponseEnvelope::<NotifyResult>::from_fields(&fields, body)?;

        if envelope.outer_ok {
            let token = fields.get("sign").map(String::as_str).unwrap_or_default();
            if token.is_empty() {
                tracing::warn!("[Pay] 支付通知缺少签名");
                return Err(SdkError::SignatureMismatch);
            }
            self.signer(TagScheme::Xml).verify(&fields, token)?;

            let mch_id = &envelope.payload.mch_id;
            if !mch_id.is_empty() && *mch_id != self.config.mch_id {
                tracing::warn!("[Pay] 支付通知商户号不匹配: {}", mch_id);
                return Err(SdkError::InvalidInput(format!("unexpected mch_id {}", mch_id)));
            }
        }

        let result = envelope.into_result(&self.error_codes);
        if let Ok(notify) = &result {
            tracing::info!(
                "[Pay] 支付通知: out_trade_no={}, transaction_id={}",
                notify.out_trade_no,
                notify.transaction_id
            );
        }
        result
    }

    /// 生成通知应答
    ///
    /// # 参数
    ///
    /// * `ok` - 是否已成功处理
    /// * `msg` - 应答说明，成功且为空时使用 `OK`
    pub fn notify_reply(&self, ok: bool, msg: &str) -> SdkResult<String> {
        let reply = NotifyReturn {
            return_code: if ok { "SUCCESS" } else { "FAIL" }.to_string(),
            return_msg: if ok && msg.is_empty() { "OK" } else { msg }.to_string(),
        };
        xml::encode(&reply)
    }
}
