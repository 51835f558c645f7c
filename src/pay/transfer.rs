// 企业付款与现金红包
// Merchant transfer and red envelope
//
// 两个接口都需要商户证书（双向TLS）

use serde_json::Value;

use super::envelope::ResponseEnvelope;
use super::types::{
    RedEnvelopeParams, RedEnvelopeRequest, RedEnvelopeResult, TransferParams, TransferRequest,
    TransferResult,
};
use super::{xml, Pay};
use crate::core::{SdkError, SdkResult};
use crate::utils;

impl Pay {
    /// 企业付款到用户余额
    ///
    /// 操作员账号和密码取自商户配置
    pub async fn mch_pay(&self, params: &TransferParams) -> SdkResult<TransferResult> {
        let transport = self.tls()?;

        let mut request = TransferRequest::new(&self.config, params, utils::nonce());
        request.sign = self.sign_xml(&request)?;
        let body = xml::encode(&request)?;

        tracing::info!(
            "[Pay] 企业付款: out_trade_no={}, total_fee={}",
            request.out_trade_no,
            request.total_fee
        );

        let raw = transport.post_xml(&self.endpoints.mch_transfer, body).await?;
        let result = ResponseEnvelope::<TransferResult>::from_xml(&raw)
            .and_then(|envelope| envelope.into_result(&self.error_codes));

        match &result {
            Ok(transfer) => tracing::info!(
                "[Pay] 企业付款成功: transaction_id={}",
                transfer.transaction_id
            ),
            Err(e) => {
                tracing::error!("[Pay] 企业付款失败: out_trade_no={}, {}", request.out_trade_no, e);
            }
        }
        result
    }

    /// 发放现金红包
    ///
    /// # 返回
    ///
    /// 红包订单号 listid
    pub async fn send_red(&self, params: &RedEnvelopeParams) -> SdkResult<String> {
        let transport = self.tls()?;

        let mut request = RedEnvelopeRequest::new(&self.config, params, utils::nonce())?;
        request.sign = self.sign_json(&request)?;
        let form = form_pairs(&request)?;

        tracing::info!(
            "[Pay] 发红包: mch_billno={}, total_amount={}",
            request.mch_billno,
            request.total_amount
        );

        let raw = transport.post_form(&self.endpoints.send_red, &form).await?;
        let result = ResponseEnvelope::<RedEnvelopeResult>::from_retcode_json(&raw)
            .and_then(|envelope| envelope.into_result(&self.error_codes));

        match result {
            Ok(red) => {
                tracing::info!("[Pay] 红包发放成功: listid={}", red.listid);
                Ok(red.listid)
            }
            Err(e) => {
                tracing::error!("[Pay] 红包发放失败: mch_billno={}, {}", request.mch_billno, e);
                Err(e)
            }
        }
    }
}

/// 把记录的JSON投影展开为表单字段
fn form_pairs<T: serde::Serialize>(record: &T) -> SdkResult<Vec<(String, String)>> {
    let value = serde_json::to_value(record)
        .map_err(|e| SdkError::InvalidInput(format!("序列化请求失败: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(SdkError::InvalidInput("请求不是对象".to_string()));
    };
    Ok(map
        .into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (name, text)
        })
        .collect())
}
