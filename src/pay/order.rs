// 统一下单与调起支付参数
// Unified order and client payment parameters

use super::envelope::ResponseEnvelope;
use super::types::{AppPayParams, JsPayParams, OrderParams, PrepayOrder, TradeType, UnifiedOrderRequest};
use super::{xml, Pay};
use crate::core::{SdkError, SdkResult};
use crate::utils;

impl Pay {
    /// 统一下单
    ///
    /// # 参数
    ///
    /// * `params` - 订单参数
    /// * `trade_type` - 交易类型
    ///
    /// # 返回
    ///
    /// 下单结果；协议层失败返回 `ProtocolError`，业务失败返回 `BusinessError`
    pub async fn prepay_order(&self, params: &OrderParams, trade_type: TradeType) -> SdkResult<PrepayOrder> {
        let request = self.build_order_request(params, trade_type, utils::nonce())?;
        let body = xml::encode(&request)?;

        tracing::info!(
            "[Pay] 统一下单: out_trade_no={}, trade_type={}, total_fee={}",
            request.out_trade_no,
            request.trade_type,
            request.total_fee
        );

        let raw = self.transport.post_xml(&self.endpoints.unified_order, body).await?;
        let result = ResponseEnvelope::<PrepayOrder>::from_xml(&raw)
            .and_then(|envelope| envelope.into_result(&self.error_codes));

        match &result {
            Ok(order) => tracing::info!("[Pay] 下单成功: prepay_id={}", order.prepay_id),
            Err(e) => {
                tracing::error!("[Pay] 下单失败: out_trade_no={}, {}", request.out_trade_no, e);
            }
        }
        result
    }

    /// JSAPI 下单
    pub async fn prepay_order_by_js(&self, params: &OrderParams) -> SdkResult<PrepayOrder> {
        self.prepay_order(params, TradeType::Jsapi).await
    }

    /// APP 下单
    pub async fn prepay_order_by_app(&self, params: &OrderParams) -> SdkResult<PrepayOrder> {
        self.prepay_order(params, TradeType::App).await
    }

    /// 小程序下单
    pub async fn prepay_order_by_mini_app(&self, params: &OrderParams) -> SdkResult<PrepayOrder> {
        self.prepay_order(params, TradeType::MiniApp).await
    }

    /// 下单并只返回 prepay_id，为空时报错
    pub async fn prepay_id(&self, params: &OrderParams, trade_type: TradeType) -> SdkResult<String> {
        let order = self.prepay_order(params, trade_type).await?;
        if order.prepay_id.is_empty() {
            return Err(SdkError::ProtocolError {
                message: "empty prepay_id".to_string(),
            });
        }
        Ok(order.prepay_id)
    }

    pub async fn prepay_id_by_js(&self, params: &OrderParams) -> SdkResult<String> {
        self.prepay_id(params, TradeType::Jsapi).await
    }

    pub async fn prepay_id_by_app(&self, params: &OrderParams) -> SdkResult<String> {
        self.prepay_id(params, TradeType::App).await
    }

    /// JSAPI 调起支付参数，签名存放在 paySign
    pub fn js_pay_params(&self, prepay_id: &str) -> SdkResult<JsPayParams> {
        let mut params = JsPayParams {
            app_id: self.config.app_id.clone(),
            time_stamp: utils::timestamp(),
            nonce_str: utils::nonce(),
            package: format!("prepay_id={}", prepay_id),
            sign_type: self.config.sign_type.as_str().to_string(),
            pay_sign: String::new(),
        };
        params.pay_sign = self.sign_json(&params)?;
        Ok(params)
    }

    /// APP 调起支付参数
    pub fn app_pay_params(&self, prepay_id: &str) -> SdkResult<AppPayParams> {
        let mut params = AppPayParams {
            appid: self.config.app_id.clone(),
            partnerid: self.config.mch_id.clone(),
            prepayid: prepay_id.to_string(),
            package: "Sign=WXPay".to_string(),
            noncestr: utils::nonce(),
            timestamp: utils::timestamp(),
            sign: String::new(),
        };
        params.sign = self.sign_xml(&params)?;
        Ok(params)
    }

    /// 组装并签名下单请求
    pub(crate) fn build_order_request(
        &self,
        params: &OrderParams,
        trade_type: TradeType,
        nonce_str: String,
    ) -> SdkResult<UnifiedOrderRequest> {
        let mut request = UnifiedOrderRequest::new(&self.config, params, trade_type, nonce_str);
        request.sign = self.sign_xml(&request)?;
        Ok(request)
    }
}
