//! 支付类接口的参数与报文结构
//!
//! 每个请求结构实现 [`Signable`]，字段表即XML输出顺序；
//! 响应结构从解码后的字段表构建。

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{MerchantConfig, SdkError, SdkResult};
use crate::sign::{SignField, Signable};

// ============================================================================
// 调用方参数
// ============================================================================

/// 交易类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    /// 公众号 / H5
    #[serde(rename = "JSAPI")]
    Jsapi,
    /// APP
    #[serde(rename = "APP")]
    App,
    /// 小程序
    #[serde(rename = "MINIAPP")]
    MiniApp,
    /// 扫码
    #[serde(rename = "NATIVE")]
    Native,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Jsapi => "JSAPI",
            TradeType::App => "APP",
            TradeType::MiniApp => "MINIAPP",
            TradeType::Native => "NATIVE",
        }
    }
}

/// 下单参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderParams {
    /// 商品描述（必填）
    pub body: String,
    /// 商户订单号（必填）
    pub out_trade_no: String,
    /// 金额，单位分（必填）
    pub total_fee: i64,
    /// 终端IP（必填）
    pub create_ip: String,
    /// 附加数据，原样返回
    pub attach: String,
    /// 标价币种，留空使用远端默认
    pub fee_type: String,
    /// 交易起始时间 yyyyMMddHHmmss
    pub time_start: String,
    /// 交易结束时间 yyyyMMddHHmmss
    pub time_expire: String,
    /// 支付方式限制
    pub limit_pay: String,
    /// 代扣协议序列号，支付中开通代扣必传
    pub contract_code: String,
    /// 活动标识，格式 `level_tag=xxx&sale_tag=xxx`
    pub promotion_tag: String,
    /// 设备号
    pub device_info: String,
    /// 小程序参数
    pub mini_app_param: String,
}

/// 企业付款参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferParams {
    /// 收款用户 openid
    pub open_id: String,
    /// 商户订单号
    pub out_trade_no: String,
    /// 金额，单位分
    pub total_fee: i64,
    /// 付款备注
    pub memo: String,
    /// 调用方IP
    pub create_ip: String,
}

/// 现金红包参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedEnvelopeParams {
    /// 接收用户 openid
    pub open_id: String,
    /// 商户订单号
    pub mch_billno: String,
    /// 金额，单位分
    pub total_amount: i64,
    /// 商户名称，展示在红包领取页
    pub send_name: String,
    /// 祝福语
    pub wishing: String,
    /// 活动名称
    pub act_name: String,
    /// 红包图标ID
    pub icon_id: i64,
    /// 红包背景ID
    pub banner_id: i64,
    /// 结果通知地址
    pub notify_url: String,
    /// 1 表示不发送消息通知
    pub not_send_msg: i64,
}

// ============================================================================
// 统一下单
// ============================================================================

/// 统一下单请求
#[derive(Debug, Clone, Default)]
pub struct UnifiedOrderRequest {
    pub appid: String,
    pub mch_id: String,
    pub nonce_str: String,
    pub sign: String,
    pub body: String,
    pub attach: String,
    pub out_trade_no: String,
    pub fee_type: String,
    pub total_fee: i64,
    pub spbill_create_ip: String,
    pub time_start: String,
    pub time_expire: String,
    pub limit_pay: String,
    pub contract_code: String,
    pub promotion_tag: String,
    pub trade_type: String,
    pub notify_url: String,
    pub device_info: String,
    pub mini_app_param: String,
}

impl UnifiedOrderRequest {
    /// 用商户配置和调用方参数组装请求（未签名）
    pub fn new(config: &MerchantConfig, params: &OrderParams, trade_type: TradeType, nonce_str: String) -> Self {
        Self {
            appid: config.app_id.clone(),
            mch_id: config.mch_id.clone(),
            nonce_str,
            sign: String::new(),
            body: params.body.clone(),
            attach: params.attach.clone(),
            out_trade_no: params.out_trade_no.clone(),
            fee_type: params.fee_type.clone(),
            total_fee: params.total_fee,
            spbill_create_ip: params.create_ip.clone(),
            time_start: params.time_start.clone(),
            time_expire: params.time_expire.clone(),
            limit_pay: params.limit_pay.clone(),
            contract_code: params.contract_code.clone(),
            promotion_tag: params.promotion_tag.clone(),
            trade_type: trade_type.as_str().to_string(),
            notify_url: config.notify_url.clone(),
            device_info: params.device_info.clone(),
            mini_app_param: params.mini_app_param.clone(),
        }
    }
}

impl Signable for UnifiedOrderRequest {
    fn sign_fields(&self) -> Vec<SignField<'_>> {
        vec![
            SignField::xml("appid", &self.appid).omit_empty(),
            SignField::xml("mch_id", &self.mch_id),
            SignField::xml("nonce_str", &self.nonce_str),
            SignField::xml("sign", &self.sign),
            SignField::xml("body", &self.body),
            SignField::xml("attach", &self.attach).omit_empty(),
            SignField::xml("out_trade_no", &self.out_trade_no),
            SignField::xml("fee_type", &self.fee_type),
            SignField::xml("total_fee", self.total_fee),
            SignField::xml("spbill_create_ip", &self.spbill_create_ip),
            SignField::xml("time_start", &self.time_start).omit_empty(),
            SignField::xml("time_expire", &self.time_expire).omit_empty(),
            SignField::xml("limit_pay", &self.limit_pay).omit_empty(),
            SignField::xml("contract_code", &self.contract_code).omit_empty(),
            SignField::xml("promotion_tag", &self.promotion_tag).omit_empty(),
            SignField::xml("trade_type", &self.trade_type),
            SignField::xml("notify_url", &self.notify_url),
            SignField::xml("device_info", &self.device_info).omit_empty(),
            SignField::xml("mini_app_param", &self.mini_app_param),
        ]
    }
}

/// 从解码后的XML字段表构建
pub trait FromFields: Sized {
    fn from_fields(fields: &IndexMap<String, String>) -> Self;
}

fn field(fields: &IndexMap<String, String>, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

/// 统一下单结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepayOrder {
    pub return_code: String,
    pub return_msg: String,
    pub appid: String,
    pub mch_id: String,
    pub nonce_str: String,
    pub sign: String,
    pub result_code: String,
    pub trade_type: String,
    pub prepay_id: String,
    pub code_url: String,
    pub err_code: String,
    pub err_code_des: String,
}

impl FromFields for PrepayOrder {
    fn from_fields(fields: &IndexMap<String, String>) -> Self {
        Self {
            return_code: field(fields, "return_code"),
            return_msg: field(fields, "return_msg"),
            appid: field(fields, "appid"),
            mch_id: field(fields, "mch_id"),
            nonce_str: field(fields, "nonce_str"),
            sign: field(fields, "sign"),
            result_code: field(fields, "result_code"),
            trade_type: field(fields, "trade_type"),
            prepay_id: field(fields, "prepay_id"),
            code_url: field(fields, "code_url"),
            err_code: field(fields, "err_code"),
            err_code_des: field(fields, "err_code_des"),
        }
    }
}

// ============================================================================
// 调起支付参数
// ============================================================================

/// JSAPI 调起支付参数（交给前端）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsPayParams {
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    #[serde(rename = "nonceStr")]
    pub nonce_str: String,
    pub package: String,
    #[serde(rename = "signType")]
    pub sign_type: String,
    #[serde(rename = "paySign")]
    pub pay_sign: String,
}

impl Signable for JsPayParams {
    fn sign_fields(&self) -> Vec<SignField<'_>> {
        vec![
            SignField::new("appId", &self.app_id),
            SignField::new("timeStamp", &self.time_stamp),
            SignField::new("nonceStr", &self.nonce_str),
            SignField::new("package", &self.package),
            SignField::new("signType", &self.sign_type),
            SignField::new("paySign", &self.pay_sign),
        ]
    }

    fn signature_field(&self) -> &'static str {
        "paySign"
    }
}

/// APP 调起支付参数（交给客户端SDK）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppPayParams {
    pub appid: String,
    pub partnerid: String,
    pub prepayid: String,
    pub package: String,
    pub noncestr: String,
    pub timestamp: String,
    pub sign: String,
}

impl Signable for AppPayParams {
    fn sign_fields(&self) -> Vec<SignField<'_>> {
        vec![
            SignField::new("appid", &self.appid),
            SignField::new("partnerid", &self.partnerid),
            SignField::new("prepayid", &self.prepayid),
            SignField::new("package", &self.package),
            SignField::new("noncestr", &self.noncestr),
            SignField::new("timestamp", &self.timestamp),
            SignField::new("sign", &self.sign),
        ]
    }
}

// ============================================================================
// 企业付款
// ============================================================================

/// 企业付款请求
#[derive(Debug, Clone, Default)]
pub struct TransferRequest {
    pub input_charset: String,
    pub mch_id: String,
    pub nonce_str: String,
    pub sign: String,
    pub out_trade_no: String,
    pub total_fee: i64,
    pub memo: String,
    pub appid: String,
    pub openid: String,
    pub op_user_id: String,
    pub op_user_passwd: String,
    pub spbill_create_ip: String,
}

impl TransferRequest {
    pub fn new(config: &MerchantConfig, params: &TransferParams, nonce_str: String) -> Self {
        Self {
            input_charset: "UTF-8".to_string(),
            mch_id: config.mch_id.clone(),
            nonce_str,
            sign: String::new(),
            out_trade_no: params.out_trade_no.clone(),
            total_fee: params.total_fee,
            memo: params.memo.clone(),
            appid: config.app_id.clone(),
            openid: params.open_id.clone(),
            op_user_id: config.op_user_id.clone(),
            op_user_passwd: config.op_user_passwd.clone(),
            spbill_create_ip: params.create_ip.clone(),
        }
    }
}

impl Signable for TransferRequest {
    fn sign_fields(&self) -> Vec<SignField<'_>> {
        vec![
            SignField::xml("input_charset", &self.input_charset),
            SignField::xml("mch_id", &self.mch_id),
            SignField::xml("nonce_str", &self.nonce_str),
            SignField::xml("sign", &self.sign),
            SignField::xml("out_trade_no", &self.out_trade_no),
            SignField::xml("total_fee", self.total_fee),
            SignField::xml("memo", &self.memo),
            SignField::xml("appid", &self.appid),
            SignField::xml("openid", &self.openid),
            SignField::xml("op_user_id", &self.op_user_id),
            SignField::xml("op_user_passwd", &self.op_user_passwd),
            SignField::xml("spbill_create_ip", &self.spbill_create_ip),
        ]
    }
}

/// 企业付款结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transaction_id: String,
    pub out_trade_no: String,
    pub total_fee: String,
}

impl FromFields for TransferResult {
    fn from_fields(fields: &IndexMap<String, String>) -> Self {
        Self {
            transaction_id: field(fields, "transaction_id"),
            out_trade_no: field(fields, "out_trade_no"),
            total_fee: field(fields, "total_fee"),
        }
    }
}

// ============================================================================
// 现金红包
// ============================================================================

/// 发红包请求
///
/// 按JSON字段名签名，再把JSON投影编码为表单提交
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedEnvelopeRequest {
    /// 1 = UTF-8, 2 = GBK
    pub charset: i64,
    pub nonce_str: String,
    pub sign: String,
    pub mch_billno: String,
    pub mch_id: String,
    pub mch_name: String,
    pub qqappid: String,
    pub re_openid: String,
    pub total_amount: i64,
    pub total_num: i64,
    pub wishing: String,
    pub act_name: String,
    pub icon_id: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub banner_id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notify_url: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub not_send_msg: i64,
    pub min_value: i64,
    pub max_value: i64,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

impl RedEnvelopeRequest {
    /// 普通红包：单个、最小金额 1 分、最大金额为总额 + 1
    ///
    /// 金额必须为正数
    pub fn new(config: &MerchantConfig, params: &RedEnvelopeParams, nonce_str: String) -> SdkResult<Self> {
        if params.total_amount <= 0 {
            return Err(SdkError::InvalidInput(format!(
                "红包金额必须大于0: {}",
                params.total_amount
            )));
        }
        let max_value = params.total_amount.checked_add(1).ok_or_else(|| {
            SdkError::InvalidInput(format!("红包金额超出范围: {}", params.total_amount))
        })?;

        Ok(Self {
            charset: 1,
            nonce_str,
            sign: String::new(),
            mch_billno: params.mch_billno.clone(),
            mch_id: config.mch_id.clone(),
            mch_name: params.send_name.clone(),
            qqappid: config.app_id.clone(),
            re_openid: params.open_id.clone(),
            total_amount: params.total_amount,
            total_num: 1,
            wishing: params.wishing.clone(),
            act_name: params.act_name.clone(),
            icon_id: params.icon_id,
            banner_id: params.banner_id,
            notify_url: params.notify_url.clone(),
            not_send_msg: params.not_send_msg,
            min_value: 1,
            max_value,
        })
    }
}

impl Signable for RedEnvelopeRequest {
    fn sign_fields(&self) -> Vec<SignField<'_>> {
        vec![
            SignField::new("charset", self.charset),
            SignField::new("nonce_str", &self.nonce_str),
            SignField::new("sign", &self.sign),
            SignField::new("mch_billno", &self.mch_billno),
            SignField::new("mch_id", &self.mch_id),
            SignField::new("mch_name", &self.mch_name),
            SignField::new("qqappid", &self.qqappid),
            SignField::new("re_openid", &self.re_openid),
            SignField::new("total_amount", self.total_amount),
            SignField::new("total_num", self.total_num),
            SignField::new("wishing", &self.wishing),
            SignField::new("act_name", &self.act_name),
            SignField::new("icon_id", self.icon_id),
            SignField::new("banner_id", self.banner_id).omit_empty(),
            SignField::new("notify_url", &self.notify_url).omit_empty(),
            SignField::new("not_send_msg", self.not_send_msg).omit_empty(),
            SignField::new("min_value", self.min_value),
            SignField::new("max_value", self.max_value),
        ]
    }
}

/// 发红包结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedEnvelopeResult {
    #[serde(default, deserialize_with = "string_or_number")]
    pub retcode: String,
    #[serde(default)]
    pub retmsg: String,
    /// 红包订单号
    #[serde(default, deserialize_with = "string_or_number")]
    pub listid: String,
}

/// 远端有时以数字、有时以字符串返回编号类字段
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ============================================================================
// 支付结果通知
// ============================================================================

/// 支付结果通知
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyResult {
    pub return_code: String,
    pub return_msg: String,
    pub appid: String,
    pub mch_id: String,
    pub nonce_str: String,
    pub sign: String,
    pub device_info: String,
    pub trade_type: String,
    pub bank_type: String,
    pub fee_type: String,
    pub total_fee: String,
    pub cash_fee: String,
    pub coupon_fee: String,
    pub transaction_id: String,
    pub out_trade_no: String,
    pub attach: String,
    pub time_end: String,
    pub openid: String,
    pub result_code: String,
    pub err_code: String,
    pub err_code_des: String,
}

impl FromFields for NotifyResult {
    fn from_fields(fields: &IndexMap<String, String>) -> Self {
        Self {
            return_code: field(fields, "return_code"),
            return_msg: field(fields, "return_msg"),
            appid: field(fields, "appid"),
            mch_id: field(fields, "mch_id"),
            nonce_str: field(fields, "nonce_str"),
            sign: field(fields, "sign"),
            device_info: field(fields, "device_info"),
            trade_type: field(fields, "trade_type"),
            bank_type: field(fields, "bank_type"),
            fee_type: field(fields, "fee_type"),
            total_fee: field(fields, "total_fee"),
            cash_fee: field(fields, "cash_fee"),
            coupon_fee: field(fields, "coupon_fee"),
            transaction_id: field(fields, "transaction_id"),
            out_trade_no: field(fields, "out_trade_no"),
            attach: field(fields, "attach"),
            time_end: field(fields, "time_end"),
            openid: field(fields, "openid"),
            result_code: field(fields, "result_code"),
            err_code: field(fields, "err_code"),
            err_code_des: field(fields, "err_code_des"),
        }
    }
}

/// 通知应答
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotifyReturn {
    pub return_code: String,
    pub return_msg: String,
}

impl Signable for NotifyReturn {
    fn sign_fields(&self) -> Vec<SignField<'_>> {
        vec![
            SignField::xml("return_code", &self.return_code),
            SignField::xml("return_msg", &self.return_msg),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::{extract, TagScheme};

    #[test]
    fn test_red_envelope_json_projection_matches_field_table() {
        let config = MerchantConfig {
            app_id: "1104".to_string(),
            mch_id: "M1".to_string(),
            ..Default::default()
        };
        let params = RedEnvelopeParams {
            open_id: "OPENID".to_string(),
            mch_billno: "B1".to_string(),
            total_amount: 100,
            send_name: "shop".to_string(),
            wishing: "hi".to_string(),
            act_name: "act".to_string(),
            icon_id: 3,
            ..Default::default()
        };
        let request = RedEnvelopeRequest::new(&config, &params, "N".to_string()).unwrap();

        let projection = serde_json::to_value(&request).unwrap();
        let object = projection.as_object().unwrap();
        for pair in extract(&request, TagScheme::Json).unwrap() {
            assert!(object.contains_key(&pair.name), "missing {}", pair.name);
        }
        assert!(!object.contains_key("banner_id"));
        assert!(!object.contains_key("notify_url"));
        assert_eq!(object["max_value"], 101);
        assert_eq!(object["total_num"], 1);
    }

    #[test]
    fn test_red_envelope_rejects_bad_amount() {
        let config = MerchantConfig::default();
        for amount in [0, -5, i64::MAX] {
            let params = RedEnvelopeParams {
                total_amount: amount,
                ..Default::default()
            };
            assert!(matches!(
                RedEnvelopeRequest::new(&config, &params, "N".to_string()),
                Err(SdkError::InvalidInput(_))
            ));
        }

        let params = RedEnvelopeParams {
            total_amount: i64::MAX - 1,
            ..Default::default()
        };
        let request = RedEnvelopeRequest::new(&config, &params, "N".to_string()).unwrap();
        assert_eq!(request.max_value, i64::MAX);
    }

    #[test]
    fn test_red_envelope_result_accepts_numbers() {
        let result: RedEnvelopeResult =
            serde_json::from_str(r#"{"retcode":0,"retmsg":"ok","listid":1000}"#).unwrap();
        assert_eq!(result.retcode, "0");
        assert_eq!(result.listid, "1000");
    }

    #[test]
    fn test_js_pay_params_sign_field() {
        let params = JsPayParams {
            app_id: "1104".to_string(),
            pay_sign: "X".to_string(),
            ..Default::default()
        };
        let pairs = extract(&params, TagScheme::Json).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "appId");
    }

    #[test]
    fn test_order_request_xml_only() {
        let request = UnifiedOrderRequest {
            body: "toy".to_string(),
            ..Default::default()
        };
        assert!(extract(&request, TagScheme::Json).unwrap().is_empty());
    }

    #[test]
    fn test_trade_type_strings() {
        assert_eq!(TradeType::Jsapi.as_str(), "JSAPI");
        assert_eq!(TradeType::MiniApp.as_str(), "MINIAPP");
        assert_eq!(serde_json::to_string(&TradeType::App).unwrap(), "\"APP\"");
    }
}
