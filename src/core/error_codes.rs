//! 错误码映射表
//!
//! 将远端返回的业务错误码映射为稳定的说明文字。
//! 表是数据：新增错误码只需追加条目，不涉及信封解析逻辑。
//!
//! - 支付类接口的 `err_code`（字符串，如 `NOTENOUGH`）
//! - 内容安全类接口的 `errcode`（数字，如 `87014`）
//!
//! 查找时大小写不敏感；未知错误码直接透传远端的错误描述。

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// 内置错误码
const BUILTIN_CODES: &[(&str, &str)] = &[
    // 支付 / 企业付款 / 红包
    ("SYSTEMERROR", "系统错误，请稍后使用原单号重试"),
    ("PARAM_ERROR", "请求参数错误"),
    ("SIGNERROR", "签名错误"),
    ("LACK_PARAMS", "缺少必要的请求参数"),
    ("NOT_UTF8", "参数编码不是UTF-8"),
    ("XML_FORMAT_ERROR", "XML格式错误"),
    ("REQUIRE_POST_METHOD", "请使用POST方法"),
    ("NOAUTH", "商户无此接口权限"),
    ("APPID_NOT_EXIST", "APPID不存在"),
    ("MCHID_NOT_EXIST", "商户号不存在"),
    ("APPID_MCHID_NOT_MATCH", "APPID和商户号不匹配"),
    ("OUT_TRADE_NO_USED", "商户订单号重复"),
    ("ORDERPAID", "订单已支付"),
    ("ORDERCLOSED", "订单已关闭"),
    ("ORDERREVERSED", "订单已撤销"),
    ("ORDERNOTEXIST", "订单不存在"),
    ("NOTENOUGH", "商户余额不足"),
    ("BANKERROR", "银行系统异常"),
    ("USERPAYING", "用户支付中"),
    ("TRADE_ERROR", "交易错误"),
    ("BUYER_MISMATCH", "支付帐号错误"),
    ("OPENID_ERROR", "用户openid错误"),
    ("AMOUNT_LIMIT", "付款金额超出限制"),
    ("SENDNUM_LIMIT", "该用户今日领取红包个数超过限制"),
    ("FREQ_LIMIT", "请求频率超过限制"),
    ("OP_USER_ERROR", "操作员帐号或密码错误"),
    ("CA_ERROR", "商户证书校验失败"),
    // 内容安全 / 公共错误码
    ("-1", "系统繁忙，请稍候再试"),
    ("40001", "access_token无效或已过期"),
    ("40013", "AppID无效"),
    ("40014", "access_token不合法"),
    ("41001", "缺少access_token参数"),
    ("42001", "access_token超时"),
    ("44002", "POST数据包为空"),
    ("45009", "接口调用超过限额"),
    ("87014", "内容含有违法违规内容"),
];

/// 默认错误码表
pub static DEFAULT_ERROR_CODES: Lazy<ErrorCodeTable> =
    Lazy::new(|| ErrorCodeTable::from_entries(BUILTIN_CODES));

/// Code-keyed message table
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeTable {
    entries: HashMap<String, String>,
}

impl ErrorCodeTable {
    /// 空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 (code, message) 列表构建
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        let mut table = Self::new();
        for (code, message) in entries {
            table.insert(code, message);
        }
        table
    }

    /// 追加或覆盖一个错误码
    pub fn insert(&mut self, code: &str, message: &str) {
        self.entries
            .insert(Self::normalize(code), message.to_string());
    }

    /// 查找错误码说明
    pub fn message_for(&self, code: &str) -> Option<&str> {
        self.entries.get(&Self::normalize(code)).map(String::as_str)
    }

    /// 解析最终展示的错误信息
    ///
    /// 已知错误码返回表内说明，否则返回远端描述
    pub fn resolve(&self, code: &str, remote_message: &str) -> String {
        match self.message_for(code) {
            Some(message) => message.to_string(),
            None => remote_message.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn normalize(code: &str) -> String {
        code.trim().to_ascii_uppercase()
    }
}
