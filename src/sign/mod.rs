//! 请求签名模块
//!
//! 所有支付类接口共用同一套签名规则：
//!
//! 1. 取出记录中所有非空、参与签名的字段（按所选标签方案取字段名）
//! 2. 按字段名字节序升序排列，拼接为 `k1=v1&k2=v2&...`
//! 3. 末尾追加 `&key=<商户密钥>`
//! 4. 计算摘要（默认 MD5），输出大写十六进制
//!
//! 远端会按同样的规则重新计算并比对，所以这里的每一步都必须逐字节一致。
//!
//! # 模块结构
//!
//! - [`canonical`] - 字段提取与规范串拼接
//! - [`digest`] - 摘要算法
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use qqchat_sdk::sign::SigningContext;
//!
//! let token = SigningContext::xml("K1").sign(&request)?;
//! ```

pub mod canonical;
pub mod digest;

pub use canonical::{build, extract, CanonicalPair};
pub use digest::SignType;

use indexmap::IndexMap;

use crate::core::{SdkError, SdkResult};

/// 字段名标签方案
///
/// 同一条记录在 XML 和 JSON 两种序列化下可能使用不同的字段名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScheme {
    Xml,
    Json,
}

/// 字段取值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Int(i64),
    /// 没有字符串形式的字段（嵌套结构、列表），参与签名时报错
    Unsupported(&'static str),
}

impl<'a> FieldValue<'a> {
    /// 空字符串或零值
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int(n) => *n == 0,
            FieldValue::Unsupported(_) => false,
        }
    }

    /// 字符串形式；整数输出十进制
    ///
    /// `field` 只用于错误信息
    pub fn render(&self, field: &str) -> SdkResult<String> {
        match self {
            FieldValue::Str(s) => Ok((*s).to_string()),
            FieldValue::Int(n) => Ok(n.to_string()),
            FieldValue::Unsupported(type_name) => Err(SdkError::UnsupportedFieldType {
                field: field.to_string(),
                type_name: *type_name,
            }),
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(s: &'a str) -> Self {
        FieldValue::Str(s)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(s: &'a String) -> Self {
        FieldValue::Str(s.as_str())
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue<'_> {
    fn from(n: i32) -> Self {
        FieldValue::Int(n as i64)
    }
}

impl From<u32> for FieldValue<'_> {
    fn from(n: u32) -> Self {
        FieldValue::Int(n as i64)
    }
}

/// 字段表中的一项
///
/// 对应一个记录字段：两种方案下的字段名、取值以及三个标记
#[derive(Debug, Clone)]
pub struct SignField<'a> {
    pub xml_name: Option<&'a str>,
    pub json_name: Option<&'a str>,
    pub value: FieldValue<'a>,
    /// 序列化时为空则不输出（对应 omitempty）
    pub omit_empty: bool,
    /// 即使为空也参与签名
    pub always_sign: bool,
    /// 不参与签名
    pub skip_sign: bool,
}

impl<'a> SignField<'a> {
    /// XML 和 JSON 使用相同字段名
    pub fn new(name: &'a str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            xml_name: Some(name),
            json_name: Some(name),
            value: value.into(),
            omit_empty: false,
            always_sign: false,
            skip_sign: false,
        }
    }

    /// 仅有 XML 字段名
    pub fn xml(name: &'a str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            json_name: None,
            ..Self::new(name, value)
        }
    }

    /// 仅有 JSON 字段名
    pub fn json(name: &'a str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            xml_name: None,
            ..Self::new(name, value)
        }
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn always_sign(mut self) -> Self {
        self.always_sign = true;
        self
    }

    pub fn skip_sign(mut self) -> Self {
        self.skip_sign = true;
        self
    }

    /// 指定方案下的字段名
    pub fn name(&self, scheme: TagScheme) -> Option<&'a str> {
        match scheme {
            TagScheme::Xml => self.xml_name,
            TagScheme::Json => self.json_name,
        }
    }
}

/// 可签名记录
///
/// 每种请求类型显式列出自己的字段表，顺序即序列化顺序
pub trait Signable {
    /// 字段表（包含签名字段本身，序列化时需要）
    fn sign_fields(&self) -> Vec<SignField<'_>>;

    /// 存放签名的字段名，不参与自身签名计算
    fn signature_field(&self) -> &'static str {
        "sign"
    }
}

/// 解码后的扁平记录（例如支付结果通知），所有字段都参与验签
impl Signable for IndexMap<String, String> {
    fn sign_fields(&self) -> Vec<SignField<'_>> {
        self.iter()
            .map(|(name, value)| SignField::new(name.as_str(), value))
            .collect()
    }
}

/// 签名上下文
///
/// 每次调用构建，用完即弃，不持有任何状态
#[derive(Clone, Copy)]
pub struct SigningContext<'k> {
    secret_key: &'k str,
    scheme: TagScheme,
    case_fold: bool,
    sign_type: SignType,
}

impl std::fmt::Debug for SigningContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("scheme", &self.scheme)
            .field("case_fold", &self.case_fold)
            .field("sign_type", &self.sign_type)
            .finish_non_exhaustive()
    }
}

impl<'k> SigningContext<'k> {
    pub fn new(secret_key: &'k str, scheme: TagScheme) -> Self {
        Self {
            secret_key,
            scheme,
            case_fold: false,
            sign_type: SignType::default(),
        }
    }

    /// 使用 XML 字段名
    pub fn xml(secret_key: &'k str) -> Self {
        Self::new(secret_key, TagScheme::Xml)
    }

    /// 使用 JSON 字段名
    pub fn json(secret_key: &'k str) -> Self {
        Self::new(secret_key, TagScheme::Json)
    }

    pub fn with_case_fold(mut self, case_fold: bool) -> Self {
        self.case_fold = case_fold;
        self
    }

    pub fn with_sign_type(mut self, sign_type: SignType) -> Self {
        self.sign_type = sign_type;
        self
    }

    /// 生成待签名的规范串（包含 `&key=`）
    pub fn canonical_string<R: Signable + ?Sized>(&self, record: &R) -> SdkResult<String> {
        let pairs = extract(record, self.scheme)?;
        Ok(build(pairs, self.secret_key, self.case_fold))
    }

    /// 计算签名
    pub fn sign<R: Signable + ?Sized>(&self, record: &R) -> SdkResult<String> {
        let canonical = self.canonical_string(record)?;
        self.sign_type.digest(&canonical, self.secret_key)
    }

    /// 校验签名，十六进制大小写不敏感
    pub fn verify<R: Signable + ?Sized>(&self, record: &R, token: &str) -> SdkResult<()> {
        let expected = self.sign(record)?;
        if expected.eq_ignore_ascii_case(token.trim()) {
            Ok(())
        } else {
            tracing::warn!("[Sign] 签名校验失败");
            Err(SdkError::SignatureMismatch)
        }
    }
}

/// 使用默认设置（区分大小写、MD5）计算签名
pub fn sign<R: Signable + ?Sized>(record: &R, secret_key: &str, scheme: TagScheme) -> SdkResult<String> {
    SigningContext::new(secret_key, scheme).sign(record)
}
