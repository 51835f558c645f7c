//! 规范串生成
//!
//! [`extract`] 从字段表中挑出参与签名的字段，[`build`] 排序并拼接。
//! 拼接时不做任何 URL 编码，与远端的计算方式保持一致。

use super::{Signable, TagScheme};
use crate::core::SdkResult;

/// 参与签名的一个字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPair {
    pub name: String,
    pub value: String,
}

impl CanonicalPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 提取参与签名的字段
///
/// 跳过规则：
/// - 当前方案下没有字段名
/// - 签名字段本身
/// - 标记为不参与签名
/// - 空字符串或零值（标记为 always_sign 的除外）
///
/// # 返回
///
/// 按字段表顺序排列的字段，尚未排序
pub fn extract<R: Signable + ?Sized>(record: &R, scheme: TagScheme) -> SdkResult<Vec<CanonicalPair>> {
    let signature_field = record.signature_field();
    let mut pairs = Vec::new();

    for field in record.sign_fields() {
        let Some(name) = field.name(scheme) else {
            continue;
        };
        if name == signature_field || field.skip_sign {
            continue;
        }
        if field.value.is_empty() && !field.always_sign {
            continue;
        }

        pairs.push(CanonicalPair::new(name, field.value.render(name)?));
    }

    Ok(pairs)
}

/// 拼接规范串
///
/// # 参数
///
/// * `pairs` - 参与签名的字段
/// * `secret_key` - 商户密钥
/// * `case_fold` - 是否先将字段名转为小写
///
/// # 返回
///
/// `k1=v1&k2=v2&...&key=<secret_key>`
pub fn build(mut pairs: Vec<CanonicalPair>, secret_key: &str, case_fold: bool) -> String {
    if case_fold {
        for pair in pairs.iter_mut() {
            pair.name = pair.name.to_lowercase();
        }
    }

    // String 的 Ord 即字节序；sort_by 是稳定排序
    pairs.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

    let mut canonical = String::new();
    for pair in &pairs {
        canonical.push_str(&pair.name);
        canonical.push('=');
        canonical.push_str(&pair.value);
        canonical.push('&');
    }
    canonical.push_str("key=");
    canonical.push_str(secret_key);
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SdkError;
    use crate::sign::{FieldValue, SignField};

    struct Record {
        body: String,
        total_fee: i64,
        attach: String,
        device_info: String,
        nonce_str: String,
        sign: String,
    }

    impl Signable for Record {
        fn sign_fields(&self) -> Vec<SignField<'_>> {
            vec![
                SignField::xml("body", &self.body),
                SignField::new("total_fee", self.total_fee),
                SignField::new("attach", &self.attach).omit_empty(),
                SignField::new("device_info", &self.device_info).always_sign(),
                SignField::new("nonce_str", &self.nonce_str).skip_sign(),
                SignField::new("sign", &self.sign),
            ]
        }
    }

    fn record() -> Record {
        Record {
            body: "toy".to_string(),
            total_fee: 100,
            attach: String::new(),
            device_info: String::new(),
            nonce_str: "abc".to_string(),
            sign: "OLD".to_string(),
        }
    }

    #[test]
    fn test_extract_rules() {
        let pairs = extract(&record(), TagScheme::Xml).unwrap();
        assert_eq!(
            pairs,
            vec![
                CanonicalPair::new("body", "toy"),
                CanonicalPair::new("total_fee", "100"),
                CanonicalPair::new("device_info", ""),
            ]
        );
    }

    #[test]
    fn test_extract_uses_scheme_names() {
        // body 只有 XML 字段名
        let pairs = extract(&record(), TagScheme::Json).unwrap();
        assert!(pairs.iter().all(|p| p.name != "body"));
        assert!(pairs.iter().any(|p| p.name == "total_fee"));
    }

    #[test]
    fn test_extract_drops_zero_numbers() {
        let mut r = record();
        r.total_fee = 0;
        let pairs = extract(&r, TagScheme::Xml).unwrap();
        assert!(pairs.iter().all(|p| p.name != "total_fee"));
    }

    #[test]
    fn test_always_sign_field_present_when_empty() {
        let canonical = build(extract(&record(), TagScheme::Xml).unwrap(), "K", false);
        assert_eq!(canonical, "body=toy&device_info=&total_fee=100&key=K");
    }

    #[test]
    fn test_unsupported_field_type() {
        struct Nested;
        impl Signable for Nested {
            fn sign_fields(&self) -> Vec<SignField<'_>> {
                vec![SignField::new("detail", FieldValue::Unsupported("Vec<GoodsDetail>"))]
            }
        }

        let err = extract(&Nested, TagScheme::Json).unwrap_err();
        match err {
            SdkError::UnsupportedFieldType { field, type_name } => {
                assert_eq!(field, "detail");
                assert_eq!(type_name, "Vec<GoodsDetail>");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_build_ordinal_order() {
        // 大写字母排在小写字母之前
        let pairs = vec![
            CanonicalPair::new("b", "2"),
            CanonicalPair::new("Z", "26"),
            CanonicalPair::new("a", "1"),
        ];
        assert_eq!(build(pairs, "K", false), "Z=26&a=1&b=2&key=K");
    }

    #[test]
    fn test_build_case_fold() {
        let pairs = vec![
            CanonicalPair::new("b", "2"),
            CanonicalPair::new("Z", "26"),
            CanonicalPair::new("a", "1"),
        ];
        let folded = build(pairs.clone(), "K", true);
        let preserved = build(pairs, "K", false);

        assert_eq!(folded, "a=1&b=2&z=26&key=K");
        assert_ne!(folded, preserved);
    }

    #[test]
    fn test_build_does_not_escape() {
        let pairs = vec![CanonicalPair::new("notify_url", "https://a.b/c?d=e&f=g")];
        assert_eq!(
            build(pairs, "K", false),
            "notify_url=https://a.b/c?d=e&f=g&key=K"
        );
    }

    #[test]
    fn test_build_empty() {
        assert_eq!(build(Vec::new(), "K", false), "key=K");
    }
}
