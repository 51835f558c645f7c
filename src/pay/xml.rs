//! 扁平XML编解码
//!
//! 支付类接口使用单层 `<xml><k>v</k>...</xml>` 文档：
//!
//! - [`encode`] 按字段表顺序输出，omit_empty 字段为空时不输出
//! - [`decode`] 读取根节点下一层的所有元素，文本与 CDATA 都按原文取值（不去除首尾空白），
//!   同名元素以最后一次出现为准

use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::core::{SdkError, SdkResult};
use crate::sign::Signable;

/// 序列化为XML文档
pub fn encode<R: Signable + ?Sized>(record: &R) -> SdkResult<String> {
    let mut xml = String::from("<xml>");
    for field in record.sign_fields() {
        let Some(name) = field.xml_name else {
            continue;
        };
        if field.omit_empty && field.value.is_empty() {
            continue;
        }
        let value = field.value.render(name)?;
        let value = escape(&value);
        xml.push('<');
        xml.push_str(name);
        xml.push('>');
        xml.push_str(&value);
        xml.push_str("</");
        xml.push_str(name);
        xml.push('>');
    }
    xml.push_str("</xml>");
    Ok(xml)
}

/// 解析XML文档为有序字段表
///
/// 根节点名不做要求；更深层的嵌套元素被忽略。
/// 文档不完整或不是XML时返回 `DecodeError`，并附带原始响应体。
pub fn decode(raw: &[u8]) -> SdkResult<IndexMap<String, String>> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| SdkError::decode(format!("响应不是UTF-8: {}", e), raw))?;

    let mut reader = Reader::from_str(text);

    let mut fields = IndexMap::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 1 {
                    saw_root = true;
                } else if depth == 2 {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    fields.insert(name.clone(), String::new());
                    current = Some(name);
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    saw_root = true;
                } else if depth == 1 {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    fields.insert(name, String::new());
                }
            }
            Ok(Event::Text(t)) => {
                if depth == 2 {
                    let value = t
                        .unescape()
                        .map_err(|e| SdkError::decode(format!("XML转义错误: {}", e), raw))?;
                    // 纯空白是排版用的缩进，其余文本原样保留
                    if !value.trim().is_empty() {
                        append(&mut fields, current.as_deref(), &value);
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if depth == 2 {
                    let inner = c.into_inner();
                    append(&mut fields, current.as_deref(), &String::from_utf8_lossy(&inner));
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    current = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SdkError::decode(format!("XML解析失败: {}", e), raw));
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(SdkError::decode("响应不是XML文档", raw));
    }
    if depth != 0 {
        return Err(SdkError::decode("XML文档不完整", raw));
    }
    Ok(fields)
}

fn append(fields: &mut IndexMap<String, String>, current: Option<&str>, value: &str) {
    if let Some(name) = current {
        if let Some(slot) = fields.get_mut(name) {
            slot.push_str(value);
        }
    }
}
