// 工具函数
// Utility functions

use rand::distributions::Alphanumeric;
use rand::Rng;

/// 随机串长度
pub const NONCE_LEN: usize = 32;

/// 生成随机字母数字串
///
/// # 参数
///
/// * `len` - 长度
pub fn random_str(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// 生成请求随机串（nonce_str）
pub fn nonce() -> String {
    random_str(NONCE_LEN)
}

/// 当前Unix时间戳（秒），十进制文本
pub fn timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}
