// Core modules
// 核心模块
pub mod core;
pub mod sign;
pub mod transport;
pub mod pay;
pub mod safe;
pub mod utils;

// Re-export common types for easy access
// 重新导出常用类型
pub use crate::core::{
    Endpoints, ErrorCodeTable, MerchantConfig, SdkError, SdkResult, DEFAULT_ERROR_CODES,
};
pub use pay::Pay;
pub use safe::{AccessTokenProvider, Safe, StaticAccessToken};
pub use sign::{SignType, Signable, SigningContext, TagScheme};
pub use transport::{HttpTransport, Transport};

// Initialize tracing for logging
// 初始化 tracing 用于日志输出
//
// 供宿主程序调用；已经设置过全局 subscriber 时不做任何事
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_thread_ids(true)
        .with_target(false)
        .try_init();
}
