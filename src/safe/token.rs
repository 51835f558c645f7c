// access_token 来源
// Access token source
//
// 获取与缓存策略由调用方决定，这里只定义接口

use async_trait::async_trait;

use crate::core::{SdkError, SdkResult};

/// access_token 提供者
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> SdkResult<String>;
}

/// 固定 access_token
#[derive(Clone)]
pub struct StaticAccessToken {
    token: String,
}

impl StaticAccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAccessToken").finish_non_exhaustive()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticAccessToken {
    async fn access_token(&self) -> SdkResult<String> {
        if self.token.is_empty() {
            return Err(SdkError::ConfigError("access_token 为空".to_string()));
        }
        Ok(self.token.clone())
    }
}
