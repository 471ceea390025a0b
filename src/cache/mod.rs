//! 对象缓存
//!
//! 后端以插件形式在加载时注册，启动时按 `cache.type` 选择，失败时回退到 moka。

pub mod macros;
pub mod object_cache;
pub mod register;
pub mod traits;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::{Result, SchoolError};

pub use object_cache::moka::MokaCacheWrapper;
pub use traits::{CacheResult, ObjectCache};

/// 认证用户缓存键
pub fn user_cache_key(token: &str) -> String {
    format!("user:{token}")
}

pub const DASHBOARD_CACHE_KEY: &str = "dashboard:overview";
pub const DASHBOARD_CACHE_TTL: u64 = 60;

async fn build_cache(name: &str) -> Result<Box<dyn ObjectCache>> {
    let constructor = register::get_object_cache_plugin(name)
        .ok_or_else(|| SchoolError::cache_plugin_not_found(format!("未注册的缓存后端: {name}")))?;
    constructor().await
}

/// 按配置创建缓存，失败时回退到内存缓存
pub async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    register::debug_object_cache_registry();

    let cache_type = AppConfig::get().cache.cache_type.clone();
    match build_cache(&cache_type).await {
        Ok(cache) => {
            info!("缓存后端: {}", cache_type);
            Ok(Arc::from(cache))
        }
        Err(e) => {
            warn!("缓存后端 {} 初始化失败，回退到 moka: {}", cache_type, e);
            Ok(Arc::new(MokaCacheWrapper::new()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_cache_key() {
        assert_eq!(user_cache_key("abc"), "user:abc");
    }
}
