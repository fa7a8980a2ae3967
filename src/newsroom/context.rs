use std::sync::Arc;

use anyhow::Result;

use crate::{
    cache::CacheManager,
    config::Config,
    llm::client::{CompletionBackend, LLMClient},
    store::{Store, models::NewsSource},
};

#[derive(Clone)]
pub struct NewsroomContext {
    /// 模型补全后端，生产环境为[`LLMClient`]
    pub backend: Arc<dyn CompletionBackend>,
    /// 配置
    pub config: Config,
    /// 缓存管理器
    pub cache_manager: Arc<CacheManager>,
    /// 持久化存储
    pub store: Store,
}

impl NewsroomContext {
    pub fn new(config: Config, backend: Arc<dyn CompletionBackend>, store: Store) -> Self {
        let cache_manager = Arc::new(CacheManager::new(config.cache.clone()));
        Self {
            backend,
            config,
            cache_manager,
            store,
        }
    }

    /// 按配置连接数据库、写入默认新闻来源并创建模型客户端
    pub async fn from_config(config: &Config, llm_client: LLMClient) -> Result<Self> {
        let store = Store::connect(&config.database_url).await?;
        NewsSource::seed_defaults(&store.pool).await?;
        let context = Self::new(config.clone(), Arc::new(llm_client), store);

        tracing::info!("🌐 报告语言: {}", context.config.target_language.display_name());
        if context.cache_manager.is_enabled() {
            tracing::info!(
                "💾 已启用回复缓存: {}",
                context.config.cache.cache_dir.display()
            );
        }
        Ok(context)
    }
}
