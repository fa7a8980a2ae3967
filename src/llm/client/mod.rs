//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::{config::LLMConfig, llm::client::utils::evaluate_befitting_model};

mod providers;
pub mod types;
pub mod utils;

pub use types::{CompletionRequest, TokenUsage};

use providers::ProviderClient;

/// 补全后端
///
/// 编排器只依赖这个trait，生产环境注入[`LLMClient`]，测试中注入脚本化的替身。
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 提交一次补全请求，返回模型的原始文本回复
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        tracing::info!("🔄 正在检查模型连接...");
        let request = CompletionRequest::new(
            "You are a helpful assistant. Reply with a JSON object.",
            "Reply with {\"ok\": true}",
            "connection_check",
        );
        match self.complete(&request).await {
            Ok(_) => {
                tracing::info!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，失败后按固定间隔加随机抖动重试
    async fn retry_with_backoff<T, F, Fut>(&self, log_tag: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        "❌ [{}] 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        log_tag,
                        retries,
                        max_retries,
                        err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    let jitter = rand::rng().random_range(0..=retry_delay_ms / 4);
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms + jitter)).await;
                }
            }
        }
    }

    /// 使用指定模型执行一次带重试的调用
    async fn prompt_with_retry(&self, request: &CompletionRequest, model: &str) -> Result<String> {
        let agent = self
            .client
            .create_agent(model, &request.system_prompt, &self.config)?;
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        self.retry_with_backoff(&request.log_tag, || async {
            match tokio::time::timeout(timeout, agent.prompt(&request.user_prompt)).await {
                Ok(reply) => reply,
                Err(_) => Err(anyhow::anyhow!(
                    "模型调用超时（{}秒）",
                    timeout.as_secs()
                )),
            }
        })
        .await
    }

    async fn complete_inner(
        &self,
        request: &CompletionRequest,
        befitting_model: &str,
        fallover_model: Option<String>,
    ) -> Result<String> {
        let err = match self.prompt_with_retry(request, befitting_model).await {
            Ok(reply) => return Ok(reply),
            Err(e) => e,
        };

        let Some(model) = fallover_model else {
            tracing::error!(
                "❌ [{}] 调用模型服务出错，尝试 {} 次均失败...{}",
                request.log_tag,
                self.config.retry_attempts,
                err
            );
            return Err(err);
        };

        tracing::warn!(
            "❌ [{}] 调用模型服务出错，尝试 {} 次均失败，尝试使用备选模型{}...{}",
            request.log_tag,
            self.config.retry_attempts,
            model,
            err
        );
        let fixed_request = CompletionRequest {
            user_prompt: format!(
                "{}\n\nNote: a previous attempt failed with the error \"{}\". Avoid repeating it and reply with valid JSON only.",
                request.user_prompt, err
            ),
            ..request.clone()
        };
        self.prompt_with_retry(&fixed_request, &model)
            .await
            .inspect_err(|e| {
                tracing::error!("❌ [{}] 备选模型{}同样失败...{}", request.log_tag, model, e)
            })
    }
}

#[async_trait]
impl CompletionBackend for LLMClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let (befitting_model, fallover_model) = evaluate_befitting_model(
            &self.config,
            &request.system_prompt,
            &request.user_prompt,
        );
        tracing::debug!("[{}] 使用模型 {}", request.log_tag, befitting_model);

        self.complete_inner(request, &befitting_model, fallover_model)
            .await
    }
}
