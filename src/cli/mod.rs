use crate::config::{Config, LLMProvider};
use crate::i18n::TargetLanguage;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "newsroom.toml";

/// Newsroom-RS - 由Rust与AI驱动的新闻调研服务
#[derive(Parser, Debug)]
#[command(name = "newsroom-rs")]
#[command(
    about = "AI-assisted newsroom research service. Generates analyst teams, simulates expert interviews, scores credibility and synthesizes a verified final report."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HTTP服务监听地址，例如 127.0.0.1:8000
    #[arg(short, long)]
    pub bind: Option<String>,

    /// 数据库连接串
    #[arg(long)]
    pub database_url: Option<String>,

    /// 直接对该主题执行一次调研并输出报告，不启动HTTP服务
    #[arg(short, long)]
    pub topic: Option<String>,

    /// 分析师数量
    #[arg(short = 'n', long)]
    pub analyst_count: Option<usize>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 高能效模型，用于角色生成、提问与访谈
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于最终报告综合，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 单个项目内访谈的最大并发数
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// LLM Provider (openai, deepseek, openrouter, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 目标语言 (en, es, zh, fr, de, pt)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 同时运行的工作流数量上限
    #[arg(long)]
    pub max_concurrent_runs: Option<usize>,

    /// 人工审阅窗口（秒）
    #[arg(long)]
    pub review_timeout_secs: Option<u64>,

    /// 启用智能体回复缓存
    #[arg(long, conflicts_with = "no_cache")]
    pub enable_cache: bool,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path).with_context(|| {
                    format!("无法读取默认配置文件 {:?}", default_config_path)
                })?
            } else {
                Config::default()
            }
        };

        // 覆盖服务配置
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(database_url) = self.database_url {
            config.database_url = database_url;
        }
        if let Some(analyst_count) = self.analyst_count {
            config.default_analyst_count = analyst_count;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的目标语言: {}，使用默认语言 (English)",
                    target_language_str
                );
            }
        }

        // 工作流配置
        if let Some(max_concurrent_runs) = self.max_concurrent_runs {
            config.workflow.max_concurrent_runs = max_concurrent_runs;
        }
        if let Some(review_timeout_secs) = self.review_timeout_secs {
            config.workflow.review_timeout_secs = review_timeout_secs;
        }

        // 缓存配置
        if self.enable_cache {
            config.cache.enabled = true;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }

        config.verbose = config.verbose || self.verbose;

        config.validate()?;
        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
