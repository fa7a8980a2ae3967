use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;
use crate::store::models::MAX_ANALYST_COUNT;

/// 人工审阅窗口上限（7天）
pub const MAX_REVIEW_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 是否支持OpenAI风格的`response_format: json_object`参数
    pub fn supports_json_mode(&self) -> bool {
        matches!(
            self,
            LLMProvider::OpenAI | LLMProvider::DeepSeek | LLMProvider::OpenRouter
        )
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// HTTP服务监听地址
    pub bind_address: String,

    /// 数据库连接串
    pub database_url: String,

    /// 报告目标语言
    pub target_language: TargetLanguage,

    /// 每个调研项目默认生成的分析师数量
    pub default_analyst_count: usize,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 工作流配置
    pub workflow: WorkflowConfig,

    /// 缓存配置
    pub cache: CacheConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，优先用于常规的角色生成与访谈任务
    pub model_efficient: String,

    /// 高质量模型，用于长上下文的报告综合，以及作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 单个项目内访谈的最大并发数
    pub max_parallels: usize,

    /// 报告综合时访谈素材的token预算
    pub max_prompt_tokens: usize,
}

/// 工作流配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WorkflowConfig {
    /// 同时运行的工作流数量上限
    pub max_concurrent_runs: usize,

    /// 人工审阅窗口（秒），超时后自动完成
    pub review_timeout_secs: u64,

    /// 人工审阅期间的状态轮询间隔（秒）
    pub review_poll_interval_secs: u64,
}

/// 缓存配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,

    /// 缓存目录
    pub cache_dir: PathBuf,

    /// 缓存过期时间（小时）
    pub expire_hours: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 校验配置是否可用
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_ANALYST_COUNT as usize).contains(&self.default_analyst_count) {
            anyhow::bail!(
                "default_analyst_count must be within [1, {}]",
                MAX_ANALYST_COUNT
            );
        }
        if self.workflow.max_concurrent_runs == 0 {
            anyhow::bail!("workflow.max_concurrent_runs must be at least 1");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be within [0, 2]");
        }
        if self.workflow.review_timeout_secs > MAX_REVIEW_TIMEOUT_SECS {
            anyhow::bail!(
                "workflow.review_timeout_secs must not exceed {}",
                MAX_REVIEW_TIMEOUT_SECS
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1:8000"),
            database_url: String::from("sqlite://newsroom.db"),
            target_language: TargetLanguage::default(),
            default_analyst_count: 3,
            llm: LLMConfig::default(),
            workflow: WorkflowConfig::default(),
            cache: CacheConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("NEWSROOM_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model_efficient: String::from("gpt-4o-mini"),
            model_powerful: String::from("gpt-4o"),
            max_tokens: 16384,
            temperature: 0.3,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
            max_parallels: 3,
            max_prompt_tokens: 24000,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 4,
            review_timeout_secs: 300,
            review_poll_interval_secs: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cache_dir: PathBuf::from(".newsroom/cache"),
            expire_hours: 72,
        }
    }
}
