use std::fmt::Display;

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::i18n::TargetLanguage;
use crate::llm::client::CompletionRequest;
use crate::llm::client::utils::{estimate_token_usage, extract_json_body};
use crate::newsroom::context::NewsroomContext;

/// 智能体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    AnalystGenerator,
    ExpertSynthesizer,
    QuestionGenerator,
    InterviewSimulator,
    CredibilityAnalyzer,
    ReportSynthesizer,
}

impl AgentType {
    /// 日志标签与缓存目录名
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::AnalystGenerator => "analyst_generator",
            AgentType::ExpertSynthesizer => "expert_synthesizer",
            AgentType::QuestionGenerator => "question_generator",
            AgentType::InterviewSimulator => "interview_simulator",
            AgentType::CredibilityAnalyzer => "credibility_analyzer",
            AgentType::ReportSynthesizer => "report_synthesizer",
        }
    }
}

impl Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            AgentType::AnalystGenerator => "分析师生成",
            AgentType::ExpertSynthesizer => "专家合成",
            AgentType::QuestionGenerator => "访谈提纲",
            AgentType::InterviewSimulator => "访谈模拟",
            AgentType::CredibilityAnalyzer => "可信度分析",
            AgentType::ReportSynthesizer => "报告撰写",
        };
        write!(f, "{}", str)
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("[{agent}] 模型调用失败: {message}")]
    Transport { agent: AgentType, message: String },
    #[error("[{agent}] 模型回复不是合法的JSON: {message}")]
    MalformedReply { agent: AgentType, message: String },
    #[error("[{agent}] 模型回复不符合要求: {reason}")]
    InvalidReply { agent: AgentType, reason: String },
    #[error("[{agent}] 输入无效: {reason}")]
    InvalidInput { agent: AgentType, reason: String },
}

impl AgentError {
    pub fn agent(&self) -> AgentType {
        match self {
            AgentError::Transport { agent, .. }
            | AgentError::MalformedReply { agent, .. }
            | AgentError::InvalidReply { agent, .. }
            | AgentError::InvalidInput { agent, .. } => *agent,
        }
    }
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
}

/// 标准的智能体Prompt构建器
pub struct AgentPromptBuilder {
    template: PromptTemplate,
}

impl AgentPromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// 构建完整请求：系统提示词附加语言指令，用户提示词依次为
    /// 开头指令、（可选）日期、调研材料、回复格式和结尾指令
    pub fn build_request<R: JsonSchema>(
        &self,
        agent: AgentType,
        language: &TargetLanguage,
        material: &str,
        include_timestamp: bool,
    ) -> CompletionRequest {
        let system_prompt = format!(
            "{}\n\n{}",
            self.template.system_prompt,
            language.prompt_instruction()
        );

        let mut prompt = String::new();
        prompt.push_str(&self.template.opening_instruction);
        prompt.push_str("\n\n");

        if include_timestamp {
            prompt.push_str(&format!(
                "## Current date\n{} (UTC)\n\n",
                chrono::Utc::now().format("%Y-%m-%d")
            ));
        }

        prompt.push_str("## Research material\n");
        prompt.push_str(material);
        prompt.push_str("\n\n");

        let schema = serde_json::to_string_pretty(&schema_for!(R)).unwrap_or_default();
        prompt.push_str(
            "## Reply format\nReply with a single JSON object that validates against this JSON schema, without any commentary:\n```json\n",
        );
        prompt.push_str(&schema);
        prompt.push_str("\n```\n");

        prompt.push_str(&self.template.closing_instruction);

        CompletionRequest::new(system_prompt, prompt, agent.as_str())
    }
}

/// 单步智能体：构建prompt、调用模型、解析并校验结构化回复
#[async_trait]
pub trait NewsroomAgent: Send + Sync {
    type Input: Send + Sync;
    /// 模型回复的JSON结构
    type Reply: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static;
    type Output: Send;

    fn agent_type(&self) -> AgentType;

    fn prompt_template(&self) -> PromptTemplate;

    /// 把输入整理为prompt中的调研材料
    fn format_material(&self, context: &NewsroomContext, input: &Self::Input) -> String;

    /// 校验并整理模型回复，返回的错误信息会成为[`AgentError::InvalidReply`]
    fn validate(&self, input: &Self::Input, reply: &Self::Reply) -> Result<Self::Output, String>;

    /// 调用模型前的输入检查
    fn check_input(&self, _input: &Self::Input) -> Result<(), String> {
        Ok(())
    }

    /// 是否在prompt中包含当前日期
    fn should_include_timestamp(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        context: &NewsroomContext,
        input: &Self::Input,
    ) -> Result<Self::Output, AgentError> {
        let agent = self.agent_type();
        self.check_input(input)
            .map_err(|reason| AgentError::InvalidInput { agent, reason })?;

        let material = self.format_material(context, input);
        let request = AgentPromptBuilder::new(self.prompt_template()).build_request::<Self::Reply>(
            agent,
            &context.config.target_language,
            &material,
            self.should_include_timestamp(),
        );
        let cache_scope = agent.as_str();
        let cache_key = request.cache_key();

        match context
            .cache_manager
            .get::<Self::Reply>(cache_scope, &cache_key)
            .await
        {
            Ok(Some(cached)) => match self.validate(input, &cached) {
                Ok(output) => return Ok(output),
                Err(reason) => {
                    tracing::warn!("[{}] 缓存结果校验失败，重新调用模型: {}", agent, reason)
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("[{}] 读取缓存失败: {}", agent, e),
        }

        let raw = context
            .backend
            .complete(&request)
            .await
            .map_err(|e| AgentError::Transport {
                agent,
                message: format!("{:#}", e),
            })?;

        let reply: Self::Reply =
            serde_json::from_str(extract_json_body(&raw)).map_err(|e| {
                tracing::debug!("[{}] 无法解析的模型回复: {}", agent, raw);
                AgentError::MalformedReply {
                    agent,
                    message: e.to_string(),
                }
            })?;

        let output = self
            .validate(input, &reply)
            .map_err(|reason| AgentError::InvalidReply { agent, reason })?;

        if let Err(e) = context
            .cache_manager
            .set_with_tokens(
                cache_scope,
                &cache_key,
                &reply,
                estimate_token_usage(&cache_key, &raw),
            )
            .await
        {
            tracing::warn!("[{}] 写入缓存失败: {}", agent, e);
        }

        tracing::debug!("✅ Sub-Agent [{}]执行完成", agent);
        Ok(output)
    }
}

/// 去掉首尾空白、丢弃空串并按首次出现的顺序去重（不区分大小写）
pub(crate) fn normalize_distinct(items: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, JsonSchema)]
    struct ProbeReply {
        /// 探针字段
        value: String,
    }

    fn template() -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a probe.".to_string(),
            opening_instruction: "Open.".to_string(),
            closing_instruction: "Close.".to_string(),
        }
    }

    #[test]
    fn test_request_layout() {
        let request = AgentPromptBuilder::new(template()).build_request::<ProbeReply>(
            AgentType::QuestionGenerator,
            &TargetLanguage::Spanish,
            "material body",
            false,
        );

        assert_eq!(request.log_tag, "question_generator");
        assert!(request.system_prompt.starts_with("You are a probe."));
        assert!(request.system_prompt.ends_with(TargetLanguage::Spanish.prompt_instruction()));

        let user = &request.user_prompt;
        let open = user.find("Open.").unwrap();
        let material = user.find("material body").unwrap();
        let schema = user.find("\"value\"").unwrap();
        let close = user.rfind("Close.").unwrap();
        assert!(open < material && material < schema && schema < close);
        assert!(!user.contains("## Current date"));
    }

    #[test]
    fn test_request_with_timestamp() {
        let request = AgentPromptBuilder::new(template()).build_request::<ProbeReply>(
            AgentType::ReportSynthesizer,
            &TargetLanguage::English,
            "material",
            true,
        );
        assert!(request.user_prompt.contains("## Current date"));
    }

    #[test]
    fn test_normalize_distinct() {
        let items = vec![
            " What changed? ".to_string(),
            "".to_string(),
            "what changed?".to_string(),
            "Who benefits?".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(
            normalize_distinct(&items),
            vec!["What changed?".to_string(), "Who benefits?".to_string()]
        );
    }

    #[test]
    fn test_agent_error_reports_agent() {
        let err = AgentError::InvalidReply {
            agent: AgentType::AnalystGenerator,
            reason: "too few".to_string(),
        };
        assert_eq!(err.agent(), AgentType::AnalystGenerator);
        assert!(err.to_string().contains("too few"));
    }
}
