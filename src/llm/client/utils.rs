use crate::{
    config::LLMConfig, llm::client::types::TokenUsage, utils::token_estimator::TokenEstimator,
};

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_ESTIMATOR: LazyLock<TokenEstimator> = LazyLock::new(TokenEstimator::new);

static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok());

/// 根据prompt长度选择模型，短prompt使用高能效模型并以高质量模型兜底
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= 32 * 1024 {
        let fallover = if llm_config.model_powerful != llm_config.model_efficient {
            Some(llm_config.model_powerful.clone())
        } else {
            None
        };
        return (llm_config.model_efficient.clone(), fallover);
    }
    (llm_config.model_powerful.clone(), None)
}

/// 估算token使用情况（基于文本长度）
pub fn estimate_token_usage(input_text: &str, output_text: &str) -> TokenUsage {
    let input_estimate = TOKEN_ESTIMATOR.estimate_tokens(input_text);
    let output_estimate = TOKEN_ESTIMATOR.estimate_tokens(output_text);
    TokenUsage::new(
        input_estimate.estimated_tokens,
        output_estimate.estimated_tokens,
    )
}

/// 从模型回复中取出JSON正文
///
/// 兼容Markdown代码块包裹以及正文前后夹杂说明文字的情况。
pub fn extract_json_body(reply: &str) -> &str {
    let trimmed = reply.trim();
    let fenced = CODE_FENCE
        .as_ref()
        .and_then(|pattern| pattern.captures(trimmed))
        .and_then(|captures| captures.get(1));
    if let Some(body) = fenced {
        return body.as_str();
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
