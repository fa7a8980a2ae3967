use serde::{Deserialize, Serialize};

/// 单次模型调用的token使用情况
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

impl TokenUsage {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// 一次补全请求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// 发起调用的Agent标识，用于日志与缓存分类
    pub log_tag: String,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        log_tag: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            log_tag: log_tag.into(),
        }
    }

    /// 缓存键使用的完整prompt文本
    pub fn cache_key(&self) -> String {
        format!("{}\n\n{}", self.system_prompt, self.user_prompt)
    }
}
