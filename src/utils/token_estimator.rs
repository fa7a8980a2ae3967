/// Token估算器，用于在提交前粗略估计prompt体积
pub struct TokenEstimator {
    rules: TokenCalculationRules,
}

/// Token计算规则
#[derive(Debug, Clone)]
pub struct TokenCalculationRules {
    /// 拉丁字符的平均token比例（字符数/token数）
    pub latin_char_per_token: f64,
    /// CJK字符的平均token比例
    pub cjk_char_per_token: f64,
    /// 基础token开销（消息封装等）
    pub base_token_overhead: usize,
}

impl Default for TokenCalculationRules {
    fn default() -> Self {
        Self {
            // 基于GPT系列模型的经验值
            latin_char_per_token: 4.0,
            cjk_char_per_token: 1.5,
            base_token_overhead: 50,
        }
    }
}

/// Token估算结果
#[derive(Debug, Clone)]
pub struct TokenEstimation {
    pub estimated_tokens: usize,
    pub character_count: usize,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self {
            rules: TokenCalculationRules::default(),
        }
    }

    /// 估算文本的token数量
    pub fn estimate_tokens(&self, text: &str) -> TokenEstimation {
        let character_count = text.chars().count();
        let cjk_count = text.chars().filter(|c| is_cjk_char(*c)).count();
        let latin_count = character_count - cjk_count;

        let cjk_tokens = (cjk_count as f64 / self.rules.cjk_char_per_token).ceil() as usize;
        let latin_tokens = (latin_count as f64 / self.rules.latin_char_per_token).ceil() as usize;

        TokenEstimation {
            estimated_tokens: cjk_tokens + latin_tokens + self.rules.base_token_overhead,
            character_count,
        }
    }

    /// 检查文本是否超过token限制
    pub fn exceeds_limit(&self, text: &str, limit: usize) -> bool {
        self.estimate_tokens(text).estimated_tokens > limit
    }

    /// 将文本截断到大致不超过`budget`个token，按字符边界截断
    pub fn truncate_to_budget(&self, text: &str, budget: usize) -> String {
        if !self.exceeds_limit(text, budget) {
            return text.to_string();
        }
        let usable = budget.saturating_sub(self.rules.base_token_overhead + 1);
        // 按最保守的CJK比例换算字符数，确保截断后不超预算
        let max_chars = (usable as f64 * self.rules.cjk_char_per_token).floor() as usize;
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push('…');
        truncated
    }
}

/// 判断是否为CJK字符
fn is_cjk_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF |
        0x3400..=0x4DBF |
        0x3040..=0x30FF |
        0xAC00..=0xD7AF |
        0x20000..=0x2A6DF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_latin_text() {
        let estimator = TokenEstimator::new();
        let estimation = estimator.estimate_tokens("abcdefgh");
        assert_eq!(estimation.character_count, 8);
        assert_eq!(estimation.estimated_tokens, 2 + 50);
    }

    #[test]
    fn test_estimate_cjk_text() {
        let estimator = TokenEstimator::new();
        let estimation = estimator.estimate_tokens("新闻调研");
        assert_eq!(estimation.estimated_tokens, 3 + 50);
    }

    #[test]
    fn test_truncate_within_budget_is_noop() {
        let estimator = TokenEstimator::new();
        assert_eq!(estimator.truncate_to_budget("short", 1000), "short");
    }

    #[test]
    fn test_truncate_over_budget() {
        let estimator = TokenEstimator::new();
        let text = "word ".repeat(2000);
        let truncated = estimator.truncate_to_budget(&text, 200);
        assert!(truncated.len() < text.len());
        assert!(truncated.ends_with('…'));
        assert!(!estimator.exceeds_limit(&truncated, 200));
    }
}
