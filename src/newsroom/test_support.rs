//! 测试用的脚本化模型后端与上下文

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::llm::client::{CompletionBackend, CompletionRequest};
use crate::newsroom::agent::AgentType;
use crate::newsroom::context::NewsroomContext;
use crate::store::Store;
use crate::store::models::NewsSource;

type Handler = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;

/// 按请求内容返回预设回复的补全后端，并记录全部请求
pub struct ScriptedBackend {
    handler: Handler,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(
        handler: impl Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// 每个智能体都返回合法回复
    pub fn newsroom() -> Arc<Self> {
        Self::new(newsroom_reply)
    }

    /// 所有调用都失败
    pub fn failing(message: &'static str) -> Arc<Self> {
        Self::new(move |_| Err(anyhow!(message)))
    }

    /// 指定智能体的调用失败，其余正常返回
    pub fn failing_for(agent: AgentType, message: &'static str) -> Arc<Self> {
        Self::new(move |request| {
            if request.log_tag == agent.as_str() {
                Err(anyhow!(message))
            } else {
                newsroom_reply(request)
            }
        })
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, agent: AgentType) -> usize {
        self.calls()
            .iter()
            .filter(|request| request.log_tag == agent.as_str())
            .count()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        (self.handler)(request)
    }
}

/// 各智能体的标准回复
pub fn newsroom_reply(request: &CompletionRequest) -> Result<String> {
    let reply = match request.log_tag.as_str() {
        "analyst_generator" => json!({
            "analysts": (1..=10)
                .map(|i| json!({
                    "name": format!("Analyst {}", i),
                    "specialization": format!("Field {}", i),
                    "background": "Ten years on the investigations desk",
                    "expertise": ["verification", "data"],
                }))
                .collect::<Vec<_>>()
        }),
        "expert_synthesizer" => json!({
            "name": "Dr. Rivera",
            "expertise_area": "Media studies",
            "background": "Twenty years at a fact-checking organisation",
            "credibility_score": 0.85,
        }),
        "question_generator" => json!({
            "questions": ["What happened?", "Who is affected?", "What is disputed?"]
        }),
        "interview_simulator" => json!({
            "responses": (1..=10)
                .map(|i| json!({
                    "question": format!("Question {}", i),
                    "answer": format!("Documented answer {}", i),
                    "sources": ["Reuters"],
                }))
                .collect::<Vec<_>>()
        }),
        "credibility_analyzer" => json!({
            "score": 0.82,
            "flags": [],
            "narrative": "Consistent and well sourced.",
        }),
        "report_synthesizer" => json!({
            "executive_summary": "Summary of findings",
            "key_findings": ["Finding one"],
            "credibility_score": 0.1,
            "experts_consulted": 99,
        }),
        other => return Err(anyhow!("unexpected agent {}", other)),
    };
    Ok(reply.to_string())
}

/// 基于内存数据库的上下文
pub async fn test_context(backend: Arc<ScriptedBackend>) -> NewsroomContext {
    test_context_with(Config::default(), backend).await
}

pub async fn test_context_with(config: Config, backend: Arc<ScriptedBackend>) -> NewsroomContext {
    let store = Store::in_memory().await.expect("in-memory store");
    NewsSource::seed_defaults(&store.pool)
        .await
        .expect("seed news sources");
    NewsroomContext::new(config, backend, store)
}
