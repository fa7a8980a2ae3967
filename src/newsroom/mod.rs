//! 新闻调研工作流：智能体、编排器与阶段推进

use anyhow::{Context, Result, anyhow};

use crate::config::Config;
use crate::llm::client::LLMClient;
use crate::store::models::{ProjectStatus, ResearchProject};

pub mod agent;
pub mod agents;
pub mod context;
pub mod orchestrator;
pub mod report;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::NewsroomContext;
pub use orchestrator::AgentOrchestrator;
pub use workflow::{WorkflowError, WorkflowRunner, WorkflowSequencer};

/// 启动服务；指定`topic`时改为对单个主题执行一次完整调研并输出报告
pub async fn launch(config: &Config, topic: Option<String>) -> Result<()> {
    let llm_client = LLMClient::new(config.llm.clone())?;

    match topic {
        Some(topic) => {
            llm_client.check_connection().await?;
            // 命令行模式下没有人工审阅
            let mut config = config.clone();
            config.workflow.review_timeout_secs = 0;
            let context = NewsroomContext::from_config(&config, llm_client).await?;
            run_once(context, &topic).await
        }
        None => {
            if let Err(e) = llm_client.check_connection().await {
                tracing::warn!("⚠️ 模型连接检查失败，服务仍将启动: {}", e);
            }
            let context = NewsroomContext::from_config(config, llm_client).await?;
            crate::server::serve(context).await
        }
    }
}

async fn run_once(context: NewsroomContext, topic: &str) -> Result<()> {
    let project = ResearchProject::create(
        &context.store.pool,
        topic,
        u32::try_from(context.config.default_analyst_count).unwrap_or(u32::MAX),
    )
    .await?;
    tracing::info!("📰 已创建调研项目 {}", project.id);

    let runner = WorkflowRunner::new(context.clone());
    let mut handle = runner.trigger(project.id)?;

    let status = tokio::select! {
        joined = &mut handle => joined.context("工作流任务异常退出")??,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("收到中断信号，正在停止工作流...");
            runner.cancel(project.id);
            handle.await.context("工作流任务异常退出")??
        }
    };

    if status != ProjectStatus::Completed {
        let project = ResearchProject::get(&context.store.pool, project.id).await?;
        return Err(anyhow!(
            "调研未完成，项目状态为 {}{}",
            status,
            project
                .last_error
                .map(|e| format!("：{}", e))
                .unwrap_or_default()
        ));
    }

    let report = report::compose_final_report(&context, project.id).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
