use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::MAX_REVIEW_TIMEOUT_SECS;
use crate::newsroom::agent::AgentError;
use crate::newsroom::context::NewsroomContext;
use crate::newsroom::orchestrator::AgentOrchestrator;
use crate::store::StoreError;
use crate::store::models::{
    Analyst, Expert, Interview, InterviewStatus, ProjectStatus, ResearchProject,
};
use crate::types::{CredibilityAssessment, ExpertProfile};
use crate::utils::threads::do_parallel_with_cancel;

mod runner;

pub use runner::WorkflowRunner;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("工作流已取消")]
    Cancelled,
    #[error("项目 {0} 的工作流正在运行")]
    AlreadyRunning(Uuid),
    #[error("项目当前状态为 {0}，不能生成报告")]
    ReportNotAllowed(ProjectStatus),
    #[error("项目还没有完成的访谈，不能生成报告")]
    NoCompletedInterviews,
}

impl WorkflowError {
    /// 状态推进时发现项目已被并发停止
    fn is_concurrent_stop(&self) -> bool {
        matches!(
            self,
            WorkflowError::Store(StoreError::StaleStatus {
                actual: ProjectStatus::Stopped,
                ..
            })
        )
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(e: sqlx::Error) -> Self {
        WorkflowError::Store(e.into())
    }
}

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<String, Instant>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations.push((phase_name.to_string(), duration));
        Some(duration)
    }

    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 工作流阶段名称
pub struct StageKeys;

impl StageKeys {
    pub const ANALYZE: &'static str = "analyze";
    pub const SCHEDULE: &'static str = "schedule";
    pub const INTERVIEW: &'static str = "interview";
    pub const ASSESS: &'static str = "assess";
    pub const REVIEW: &'static str = "review";
}

/// 一场访谈的执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterviewOutcome {
    Completed,
    Failed,
    /// 已被其它调用方认领
    Skipped,
}

/// 工作流编排器：按固定顺序推进调研项目的各个阶段
pub struct WorkflowSequencer {
    context: NewsroomContext,
    orchestrator: AgentOrchestrator,
}

impl WorkflowSequencer {
    pub fn new(context: NewsroomContext) -> Self {
        let orchestrator = AgentOrchestrator::new(context.clone());
        Self {
            context,
            orchestrator,
        }
    }

    pub fn context(&self) -> &NewsroomContext {
        &self.context
    }

    /// 从项目当前持久化的状态继续执行，返回本次运行结束时的状态
    ///
    /// 失败时错误信息写入项目的`last_error`，取消时项目标记为`stopped`。
    pub async fn run(
        &self,
        project_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<ProjectStatus, WorkflowError> {
        let mut timing = TimingScope::new();
        let result = match self.run_stages(project_id, cancel, &mut timing).await {
            Err(e) if e.is_concurrent_stop() => Err(WorkflowError::Cancelled),
            other => other,
        };

        match &result {
            Ok(status) => tracing::info!("✓ 项目 {} 工作流结束，当前状态: {}", project_id, status),
            Err(WorkflowError::Cancelled) => {
                tracing::warn!("⏹️ 项目 {} 工作流已取消", project_id);
                self.mark_stopped(project_id).await;
            }
            Err(e) => {
                tracing::error!("❌ 项目 {} 工作流失败: {}", project_id, e);
                let pool = &self.context.store.pool;
                if let Err(store_err) =
                    ResearchProject::set_last_error(pool, project_id, Some(&e.to_string())).await
                {
                    tracing::error!("❌ 无法记录项目 {} 的错误: {}", project_id, store_err);
                }
            }
        }

        tracing::info!("⏱️ 项目 {} 执行时间统计\n{}", project_id, timing.generate_timing_report());
        let cache_report = self.context.cache_manager.generate_performance_report();
        if cache_report.total_operations > 0 {
            tracing::info!(
                "💰 缓存命中率 {:.1}%（命中{}，未命中{}），节省tokens: {}输入+{}输出",
                cache_report.hit_rate * 100.0,
                cache_report.cache_hits,
                cache_report.cache_misses,
                cache_report.input_tokens_saved,
                cache_report.output_tokens_saved
            );
        }

        result
    }

    async fn run_stages(
        &self,
        project_id: Uuid,
        cancel: &CancellationToken,
        timing: &mut TimingScope,
    ) -> Result<ProjectStatus, WorkflowError> {
        let pool = &self.context.store.pool;
        let project = ResearchProject::get(pool, project_id).await?;
        let mut status = project.status;

        if status.is_terminal() {
            tracing::info!("项目 {} 已处于终止状态 {}，无需执行", project_id, status);
            return Ok(status);
        }

        tracing::info!("🚀 开始调研工作流: {}（当前状态: {}）", project.topic, status);
        ResearchProject::set_last_error(pool, project_id, None).await?;

        if status == ProjectStatus::Initialized {
            ensure_active(cancel)?;
            timing.start_phase(StageKeys::ANALYZE);
            self.stage_analyze(&project, cancel).await?;
            timing.end_phase(StageKeys::ANALYZE);
            status = ProjectStatus::Analyzing;
        }

        if status == ProjectStatus::Analyzing {
            ensure_active(cancel)?;
            timing.start_phase(StageKeys::SCHEDULE);
            self.stage_schedule(&project).await?;
            timing.end_phase(StageKeys::SCHEDULE);
            status = ProjectStatus::Interviewing;
        }

        if status == ProjectStatus::Interviewing {
            ensure_active(cancel)?;
            timing.start_phase(StageKeys::INTERVIEW);
            self.stage_interview(&project, cancel).await?;
            ResearchProject::advance(
                pool,
                project_id,
                ProjectStatus::Interviewing,
                ProjectStatus::Reviewing,
            )
            .await?;
            timing.end_phase(StageKeys::INTERVIEW);
            status = ProjectStatus::Reviewing;
        }

        if status == ProjectStatus::Reviewing {
            ensure_active(cancel)?;
            timing.start_phase(StageKeys::ASSESS);
            self.stage_assess(&project, cancel).await?;
            timing.end_phase(StageKeys::ASSESS);

            timing.start_phase(StageKeys::REVIEW);
            status = self.await_human_review(project_id, cancel).await?;
            timing.end_phase(StageKeys::REVIEW);
        }

        Ok(status)
    }

    /// 生成分析师；只有生成成功时才会写入分析师并进入analyzing
    async fn stage_analyze(
        &self,
        project: &ResearchProject,
        cancel: &CancellationToken,
    ) -> Result<(), WorkflowError> {
        tracing::info!("🧑‍💼 正在为项目组建 {} 人的分析师团队...", project.analyst_count);
        let count = project.analyst_count.max(0) as usize;
        let profiles =
            guarded(cancel, self.orchestrator.generate_analysts(&project.topic, count)).await??;

        let mut tx = self.context.store.pool.begin().await?;
        for profile in &profiles {
            Analyst::create(&mut tx, project.id, profile).await?;
        }
        ResearchProject::transition(
            &mut tx,
            project.id,
            ProjectStatus::Initialized,
            ProjectStatus::Analyzing,
        )
        .await?;
        tx.commit().await?;

        tracing::info!("✓ 已创建 {} 位分析师", profiles.len());
        Ok(())
    }

    /// 为每位尚无访谈的分析师安排访谈，并进入interviewing
    async fn stage_schedule(&self, project: &ResearchProject) -> Result<(), WorkflowError> {
        let pool = &self.context.store.pool;
        let analysts = Analyst::find_by_project(pool, project.id).await?;

        let mut tx = pool.begin().await?;
        let mut scheduled = 0;
        for analyst in &analysts {
            if Interview::schedule(&mut tx, project.id, analyst.id).await? {
                scheduled += 1;
            }
        }
        ResearchProject::transition(
            &mut tx,
            project.id,
            ProjectStatus::Analyzing,
            ProjectStatus::Interviewing,
        )
        .await?;
        tx.commit().await?;

        tracing::info!("📅 已安排 {} 场访谈", scheduled);
        Ok(())
    }

    /// 并行执行全部待进行的访谈
    async fn stage_interview(
        &self,
        project: &ResearchProject,
        cancel: &CancellationToken,
    ) -> Result<(), WorkflowError> {
        let pool = &self.context.store.pool;

        let reset = Interview::reset_unfinished(pool, project.id).await?;
        if reset > 0 {
            tracing::info!("🔁 重新安排上次未完成的 {} 场访谈", reset);
        }

        let analysts: HashMap<Uuid, Analyst> = Analyst::find_by_project(pool, project.id)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let pending: Vec<(Uuid, Analyst)> = Interview::find_by_project(pool, project.id)
            .await?
            .into_iter()
            .filter(|i| i.status == InterviewStatus::Scheduled)
            .filter_map(|i| analysts.get(&i.analyst_id).map(|a| (i.id, a.clone())))
            .collect();

        let max_parallels = self.context.config.llm.max_parallels;
        tracing::info!(
            "🎙️ 开始 {} 场访谈（最大并发 {}）",
            pending.len(),
            max_parallels
        );

        let futures = pending
            .iter()
            .map(|(interview_id, analyst)| {
                self.conduct_single_interview(project, analyst, *interview_id, cancel)
            })
            .collect::<Vec<_>>();
        let results = do_parallel_with_cancel(futures, max_parallels, cancel).await;
        ensure_active(cancel)?;

        let (mut completed, mut failed) = (0, 0);
        for result in results.into_iter().flatten() {
            match result? {
                InterviewOutcome::Completed => completed += 1,
                InterviewOutcome::Failed => failed += 1,
                InterviewOutcome::Skipped => {}
            }
        }
        tracing::info!("✓ 访谈结束：完成 {} 场，失败 {} 场", completed, failed);
        Ok(())
    }

    /// 认领并执行一场访谈：合成专家、生成提纲、模拟访谈
    async fn conduct_single_interview(
        &self,
        project: &ResearchProject,
        analyst: &Analyst,
        interview_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<InterviewOutcome, WorkflowError> {
        let pool = &self.context.store.pool;
        if !Interview::claim(pool, interview_id).await? {
            tracing::debug!("访谈 {} 已被认领，跳过", interview_id);
            return Ok(InterviewOutcome::Skipped);
        }

        let expert_profile = match guarded(
            cancel,
            self.orchestrator.synthesize_expert(
                &project.topic,
                &analyst.specialization,
                &analyst.expertise,
            ),
        )
        .await?
        {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("⚠️ 专家合成失败，使用默认专家人设: {}", e);
                ExpertProfile::fallback(&analyst.specialization)
            }
        };
        let expert = Expert::create(pool, &expert_profile).await?;
        Interview::attach_expert(pool, interview_id, expert.id).await?;

        let interview = async {
            let questions = self
                .orchestrator
                .generate_interview_questions(
                    &project.topic,
                    &analyst.specialization,
                    &expert.expertise_area,
                )
                .await?;
            let responses = self
                .orchestrator
                .conduct_interview(&questions, &expert.background, &project.topic)
                .await?;
            Ok::<_, AgentError>((questions, responses))
        };

        match guarded(cancel, interview).await? {
            Ok((questions, responses)) => {
                Interview::complete(pool, interview_id, &questions, &responses).await?;
                tracing::info!("✓ {} 与 {} 的访谈完成", analyst.name, expert.name);
                Ok(InterviewOutcome::Completed)
            }
            Err(e) => {
                tracing::warn!("❌ {} 的访谈失败: {}", analyst.name, e);
                Interview::fail(pool, interview_id, &e.to_string()).await?;
                Ok(InterviewOutcome::Failed)
            }
        }
    }

    /// 为每场没有评估结果的已完成访谈做可信度评估，失败时写入中性评估
    async fn stage_assess(
        &self,
        project: &ResearchProject,
        cancel: &CancellationToken,
    ) -> Result<(), WorkflowError> {
        let pool = &self.context.store.pool;
        let pending: Vec<Interview> = Interview::find_by_project(pool, project.id)
            .await?
            .into_iter()
            .filter(|i| i.status == InterviewStatus::Completed && i.assessment.is_none())
            .collect();

        tracing::info!("🔍 评估 {} 场访谈的可信度", pending.len());
        let futures = pending
            .iter()
            .map(|interview| async move {
                let assessment = match self
                    .orchestrator
                    .analyze_credibility(&interview.responses, &project.topic)
                    .await
                {
                    Ok(assessment) => assessment,
                    Err(e) => {
                        tracing::warn!("⚠️ 访谈 {} 的可信度评估失败，写入中性评估: {}", interview.id, e);
                        CredibilityAssessment::unavailable(&e.to_string())
                    }
                };
                Interview::set_assessment(pool, interview.id, &assessment).await
            })
            .collect::<Vec<_>>();

        let results =
            do_parallel_with_cancel(futures, self.context.config.llm.max_parallels, cancel).await;
        ensure_active(cancel)?;
        for result in results.into_iter().flatten() {
            result?;
        }
        Ok(())
    }

    /// 等待人工审阅：批准或停止由人工操作直接写入状态，超时后自动完成
    async fn await_human_review(
        &self,
        project_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<ProjectStatus, WorkflowError> {
        let pool = &self.context.store.pool;
        let workflow = &self.context.config.workflow;
        let window = workflow.review_timeout_secs.min(MAX_REVIEW_TIMEOUT_SECS);
        let deadline = Instant::now() + Duration::from_secs(window);
        let poll_interval = Duration::from_secs(workflow.review_poll_interval_secs.max(1));

        if window > 0 {
            tracing::info!("👀 等待人工审阅，最长 {} 秒", window);
        }

        loop {
            let current = ResearchProject::get(pool, project_id).await?.status;
            if current != ProjectStatus::Reviewing {
                tracing::info!("✓ 审阅已由人工处理，当前状态: {}", current);
                return Ok(current);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
                _ = tokio::time::sleep(remaining.min(poll_interval)) => {}
            }
        }

        match ResearchProject::advance(
            pool,
            project_id,
            ProjectStatus::Reviewing,
            ProjectStatus::Completed,
        )
        .await
        {
            Ok(()) => {
                tracing::info!("✓ 审阅窗口结束，项目自动完成");
                Ok(ProjectStatus::Completed)
            }
            Err(StoreError::StaleStatus { actual, .. }) => Ok(actual),
            Err(e) => Err(e.into()),
        }
    }

    /// 把未终止的项目标记为stopped
    pub(crate) async fn mark_stopped(&self, project_id: Uuid) {
        if let Err(e) = self.stop_project(project_id).await {
            tracing::error!("❌ 无法停止项目 {}: {}", project_id, e);
        }
    }

    /// 把项目推进到stopped，返回项目最终所处的状态
    ///
    /// 已处于终止状态的项目保持不变；与并发的状态推进冲突时按最新状态重试。
    pub(crate) async fn stop_project(&self, project_id: Uuid) -> Result<ProjectStatus, StoreError> {
        let pool = &self.context.store.pool;
        loop {
            let status = ResearchProject::get(pool, project_id).await?.status;
            if status.is_terminal() {
                return Ok(status);
            }
            match ResearchProject::advance(pool, project_id, status, ProjectStatus::Stopped).await {
                Ok(()) => return Ok(ProjectStatus::Stopped),
                Err(StoreError::StaleStatus { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), WorkflowError> {
    if cancel.is_cancelled() {
        return Err(WorkflowError::Cancelled);
    }
    Ok(())
}

/// 在取消令牌触发时放弃等待
async fn guarded<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = T>,
) -> Result<T, WorkflowError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WorkflowError::Cancelled),
        output = future => Ok(output),
    }
}
