use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::newsroom::context::NewsroomContext;
use crate::newsroom::workflow::{WorkflowError, WorkflowSequencer};
use crate::store::models::ProjectStatus;

/// 后台工作流运行池
///
/// 同时运行的工作流数量受`workflow.max_concurrent_runs`限制，
/// 同一项目同一时刻只允许一个运行。
#[derive(Clone)]
pub struct WorkflowRunner {
    sequencer: Arc<WorkflowSequencer>,
    permits: Arc<Semaphore>,
    running: Arc<DashMap<Uuid, CancellationToken>>,
}

impl WorkflowRunner {
    pub fn new(context: NewsroomContext) -> Self {
        let max_runs = context.config.workflow.max_concurrent_runs.max(1);
        Self {
            sequencer: Arc::new(WorkflowSequencer::new(context)),
            permits: Arc::new(Semaphore::new(max_runs)),
            running: Arc::new(DashMap::new()),
        }
    }

    pub fn context(&self) -> &NewsroomContext {
        self.sequencer.context()
    }

    /// 在后台启动项目的工作流，项目已在运行时返回[`WorkflowError::AlreadyRunning`]
    pub fn trigger(
        &self,
        project_id: Uuid,
    ) -> Result<JoinHandle<Result<ProjectStatus, WorkflowError>>, WorkflowError> {
        let token = CancellationToken::new();
        match self.running.entry(project_id) {
            Entry::Occupied(_) => return Err(WorkflowError::AlreadyRunning(project_id)),
            Entry::Vacant(entry) => {
                entry.insert(token.clone());
            }
        }

        let runner = self.clone();
        Ok(tokio::spawn(async move {
            // 任务结束或panic展开时都会移除运行记录
            let _registration = RunRegistration {
                running: runner.running.clone(),
                project_id,
            };
            runner.run_with_permit(project_id, &token).await
        }))
    }

    async fn run_with_permit(
        &self,
        project_id: Uuid,
        token: &CancellationToken,
    ) -> Result<ProjectStatus, WorkflowError> {
        let _permit = tokio::select! {
            biased;
            _ = token.cancelled() => {
                self.sequencer.mark_stopped(project_id).await;
                return Err(WorkflowError::Cancelled);
            }
            permit = self.permits.clone().acquire_owned() => {
                permit.map_err(|_| WorkflowError::Cancelled)?
            }
        };
        self.sequencer.run(project_id, token).await
    }

    /// 取消正在运行的工作流，项目没有在运行时返回false
    pub fn cancel(&self, project_id: Uuid) -> bool {
        match self.running.get(&project_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// 停止项目：取消正在运行的工作流，并把未终止的项目标记为stopped
    pub async fn stop(&self, project_id: Uuid) -> Result<ProjectStatus, WorkflowError> {
        if self.cancel(project_id) {
            tracing::info!("⏹️ 已取消项目 {} 的工作流", project_id);
        }
        Ok(self.sequencer.stop_project(project_id).await?)
    }

    pub fn is_running(&self, project_id: Uuid) -> bool {
        self.running.contains_key(&project_id)
    }
}

/// 项目在运行表中的登记，释放时注销
struct RunRegistration {
    running: Arc<DashMap<Uuid, CancellationToken>>,
    project_id: Uuid,
}

impl Drop for RunRegistration {
    fn drop(&mut self) {
        self.running.remove(&self.project_id);
    }
}
