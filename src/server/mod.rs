//! HTTP接口

use anyhow::{Context, Result};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use crate::newsroom::{NewsroomContext, WorkflowRunner};

pub mod error;
pub mod response;
pub mod routes;

pub use error::ApiError;
pub use response::ApiResponse;

/// 各路由共享的状态
#[derive(Clone)]
pub struct AppState {
    pub runner: WorkflowRunner,
}

impl AppState {
    pub fn new(context: NewsroomContext) -> Self {
        Self {
            runner: WorkflowRunner::new(context),
        }
    }

    pub fn context(&self) -> &NewsroomContext {
        self.runner.context()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.runner.context().store.pool
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 在配置的地址上启动HTTP服务，直到收到Ctrl-C
pub async fn serve(context: NewsroomContext) -> Result<()> {
    let bind_address = context.config.bind_address.clone();
    let app = router(AppState::new(context));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("无法监听地址 {}", bind_address))?;
    tracing::info!("🌐 服务已启动: http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("收到中断信号，服务正在关闭...");
            }
        })
        .await?;
    Ok(())
}
