//! HTTP 接口层
//!
//! 触发批处理、按文档处理、查询处理状态和健康检查。
//! 同一时间只允许一个批处理运行，其余触发返回 409。

pub mod batch;
pub mod health;

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::RecordStore;
use crate::orchestrator::BatchProcessor;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::trace::TraceLayer;

/// 接口共享状态
pub struct AppState {
    pub processor: BatchProcessor,
    pub store: Arc<dyn RecordStore>,
    pub config: Config,
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(processor: BatchProcessor, store: Arc<dyn RecordStore>, config: Config) -> Self {
        Self {
            processor,
            store,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// 获取单飞锁，已有批处理在运行时返回 `Busy`
    ///
    /// 请求被取消时 guard 随之释放。
    pub fn try_begin_run(&self) -> Result<MutexGuard<'_, ()>, AppError> {
        self.run_lock.try_lock().map_err(|_| AppError::Busy)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/process-batch", post(batch::process_batch))
        .route("/process-documents", post(batch::process_documents))
        .route("/processing-status", post(batch::processing_status))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
