//! 应用装配
//!
//! 按配置创建记录存储、HTTP 客户端和增强服务，组装路由并启动服务。

use crate::clients::{build_http_client, PayloadLoader};
use crate::config::{Config, StoreBackend};
use crate::infrastructure::{MemoryRecordStore, PgRecordStore, RecordStore};
use crate::orchestrator::BatchProcessor;
use crate::routes::{self, AppState};
use crate::services::EnrichmentService;
use crate::utils::logging::log_startup;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    state: Arc<AppState>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let store = build_store(&config).await?;

        let http = build_http_client(&config).context("创建 HTTP 客户端失败")?;
        let payloads = Arc::new(PayloadLoader::new(http.clone(), config.payload_root.clone()));
        let enrichment = EnrichmentService::from_config(http, &config);

        let processor = BatchProcessor::new(store.clone(), payloads, enrichment);
        let state = Arc::new(AppState::new(processor, store, config));

        Ok(Self { state })
    }

    /// 启动 HTTP 服务，直到进程退出
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_addr.clone();
        let app = routes::router(self.state);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("绑定地址 {} 失败", addr))?;
        info!("✓ 服务已启动: http://{}", addr);

        axum::serve(listener, app).await.context("HTTP 服务异常退出")?;
        Ok(())
    }
}

async fn build_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let store = PgRecordStore::connect(config)
                .await
                .context("连接数据库失败")?;
            if config.run_migrations {
                store.migrate().await.context("数据库迁移失败")?;
            }
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("⚠️ 使用内存存储，重启后数据丢失");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
    }
}
