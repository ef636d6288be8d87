//! # Enrich Batch
//!
//! 文档增强批处理服务：对尚未处理完的文档依次执行
//! 图片描述、文字识别、人脸识别，并把结果一次性写回存储。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有数据库连接池，只暴露存储能力
//! - `RecordStore` - 取批、事务提交、状态查询
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 三个增强服务的 HTTP 客户端和文档内容读取
//!
//! ### ③ 业务能力层（Services）
//! - `step_policy` - 判定哪些步骤待处理
//! - `EnrichmentService` - 步骤到客户端的映射
//!
//! ### ④ 流程层（Workflow）
//! - `DocumentFlow` - 单个文档的状态机（执行 → 提交）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `BatchProcessor` - 取批、逐个处理、汇总报告
//!
//! ### ⑥ 接口层（Routes）
//! - `routes/` - HTTP 触发接口

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod routes;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, ClientError, ConfigError, StoreError};
pub use models::{BatchReport, DocumentId, DocumentRecord, Step};
pub use orchestrator::BatchProcessor;
pub use workflow::{DocumentCtx, DocumentFlow};
