//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，不做具体业务判断。
//!
//! ## 层次关系
//!
//! ```text
//! routes (HTTP 触发)
//!     ↓
//! batch_processor (处理 Vec<DocumentRecord>)
//!     ↓
//! workflow::DocumentFlow (处理单个文档)
//!     ↓
//! services (能力层：step_policy / enrichment)
//!     ↓
//! clients / infrastructure (外部服务、记录存储)
//! ```

pub mod batch_processor;

pub use batch_processor::BatchProcessor;
