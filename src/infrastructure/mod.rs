//! 基础设施层
//!
//! 持有稀缺资源（数据库连接池），只暴露存储能力

pub mod memory_store;
pub mod pg_store;
pub mod record_store;

pub use memory_store::{CommitFault, MemoryRecordStore};
pub use pg_store::PgRecordStore;
pub use record_store::RecordStore;
