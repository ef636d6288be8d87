//! 记录存储接口 - 基础设施层
//!
//! 只暴露"取一批"和"提交一个文档"的能力，不关心流程

use crate::error::StoreResult;
use crate::models::{BatchRequest, DocumentId, DocumentRecord, FieldUpdates};
use async_trait::async_trait;
use std::sync::Arc;

/// 文档记录存储
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 取一批候选文档
    ///
    /// 未指定文档时只返回至少有一个待处理步骤的文档；结果按标识排序，
    /// 数量不超过 `request.limit`。
    async fn fetch_batch(&self, request: &BatchRequest) -> StoreResult<Vec<DocumentRecord>>;

    /// 在单个事务中提交一个文档的全部字段更新
    ///
    /// `expected_version` 与存储中的版本不一致时返回 `CommitConflict`。
    /// 失败时不会有任何字段被写入。
    async fn commit(
        &self,
        id: &DocumentId,
        expected_version: i64,
        updates: &FieldUpdates,
    ) -> StoreResult<()>;

    /// 给定文档中尚未全部完成的文档（不存在的文档也算未完成）
    async fn unfinished(&self, ids: &[DocumentId]) -> StoreResult<Vec<DocumentId>>;

    /// 健康检查
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn fetch_batch(&self, request: &BatchRequest) -> StoreResult<Vec<DocumentRecord>> {
        (**self).fetch_batch(request).await
    }

    async fn commit(
        &self,
        id: &DocumentId,
        expected_version: i64,
        updates: &FieldUpdates,
    ) -> StoreResult<()> {
        (**self).commit(id, expected_version, updates).await
    }

    async fn unfinished(&self, ids: &[DocumentId]) -> StoreResult<Vec<DocumentId>> {
        (**self).unfinished(ids).await
    }

    async fn ping(&self) -> StoreResult<()> {
        (**self).ping().await
    }
}
