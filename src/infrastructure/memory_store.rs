//! 内存记录存储 - 基础设施层
//!
//! 与 Postgres 存储语义一致（排序、版本校验、全有或全无的提交），
//! 并支持故障注入，供测试和本地调试使用。

use crate::error::{StoreError, StoreResult};
use crate::infrastructure::record_store::RecordStore;
use crate::models::{BatchRequest, DocumentId, DocumentRecord, FieldUpdates};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// 注入到某个文档提交上的故障
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitFault {
    /// 返回并发冲突
    Conflict,
    /// 返回存储不可用
    Unavailable,
    /// 已写入部分字段后失败（工作副本被丢弃）
    MidCommit,
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<DocumentId, DocumentRecord>,
    fetch_failure: Option<String>,
    commit_faults: HashMap<DocumentId, CommitFault>,
    commit_attempts: Vec<DocumentId>,
    committed: Vec<(DocumentId, FieldUpdates)>,
}

/// 内存记录存储
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = DocumentRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: DocumentRecord) {
        self.lock().records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &DocumentId) -> Option<DocumentRecord> {
        self.lock().records.get(id).cloned()
    }

    /// 下一次取批次时返回 `Unavailable`
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        self.lock().fetch_failure = Some(message.into());
    }

    /// 对某个文档的提交注入故障（一次性）
    pub fn fail_commit(&self, id: impl Into<DocumentId>, fault: CommitFault) {
        self.lock().commit_faults.insert(id.into(), fault);
    }

    /// 所有提交尝试（包括失败的）
    pub fn commit_attempts(&self) -> Vec<DocumentId> {
        self.lock().commit_attempts.clone()
    }

    /// 成功提交的记录
    pub fn committed(&self) -> Vec<(DocumentId, FieldUpdates)> {
        self.lock().committed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // 测试中 panic 会毒化锁，这里直接继续使用内部数据
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_batch(&self, request: &BatchRequest) -> StoreResult<Vec<DocumentRecord>> {
        let mut inner = self.lock();
        if let Some(message) = inner.fetch_failure.take() {
            return Err(StoreError::Unavailable(message));
        }

        let filter = &request.filter;
        let records = inner
            .records
            .values()
            .filter(|record| match &filter.document_ids {
                Some(ids) => ids.contains(&record.id),
                None => !record.is_complete(),
            })
            .filter(|record| match &filter.after_id {
                Some(after) => &record.id > after,
                None => true,
            })
            .take(request.limit)
            .cloned()
            .collect();
        Ok(records)
    }

    async fn commit(
        &self,
        id: &DocumentId,
        expected_version: i64,
        updates: &FieldUpdates,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.commit_attempts.push(id.clone());

        let fault = inner.commit_faults.remove(id);
        let current = inner
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::CommitConflict { id: id.clone() })?;

        match fault {
            Some(CommitFault::Conflict) => {
                return Err(StoreError::CommitConflict { id: id.clone() })
            }
            Some(CommitFault::Unavailable) => {
                return Err(StoreError::Unavailable("注入的连接中断".to_string()))
            }
            _ => {}
        }
        if current.version != expected_version {
            return Err(StoreError::CommitConflict { id: id.clone() });
        }

        // 在工作副本上写入，成功后整体替换
        let mut working = current;
        if fault == Some(CommitFault::MidCommit) {
            let first_field_only = FieldUpdates {
                caption: updates.caption.clone(),
                ..FieldUpdates::default()
            };
            first_field_only.apply_to(&mut working);
            return Err(StoreError::Unavailable("提交过程中连接中断".to_string()));
        }
        updates.apply_to(&mut working);
        working.version += 1;
        working.updated_at = Utc::now();

        inner.records.insert(id.clone(), working);
        inner.committed.push((id.clone(), updates.clone()));
        Ok(())
    }

    async fn unfinished(&self, ids: &[DocumentId]) -> StoreResult<Vec<DocumentId>> {
        let inner = self.lock();
        Ok(ids
            .iter()
            .filter(|id| {
                inner
                    .records
                    .get(*id)
                    .map(|record| !record.is_complete())
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
