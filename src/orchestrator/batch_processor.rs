//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **取批**：从记录存储取一批候选文档
//! 2. **逐个处理**：委托 `DocumentFlow` 处理单个文档，串行执行
//! 3. **汇总统计**：把每个文档的结果汇总成 `BatchReport`
//!
//! ## 失败边界
//!
//! - 取批失败是整个调用的失败，直接返回 `StoreError`
//! - 取批之后的所有失败都只体现在报告中，一个文档失败不影响后续文档

use crate::clients::PayloadSource;
use crate::error::StoreError;
use crate::infrastructure::RecordStore;
use crate::models::{BatchReport, BatchRequest, DocumentId};
use crate::services::EnrichmentService;
use crate::utils::logging::{log_batch_complete, log_batch_start};
use crate::workflow::{DocumentCtx, DocumentFlow};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// 批量文档处理器
pub struct BatchProcessor {
    store: Arc<dyn RecordStore>,
    flow: DocumentFlow,
    batch_counter: AtomicU64,
}

impl BatchProcessor {
    pub fn new(
        store: Arc<dyn RecordStore>,
        payloads: Arc<dyn PayloadSource>,
        enrichment: EnrichmentService,
    ) -> Self {
        let flow = DocumentFlow::new(store.clone(), enrichment, payloads);
        Self {
            store,
            flow,
            batch_counter: AtomicU64::new(0),
        }
    }

    /// 处理一批文档
    ///
    /// # 返回
    /// - `Ok(BatchReport)`: 取批成功，报告中包含每个文档的结果
    /// - `Err(StoreError)`: 取批失败，没有任何文档被处理
    pub async fn process(&self, request: BatchRequest) -> Result<BatchReport, StoreError> {
        let batch_id = self.batch_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let started = Instant::now();

        let records = self.store.fetch_batch(&request).await.map_err(|e| {
            error!("❌ 第 {} 批取文档失败: {}", batch_id, e);
            e
        })?;

        let total = records.len();
        log_batch_start(batch_id, total, request.limit);

        let mut report = BatchReport::default();
        if request.filter.document_ids.is_none() && total > 0 && total == request.limit {
            report.next_after = records.last().map(|record| record.id.clone());
        }
        for (idx, record) in records.into_iter().enumerate() {
            let ctx = DocumentCtx::new(batch_id, idx + 1, total, record.id.clone());
            let result = self.flow.run(record, &ctx).await;

            report.record_skipped_steps(&result.skipped_steps);
            report.record(result.outcome);
        }

        log_batch_complete(batch_id, &report);
        info!("⏱️ 第 {} 批耗时 {} ms", batch_id, started.elapsed().as_millis());

        Ok(report)
    }

    /// 给定文档中尚未全部完成的文档
    pub async fn unfinished(&self, ids: &[DocumentId]) -> Result<Vec<DocumentId>, StoreError> {
        self.store.unfinished(ids).await
    }
}
