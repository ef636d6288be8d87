//! 批处理触发接口

use crate::error::{AppError, AppResult};
use crate::models::{BatchReport, BatchRequest, DocumentId};
use crate::routes::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    batch_size: Option<usize>,
    /// 只处理ID大于该值的文档（上一批报告中的 `nextAfter`）
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIdsBody {
    document_ids: Vec<DocumentId>,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pending: Vec<DocumentId>,
}

/// `POST /process-batch?batch_size=N&after=ID`
pub async fn process_batch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BatchQuery>,
) -> AppResult<Json<BatchReport>> {
    if query.batch_size == Some(0) {
        return Err(AppError::BadRequest("batch_size 必须大于 0".to_string()));
    }
    let limit = state.config.effective_batch_size(query.batch_size);

    let mut request = BatchRequest::new(limit);
    if let Some(after) = query.after.filter(|after| !after.trim().is_empty()) {
        request = request.after(DocumentId::new(after));
    }

    let _guard = state.try_begin_run()?;
    info!(
        "📥 收到批处理请求, batch_size = {}, after = {}",
        limit,
        request
            .filter
            .after_id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("-")
    );

    let report = state.processor.process(request).await?;
    Ok(Json(report))
}

/// `POST /process-documents`，只处理指定的文档
pub async fn process_documents(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DocumentIdsBody>,
) -> AppResult<Json<BatchReport>> {
    let ids = validate_ids(body.document_ids, state.config.max_batch_size)?;

    let _guard = state.try_begin_run()?;
    info!("📥 收到指定文档处理请求: {} 个文档", ids.len());

    let report = state
        .processor
        .process(BatchRequest::for_documents(ids))
        .await?;
    Ok(Json(report))
}

/// `POST /processing-status`，返回尚未全部完成的文档
pub async fn processing_status(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DocumentIdsBody>,
) -> AppResult<Json<PendingResponse>> {
    let ids = validate_ids(body.document_ids, state.config.max_batch_size)?;
    let pending = state.processor.unfinished(&ids).await?;
    Ok(Json(PendingResponse { pending }))
}

/// 去重（保持顺序）并校验数量，超过上限时立即拒绝
fn validate_ids(ids: Vec<DocumentId>, max: usize) -> AppResult<Vec<DocumentId>> {
    let mut seen = HashSet::with_capacity(ids.len().min(max + 1));
    let mut unique = Vec::new();
    for id in ids {
        if id.as_str().trim().is_empty() {
            return Err(AppError::BadRequest("文档ID不能为空".to_string()));
        }
        if seen.insert(id.clone()) {
            unique.push(id);
            if unique.len() > max {
                return Err(AppError::BadRequest(format!(
                    "documentIds 数量超过上限 {}",
                    max
                )));
            }
        }
    }

    if unique.is_empty() {
        return Err(AppError::BadRequest("documentIds 不能为空".to_string()));
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ids() {
        let ids = vec![DocumentId::new("b"), DocumentId::new("a"), DocumentId::new("b")];
        let unique = validate_ids(ids, 10).unwrap();
        assert_eq!(unique, vec![DocumentId::new("b"), DocumentId::new("a")]);

        assert!(validate_ids(vec![], 10).is_err());
        assert!(validate_ids(vec![DocumentId::new(" ")], 10).is_err());

        let many = (0..3).map(|i| DocumentId::new(format!("d{}", i))).collect();
        assert!(validate_ids(many, 2).is_err());

        // 重复ID不计入上限
        let repeated = vec![DocumentId::new("a"); 50_000];
        assert_eq!(validate_ids(repeated, 2).unwrap(), vec![DocumentId::new("a")]);

        let huge = (0..200_000).map(|i| DocumentId::new(format!("d{}", i))).collect();
        assert!(validate_ids(huge, 100).is_err());
    }
}
