use crate::models::document::DocumentId;

/// 单次调用的批量请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// 最多取多少个文档
    pub limit: usize,
    pub filter: BatchFilter,
}

/// 可选的过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchFilter {
    /// 指定文档（包含已完成的文档）
    pub document_ids: Option<Vec<DocumentId>>,
    /// 只取标识大于该值的文档
    pub after_id: Option<DocumentId>,
}

impl BatchRequest {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            filter: BatchFilter::default(),
        }
    }

    /// 只处理指定的文档
    pub fn for_documents(ids: Vec<DocumentId>) -> Self {
        Self {
            limit: ids.len(),
            filter: BatchFilter {
                document_ids: Some(ids),
                after_id: None,
            },
        }
    }

    pub fn after(mut self, id: DocumentId) -> Self {
        self.filter.after_id = Some(id);
        self
    }
}
