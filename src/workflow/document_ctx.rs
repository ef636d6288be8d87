//! 文档处理上下文
//!
//! 封装"我正在处理哪一批的第几个文档"这一信息

use crate::models::DocumentId;
use std::fmt::Display;

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 批次编号（仅用于日志显示）
    pub batch_id: u64,

    /// 文档在批次中的索引（从1开始）
    pub index: usize,

    /// 本批文档总数
    pub total: usize,

    /// 文档ID
    pub document_id: DocumentId,
}

impl DocumentCtx {
    /// 创建新的文档上下文
    pub fn new(batch_id: u64, index: usize, total: usize, document_id: DocumentId) -> Self {
        Self {
            batch_id,
            index,
            total,
            document_id,
        }
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次 #{} 文档 {}/{} ID#{}]",
            self.batch_id, self.index, self.total, self.document_id
        )
    }
}
