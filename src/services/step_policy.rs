//! 步骤判定 - 业务能力层
//!
//! 纯函数：根据记录的状态决定哪些步骤还需要执行

use crate::models::{DocumentRecord, Step, StepStatus};
use tracing::warn;

/// 待执行的步骤（按固定顺序）
///
/// 只有状态为 done 且结果非空的步骤会被排除。状态为 done 但结果为空的
/// 记录不一致，仍视为待处理；error 状态在下次调用时重新执行。
/// 全部完成时返回空列表。
pub fn pending_steps(record: &DocumentRecord) -> Vec<Step> {
    Step::ORDERED
        .into_iter()
        .filter(|step| {
            if record.status(*step) == StepStatus::Done && !record.has_result(*step) {
                warn!(
                    "⚠️ 文档 {} 的 {} 标记为完成但没有结果，重新执行",
                    record.id, step
                );
            }
            !record.is_satisfied(*step)
        })
        .collect()
}

/// 已完成而跳过的步骤（按固定顺序）
pub fn satisfied_steps(record: &DocumentRecord) -> Vec<Step> {
    Step::ORDERED
        .into_iter()
        .filter(|step| record.is_satisfied(*step))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldUpdates, StepResult};

    fn record_with(results: Vec<StepResult>) -> DocumentRecord {
        let mut record = DocumentRecord::new("doc", "doc.jpg");
        let mut updates = FieldUpdates::default();
        for result in results {
            updates.record(result);
        }
        updates.apply_to(&mut record);
        record
    }

    #[test]
    fn test_new_record_has_all_steps_pending_in_order() {
        let record = DocumentRecord::new("doc", "doc.jpg");
        assert_eq!(
            pending_steps(&record),
            vec![Step::Captioning, Step::Ocr, Step::FaceRecognition]
        );
        assert!(satisfied_steps(&record).is_empty());
    }

    #[test]
    fn test_all_done_yields_empty() {
        let record = record_with(vec![
            StepResult::caption("a cat"),
            StepResult::Ocr(String::new()),
            StepResult::Faces(vec![]),
        ]);
        assert!(pending_steps(&record).is_empty());
        assert_eq!(satisfied_steps(&record).len(), 3);
    }

    #[test]
    fn test_only_missing_steps_are_pending() {
        let record = record_with(vec![
            StepResult::caption("a cat"),
            StepResult::Faces(vec![]),
        ]);
        assert_eq!(pending_steps(&record), vec![Step::Ocr]);
    }

    #[test]
    fn test_done_without_result_is_pending() {
        let mut record = record_with(vec![StepResult::caption("a cat")]);
        record.face_status = StepStatus::Done;
        assert_eq!(
            pending_steps(&record),
            vec![Step::Ocr, Step::FaceRecognition]
        );
    }

    #[test]
    fn test_error_status_is_pending() {
        let mut record = DocumentRecord::new("doc", "doc.jpg");
        record.caption_status = StepStatus::Error;
        assert_eq!(pending_steps(&record)[0], Step::Captioning);
    }
}
