//! 批量处理报告
//!
//! 报告只返回给调用方，不做持久化。

use crate::models::document::DocumentId;
use crate::models::step::Step;
use serde::Serialize;

/// 单个文档的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// 待处理步骤全部成功并已提交
    Done,
    /// 没有待处理步骤
    Skipped,
    /// 某一步骤或提交失败
    Failed,
}

/// 单个文档的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub id: DocumentId,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 本次调用中成功执行的步骤
    pub completed_steps: Vec<Step>,
}

impl DocumentOutcome {
    pub fn done(id: DocumentId, completed_steps: Vec<Step>) -> Self {
        Self {
            id,
            status: DocumentStatus::Done,
            failed_step: None,
            error: None,
            completed_steps,
        }
    }

    pub fn skipped(id: DocumentId) -> Self {
        Self {
            id,
            status: DocumentStatus::Skipped,
            failed_step: None,
            error: None,
            completed_steps: Vec::new(),
        }
    }

    pub fn failed(id: DocumentId, failed_step: Option<Step>, error: impl Into<String>) -> Self {
        Self {
            id,
            status: DocumentStatus::Failed,
            failed_step,
            error: Some(error.into()),
            completed_steps: Vec::new(),
        }
    }
}

/// 每个步骤因已完成而被跳过的次数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSteps {
    pub captioning: usize,
    pub ocr: usize,
    pub face_recognition: usize,
}

impl SkippedSteps {
    pub fn add(&mut self, step: Step) {
        match step {
            Step::Captioning => self.captioning += 1,
            Step::Ocr => self.ocr += 1,
            Step::FaceRecognition => self.face_recognition += 1,
        }
    }

    pub fn get(&self, step: Step) -> usize {
        match step {
            Step::Captioning => self.captioning,
            Step::Ocr => self.ocr,
            Step::FaceRecognition => self.face_recognition,
        }
    }
}

/// 批量处理报告
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// 本批取到的文档数
    pub processed: usize,
    pub committed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub skipped_steps: SkippedSteps,
    pub per_document: Vec<DocumentOutcome>,
    /// 本批取满时为最后一个文档的ID，下次调用以 `after` 传入即可越过本批；
    /// 未取满时为空，表示从头开始
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_after: Option<DocumentId>,
}

impl BatchReport {
    /// 记录一个已完成步骤判定的文档所跳过的步骤
    pub fn record_skipped_steps(&mut self, skipped: &[Step]) {
        for step in skipped {
            self.skipped_steps.add(*step);
        }
    }

    /// 记录一个文档的最终结果
    pub fn record(&mut self, outcome: DocumentOutcome) {
        self.processed += 1;
        match outcome.status {
            DocumentStatus::Done => self.committed += 1,
            DocumentStatus::Skipped => self.skipped += 1,
            DocumentStatus::Failed => self.failed += 1,
        }
        self.per_document.push(outcome);
    }

    pub fn outcome(&self, id: &DocumentId) -> Option<&DocumentOutcome> {
        self.per_document.iter().find(|o| &o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_counts_and_json_shape() {
        let mut report = BatchReport::default();
        report.record_skipped_steps(&[Step::Captioning, Step::Ocr, Step::FaceRecognition]);
        report.record(DocumentOutcome::skipped(DocumentId::new("a")));
        report.record(DocumentOutcome::done(DocumentId::new("b"), vec![Step::Ocr]));
        report.record(DocumentOutcome::failed(
            DocumentId::new("c"),
            Some(Step::Captioning),
            "boom",
        ));

        assert_eq!(report.processed, 3);
        assert_eq!(report.committed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped_steps.get(Step::Ocr), 1);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["processed"], json!(3));
        assert_eq!(value["skippedSteps"]["faceRecognition"], json!(1));
        assert_eq!(value["perDocument"][0]["status"], json!("skipped"));
        assert!(value["perDocument"][0].get("failedStep").is_none());
        assert_eq!(value["perDocument"][1]["completedSteps"], json!(["OCR"]));
        assert_eq!(value["perDocument"][2]["failedStep"], json!("Captioning"));
        assert_eq!(value["perDocument"][2]["error"], json!("boom"));
        assert!(value.get("nextAfter").is_none());

        report.next_after = Some(DocumentId::new("c"));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["nextAfter"], json!("c"));
    }
}
