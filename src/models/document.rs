//! 文档记录与字段更新
//!
//! `DocumentRecord` 是存储中的快照；`FieldUpdates` 是流程中的内存工作副本，
//! 在文档处理结束时一次性提交。

use crate::models::step::{Step, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 文档唯一标识（不透明字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 人脸识别结果中的一个人
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceMatch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// 从识别结果中提取已知人物名称
///
/// 忽略 `Unknown`，下划线转空格并按单词首字母大写，去重后排序。
pub fn known_people(faces: &[FaceMatch]) -> Vec<String> {
    let names: BTreeSet<String> = faces
        .iter()
        .map(|f| f.name.trim())
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("unknown"))
        .map(|name| title_case(&name.replace('_', " ")))
        .collect();
    names.into_iter().collect()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 存储中的文档记录快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    /// 文档内容的定位符（路径或 URL），不是内容本身
    pub payload_ref: String,
    pub caption_status: StepStatus,
    pub caption: Option<String>,
    /// 图片描述服务返回的标签，与描述一同写入
    pub caption_tags: Option<Vec<String>>,
    pub ocr_status: StepStatus,
    pub ocr_text: Option<String>,
    pub face_status: StepStatus,
    pub faces: Option<Vec<FaceMatch>>,
    /// 乐观并发版本号，每次提交加一
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// 创建一个所有步骤都待处理的新记录
    pub fn new(id: impl Into<DocumentId>, payload_ref: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            payload_ref: payload_ref.into(),
            caption_status: StepStatus::Pending,
            caption: None,
            caption_tags: None,
            ocr_status: StepStatus::Pending,
            ocr_text: None,
            face_status: StepStatus::Pending,
            faces: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self, step: Step) -> StepStatus {
        match step {
            Step::Captioning => self.caption_status,
            Step::Ocr => self.ocr_status,
            Step::FaceRecognition => self.face_status,
        }
    }

    pub fn has_result(&self, step: Step) -> bool {
        match step {
            Step::Captioning => self.caption.is_some(),
            Step::Ocr => self.ocr_text.is_some(),
            Step::FaceRecognition => self.faces.is_some(),
        }
    }

    /// 步骤已完成：状态为 done 且结果非空
    pub fn is_satisfied(&self, step: Step) -> bool {
        self.status(step) == StepStatus::Done && self.has_result(step)
    }

    /// 所有步骤均已完成
    pub fn is_complete(&self) -> bool {
        Step::ORDERED.iter().all(|step| self.is_satisfied(*step))
    }
}

/// 单个步骤成功后产生的结果
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Caption { text: String, tags: Vec<String> },
    Ocr(String),
    Faces(Vec<FaceMatch>),
}

impl StepResult {
    /// 不带标签的图片描述结果
    pub fn caption(text: impl Into<String>) -> Self {
        StepResult::Caption {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    pub fn step(&self) -> Step {
        match self {
            StepResult::Caption { .. } => Step::Captioning,
            StepResult::Ocr(_) => Step::Ocr,
            StepResult::Faces(_) => Step::FaceRecognition,
        }
    }
}

/// 一个文档待提交的全部字段更新
///
/// 每个已设置的结果字段都意味着对应步骤的状态变为 done。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    pub caption: Option<String>,
    /// 随描述一起写入，单独出现时不改变任何状态
    pub caption_tags: Option<Vec<String>>,
    pub ocr_text: Option<String>,
    pub faces: Option<Vec<FaceMatch>>,
}

impl FieldUpdates {
    /// 记录一个步骤的结果
    pub fn record(&mut self, result: StepResult) {
        match result {
            StepResult::Caption { text, tags } => {
                self.caption = Some(text);
                self.caption_tags = Some(tags);
            }
            StepResult::Ocr(text) => self.ocr_text = Some(text),
            StepResult::Faces(faces) => self.faces = Some(faces),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.ocr_text.is_none() && self.faces.is_none()
    }

    /// 本次更新涉及的步骤（按固定顺序）
    pub fn steps(&self) -> Vec<Step> {
        Step::ORDERED
            .into_iter()
            .filter(|step| match step {
                Step::Captioning => self.caption.is_some(),
                Step::Ocr => self.ocr_text.is_some(),
                Step::FaceRecognition => self.faces.is_some(),
            })
            .collect()
    }

    /// 把更新应用到记录上（结果字段 + 状态标记），不修改版本号
    pub fn apply_to(&self, record: &mut DocumentRecord) {
        if let Some(caption) = &self.caption {
            record.caption = Some(caption.clone());
            record.caption_status = StepStatus::Done;
            record.caption_tags = self.caption_tags.clone();
        }
        if let Some(text) = &self.ocr_text {
            record.ocr_text = Some(text.clone());
            record.ocr_status = StepStatus::Done;
        }
        if let Some(faces) = &self.faces {
            record.faces = Some(faces.clone());
            record.face_status = StepStatus::Done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(name: &str) -> FaceMatch {
        FaceMatch {
            name: name.to_string(),
            confidence: None,
        }
    }

    #[test]
    fn test_document_id_conversions() {
        let owned = DocumentId::from(String::from("doc-7"));
        assert_eq!(owned, DocumentId::from("doc-7"));
        assert_eq!(owned.to_string(), "doc-7");
    }

    #[test]
    fn test_known_people_normalizes_names() {
        let faces = vec![
            face("john_smith"),
            face("Unknown"),
            face("JOHN_SMITH"),
            face("alice"),
            face(""),
        ];
        assert_eq!(known_people(&faces), vec!["Alice", "John Smith"]);
    }

    #[test]
    fn test_satisfied_requires_result() {
        let mut record = DocumentRecord::new("doc-1", "a.jpg");
        record.ocr_status = StepStatus::Done;
        assert!(!record.is_satisfied(Step::Ocr));

        record.ocr_text = Some(String::new());
        assert!(record.is_satisfied(Step::Ocr));
        assert!(!record.is_complete());
    }

    #[test]
    fn test_field_updates_apply() {
        let mut record = DocumentRecord::new("doc-1", "a.jpg");
        let mut updates = FieldUpdates::default();
        assert!(updates.is_empty());

        updates.record(StepResult::Ocr("hello".to_string()));
        updates.record(StepResult::Faces(vec![]));
        assert_eq!(updates.steps(), vec![Step::Ocr, Step::FaceRecognition]);

        updates.apply_to(&mut record);
        assert_eq!(record.ocr_status, StepStatus::Done);
        assert_eq!(record.ocr_text.as_deref(), Some("hello"));
        assert_eq!(record.face_status, StepStatus::Done);
        assert_eq!(record.caption_status, StepStatus::Pending);
        assert!(record.caption.is_none());
        assert_eq!(record.version, 0);
    }

    #[test]
    fn test_caption_tags_travel_with_caption() {
        let mut record = DocumentRecord::new("doc-1", "a.jpg");
        let mut updates = FieldUpdates::default();
        updates.record(StepResult::Caption {
            text: "a red bicycle".to_string(),
            tags: vec!["bicycle".to_string(), "street".to_string()],
        });
        assert_eq!(updates.steps(), vec![Step::Captioning]);

        updates.apply_to(&mut record);
        assert_eq!(record.caption.as_deref(), Some("a red bicycle"));
        assert_eq!(
            record.caption_tags,
            Some(vec!["bicycle".to_string(), "street".to_string()])
        );
    }
}
