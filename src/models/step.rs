//! 增强步骤定义
//!
//! 三个步骤构成一个封闭的枚举，执行顺序固定：
//! 图片描述（Captioning） → 文字识别（OCR） → 人脸识别（FaceRecognition）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 增强步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    /// 图片描述
    Captioning,
    /// 文字识别
    #[serde(rename = "OCR")]
    Ocr,
    /// 人脸识别
    FaceRecognition,
}

impl Step {
    /// 固定执行顺序（便宜、快速的步骤在前）
    pub const ORDERED: [Step; 3] = [Step::Captioning, Step::Ocr, Step::FaceRecognition];

    /// 报告与日志中使用的名称
    pub fn name(&self) -> &'static str {
        match self {
            Step::Captioning => "Captioning",
            Step::Ocr => "OCR",
            Step::FaceRecognition => "FaceRecognition",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单个步骤在存储中的状态标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Done,
    Error,
}

impl StepStatus {
    /// 数据库列中的取值
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Done => "done",
            StepStatus::Error => "error",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "done" => Ok(StepStatus::Done),
            "error" => Ok(StepStatus::Error),
            other => Err(format!("未知的步骤状态: {}", other)),
        }
    }
}
