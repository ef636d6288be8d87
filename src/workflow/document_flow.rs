//! 文档处理流程 - 流程层
//!
//! 核心职责：定义"一个文档"的完整处理流程
//!
//! 状态机：
//! `Fetched → StepsIdentified → {StepRunning}* → ReadyToCommit → Committed | Failed`
//! 没有待处理步骤的文档在 `StepsIdentified` 之后直接进入 `Skipped`。
//!
//! 流程规则：
//! 1. 待处理步骤按固定顺序串行执行
//! 2. 任一步骤失败（暂时性或永久性）立即停止，不重试，不提交
//! 3. 全部成功后只提交一次，提交失败则本次所有结果丢弃
//!
//! 提交是唯一的持久化副作用，调用被中途取消时存储不受影响。

use crate::clients::PayloadSource;
use crate::infrastructure::RecordStore;
use crate::models::{known_people, DocumentOutcome, DocumentRecord, FieldUpdates, Step, StepResult};
use crate::services::{pending_steps, satisfied_steps, EnrichmentService};
use crate::utils::truncate_text;
use crate::workflow::document_ctx::DocumentCtx;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// 单个文档的处理状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    Fetched,
    StepsIdentified { pending: Vec<Step> },
    StepRunning(Step),
    ReadyToCommit,
    Committed,
    Skipped,
    Failed,
}

impl DocumentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DocumentState::Committed | DocumentState::Skipped | DocumentState::Failed
        )
    }

    /// 是否允许从当前状态进入 `next`
    pub fn can_advance_to(&self, next: &DocumentState) -> bool {
        use DocumentState::*;
        match (self, next) {
            (Fetched, StepsIdentified { .. }) => true,
            (StepsIdentified { pending }, Skipped) => pending.is_empty(),
            (StepsIdentified { pending }, StepRunning(step)) => pending.first() == Some(step),
            // 读取文档内容失败
            (StepsIdentified { .. }, Failed) => true,
            (StepRunning(current), StepRunning(step)) => current < step,
            (StepRunning(_), ReadyToCommit) | (StepRunning(_), Failed) => true,
            (ReadyToCommit, Committed) | (ReadyToCommit, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentState::Fetched => write!(f, "Fetched"),
            DocumentState::StepsIdentified { pending } => {
                write!(f, "StepsIdentified({} pending)", pending.len())
            }
            DocumentState::StepRunning(step) => write!(f, "StepRunning({})", step),
            DocumentState::ReadyToCommit => write!(f, "ReadyToCommit"),
            DocumentState::Committed => write!(f, "Committed"),
            DocumentState::Skipped => write!(f, "Skipped"),
            DocumentState::Failed => write!(f, "Failed"),
        }
    }
}

/// 记录状态迁移，调试日志中输出
struct StateTracker<'a> {
    ctx: &'a DocumentCtx,
    state: DocumentState,
    history: Vec<DocumentState>,
}

impl<'a> StateTracker<'a> {
    fn new(ctx: &'a DocumentCtx) -> Self {
        Self {
            ctx,
            state: DocumentState::Fetched,
            history: vec![DocumentState::Fetched],
        }
    }

    fn advance(&mut self, next: DocumentState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "非法状态迁移: {} -> {}",
            self.state,
            next
        );
        debug!("{} 状态: {} → {}", self.ctx, self.state, next);
        self.state = next.clone();
        self.history.push(next);
    }
}

/// 单个文档的处理结果
#[derive(Debug, Clone)]
pub struct FlowResult {
    pub outcome: DocumentOutcome,
    /// 已完成而跳过的步骤
    pub skipped_steps: Vec<Step>,
    /// 经历的状态（含初始状态）
    pub states: Vec<DocumentState>,
}

/// 文档处理流程
///
/// - 编排单个文档的步骤执行和提交
/// - 决定何时跳过、何时停止、何时提交
/// - 失败只体现在结果中，不向上抛出
pub struct DocumentFlow {
    store: Arc<dyn RecordStore>,
    enrichment: EnrichmentService,
    payloads: Arc<dyn PayloadSource>,
}

impl DocumentFlow {
    /// 创建新的文档处理流程
    pub fn new(
        store: Arc<dyn RecordStore>,
        enrichment: EnrichmentService,
        payloads: Arc<dyn PayloadSource>,
    ) -> Self {
        Self {
            store,
            enrichment,
            payloads,
        }
    }

    pub async fn run(&self, record: DocumentRecord, ctx: &DocumentCtx) -> FlowResult {
        let mut tracker = StateTracker::new(ctx);
        let id = record.id.clone();

        // ========== 判定待处理步骤 ==========
        let pending = pending_steps(&record);
        let skipped_steps = satisfied_steps(&record);
        tracker.advance(DocumentState::StepsIdentified {
            pending: pending.clone(),
        });

        if pending.is_empty() {
            info!("{} ⏭️ 所有步骤已完成，跳过", ctx);
            tracker.advance(DocumentState::Skipped);
            return FlowResult {
                outcome: DocumentOutcome::skipped(id),
                skipped_steps,
                states: tracker.history,
            };
        }

        info!(
            "{} 待处理步骤: {}",
            ctx,
            pending.iter().map(|s| s.name()).collect::<Vec<_>>().join(" → ")
        );

        // ========== 读取文档内容 ==========
        let payload = match self.payloads.load(&record).await {
            Ok(payload) => payload,
            Err(e) => {
                error!("{} ❌ 读取文档内容失败: {}", ctx, e);
                tracker.advance(DocumentState::Failed);
                return FlowResult {
                    outcome: DocumentOutcome::failed(id, None, e.to_string()),
                    skipped_steps,
                    states: tracker.history,
                };
            }
        };

        // ========== 按顺序执行步骤 ==========
        let mut updates = FieldUpdates::default();
        let mut completed = Vec::with_capacity(pending.len());

        for step in pending {
            tracker.advance(DocumentState::StepRunning(step));
            let started = Instant::now();

            match self.enrichment.run(step, &payload).await {
                Ok(result) => {
                    log_step_result(ctx, &result, started);
                    updates.record(result);
                    completed.push(step);
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!("{} ⚠️ {} 暂时失败，下次调用再处理: {}", ctx, step, e);
                    } else {
                        error!("{} ❌ {} 失败: {}", ctx, step, e);
                    }
                    tracker.advance(DocumentState::Failed);
                    return FlowResult {
                        outcome: DocumentOutcome::failed(id, Some(step), e.to_string()),
                        skipped_steps,
                        states: tracker.history,
                    };
                }
            }
        }

        // ========== 一次性提交 ==========
        tracker.advance(DocumentState::ReadyToCommit);
        info!("{} 📤 正在提交 {} 个字段...", ctx, completed.len());

        match self.store.commit(&id, record.version, &updates).await {
            Ok(()) => {
                tracker.advance(DocumentState::Committed);
                info!("{} ✓ 提交成功", ctx);
                FlowResult {
                    outcome: DocumentOutcome::done(id, completed),
                    skipped_steps,
                    states: tracker.history,
                }
            }
            Err(e) => {
                error!("{} ❌ 提交失败，本次结果已丢弃: {}", ctx, e);
                tracker.advance(DocumentState::Failed);
                FlowResult {
                    outcome: DocumentOutcome::failed(id, None, format!("提交失败: {}", e)),
                    skipped_steps,
                    states: tracker.history,
                }
            }
        }
    }
}

// ========== 日志辅助方法 ==========

fn log_step_result(ctx: &DocumentCtx, result: &StepResult, started: Instant) {
    let elapsed = started.elapsed().as_millis();
    match result {
        StepResult::Caption { text, tags } => {
            info!(
                "{} ✓ 图片描述完成 ({} ms): {} [{} 个标签]",
                ctx,
                elapsed,
                truncate_text(text, 80),
                tags.len()
            );
        }
        StepResult::Ocr(text) => {
            info!(
                "{} ✓ 文字识别完成 ({} ms): {} 个字符",
                ctx,
                elapsed,
                text.chars().count()
            );
        }
        StepResult::Faces(faces) => {
            let people = known_people(faces);
            info!(
                "{} ✓ 人脸识别完成 ({} ms): {} 张人脸, 已知人物: {}",
                ctx,
                elapsed,
                faces.len(),
                if people.is_empty() {
                    "无".to_string()
                } else {
                    people.join(", ")
                }
            );
        }
    }
}
