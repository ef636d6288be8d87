/// 日志工具模块
///
/// 提供批处理日志格式化和输出的辅助函数
use crate::config::Config;
use crate::models::{BatchReport, DocumentStatus, Step};
use tracing::{info, warn};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档增强批处理服务");
    info!("🌐 监听地址: {}", config.bind_addr);
    info!(
        "📊 默认批量: {} / 上限: {}",
        config.default_batch_size, config.max_batch_size
    );
    info!("⏱️ 单次调用超时: {} 秒", config.client_timeout_secs);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_id`: 批次编号（仅用于日志）
/// - `fetched`: 取到的文档数量
/// - `limit`: 批量上限
pub fn log_batch_start(batch_id: u64, fetched: usize, limit: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {} 批", batch_id);
    info!("📄 本批文档: {} / 上限 {}", fetched, limit);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_id: u64, report: &BatchReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 提交 {}, 跳过 {}, 失败 {} / 共 {}",
        batch_id, report.committed, report.skipped, report.failed, report.processed
    );
    for step in Step::ORDERED {
        let skipped = report.skipped_steps.get(step);
        if skipped > 0 {
            info!("   {} 已完成而跳过: {}", step, skipped);
        }
    }
    for outcome in report
        .per_document
        .iter()
        .filter(|o| o.status == DocumentStatus::Failed)
    {
        warn!(
            "   ❌ 文档 {} 失败于 {}: {}",
            outcome.id,
            outcome
                .failed_step
                .map(|s| s.name())
                .unwrap_or("读取内容"),
            outcome.error.as_deref().unwrap_or_default()
        );
    }
    info!("{}", "─".repeat(60));
}
