/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::GenerationRequestParams;
use crate::orchestrator::RunSummary;
use crate::workflow::{RunId, WorksheetSnapshot};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "debug,hyper=warn,reqwest=warn"
    } else {
        "info,hyper=warn,reqwest=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - SmartWorksheet 学习单生成");
    info!("📝 结构模型: {}", config.structure_model_name);
    info!("🎨 插图模型: {}", config.image_model_name);
    match config.illustration_timeout() {
        Some(limit) => info!("⏱️ 插图超时: {} 秒", limit.as_secs()),
        None => info!("⏱️ 插图超时: 不限"),
    }
    info!("{}", "=".repeat(60));
}

/// 记录运行开始信息
pub fn log_run_start(run_id: RunId, params: &GenerationRequestParams) {
    info!("\n{}", "─".repeat(60));
    info!("[运行 {}] 📦 开始生成学习单", run_id);
    info!(
        "[运行 {}] 年级: {} | 科目: {} | 主题: {}",
        run_id, params.grade, params.subject, params.topic
    );
    if !params.details.trim().is_empty() {
        info!("[运行 {}] 补充说明: {}", run_id, truncate_text(&params.details, 80));
    }
}

/// 记录运行完成信息
pub fn log_run_complete(run_id: RunId, summary: &RunSummary) {
    info!("{}", "─".repeat(60));
    info!(
        "[运行 {}] ✓ 插图全部落定: 合并 {}, 占位图 {}, 已丢弃 {}",
        run_id, summary.applied, summary.fallback, summary.stale
    );
    if summary.failed_tasks > 0 || summary.unknown_section > 0 || summary.already_settled > 0 {
        info!(
            "[运行 {}] ❌ 任务失败 {}, 未知段落 {}, 重复落定 {}",
            run_id, summary.failed_tasks, summary.unknown_section, summary.already_settled
        );
    }
    info!("{}", "─".repeat(60));
}

/// 插图生成中的横幅（对应页面上的 "Generating Images..."）
pub fn log_progress(snapshot: &WorksheetSnapshot) {
    if snapshot.is_generating_images() {
        info!("⏳ Generating Images... 剩余 {} 张", snapshot.outstanding);
    } else if snapshot.can_print() {
        info!("🖨️ 插图已全部落定，可以打印");
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
