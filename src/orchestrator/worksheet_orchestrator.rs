//! 学习单编排器 - 编排层
//!
//! ## 职责
//!
//! 一次运行（Run）的完整调度：
//!
//! 1. **开始运行**：在状态容器中登记新的 RunId，清空旧文档和计数
//! 2. **结构请求**：等待结构服务返回，失败则本次运行结束
//! 3. **发布文档**：需要插图的段落标记为加载中，设置未落定计数
//! 4. **扇出插图**：每个段落一个 `tokio::spawn` 任务，互不等待
//! 5. **独立合并**：每个任务按 (RunId, 段落 id) 合并结果，旧运行的结果直接丢弃
//!
//! ## 设计特点
//!
//! - **不持有文档**：文档只存在于 `WorksheetState`，任务只持有合并键
//! - **显式句柄**：每个插图任务的 `JoinHandle` 都交给调用方
//! - **不取消**：新运行开始时不取消旧任务，旧结果在合并时被识别并丢弃

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::GenerationRequestParams;
use crate::services::{GenerationBackend, GenerationClient};
use crate::utils::logging::{log_run_complete, log_run_start};
use crate::workflow::{
    IllustrationCtx, MergeOutcome, PublishOutcome, RunId, WorksheetSnapshot, WorksheetState,
};

/// 单个插图任务落定后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllustrationSettlement {
    pub outcome: MergeOutcome,
    pub used_fallback: bool,
}

/// 插图任务句柄
pub struct IllustrationTask {
    pub section_id: String,
    pub handle: JoinHandle<IllustrationSettlement>,
}

/// 一次运行的句柄
pub struct GenerationRun {
    run_id: RunId,
    tasks: Vec<IllustrationTask>,
    superseded: bool,
}

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub stale: usize,
    pub fallback: usize,
    pub unknown_section: usize,
    pub already_settled: usize,
    pub failed_tasks: usize,
}

impl GenerationRun {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn tasks(&self) -> &[IllustrationTask] {
        &self.tasks
    }

    /// 结构返回前已经有新的运行开始
    pub fn is_superseded(&self) -> bool {
        self.superseded
    }

    /// 等待全部插图任务落定
    pub async fn wait(self) -> RunSummary {
        let run_id = self.run_id;
        let (section_ids, handles): (Vec<_>, Vec<_>) = self
            .tasks
            .into_iter()
            .map(|t| (t.section_id, t.handle))
            .unzip();

        let mut summary = RunSummary::default();
        for (section_id, result) in section_ids.iter().zip(join_all(handles).await) {
            match result {
                Ok(settlement) => {
                    if settlement.used_fallback {
                        summary.fallback += 1;
                    }
                    match settlement.outcome {
                        MergeOutcome::Applied => summary.applied += 1,
                        MergeOutcome::StaleRun => summary.stale += 1,
                        MergeOutcome::UnknownSection => summary.unknown_section += 1,
                        MergeOutcome::AlreadySettled => summary.already_settled += 1,
                    }
                }
                Err(e) => {
                    error!("[运行 {} 段落 {}] 插图任务执行失败: {}", run_id, section_id, e);
                    summary.failed_tasks += 1;
                }
            }
        }

        log_run_complete(run_id, &summary);
        summary
    }
}

/// 学习单编排器
pub struct WorksheetOrchestrator<B> {
    client: Arc<GenerationClient<B>>,
    state: WorksheetState,
}

impl<B> Clone for WorksheetOrchestrator<B> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            state: self.state.clone(),
        }
    }
}

impl<B: GenerationBackend> WorksheetOrchestrator<B> {
    /// 创建新的编排器
    pub fn new(backend: B, config: &Config) -> Self {
        Self::with_state(backend, config, WorksheetState::new())
    }

    /// 使用外部传入的状态容器
    pub fn with_state(backend: B, config: &Config, state: WorksheetState) -> Self {
        Self {
            client: Arc::new(GenerationClient::new(backend, config)),
            state,
        }
    }

    pub fn state(&self) -> &WorksheetState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<WorksheetSnapshot> {
        self.state.subscribe()
    }

    /// 根据表单参数生成学习单
    ///
    /// 结构失败时返回错误（同时写入状态的 `last_error`），文档保持为空。
    /// 成功时立即返回，插图在后台各自落定。
    pub async fn generate(&self, params: GenerationRequestParams) -> AppResult<GenerationRun> {
        let run_id = self.state.begin_run();
        log_run_start(run_id, &params);

        let document = match self.client.request_structure(&params).await {
            Ok(document) => document,
            Err(e) => {
                error!("[运行 {}] ❌ 生成学习单时出错: {}", run_id, e);
                self.state.fail_structure(run_id, e.to_string());
                return Err(e.into());
            }
        };

        let section_count = document.sections.len();
        let targets = match self.state.publish_structure(run_id, document) {
            PublishOutcome::Published { targets } => targets,
            PublishOutcome::StaleRun => {
                warn!("[运行 {}] ⚠️ 已有新的运行开始，丢弃本次结构结果", run_id);
                return Ok(GenerationRun {
                    run_id,
                    tasks: Vec::new(),
                    superseded: true,
                });
            }
        };

        info!(
            "[运行 {}] ✓ 结构已发布: {} 个段落, {} 张插图待生成",
            run_id,
            section_count,
            targets.len()
        );

        let tasks = targets
            .into_iter()
            .map(|ctx| self.spawn_illustration(ctx))
            .collect();

        Ok(GenerationRun {
            run_id,
            tasks,
            superseded: false,
        })
    }

    /// 为一个段落启动插图任务
    fn spawn_illustration(&self, ctx: IllustrationCtx) -> IllustrationTask {
        let client = Arc::clone(&self.client);
        let state = self.state.clone();
        let section_id = ctx.section_id.clone();

        debug!("{} 🎨 开始生成插图", ctx);

        let handle = tokio::spawn(async move {
            let image = client.request_illustration(&ctx.description).await;
            let used_fallback = image.is_fallback();
            let outcome = state.apply_illustration(&ctx, image.to_url());

            match outcome {
                MergeOutcome::Applied if used_fallback => {
                    warn!("{} ⚠️ 已使用占位图", ctx);
                }
                MergeOutcome::Applied => info!("{} ✓ 插图已合并", ctx),
                MergeOutcome::StaleRun => debug!("{} 运行已被取代，丢弃插图", ctx),
                MergeOutcome::UnknownSection => warn!("{} ⚠️ 当前文档中没有该段落", ctx),
                MergeOutcome::AlreadySettled => warn!("{} ⚠️ 段落已落定，忽略重复结果", ctx),
            }

            IllustrationSettlement {
                outcome,
                used_fallback,
            }
        });

        IllustrationTask { section_id, handle }
    }
}
