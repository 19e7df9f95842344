//! # Smart Worksheet
//!
//! 根据年级和主题调用生成式 AI，生成可打印的儿童学习单
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 只负责 HTTP 调用，不认识学习单
//! - `GeminiClient` - Gemini `generateContent` REST 接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `GenerationBackend` - 结构生成 / 插图生成能力
//! - `GenerationClient` - 结构失败向上传播，插图失败换成占位图
//! - `html_renderer` - 把快照渲染成可打印页面
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 运行标识和状态容器
//! - `RunId` / `IllustrationCtx` - 合并键（运行 + 段落）
//! - `WorksheetState` - 显式状态容器，展示层订阅
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 一次运行：结构请求 → 发布 → 扇出插图 → 独立合并
//!

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError, IllustrationGenerationError, StructureGenerationError};
pub use models::{GenerationRequestParams, ImageRef, Section, SectionKind, WorksheetDocument};
pub use orchestrator::{GenerationRun, RunSummary, WorksheetOrchestrator};
pub use services::{render_worksheet_html, GeminiBackend, GenerationBackend, GenerationClient};
pub use workflow::{RunId, RunPhase, WorksheetSnapshot, WorksheetState};
