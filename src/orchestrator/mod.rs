//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator (一次运行：结构 → 扇出插图)
//!     ↓
//! workflow (RunId / 状态容器 / 合并)
//!     ↓
//! services (能力层：结构 / 插图 / 渲染)
//!     ↓
//! clients (Gemini REST)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：只做调度，不解析回复、不拼提示词
//! 2. **状态外置**：文档和计数都在 `WorksheetState` 中，展示层订阅它
//! 3. **向下依赖**：编排层 → workflow → services → clients

pub mod worksheet_orchestrator;

pub use worksheet_orchestrator::{
    GenerationRun, IllustrationSettlement, IllustrationTask, RunSummary, WorksheetOrchestrator,
};
