//! 学习单状态容器
//!
//! 编排层写，展示层订阅。所有修改都通过 `send_if_modified` 完成，
//! 每次修改相对其他修改是原子的；合并插图只动一个段落。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::models::WorksheetDocument;
use crate::workflow::run_ctx::{IllustrationCtx, RunId};

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    StructurePending,
    SectionsSettling,
}

/// 某一时刻的状态快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorksheetSnapshot {
    /// 最近一次运行
    pub run_id: Option<RunId>,
    pub phase: RunPhase,
    pub document: Option<WorksheetDocument>,
    /// 尚未落定的插图请求数
    pub outstanding: usize,
    /// 最近一次结构失败的信息
    pub last_error: Option<String>,
}

impl WorksheetSnapshot {
    pub fn is_generating_images(&self) -> bool {
        self.outstanding > 0
    }

    pub fn can_print(&self) -> bool {
        self.document.is_some() && !self.is_generating_images()
    }
}

/// 发布结构的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// 已发布，附带需要发起的插图任务
    Published { targets: Vec<IllustrationCtx> },
    /// 运行已被新的运行取代，结果被丢弃
    StaleRun,
}

/// 合并插图的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// 来自已被取代的运行，已丢弃
    StaleRun,
    /// 当前文档中没有这个段落
    UnknownSection,
    /// 段落不在加载中（已经落定，或本来就不需要插图），未做修改
    AlreadySettled,
}

/// 状态容器
#[derive(Clone)]
pub struct WorksheetState {
    tx: Arc<watch::Sender<WorksheetSnapshot>>,
}

impl WorksheetState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorksheetSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<WorksheetSnapshot> {
        self.tx.subscribe()
    }

    /// 当前快照
    pub fn snapshot(&self) -> WorksheetSnapshot {
        self.tx.borrow().clone()
    }

    /// 开始新的运行：清空文档和计数
    pub fn begin_run(&self) -> RunId {
        let mut run_id = RunId::FIRST;
        self.tx.send_modify(|s| {
            run_id = s.run_id.map_or(RunId::FIRST, RunId::next);
            *s = WorksheetSnapshot {
                run_id: Some(run_id),
                phase: RunPhase::StructurePending,
                ..WorksheetSnapshot::default()
            };
        });
        debug!("运行 {} 开始，状态已清空", run_id);
        run_id
    }

    /// 发布结构：标记待生成插图的段落并设置计数
    pub fn publish_structure(&self, run_id: RunId, mut document: WorksheetDocument) -> PublishOutcome {
        let mut outcome = PublishOutcome::StaleRun;
        self.tx.send_if_modified(|s| {
            if s.run_id != Some(run_id) || s.phase != RunPhase::StructurePending {
                return false;
            }

            let outstanding = document.mark_pending_illustrations();
            let targets = document
                .illustration_targets()
                .into_iter()
                .map(|(section_id, description)| IllustrationCtx::new(run_id, section_id, description))
                .collect();

            s.document = Some(document);
            s.outstanding = outstanding;
            s.phase = if outstanding > 0 {
                RunPhase::SectionsSettling
            } else {
                RunPhase::Idle
            };
            outcome = PublishOutcome::Published { targets };
            true
        });
        outcome
    }

    /// 结构失败：不发布任何文档，回到空闲
    pub fn fail_structure(&self, run_id: RunId, message: impl Into<String>) -> bool {
        let message = message.into();
        self.tx.send_if_modified(|s| {
            if s.run_id != Some(run_id) || s.phase != RunPhase::StructurePending {
                return false;
            }
            s.document = None;
            s.outstanding = 0;
            s.phase = RunPhase::Idle;
            s.last_error = Some(message);
            true
        })
    }

    /// 把一张插图合并进当前文档，只修改 `ctx.section_id` 对应的段落
    pub fn apply_illustration(&self, ctx: &IllustrationCtx, image_url: String) -> MergeOutcome {
        let mut outcome = MergeOutcome::StaleRun;
        self.tx.send_if_modified(|s| {
            if s.run_id != Some(ctx.run_id) {
                return false;
            }
            let Some(document) = s.document.as_mut() else {
                return false;
            };
            let Some(section) = document.section_mut(&ctx.section_id) else {
                outcome = MergeOutcome::UnknownSection;
                return false;
            };
            // 只有仍在加载中的段落才接受结果，每个段落只计数一次
            if !section.is_generating_image {
                outcome = MergeOutcome::AlreadySettled;
                return false;
            }

            section.image_url = Some(image_url);
            section.is_generating_image = false;

            s.outstanding = s.outstanding.saturating_sub(1);
            if s.outstanding == 0 {
                s.phase = RunPhase::Idle;
            }
            debug!(
                "{} 已合并，剩余 {} 张，加载中段落 {} 个",
                ctx,
                s.outstanding,
                document.image_sections_pending()
            );
            outcome = MergeOutcome::Applied;
            true
        });
        outcome
    }
}

impl Default for WorksheetState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Section, SectionKind};

    fn image(id: &str, description: Option<&str>) -> Section {
        Section {
            image_description: description.map(str::to_string),
            ..Section::new(id, SectionKind::Image)
        }
    }

    fn sample_document() -> WorksheetDocument {
        WorksheetDocument {
            title: "Solar System".to_string(),
            grade_level: "2nd Grade".to_string(),
            subject: "Science".to_string(),
            sections: vec![
                Section {
                    content: Some("The Sun is a star.".to_string()),
                    ..Section::new("intro", SectionKind::Text)
                },
                image("sun", Some("a smiling sun")),
                image("planets", Some("eight planets")),
                image("blank", None),
            ],
        }
    }

    fn published(state: &WorksheetState, run_id: RunId) -> Vec<IllustrationCtx> {
        match state.publish_structure(run_id, sample_document()) {
            PublishOutcome::Published { targets } => targets,
            PublishOutcome::StaleRun => panic!("应当发布成功"),
        }
    }

    #[test]
    fn test_begin_run_clears_previous_state() {
        let state = WorksheetState::new();
        let first = state.begin_run();
        published(&state, first);
        assert!(state.snapshot().document.is_some());

        let second = state.begin_run();
        assert!(second > first);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.run_id, Some(second));
        assert_eq!(snapshot.phase, RunPhase::StructurePending);
        assert!(snapshot.document.is_none());
        assert_eq!(snapshot.outstanding, 0);
    }

    #[test]
    fn test_publish_marks_only_described_images() {
        let state = WorksheetState::new();
        let run_id = state.begin_run();
        let targets = published(&state, run_id);

        let ids: Vec<_> = targets.iter().map(|t| t.section_id.as_str()).collect();
        assert_eq!(ids, vec!["sun", "planets"]);

        let snapshot = state.snapshot();
        let document = snapshot.document.as_ref().unwrap();
        assert_eq!(snapshot.outstanding, 2);
        assert_eq!(snapshot.phase, RunPhase::SectionsSettling);
        assert!(document.section("sun").unwrap().is_generating_image);
        assert!(!document.section("blank").unwrap().is_generating_image);
        assert!(!document.section("intro").unwrap().is_generating_image);
        assert!(!snapshot.can_print());
    }

    #[test]
    fn test_merge_touches_only_its_section() {
        let state = WorksheetState::new();
        let run_id = state.begin_run();
        let targets = published(&state, run_id);
        let before = state.snapshot().document.unwrap();

        let outcome = state.apply_illustration(&targets[1], "data:image/png;base64,AAAA".to_string());
        assert_eq!(outcome, MergeOutcome::Applied);

        let snapshot = state.snapshot();
        let after = snapshot.document.as_ref().unwrap();
        for (old, new) in before.sections.iter().zip(after.sections.iter()) {
            if old.id == "planets" {
                assert_eq!(new.image_url.as_deref(), Some("data:image/png;base64,AAAA"));
                assert!(!new.is_generating_image);
            } else {
                assert_eq!(old, new);
            }
        }
        assert_eq!(snapshot.outstanding, 1);
        assert_eq!(snapshot.phase, RunPhase::SectionsSettling);
    }

    #[test]
    fn test_settling_all_returns_to_idle() {
        let state = WorksheetState::new();
        let run_id = state.begin_run();
        let targets = published(&state, run_id);

        for target in targets.iter().rev() {
            state.apply_illustration(target, "u".to_string());
        }

        let snapshot = state.snapshot();
        assert_eq!(snapshot.outstanding, 0);
        assert_eq!(snapshot.phase, RunPhase::Idle);
        assert!(snapshot.can_print());
    }

    #[test]
    fn test_duplicate_settlement_is_ignored() {
        let state = WorksheetState::new();
        let run_id = state.begin_run();
        let targets = published(&state, run_id);

        assert_eq!(state.apply_illustration(&targets[0], "first".to_string()), MergeOutcome::Applied);
        let after_first = state.snapshot();

        for _ in 0..3 {
            assert_eq!(
                state.apply_illustration(&targets[0], "again".to_string()),
                MergeOutcome::AlreadySettled
            );
        }

        let snapshot = state.snapshot();
        assert_eq!(snapshot, after_first);
        assert_eq!(snapshot.outstanding, 1);
        assert_eq!(snapshot.phase, RunPhase::SectionsSettling);
        assert!(!snapshot.can_print());
        let document = snapshot.document.unwrap();
        assert_eq!(document.section("sun").unwrap().image_url.as_deref(), Some("first"));
        assert!(document.section("planets").unwrap().is_generating_image);
    }

    #[test]
    fn test_settlement_for_non_loading_section_is_ignored() {
        let state = WorksheetState::new();
        let run_id = state.begin_run();
        published(&state, run_id);
        let before = state.snapshot();

        for id in ["intro", "blank"] {
            let ctx = IllustrationCtx::new(run_id, id, "x");
            assert_eq!(state.apply_illustration(&ctx, "u".to_string()), MergeOutcome::AlreadySettled);
        }

        let snapshot = state.snapshot();
        assert_eq!(snapshot, before);
        assert_eq!(snapshot.outstanding, 2);
        assert!(snapshot.document.unwrap().section("intro").unwrap().image_url.is_none());
    }

    #[test]
    fn test_stale_run_merge_is_dropped() {
        let state = WorksheetState::new();
        let old_run = state.begin_run();
        let old_targets = published(&state, old_run);

        let new_run = state.begin_run();
        let new_targets = published(&state, new_run);

        let outcome = state.apply_illustration(&old_targets[0], "stale".to_string());
        assert_eq!(outcome, MergeOutcome::StaleRun);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.outstanding, new_targets.len());
        let document = snapshot.document.unwrap();
        assert!(document.section("sun").unwrap().image_url.is_none());
        assert!(document.section("sun").unwrap().is_generating_image);
    }

    #[test]
    fn test_stale_structure_is_not_published() {
        let state = WorksheetState::new();
        let old_run = state.begin_run();
        let _new_run = state.begin_run();

        assert_eq!(
            state.publish_structure(old_run, sample_document()),
            PublishOutcome::StaleRun
        );
        assert!(state.snapshot().document.is_none());
    }

    #[test]
    fn test_unknown_section() {
        let state = WorksheetState::new();
        let run_id = state.begin_run();
        published(&state, run_id);

        let ctx = IllustrationCtx::new(run_id, "missing", "x");
        assert_eq!(state.apply_illustration(&ctx, "u".to_string()), MergeOutcome::UnknownSection);
        assert_eq!(state.snapshot().outstanding, 2);
    }

    #[test]
    fn test_fail_structure() {
        let state = WorksheetState::new();
        let run_id = state.begin_run();
        assert!(state.fail_structure(run_id, "boom"));

        let snapshot = state.snapshot();
        assert!(snapshot.document.is_none());
        assert_eq!(snapshot.outstanding, 0);
        assert_eq!(snapshot.phase, RunPhase::Idle);
        assert_eq!(snapshot.last_error.as_deref(), Some("boom"));

        // 已经失败过一次，不会重复生效
        assert!(!state.fail_structure(run_id, "again"));
    }

    #[tokio::test]
    async fn test_subscriber_sees_changes() {
        let state = WorksheetState::new();
        let mut rx = state.subscribe();

        let run_id = state.begin_run();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, RunPhase::StructurePending);

        published(&state, run_id);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().outstanding, 2);
    }
}
