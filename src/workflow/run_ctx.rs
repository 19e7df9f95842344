//! 运行上下文
//!
//! 封装"这是第几次运行的哪个段落"这一信息，合并插图结果时用作键

use std::fmt::Display;

/// 运行标识，单调递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    pub const FIRST: RunId = RunId(1);

    pub fn next(self) -> RunId {
        RunId(self.0 + 1)
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 插图任务上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationCtx {
    pub run_id: RunId,
    pub section_id: String,
    pub description: String,
}

impl IllustrationCtx {
    pub fn new(run_id: RunId, section_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            run_id,
            section_id: section_id.into(),
            description: description.into(),
        }
    }
}

impl Display for IllustrationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[运行 {} 段落 {}]", self.run_id, self.section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_is_monotonic() {
        let first = RunId::FIRST;
        assert!(first.next() > first);
        assert_eq!(first.next().to_string(), "#2");
    }

    #[test]
    fn test_ctx_display() {
        let ctx = IllustrationCtx::new(RunId::FIRST.next(), "s2", "a sun");
        assert_eq!(ctx.to_string(), "[运行 #2 段落 s2]");
    }
}
