pub mod run_ctx;
pub mod worksheet_state;

pub use run_ctx::{IllustrationCtx, RunId};
pub use worksheet_state::{MergeOutcome, PublishOutcome, RunPhase, WorksheetSnapshot, WorksheetState};
