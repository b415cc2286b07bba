//! Report data model: canonical D0–D8 state and action lists

mod actions;
mod state;

pub use actions::{derive_status, ActionList, ActionRecord, ActionStatus};
pub use state::{
    D0Preparation, D1Team, D2Problem, D4RootCause, D6Verification, D7Prevention, D8Closure,
    MergeReport, ReportState, SectionKey, FIVE_WHYS_DEPTH,
};
