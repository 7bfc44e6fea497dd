//! The crawl-and-curate pipeline
//!
//! Four stages composed by the orchestrator, each a pure transformation over
//! an explicitly owned value: discover links, harvest page content, curate
//! out low-value entries, persist to a sink. Stage toggles make "crawl
//! only", "crawl + curate", and the full run variants of one pipeline rather
//! than separate implementations.

mod curate;
mod discover;
mod harvest;
mod orchestrator;

pub use curate::curate;
pub use discover::discover;
pub use harvest::harvest;
pub use orchestrator::{run_pipeline, RunSummary, Stages};
