//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPlan` / `CrawlCursor`: the keyword × page grid and the cursor that walks it
//! - `DedupIndex`: identity keys seen so far, rebuildable from a checkpoint
//! - `RunState`: lifecycle of a crawl run

mod dedup;
mod plan;
mod run_state;

// Re-export main types
pub use dedup::{DedupIndex, SharedDedupIndex};
pub use plan::{CrawlCell, CrawlCursor, CrawlPlan, PlanExhausted};
pub use run_state::RunState;
