//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the controller's state machine phases
//! - `CrawlState`: resumable progress (visited pages, counters, pending URL)
//! - `VisitedSet`: normalized URLs already fetched, used as the cycle guard

mod crawl_phase;
mod crawl_state;

pub use crawl_phase::CrawlPhase;
pub use crawl_state::{CrawlState, VisitedSet};
