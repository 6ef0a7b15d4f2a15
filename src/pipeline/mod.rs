//! Pipeline entry points for harvester operations.
//!
//! - `run_full_crawl`: fetch every page of the result listing
//! - `run_update`: fetch newest pages until an already-known record appears

pub mod crawl;
pub mod sync;

pub use crawl::{run_full_crawl, run_update, CrawlSummary};
pub use sync::admit_batch;
