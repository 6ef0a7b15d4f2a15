//! Storage abstractions for harvested papers.
//!
//! Storage owns durable identity-based deduplication keyed by the paper URL;
//! the crawl pipeline only talks to the [`PaperStore`] trait.

pub mod export;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Paper;

// Re-export for convenience
pub use local::LocalStore;

/// Trait for paper storage backends.
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Insert a batch of papers, replacing records with the same URL.
    async fn add_papers(&self, papers: &[Paper]) -> Result<()>;

    /// Insert a batch and report, per paper, whether it was new (true) or
    /// already known (false). Known papers are refreshed in place.
    async fn upsert_papers(&self, papers: &[Paper]) -> Result<Vec<bool>>;

    /// Load every stored paper, newest submission first.
    async fn load_all(&self) -> Result<Vec<Paper>>;
}
