// src/pipeline/sync.rs

//! Continuation decision for incremental updates.

use crate::error::Result;
use crate::models::Paper;
use crate::storage::PaperStore;

/// Submit a freshly parsed batch to storage and decide whether the update
/// continues to the next page.
///
/// The whole batch is upserted regardless of the outcome. Continuation
/// relies on the listing's newest-first sort order: one already-known record
/// in the batch means every record on later pages is already known too, so
/// the crawl stops. An empty batch stops trivially.
pub async fn admit_batch(store: &dyn PaperStore, papers: &[Paper]) -> Result<bool> {
    if papers.is_empty() {
        return Ok(false);
    }

    let novelty = store.upsert_papers(papers).await?;
    let new_count = novelty.iter().filter(|novel| **novel).count();
    log::info!("Submitted {} records, {} new", papers.len(), new_count);

    Ok(new_count == papers.len())
}
