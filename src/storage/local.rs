//! Local filesystem storage implementation.
//!
//! Keeps the whole corpus in a single `papers.json` under the storage root,
//! deduplicated by paper URL. Writes are atomic (temp file, then rename) so
//! an aborted run never leaves a half-written database behind.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Paper;
use crate::storage::PaperStore;

const PAPERS_FILE: &str = "papers.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn papers_path(&self) -> PathBuf {
        self.root_dir.join(PAPERS_FILE)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_papers(&self) -> Result<Vec<Paper>> {
        match tokio::fs::read(self.papers_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_papers(&self, papers: &[Paper]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(papers)?;
        self.write_bytes(&self.papers_path(), &bytes).await
    }

    /// Merge a batch into the corpus, reporting per-paper novelty.
    async fn merge(&self, papers: &[Paper]) -> Result<Vec<bool>> {
        let mut corpus = self.read_papers().await?;
        let mut index: HashMap<String, usize> = corpus
            .iter()
            .enumerate()
            .map(|(i, p)| (p.url.clone(), i))
            .collect();

        let mut novelty = Vec::with_capacity(papers.len());
        for paper in papers {
            match index.get(&paper.url) {
                Some(&i) => {
                    corpus[i] = paper.clone();
                    novelty.push(false);
                }
                None => {
                    index.insert(paper.url.clone(), corpus.len());
                    corpus.push(paper.clone());
                    novelty.push(true);
                }
            }
        }

        self.write_papers(&corpus).await?;
        Ok(novelty)
    }
}

#[async_trait]
impl PaperStore for LocalStore {
    async fn add_papers(&self, papers: &[Paper]) -> Result<()> {
        let novelty = self.merge(papers).await?;
        let new_count = novelty.iter().filter(|novel| **novel).count();
        log::info!("Stored {} records ({} new)", papers.len(), new_count);
        Ok(())
    }

    async fn upsert_papers(&self, papers: &[Paper]) -> Result<Vec<bool>> {
        self.merge(papers).await
    }

    async fn load_all(&self) -> Result<Vec<Paper>> {
        let mut papers = self.read_papers().await?;
        papers.sort_by(|a, b| b.first_submitted.cmp(&a.first_submitted));
        Ok(papers)
    }
}
