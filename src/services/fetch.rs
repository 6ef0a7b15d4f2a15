// src/services/fetch.rs

//! Search page fetcher with bounded retries.

use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, SearchCriteria};

/// Fetches raw search result pages by offset.
///
/// Each fetch is a single GET against the advanced-search endpoint. Transport
/// errors, timeouts, and non-2xx statuses are retried up to
/// `crawler.max_retries` additional times with no delay; after that the page
/// is reported as failed with its offset.
pub struct PageFetcher {
    client: Client,
    criteria: SearchCriteria,
    max_retries: u32,
}

impl PageFetcher {
    /// Create a fetcher for the given criteria.
    pub fn new(config: &CrawlerConfig, criteria: SearchCriteria) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            criteria,
            max_retries: config.max_retries,
        })
    }

    /// The criteria this fetcher queries for.
    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    /// Fetch the raw result page starting at `start`.
    ///
    /// `start` must be a non-negative multiple of the page size.
    pub async fn fetch_page(&self, start: usize) -> Result<String> {
        debug_assert_eq!(start % self.criteria.page_size, 0);
        let url = self.criteria.search_url(start);
        self.fetch_with_retry(&url, start).await
    }

    async fn fetch_with_retry(&self, url: &str, start: usize) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            match self.try_fetch(url).await {
                Ok(body) => return Ok(body),
                Err(error) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(AppError::fetch(start, attempt, error));
                    }
                    log::warn!(
                        "Request for offset {} failed: {}. Retrying {}/{}",
                        start,
                        error,
                        attempt,
                        self.max_retries
                    );
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
