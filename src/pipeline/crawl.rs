// src/pipeline/crawl.rs

//! Full and incremental crawl orchestration.

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, Paper, RESULT_ORDER};
use crate::pipeline::sync::admit_batch;
use crate::services::{Enricher, PageFetcher, ParsedPage, SearchPageParser};
use crate::storage::PaperStore;

/// Mutable context for one crawl execution.
#[derive(Debug, Default)]
struct CrawlRun {
    total: Option<usize>,
    papers: Vec<Paper>,
}

/// Summary of a finished crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Total results the server reported for the criteria
    pub total: usize,

    /// Number of records handed to storage
    pub harvested: usize,

    /// Number of pages fetched
    pub pages: usize,
}

/// Run a full crawl: fetch every page of the result listing, enrich, then
/// hand the whole buffer to storage in one call.
pub async fn run_full_crawl(
    config: &Config,
    store: &dyn PaperStore,
    cancel: &CancellationToken,
) -> Result<CrawlSummary> {
    let criteria = config.search.criteria()?;
    let step = criteria.page_size;
    let fetcher = PageFetcher::new(&config.crawler, criteria)?;
    let parser = SearchPageParser::new(config.crawler.on_parse_error)?;
    let enricher = Enricher::from_config(&config.translation, &config.crawler)?;

    log::info!("Fetching the first {} results...", step);
    log::debug!("{}", fetcher.criteria().search_url(0));

    let mut run = CrawlRun::default();
    let first = fetch_page(&fetcher, &parser, 0, true, cancel).await?;
    run.total = first.total;
    run.papers = first.papers;

    let total = run.total.unwrap_or(0);
    if total == 0 {
        log::info!("Query returned no results");
        return Ok(CrawlSummary {
            total: 0,
            harvested: 0,
            pages: 1,
        });
    }

    // Remaining pages run as an unordered fan-out with a fan-in barrier.
    // Any page failure aborts the whole run: offsets are positional, and a
    // silently skipped page would desynchronize the pagination math.
    let offsets: Vec<usize> = (step..total).step_by(step).collect();
    let pages = offsets.len() + 1;
    log::info!("Fetching {} results across {} pages", total, pages);

    let mut page_stream = stream::iter(offsets)
        .map(|start| fetch_page(&fetcher, &parser, start, false, cancel))
        .buffer_unordered(config.crawler.max_concurrent.max(1));

    while let Some(page) = page_stream.next().await {
        run.papers.extend(page?.papers);
    }

    if let Some(enricher) = &enricher {
        enricher.enrich(&mut run.papers, cancel).await?;
    }

    let harvested = run.papers.len();
    store.add_papers(&run.papers).await?;
    run.papers.clear();

    log::info!("Crawl complete: {} records stored", harvested);
    Ok(CrawlSummary {
        total,
        harvested,
        pages,
    })
}

/// Run an incremental update: fetch pages strictly in sequence, submitting
/// each page's records before deciding whether to read further.
///
/// Precondition: the criteria's order must be newest-first
/// (`-announced_date_first`). The early stop is only correct under that
/// order, since it assumes every record after the first known one is also
/// known.
pub async fn run_update(
    config: &Config,
    store: &dyn PaperStore,
    cancel: &CancellationToken,
) -> Result<CrawlSummary> {
    let criteria = config.search.criteria()?;
    if criteria.order != RESULT_ORDER {
        return Err(AppError::config(format!(
            "incremental update requires order {RESULT_ORDER:?}, got {:?}",
            criteria.order
        )));
    }

    let step = criteria.page_size;
    let fetcher = PageFetcher::new(&config.crawler, criteria)?;
    let parser = SearchPageParser::new(config.crawler.on_parse_error)?;
    let enricher = Enricher::from_config(&config.translation, &config.crawler)?;

    log::info!("Updating the first {} results...", step);
    log::debug!("{}", fetcher.criteria().search_url(0));

    let mut run = CrawlRun::default();
    let mut summary = CrawlSummary::default();
    let mut start = 0;

    loop {
        let page = fetch_page(&fetcher, &parser, start, start == 0, cancel).await?;
        summary.pages += 1;
        if start == 0 {
            run.total = page.total;
            summary.total = run.total.unwrap_or(0);
        }
        run.papers = page.papers;

        // Enrich before submission so storage only ever sees finished records
        if let Some(enricher) = &enricher {
            enricher.enrich(&mut run.papers, cancel).await?;
        }

        summary.harvested += run.papers.len();
        let continue_update = admit_batch(store, &run.papers).await?;
        run.papers.clear();

        if !continue_update {
            log::info!("Reached already-known records, stopping");
            break;
        }

        start += step;
        if start >= summary.total {
            break;
        }
        log::info!("Updating results {}-{}...", start, start + step);
    }

    log::info!(
        "Update complete: {} records submitted over {} pages",
        summary.harvested,
        summary.pages
    );
    Ok(summary)
}

/// Fetch and parse one page, aborting early on cancellation. The parser is
/// never invoked for a page whose fetch failed.
async fn fetch_page(
    fetcher: &PageFetcher,
    parser: &SearchPageParser,
    start: usize,
    need_total: bool,
    cancel: &CancellationToken,
) -> Result<ParsedPage> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = async {
            let body = fetcher.fetch_page(start).await?;
            parser.parse(&body, need_total)
        } => result,
    }
}
