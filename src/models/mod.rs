// src/models/mod.rs

//! Domain models for the harvester.

mod config;
mod criteria;
mod paper;

pub use config::{
    Config, CrawlerConfig, OutputConfig, ParseFailurePolicy, SearchConfig, TranslateFailurePolicy,
    TranslationConfig,
};
pub use criteria::{DateFilter, SearchCriteria, RESULT_ORDER, SEARCH_ENDPOINT};
pub use paper::Paper;
