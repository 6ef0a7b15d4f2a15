//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::criteria::{DateFilter, SearchCriteria, RESULT_ORDER};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search criteria settings
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Translation enrichment settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Export settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.translation.max_concurrent == 0 {
            return Err(AppError::validation("translation.max_concurrent must be > 0"));
        }
        if self.output.filename_format.trim().is_empty() {
            return Err(AppError::validation("output.filename_format is empty"));
        }
        self.search.criteria()?.validate()
    }
}

/// Search criteria settings, resolved into a [`SearchCriteria`] per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Start of the date range (YYYY-MM-DD, inclusive); yesterday if unset
    #[serde(default)]
    pub date_from: Option<String>,

    /// End of the date range (YYYY-MM-DD, exclusive); today if unset
    #[serde(default)]
    pub date_until: Option<String>,

    /// Categories shown in full in exports
    #[serde(default = "defaults::whitelist")]
    pub whitelist: Vec<String>,

    /// Categories hidden from the featured export section
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// OR-combined keyword terms
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// Date field the range filter applies to
    #[serde(default)]
    pub date_filter: DateFilter,

    /// Results per search page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,
}

impl SearchConfig {
    /// Resolve into immutable criteria, defaulting the date range to
    /// [yesterday, today).
    pub fn criteria(&self) -> Result<SearchCriteria> {
        let today = Local::now().date_naive();
        let date_from = match &self.date_from {
            Some(s) => parse_date(s)?,
            None => today - Duration::days(1),
        };
        let date_until = match &self.date_until {
            Some(s) => parse_date(s)?,
            None => today,
        };

        let criteria = SearchCriteria {
            date_from,
            date_until,
            whitelist: self.whitelist.clone(),
            blacklist: self.blacklist.clone(),
            keywords: self.keywords.clone(),
            date_filter: self.date_filter,
            page_size: self.page_size,
            order: RESULT_ORDER.to_string(),
        };
        criteria.validate()?;
        Ok(criteria)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            date_from: None,
            date_until: None,
            whitelist: defaults::whitelist(),
            blacklist: Vec::new(),
            keywords: defaults::keywords(),
            date_filter: DateFilter::default(),
            page_size: defaults::page_size(),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::config(format!("invalid date {s:?}, expected YYYY-MM-DD")))
}

/// What to do when a result entry does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ParseFailurePolicy {
    /// Abort the whole run; unexpected markup means the upstream page
    /// structure changed and needs attention.
    #[default]
    Abort,

    /// Drop the record with a warning and keep going.
    Skip,
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Additional attempts after a failed page request
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Maximum concurrent page requests in full-crawl mode
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Forward proxy for arXiv and translation requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// Policy for result entries that fail to parse
    #[serde(default)]
    pub on_parse_error: ParseFailurePolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            max_concurrent: defaults::max_concurrent(),
            proxy: None,
            on_parse_error: ParseFailurePolicy::default(),
        }
    }
}

/// What to do when translating a single record fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TranslateFailurePolicy {
    /// Keep the record untranslated and log the failure.
    #[default]
    KeepOriginal,

    /// Abort the run on the first translation failure.
    Abort,
}

/// Translation enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Target language code (e.g. "zh-CN"); unset or empty disables translation
    #[serde(default)]
    pub target_lang: Option<String>,

    /// Maximum concurrent translation requests
    #[serde(default = "defaults::translation_concurrent")]
    pub max_concurrent: usize,

    /// Policy for per-record translation failures
    #[serde(default)]
    pub on_error: TranslateFailurePolicy,
}

impl TranslationConfig {
    /// The target language, or None when translation is disabled.
    pub fn target(&self) -> Option<&str> {
        self.target_lang
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_lang: None,
            max_concurrent: defaults::translation_concurrent(),
            on_error: TranslateFailurePolicy::default(),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory exported documents are written to
    #[serde(default = "defaults::output_dir")]
    pub dir: String,

    /// strftime pattern for exported file names, applied to the run date
    #[serde(default = "defaults::filename_format")]
    pub filename_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            filename_format: defaults::filename_format(),
        }
    }
}

mod defaults {
    // Search defaults
    pub fn whitelist() -> Vec<String> {
        vec![
            "cs.CV".into(),
            "cs.AI".into(),
            "cs.LG".into(),
            "cs.CL".into(),
            "cs.IR".into(),
            "cs.MA".into(),
        ]
    }
    pub fn keywords() -> Vec<String> {
        vec![
            "LLM".into(),
            "LLMs".into(),
            "language model".into(),
            "language models".into(),
            "multimodal".into(),
            "finetuning".into(),
            "GPT".into(),
        ]
    }
    pub fn page_size() -> usize {
        50
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Translation defaults
    pub fn translation_concurrent() -> usize {
        8
    }

    // Output defaults
    pub fn output_dir() -> String {
        "./output".into()
    }
    pub fn filename_format() -> String {
        "%Y-%m-%d".into()
    }
}
