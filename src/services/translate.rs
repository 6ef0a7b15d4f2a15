// src/services/translate.rs

//! Translation enrichment stage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, Paper, TranslateFailurePolicy, TranslationConfig};

const TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the target language.
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
}

/// Translator backed by the public google-translate endpoint.
pub struct GoogleTranslator {
    client: Client,
}

impl GoogleTranslator {
    /// Create a translator sharing the crawler's user agent, timeout, and
    /// proxy settings.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let response = self
            .client
            .get(TRANSLATE_ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?;

        // Response is a nested array; element 0 holds the translated
        // segments as [translated, original, ...] pairs.
        let body: Value = serde_json::from_str(&response.text().await?)?;
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::translate(target_lang, "unexpected response shape"))?;

        let mut out = String::new();
        for segment in segments {
            if let Some(piece) = segment.get(0).and_then(Value::as_str) {
                out.push_str(piece);
            }
        }
        Ok(out)
    }
}

/// Applies translations to a batch of papers in place, with bounded
/// concurrency.
pub struct Enricher {
    translator: Arc<dyn Translator>,
    target_lang: String,
    max_concurrent: usize,
    on_error: TranslateFailurePolicy,
}

impl Enricher {
    /// Create an enricher; fails fast when no target language is given.
    pub fn new(
        translator: Arc<dyn Translator>,
        target_lang: impl Into<String>,
        max_concurrent: usize,
        on_error: TranslateFailurePolicy,
    ) -> Result<Self> {
        let target_lang = target_lang.into();
        if target_lang.trim().is_empty() {
            return Err(AppError::config("no target language specified"));
        }
        Ok(Self {
            translator,
            target_lang,
            max_concurrent: max_concurrent.max(1),
            on_error,
        })
    }

    /// Build an enricher from configuration; None when translation is
    /// disabled.
    pub fn from_config(
        translation: &TranslationConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Option<Self>> {
        let Some(target) = translation.target() else {
            return Ok(None);
        };
        let translator = Arc::new(GoogleTranslator::new(crawler)?);
        Ok(Some(Self::new(
            translator,
            target,
            translation.max_concurrent,
            translation.on_error,
        )?))
    }

    /// Translate title and abstract of every paper.
    ///
    /// Failures are handled per record according to the configured policy;
    /// cancellation always aborts.
    pub async fn enrich(&self, papers: &mut [Paper], cancel: &CancellationToken) -> Result<()> {
        log::info!(
            "Translating {} papers to {}",
            papers.len(),
            self.target_lang
        );

        let results: Vec<Result<()>> = stream::iter(papers.iter_mut())
            .map(|paper| async move {
                tokio::select! {
                    _ = cancel.cancelled() => Err(AppError::Cancelled),
                    result = self.translate_paper(paper) => result,
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for result in results {
            match result {
                Ok(()) => {}
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(error) => match self.on_error {
                    TranslateFailurePolicy::Abort => return Err(error),
                    TranslateFailurePolicy::KeepOriginal => {
                        log::warn!("{}; record kept untranslated", error);
                    }
                },
            }
        }

        Ok(())
    }

    async fn translate_paper(&self, paper: &mut Paper) -> Result<()> {
        let title = self
            .translator
            .translate(&paper.title, &self.target_lang)
            .await
            .map_err(|e| AppError::translate(&paper.url, e))?;
        let abstract_text = self
            .translator
            .translate(&paper.abstract_text, &self.target_lang)
            .await
            .map_err(|e| AppError::translate(&paper.url, e))?;

        paper.translated_title = Some(title);
        paper.translated_abstract = Some(abstract_text);
        Ok(())
    }
}
