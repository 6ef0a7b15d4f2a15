// src/services/mod.rs

//! Network-facing services: page fetching, result parsing, translation.

pub mod fetch;
pub mod parse;
pub mod translate;

pub use fetch::PageFetcher;
pub use parse::{ParsedPage, SearchPageParser};
pub use translate::{Enricher, GoogleTranslator, Translator};
