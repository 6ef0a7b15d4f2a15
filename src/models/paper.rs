//! Harvested paper record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::extract_paper_id;

/// One paper harvested from a search result page.
///
/// The abstract URL is the record's identity; storage deduplicates on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paper {
    /// Abstract page URL, unique per paper
    pub url: String,

    /// Title with highlight markers stripped
    pub title: String,

    /// Author list as free text
    pub authors: String,

    /// Full abstract with highlight markers stripped
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Date of the first submission, no time component
    pub first_submitted: NaiveDate,

    /// Category tags in listing order, may be empty
    #[serde(default)]
    pub categories: Vec<String>,

    /// Translated title, present once enrichment has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_title: Option<String>,

    /// Translated abstract, present once enrichment has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_abstract: Option<String>,
}

impl Paper {
    /// The arXiv identifier extracted from the URL, when recognizable.
    pub fn arxiv_id(&self) -> Option<String> {
        extract_paper_id(&self.url)
    }

    /// Whether the paper belongs in the featured export section: at least one
    /// whitelisted category and no blacklisted one.
    pub fn is_featured(&self, whitelist: &[String], blacklist: &[String]) -> bool {
        let whitelisted = self
            .categories
            .iter()
            .any(|c| whitelist.iter().any(|w| w == c));
        let blacklisted = self
            .categories
            .iter()
            .any(|c| blacklist.iter().any(|b| b == c));
        whitelisted && !blacklisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paper(categories: &[&str]) -> Paper {
        Paper {
            url: "https://arxiv.org/abs/2408.12345".to_string(),
            title: "Test Paper".to_string(),
            authors: "A. Author".to_string(),
            abstract_text: "An abstract.".to_string(),
            first_submitted: NaiveDate::from_ymd_opt(2024, 8, 8).unwrap(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            translated_title: None,
            translated_abstract: None,
        }
    }

    #[test]
    fn test_arxiv_id() {
        assert_eq!(
            sample_paper(&[]).arxiv_id(),
            Some("2408.12345".to_string())
        );
    }

    #[test]
    fn test_is_featured() {
        let whitelist = vec!["cs.CL".to_string(), "cs.AI".to_string()];
        let blacklist = vec!["cs.CR".to_string()];

        assert!(sample_paper(&["cs.CL"]).is_featured(&whitelist, &blacklist));
        assert!(!sample_paper(&["cs.CV"]).is_featured(&whitelist, &blacklist));
        assert!(!sample_paper(&["cs.CL", "cs.CR"]).is_featured(&whitelist, &blacklist));
        assert!(!sample_paper(&[]).is_featured(&whitelist, &blacklist));
    }

    #[test]
    fn test_serde_round_trip_keeps_translation() {
        let mut paper = sample_paper(&["cs.CL"]);
        paper.translated_title = Some("测试论文".to_string());

        let json = serde_json::to_string(&paper).unwrap();
        assert!(json.contains("\"abstract\""));

        let back: Paper = serde_json::from_str(&json).unwrap();
        assert_eq!(back, paper);
    }
}
