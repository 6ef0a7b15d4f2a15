//! Immutable search criteria and advanced-search URL construction.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Fixed advanced-search endpoint.
pub const SEARCH_ENDPOINT: &str = "https://arxiv.org/search/advanced";

/// Sort order the incremental update protocol depends on: results are listed
/// by descending announcement recency, newest first.
pub const RESULT_ORDER: &str = "-announced_date_first";

/// Which date the server-side range filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    /// Filter by first submission date.
    #[default]
    SubmittedDateFirst,

    /// Filter by first announcement date. Matches more results, but the
    /// server only honors the year and month of the range bounds.
    AnnouncedDateFirst,
}

impl DateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::SubmittedDateFirst => "submitted_date_first",
            DateFilter::AnnouncedDateFirst => "announced_date_first",
        }
    }
}

/// Immutable description of one search.
///
/// A paper matches when its filtered date falls in `[date_from, date_until)`
/// and at least one keyword occurs in its title or abstract. The whitelist
/// and blacklist do not narrow the search itself; they classify results for
/// export.
#[derive(Debug, Clone, Serialize)]
pub struct SearchCriteria {
    /// Start of the date range, inclusive
    pub date_from: NaiveDate,

    /// End of the date range, exclusive
    pub date_until: NaiveDate,

    /// Categories shown in full in exports
    pub whitelist: Vec<String>,

    /// Categories that exclude a paper from the featured section
    pub blacklist: Vec<String>,

    /// OR-combined keyword terms; must not be empty
    pub keywords: Vec<String>,

    /// Date field the range filter applies to
    pub date_filter: DateFilter,

    /// Number of results per page
    pub page_size: usize,

    /// Result sort order sent to the server
    pub order: String,
}

impl SearchCriteria {
    /// Check the criteria invariants.
    pub fn validate(&self) -> Result<()> {
        if self.keywords.iter().all(|kw| kw.trim().is_empty()) {
            return Err(AppError::validation("search.keywords is empty"));
        }
        if self.page_size == 0 {
            return Err(AppError::validation("search.page_size must be > 0"));
        }
        if self.date_from >= self.date_until {
            return Err(AppError::validation(format!(
                "empty date range: from {} (inclusive) to {} (exclusive)",
                self.date_from, self.date_until
            )));
        }
        Ok(())
    }

    /// Build the advanced-search URL for the page starting at `start`.
    pub fn search_url(&self, start: usize) -> String {
        let mut url = String::from(SEARCH_ENDPOINT);
        url.push_str("?advanced=");

        for (i, keyword) in self.keywords.iter().enumerate() {
            let term = keyword.replace(' ', "+");
            let _ = write!(
                url,
                "&terms-{i}-operator=OR&terms-{i}-term={term}&terms-{i}-field=all"
            );
        }

        let _ = write!(
            url,
            "&classification-computer_science=y\
             &classification-physics_archives=all\
             &classification-include_cross_list=include\
             &date-year=&date-filter_by=date_range\
             &date-from_date={from}&date-to_date={until}\
             &date-date_type={date_type}\
             &abstracts=show&size={size}&order={order}&start={start}",
            from = self.date_from.format("%Y-%m-%d"),
            until = self.date_until.format("%Y-%m-%d"),
            date_type = self.date_filter.as_str(),
            size = self.page_size,
            order = self.order,
        );

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_criteria() -> SearchCriteria {
        SearchCriteria {
            date_from: NaiveDate::from_ymd_opt(2024, 8, 8).unwrap(),
            date_until: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            whitelist: vec!["cs.CL".to_string()],
            blacklist: vec![],
            keywords: vec!["LLM".to_string(), "language model".to_string()],
            date_filter: DateFilter::SubmittedDateFirst,
            page_size: 50,
            order: RESULT_ORDER.to_string(),
        }
    }

    #[test]
    fn test_search_url_encodes_terms_and_range() {
        let url = sample_criteria().search_url(100);

        assert!(url.starts_with(SEARCH_ENDPOINT));
        assert!(url.contains("terms-0-operator=OR&terms-0-term=LLM&terms-0-field=all"));
        assert!(url.contains("terms-1-term=language+model"));
        assert!(url.contains("date-from_date=2024-08-08"));
        assert!(url.contains("date-to_date=2024-08-15"));
        assert!(url.contains("date-date_type=submitted_date_first"));
        assert!(url.contains("size=50"));
        assert!(url.contains("order=-announced_date_first"));
        assert!(url.ends_with("start=100"));
    }

    #[test]
    fn test_validate_rejects_empty_keywords() {
        let mut criteria = sample_criteria();
        criteria.keywords = vec!["  ".to_string()];
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_range() {
        let mut criteria = sample_criteria();
        criteria.date_until = criteria.date_from;
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample_criteria().validate().is_ok());
    }
}
