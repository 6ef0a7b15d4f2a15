// src/services/parse.rs

//! Search result page parsing.
//!
//! One parser call turns a raw result page into a [`ParsedPage`]: on the
//! first page of a run the total result count, and the sequence of records
//! extracted from the `li.arxiv-result` entries.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Paper, ParseFailurePolicy, SEARCH_ENDPOINT};
use crate::utils::{collapse_whitespace, resolve_url};

/// Records parsed from one page, plus the result total when requested.
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Total result count; only set for the first page of a run. Callers
    /// persist it across the remaining pages of the run.
    pub total: Option<usize>,

    /// Records extracted from this page
    pub papers: Vec<Paper>,
}

/// Parser for advanced-search result pages.
pub struct SearchPageParser {
    policy: ParseFailurePolicy,
    base_url: Url,
    selectors: Selectors,
}

struct Selectors {
    total: Selector,
    result: Selector,
    link: Selector,
    title: Selector,
    date: Selector,
    tag: Selector,
    authors: Selector,
    abstract_full: Selector,
}

impl SearchPageParser {
    /// Create a parser with the given record-failure policy.
    pub fn new(policy: ParseFailurePolicy) -> Result<Self> {
        let base_url = Url::parse(SEARCH_ENDPOINT)
            .map_err(|e| AppError::config(format!("bad search endpoint: {e}")))?;

        Ok(Self {
            policy,
            base_url,
            selectors: Selectors {
                total: parse_selector(
                    "#main-container div.level.is-marginless div.level-left h1",
                )?,
                result: parse_selector("li.arxiv-result")?,
                link: parse_selector("a")?,
                title: parse_selector("p.title")?,
                date: parse_selector("p.is-size-7")?,
                tag: parse_selector("span.tag")?,
                authors: parse_selector("p.authors")?,
                abstract_full: parse_selector("span.abstract-full")?,
            },
        })
    }

    /// Parse one result page. `need_total` is set for the first page of a
    /// run; a "no results" header then yields `total = Some(0)` and an empty
    /// record sequence, which is a valid terminal state.
    pub fn parse(&self, html: &str, need_total: bool) -> Result<ParsedPage> {
        let document = Html::parse_document(html);
        let mut page = ParsedPage::default();

        if need_total {
            let header = self.result_count_header(&document)?;
            // "Showing 1–50 of 2,542,002 results" or
            // "Sorry, your query returned no results"
            if header.contains("Sorry") {
                page.total = Some(0);
                return Ok(page);
            }
            page.total = Some(parse_total(&header)?);
        }

        for entry in document.select(&self.selectors.result) {
            match self.parse_entry(&entry) {
                Ok(paper) => page.papers.push(paper),
                Err(error) => match self.policy {
                    ParseFailurePolicy::Abort => return Err(error),
                    ParseFailurePolicy::Skip => {
                        log::warn!("Dropping result entry: {}", error);
                    }
                },
            }
        }

        Ok(page)
    }

    fn result_count_header(&self, document: &Html) -> Result<String> {
        let header = document
            .select(&self.selectors.total)
            .next()
            .ok_or_else(|| AppError::parse("result page", "result count header not found"))?;
        Ok(header.text().collect())
    }

    fn parse_entry(&self, entry: &ElementRef) -> Result<Paper> {
        let url = entry
            .select(&self.selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_url(&self.base_url, href))
            .ok_or_else(|| AppError::parse("result entry", "no hyperlink found"))?;

        let title_el = entry
            .select(&self.selectors.title)
            .next()
            .ok_or_else(|| AppError::parse(&url, "title field missing"))?;
        let title = extract_rich_text(&title_el, &url)?.trim().to_string();

        let date_el = entry
            .select(&self.selectors.date)
            .next()
            .ok_or_else(|| AppError::parse(&url, "submission metadata missing"))?;
        let date_text: String = date_el.text().map(str::trim).collect();
        let first_submitted =
            parse_submission_date(&date_text).ok_or_else(|| AppError::date(&url, &date_text))?;

        let categories = entry
            .select(&self.selectors.tag)
            .filter(|tag| tag.value().attr("data-tooltip").is_some())
            .map(|tag| tag.text().collect::<String>().trim().to_string())
            .collect();

        let authors = entry
            .select(&self.selectors.authors)
            .next()
            .map(|el| {
                let text: String = el.text().map(str::trim).collect();
                text.strip_prefix("Authors:").unwrap_or(&text).to_string()
            })
            .unwrap_or_default();

        let abstract_el = entry
            .select(&self.selectors.abstract_full)
            .next()
            .ok_or_else(|| AppError::parse(&url, "abstract field missing"))?;
        let abstract_text = extract_rich_text(&abstract_el, &url)?.trim().to_string();

        Ok(Paper {
            url,
            title,
            authors,
            abstract_text,
            first_submitted,
            categories,
            translated_title: None,
            translated_abstract: None,
        })
    }
}

/// Extract plain text from a rich-text field (title or abstract).
///
/// Plain text runs have whitespace collapsed to single spaces. Highlight
/// spans (`span.search-hit`) marking keyword matches are inlined the same
/// way so the highlighted substring survives. The "show less" toggle anchor
/// is presentation only and skipped. Anything else means the upstream markup
/// changed and is surfaced as a parse error.
pub fn extract_rich_text(element: &ElementRef, context: &str) -> Result<String> {
    let mut out = String::new();

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&collapse_whitespace(text)),
            Node::Element(el) => {
                let highlight = el.name() == "span" && el.classes().any(|c| c == "search-hit");
                let toggle = el.name() == "a"
                    && el
                        .attr("onclick")
                        .map_or(false, |js| js.contains(".style.display"));

                if highlight {
                    let inner: String = ElementRef::wrap(child)
                        .map(|span| span.text().collect())
                        .unwrap_or_default();
                    out.push_str(&collapse_whitespace(&inner));
                } else if toggle {
                    // "show less" control
                } else {
                    return Err(AppError::parse(
                        context,
                        format!("unexpected inline element <{}>", el.name()),
                    ));
                }
            }
            _ => {}
        }
    }

    Ok(out)
}

/// Resolve the first-submission date from the flattened metadata line.
///
/// Two shapes occur. With revisions the line carries a `v1` marker
/// ("… ; v1submitted 8 August, 2024; …") and the date ahead of the marker is
/// the original submission (the v1 date may be later). Without revisions the
/// date follows the "Submitted" label directly.
fn parse_submission_date(text: &str) -> Option<NaiveDate> {
    let head = match text.find("v1") {
        Some(idx) => &text[..idx],
        None => text,
    };
    // The label can be fused with the date once inline markup is flattened
    let head = match head.find("Submitted") {
        Some(idx) => &head[idx + "Submitted".len()..],
        None => head,
    };
    let raw = head.split(';').next().unwrap_or("").trim();

    NaiveDate::parse_from_str(raw, "%d %B, %Y").ok()
}

fn parse_total(header: &str) -> Result<usize> {
    let of = header
        .find("of")
        .ok_or_else(|| AppError::parse("result count header", header.to_string()))?;
    let results = header
        .find("results")
        .filter(|&end| end > of + 3)
        .ok_or_else(|| AppError::parse("result count header", header.to_string()))?;

    header[of + 3..results]
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| AppError::parse("result count header", header.to_string()))
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_entry(abstract_html: &str) -> String {
        format!(
            r#"<li class="arxiv-result">
              <div class="is-marginless">
                <p class="list-title is-inline-block">
                  <a href="https://arxiv.org/abs/physics/9403001">arXiv:physics/9403001</a>
                  <span>&nbsp;[<a href="https://arxiv.org/pdf/physics/9403001">pdf</a>]&nbsp;</span>
                </p>
                <div class="tags is-inline-block">
                  <span class="tag is-small is-link tooltip is-tooltip-top" data-tooltip="Popular Physics">
                    physics.pop-ph</span>
                  <span class="tag is-small is-grey tooltip is-tooltip-top"
                    data-tooltip="High Energy Physics - Theory">hep-th</span>
                </div>
              </div>
              <p class="title is-5 mathjax">
                Desperately Seeking <span class="search-hit mathjax">Superstrings</span>
              </p>
              <p class="authors">
                <span class="has-text-black-bis has-text-weight-semibold">Authors:</span>
                <a href="/search/?searchtype=author&amp;query=Ginsparg%2C+P">Paul Ginsparg</a>, <a href="/search/?searchtype=author&amp;query=Glashow%2C+S">Sheldon Glashow</a>
              </p>
              <p class="abstract mathjax">
                <span class="abstract-short has-text-grey-dark mathjax">short version</span>
                <span class="abstract-full has-text-grey-dark mathjax">{abstract_html}
                  <a class="is-size-7" onclick="document.getElementById('physics/9403001v1-abstract-full').style.display = 'none';">&#9651; Less</a>
                </span>
              </p>
              <p class="is-size-7"><span class="has-text-black-bis has-text-weight-semibold">Submitted</span>
                25 April, 1986; <span class="has-text-black-bis has-text-weight-semibold">originally
                announced</span> March 1994. </p>
            </li>"#
        )
    }

    fn result_page(header: &str, entries: &str) -> String {
        format!(
            r#"<html><body><div id="main-container">
              <div class="level is-marginless"><div class="level-left">
                <h1 class="title is-clearfix">{header}</h1>
              </div></div>
              <ol>{entries}</ol>
            </div></body></html>"#
        )
    }

    fn parser() -> SearchPageParser {
        SearchPageParser::new(ParseFailurePolicy::Abort).unwrap()
    }

    const ABSTRACT: &str = "We provide a detailed   analysis of\n                <span class=\"search-hit mathjax\">superstring</span> theory c. 1986.";

    #[test]
    fn test_parse_first_page() {
        let html = result_page(
            "Showing 1&ndash;50 of 2,542,002 results",
            &result_entry(ABSTRACT),
        );
        let page = parser().parse(&html, true).unwrap();

        assert_eq!(page.total, Some(2_542_002));
        assert_eq!(page.papers.len(), 1);

        let paper = &page.papers[0];
        assert_eq!(paper.url, "https://arxiv.org/abs/physics/9403001");
        assert_eq!(paper.title, "Desperately Seeking Superstrings");
        assert_eq!(paper.authors, "Paul Ginsparg,Sheldon Glashow");
        assert_eq!(
            paper.first_submitted,
            NaiveDate::from_ymd_opt(1986, 4, 25).unwrap()
        );
        assert_eq!(paper.categories, vec!["physics.pop-ph", "hep-th"]);
    }

    #[test]
    fn test_abstract_preserves_highlight_and_collapses_whitespace() {
        let html = result_page("Showing 1&ndash;50 of 100 results", &result_entry(ABSTRACT));
        let page = parser().parse(&html, true).unwrap();

        assert_eq!(
            page.papers[0].abstract_text,
            "We provide a detailed analysis of superstring theory c. 1986."
        );
    }

    #[test]
    fn test_no_results_is_a_valid_terminal_state() {
        let html = result_page("Sorry, your query returned no results", "");
        let page = parser().parse(&html, true).unwrap();

        assert_eq!(page.total, Some(0));
        assert!(page.papers.is_empty());
    }

    #[test]
    fn test_subsequent_pages_skip_the_header() {
        let html = format!("<html><body><ol>{}</ol></body></html>", result_entry(ABSTRACT));
        let page = parser().parse(&html, false).unwrap();

        assert_eq!(page.total, None);
        assert_eq!(page.papers.len(), 1);
    }

    #[test]
    fn test_missing_header_on_first_page_is_an_error() {
        let html = format!("<html><body><ol>{}</ol></body></html>", result_entry(ABSTRACT));
        assert!(parser().parse(&html, true).is_err());
    }

    #[test]
    fn test_unexpected_inline_element_aborts_by_default() {
        let html = result_page(
            "Showing 1&ndash;50 of 100 results",
            &result_entry("An abstract with an <em>unexpected</em> element."),
        );
        let result = parser().parse(&html, true);

        match result {
            Err(AppError::Parse { message, .. }) => {
                assert!(message.contains("<em>"), "got message {message:?}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_inline_element_skipped_when_configured() {
        let parser = SearchPageParser::new(ParseFailurePolicy::Skip).unwrap();
        let html = result_page(
            "Showing 1&ndash;50 of 100 results",
            &result_entry("An abstract with an <em>unexpected</em> element."),
        );
        let page = parser.parse(&html, true).unwrap();

        assert_eq!(page.total, Some(100));
        assert!(page.papers.is_empty());
    }

    #[test]
    fn test_original_submission_date_wins_over_v1_date() {
        let date = parse_submission_date(
            "25 April, 1986; v1submitted 8 August, 2024; originally announced August 2024.",
        );
        assert_eq!(date, Some(NaiveDate::from_ymd_opt(1986, 4, 25).unwrap()));
    }

    #[test]
    fn test_submitted_label_date() {
        let date =
            parse_submission_date("Submitted 8 August, 2024; originally announced August 2024.");
        assert_eq!(date, Some(NaiveDate::from_ymd_opt(2024, 8, 8).unwrap()));
    }

    #[test]
    fn test_fused_submitted_label_date() {
        // Inline markup flattening can swallow the space after the label
        let date = parse_submission_date(
            "Submitted9 August, 2024;v1submitted 8 August, 2024;originally announcedAugust 2024.",
        );
        assert_eq!(date, Some(NaiveDate::from_ymd_opt(2024, 8, 9).unwrap()));
    }

    #[test]
    fn test_garbage_date_is_rejected() {
        assert_eq!(parse_submission_date("no date here"), None);
        assert_eq!(parse_submission_date(""), None);
    }

    #[test]
    fn test_unparseable_date_carries_the_record_url() {
        let entry = result_entry(ABSTRACT).replace("25 April, 1986", "someday");
        let html = result_page("Showing 1&ndash;50 of 100 results", &entry);
        let result = parser().parse(&html, true);

        match result {
            Err(AppError::Date { url, .. }) => {
                assert_eq!(url, "https://arxiv.org/abs/physics/9403001");
            }
            other => panic!("expected date error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_total_strips_thousands_separators() {
        assert_eq!(parse_total("Showing 1-50 of 2,542,002 results").unwrap(), 2_542_002);
        assert_eq!(parse_total("Showing 1-3 of 3 results").unwrap(), 3);
        assert!(parse_total("nothing useful").is_err());
    }
}
