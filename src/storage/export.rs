//! Markdown and CSV rendering of stored papers.
//!
//! Exports read the whole corpus back from a [`PaperStore`] and write one
//! file per run date into the output directory. The criteria's whitelist and
//! blacklist split the markdown document into a featured section (shown in
//! full) and a filtered section (one line each).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{Paper, SearchCriteria};
use crate::storage::PaperStore;

/// CSV rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvConfig {
    /// Field delimiter
    pub delimiter: char,

    /// Emit a header row
    pub header: bool,

    /// Include abstract columns (they dominate the file size)
    pub include_abstract: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            header: true,
            include_abstract: false,
        }
    }
}

/// Render the stored papers as one markdown document, returning its path.
pub async fn to_markdown(
    store: &dyn PaperStore,
    output_dir: impl AsRef<Path>,
    filename_format: &str,
    criteria: &SearchCriteria,
    include_meta: bool,
) -> Result<PathBuf> {
    let papers = store.load_all().await?;
    let (featured, filtered): (Vec<&Paper>, Vec<&Paper>) = papers
        .iter()
        .partition(|p| p.is_featured(&criteria.whitelist, &criteria.blacklist));

    let mut doc = String::new();
    let _ = writeln!(doc, "# Papers {}\n", Local::now().format("%Y-%m-%d"));

    if include_meta {
        let _ = writeln!(
            doc,
            "> search range {} (inclusive) to {} (exclusive), keywords: {}",
            criteria.date_from,
            criteria.date_until,
            criteria.keywords.join(" OR "),
        );
        let _ = writeln!(
            doc,
            "> whitelist: {}; blacklist: {}\n",
            criteria.whitelist.join(", "),
            criteria.blacklist.join(", "),
        );
    }

    let _ = writeln!(doc, "## Featured ({})\n", featured.len());
    for (i, paper) in featured.iter().enumerate() {
        render_full_entry(&mut doc, i + 1, paper);
    }

    let _ = writeln!(doc, "## Filtered ({})\n", filtered.len());
    for paper in &filtered {
        let _ = writeln!(
            doc,
            "- [{}]({}) ({})",
            paper.title,
            paper.url,
            paper.categories.join(", "),
        );
    }

    write_export(output_dir, filename_format, "md", doc.as_bytes()).await
}

fn render_full_entry(doc: &mut String, index: usize, paper: &Paper) {
    let _ = writeln!(doc, "### {}. {}\n", index, paper.title);
    if let Some(translated) = &paper.translated_title {
        let _ = writeln!(doc, "**{translated}**\n");
    }
    let _ = writeln!(doc, "- **url**: {}", paper.url);
    let _ = writeln!(doc, "- **authors**: {}", paper.authors);
    let _ = writeln!(doc, "- **categories**: {}", paper.categories.join(", "));
    let _ = writeln!(doc, "- **first submitted**: {}\n", paper.first_submitted);
    let _ = writeln!(doc, "> {}\n", paper.abstract_text);
    if let Some(translated) = &paper.translated_abstract {
        let _ = writeln!(doc, "> {translated}\n");
    }
}

/// Render the stored papers as a delimiter-separated table, returning its
/// path.
pub async fn to_csv(
    store: &dyn PaperStore,
    output_dir: impl AsRef<Path>,
    filename_format: &str,
    config: &CsvConfig,
) -> Result<PathBuf> {
    let papers = store.load_all().await?;
    let mut table = String::new();

    let mut columns = vec![
        "id",
        "url",
        "title",
        "translated_title",
        "authors",
        "first_submitted",
        "categories",
    ];
    if config.include_abstract {
        columns.push("abstract");
        columns.push("translated_abstract");
    }

    if config.header {
        push_row(&mut table, config.delimiter, columns.iter().map(|c| c.to_string()));
    }

    for paper in &papers {
        let mut fields = vec![
            paper.arxiv_id().unwrap_or_default(),
            paper.url.clone(),
            paper.title.clone(),
            paper.translated_title.clone().unwrap_or_default(),
            paper.authors.clone(),
            paper.first_submitted.to_string(),
            paper.categories.join("; "),
        ];
        if config.include_abstract {
            fields.push(paper.abstract_text.clone());
            fields.push(paper.translated_abstract.clone().unwrap_or_default());
        }
        push_row(&mut table, config.delimiter, fields.into_iter());
    }

    write_export(output_dir, filename_format, "csv", table.as_bytes()).await
}

fn push_row(table: &mut String, delimiter: char, fields: impl Iterator<Item = String>) {
    let row = fields
        .map(|field| quote_field(&field, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    table.push_str(&row);
    table.push('\n');
}

/// Quote a field when it contains the delimiter, a quote, or a newline.
fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

async fn write_export(
    output_dir: impl AsRef<Path>,
    filename_format: &str,
    extension: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    let name = Local::now().format(filename_format).to_string();
    let path = output_dir.as_ref().join(format!("{name}.{extension}"));

    tokio::fs::create_dir_all(output_dir.as_ref()).await?;

    let tmp = path.with_extension(format!("{extension}.tmp"));
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);
    tokio::fs::rename(&tmp, &path).await?;

    log::info!("Rendered {} papers export to {}", extension, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::models::{DateFilter, RESULT_ORDER};
    use crate::storage::LocalStore;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            date_from: NaiveDate::from_ymd_opt(2024, 8, 8).unwrap(),
            date_until: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            whitelist: vec!["cs.CL".to_string()],
            blacklist: vec!["cs.CR".to_string()],
            keywords: vec!["LLM".to_string()],
            date_filter: DateFilter::SubmittedDateFirst,
            page_size: 50,
            order: RESULT_ORDER.to_string(),
        }
    }

    fn paper(url: &str, categories: &[&str]) -> Paper {
        Paper {
            url: url.to_string(),
            title: "A title, with a comma".to_string(),
            authors: "A. Author".to_string(),
            abstract_text: "Abstract.".to_string(),
            first_submitted: NaiveDate::from_ymd_opt(2024, 8, 8).unwrap(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            translated_title: Some("标题".to_string()),
            translated_abstract: None,
        }
    }

    async fn seeded_store(tmp: &TempDir) -> LocalStore {
        let store = LocalStore::new(tmp.path().join("db"));
        store
            .add_papers(&[
                paper("https://arxiv.org/abs/2408.00001", &["cs.CL"]),
                paper("https://arxiv.org/abs/2408.00002", &["math.CO"]),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_markdown_splits_featured_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let out = tmp.path().join("out");

        let path = to_markdown(&store, &out, "%Y-%m-%d", &criteria(), true)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("## Featured (1)"));
        assert!(content.contains("## Filtered (1)"));
        assert!(content.contains("标题"));
        assert!(content.contains("> search range 2024-08-08"));
    }

    #[tokio::test]
    async fn test_csv_quotes_fields_with_delimiters() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let out = tmp.path().join("out");

        let path = to_csv(&store, &out, "%Y-%m-%d", &CsvConfig::default())
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,url,title,translated_title,authors,first_submitted,categories"
        );
        assert_eq!(lines.count(), 2);
        assert!(content.contains("\"A title, with a comma\""));
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("plain", ','), "plain");
        assert_eq!(quote_field("a,b", ','), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
    }
}
