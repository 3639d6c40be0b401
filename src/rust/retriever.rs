use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::config::RetrieverConfig;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Separators news sites put between the headline and the site name in `<title>`.
const TITLE_SEPARATORS: [&str; 5] = [" | ", " - ", " – ", " — ", " :: "];

lazy_static! {
    static ref OG_TITLE: Selector =
        Selector::parse(r#"meta[property="og:title"]"#).expect("valid og:title selector");
    static ref TWITTER_TITLE: Selector =
        Selector::parse(r#"meta[name="twitter:title"]"#).expect("valid twitter:title selector");
    static ref HEADING: Selector = Selector::parse("h1").expect("valid h1 selector");
    static ref TITLE: Selector = Selector::parse("title").expect("valid title selector");
    static ref ARTICLE_PARAGRAPH: Selector =
        Selector::parse("article p").expect("valid article paragraph selector");
    static ref PARAGRAPH: Selector = Selector::parse("p").expect("valid paragraph selector");
}

/// Which part of the page the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    OpenGraph,
    TwitterCard,
    Heading,
    TitleTag,
    BodyText,
}

/// Outcome of one URL fetch; exactly one of text or failure reason.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalResult {
    Extracted {
        text: String,
        source: ExtractionSource,
    },
    Failed {
        reason: String,
    },
}

impl RetrievalResult {
    fn failed(cause: &FetchError) -> Self {
        RetrievalResult::Failed {
            reason: format!("Failed to fetch article. Error: {}", error_chain(cause)),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            RetrievalResult::Extracted { text, .. } => Some(text),
            RetrievalResult::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            RetrievalResult::Failed { reason } => Some(reason),
            RetrievalResult::Extracted { .. } => None,
        }
    }
}

/// Anything that can turn a URL into headline text.
pub trait ArticleSource {
    /// Never fails: every problem is reported as [`RetrievalResult::Failed`].
    fn fetch(&self, url: &str) -> impl Future<Output = RetrievalResult> + Send;
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(StatusCode),
    #[error("expected an HTML document but got content type '{0}'")]
    NotHtml(String),
    #[error("no headline or article text found in the page")]
    NothingExtracted,
}

impl FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status(status) => status.is_server_error(),
            _ => false,
        }
    }
}

/// Renders an error followed by its sources, so the underlying cause is visible.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Downloads news pages and pulls out their headline.
#[derive(Debug, Clone)]
pub struct ArticleRetriever {
    client: Client,
    config: RetrieverConfig,
}

impl ArticleRetriever {
    pub fn new(config: RetrieverConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Fetches `url` and extracts its headline, falling back to the body text.
    pub async fn fetch(&self, url: &str) -> RetrievalResult {
        info!("Fetching article from {}", url);
        let outcome = match self.download(url).await {
            Ok(html) => extract_article(&html).ok_or(FetchError::NothingExtracted),
            Err(e) => Err(e),
        };
        match outcome {
            Ok((text, source)) => {
                info!("Extracted {:?} text ({} chars)", source, text.chars().count());
                RetrievalResult::Extracted { text, source }
            }
            Err(e) => {
                warn!("Article retrieval failed for {}: {}", url, e);
                RetrievalResult::failed(&e)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<String, FetchError> {
        let url = url.trim();
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            match self.download_once(parsed.clone()).await {
                Err(e) if attempt < self.config.max_retries && e.is_transient() => {
                    attempt += 1;
                    warn!(
                        "Attempt {} of {} failed: {}; retrying",
                        attempt, attempts, e
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn download_once(&self, url: Url) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        info!("Download response status: {}", status);
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default().to_ascii_lowercase();
            if !content_type.contains("html") {
                return Err(FetchError::NotHtml(content_type));
            }
        }
        let body = response.text().await?;
        debug!("Downloaded {} bytes", body.len());
        Ok(body)
    }
}

impl ArticleSource for ArticleRetriever {
    fn fetch(&self, url: &str) -> impl Future<Output = RetrievalResult> + Send {
        ArticleRetriever::fetch(self, url)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

/// Drops a trailing site name from a `<title>` by keeping the longest piece.
fn clean_title(raw: &str) -> String {
    let title = collapse_whitespace(raw);
    for separator in TITLE_SEPARATORS {
        if title.contains(separator) {
            let mut best = "";
            for piece in title.split(separator).map(str::trim) {
                if piece.chars().count() > best.chars().count() {
                    best = piece;
                }
            }
            return best.to_string();
        }
    }
    title
}

fn headline(document: &Html) -> Option<(String, ExtractionSource)> {
    if let Some(title) = meta_content(document, &OG_TITLE) {
        return Some((title, ExtractionSource::OpenGraph));
    }
    if let Some(title) = meta_content(document, &TWITTER_TITLE) {
        return Some((title, ExtractionSource::TwitterCard));
    }
    if let Some(title) = document.select(&HEADING).map(element_text).find(|t| !t.is_empty()) {
        return Some((title, ExtractionSource::Heading));
    }
    document
        .select(&TITLE)
        .map(|el| clean_title(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
        .map(|title| (title, ExtractionSource::TitleTag))
}

fn body_text(document: &Html) -> Option<String> {
    let collect = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect()
    };
    let mut paragraphs = collect(&ARTICLE_PARAGRAPH);
    if paragraphs.is_empty() {
        paragraphs = collect(&PARAGRAPH);
    }
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

/// Picks the most likely headline out of an HTML document.
///
/// Tries `og:title`, `twitter:title`, the first `<h1>` and the `<title>` tag in
/// that order, and falls back to the article's paragraphs when none is present.
pub fn extract_article(html: &str) -> Option<(String, ExtractionSource)> {
    let document = Html::parse_document(html);
    headline(&document).or_else(|| body_text(&document).map(|text| (text, ExtractionSource::BodyText)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_open_graph_title() {
        let html = r#"<html><head>
            <title>Harga Emas Naik - detikFinance</title>
            <meta property="og:title" content="Harga Emas Naik Tajam Hari Ini">
            </head><body><h1>Harga Emas</h1></body></html>"#;
        assert_eq!(
            extract_article(html),
            Some(("Harga Emas Naik Tajam Hari Ini".into(), ExtractionSource::OpenGraph))
        );
    }

    #[test]
    fn test_heading_before_title_tag() {
        let html = "<html><head><title>Situs Berita</title></head>\
                    <body><h1>  Timnas   <em>menang</em> 2-0 </h1></body></html>";
        assert_eq!(
            extract_article(html),
            Some(("Timnas menang 2-0".into(), ExtractionSource::Heading))
        );
    }

    #[test]
    fn test_title_tag_drops_site_name() {
        let html = "<html><head><title>Rupiah Menguat terhadap Dolar AS | Kompas.com</title></head><body></body></html>";
        assert_eq!(
            extract_article(html),
            Some(("Rupiah Menguat terhadap Dolar AS".into(), ExtractionSource::TitleTag))
        );
    }

    #[test]
    fn test_falls_back_to_article_body() {
        let html = "<html><body><p>Menu</p><article><p>Paragraf pertama.</p><p></p>\
                    <p>Paragraf kedua.</p></article></body></html>";
        assert_eq!(
            extract_article(html),
            Some(("Paragraf pertama.\n\nParagraf kedua.".into(), ExtractionSource::BodyText))
        );
    }

    #[test]
    fn test_empty_page_has_nothing() {
        assert_eq!(extract_article("<html><body><div></div></body></html>"), None);
    }

    #[test]
    fn test_clean_title_keeps_first_longest_piece() {
        assert_eq!(clean_title("abc - xyz"), "abc");
        assert_eq!(clean_title("Presiden Lantik Menteri Baru – Nasional"), "Presiden Lantik Menteri Baru");
        assert_eq!(clean_title("  Tanpa   pemisah "), "Tanpa pemisah");
    }

    #[test]
    fn test_failure_reason_includes_cause() {
        let result = RetrievalResult::failed(&FetchError::Status(StatusCode::NOT_FOUND));
        assert_eq!(result.text(), None);
        assert_eq!(
            result.failure(),
            Some("Failed to fetch article. Error: server responded with status 404 Not Found")
        );
    }

    #[tokio::test]
    async fn test_unparseable_url_fails_softly() {
        let retriever = ArticleRetriever::new(RetrieverConfig::default()).unwrap();
        let result = retriever.fetch("httpfoo bar").await;
        let reason = result.failure().expect("should fail");
        assert!(reason.contains("invalid URL"));
    }
}
