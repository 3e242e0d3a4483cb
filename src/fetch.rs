//! Page retrieval and readable-text extraction.
//!
//! [`Fetcher`] issues one GET per call through a [`Transport`], then turns
//! the HTML into a title plus whitespace-collapsed body text with script,
//! style, navigation, header, footer, and ad containers removed.
//!
//! HTML parsing is synchronous and finishes before the fetcher returns, so
//! no `scraper::Html` value is held across an await point.

use async_trait::async_trait;
use indexmap::IndexSet;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{Error, Result};

pub const UNTITLED: &str = "No Title";

const SKIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header"];
const AD_CLASSES: &[&str] = &["advertisement", "ads"];

/// Raw HTTP access. Implementations return the response body as text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;
}

/// [`Transport`] backed by a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::transport("", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::transport(url, e))?;

        response.text().await.map_err(|e| Error::parse(url, e))
    }
}

/// Successful fetch of one page.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedPage {
    pub url: String,
    pub title: String,
    /// Extracted text, truncated to the configured maximum.
    pub content: String,
    /// Character count of the extracted text before truncation.
    pub content_length: usize,
}

/// Title and text pulled out of an HTML document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
    pub content_length: usize,
}

pub struct Fetcher {
    transport: Box<dyn Transport>,
    max_content_chars: usize,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, max_content_chars: usize) -> Self {
        Self {
            transport,
            max_content_chars,
        }
    }

    /// Fetcher using [`HttpTransport`] with the configured timeout and user agent.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(
            Box::new(HttpTransport::new(config)?),
            config.max_content_chars,
        ))
    }

    /// Fetch `url` and return the raw HTML body.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        self.transport.get(url).await
    }

    /// Fetch `url` and extract its title and readable text.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let html = self.fetch_html(url).await?;
        let page = extract_page(&html, self.max_content_chars).map_err(|e| Error::parse(url, e))?;

        tracing::debug!(url, title = %page.title, chars = page.content_length, "fetched page");

        Ok(FetchedPage {
            url: url.to_string(),
            title: page.title,
            content: page.content,
            content_length: page.content_length,
        })
    }

    /// Absolute http(s) links on the page at `url`, de-duplicated in first-seen order.
    ///
    /// Relative links resolve against `base`, or `url` itself when `base` is
    /// `None`. Any fetch or parse failure yields an empty list.
    pub async fn extract_links(&self, url: &str, base: Option<&str>) -> Vec<String> {
        let html = match self.fetch_html(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url, error = %e, "link extraction fetch failed");
                return Vec::new();
            }
        };

        match Url::parse(base.unwrap_or(url)) {
            Ok(base) => collect_links(&html, &base),
            Err(e) => {
                tracing::warn!(url, error = %e, "invalid base URL for link extraction");
                Vec::new()
            }
        }
    }
}

fn selector(css: &str) -> std::result::Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{}': {}", css, e))
}

/// Extract the title and visible body text from an HTML document.
///
/// Text nodes are joined with single spaces and whitespace runs collapsed.
/// `content` holds at most `max_chars` characters; `content_length` is the
/// length before truncation.
pub fn extract_page(html: &str, max_chars: usize) -> std::result::Result<ExtractedPage, String> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("title")?)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let mut fragments = Vec::new();
    if let Some(body) = document.select(&selector("body")?).next() {
        collect_text(body, &mut fragments);
    }

    let full = collapse_whitespace(&fragments.join(" "));
    let content_length = full.chars().count();
    let content = full.chars().take(max_chars).collect();

    Ok(ExtractedPage {
        title,
        content,
        content_length,
    })
}

fn is_boilerplate(element: &ElementRef<'_>) -> bool {
    let el = element.value();
    SKIPPED_TAGS.contains(&el.name()) || el.classes().any(|c| AD_CLASSES.contains(&c))
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_boilerplate(&child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve every `a[href]` against `base`, keeping absolute http(s) URLs.
pub fn collect_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchors) = selector("a[href]") else {
        return Vec::new();
    };

    let mut links: IndexSet<String> = IndexSet::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Ok(resolved) = base.join(href) {
            if matches!(resolved.scheme(), "http" | "https") {
                links.insert(resolved.to_string());
            }
        }
    }
    links.into_iter().collect()
}
