//! HTTP fetcher implementation
//!
//! One reqwest client is built per fetcher and reused for every request in a
//! run, so all fetches of a harvest share one connection pool. Extraction is
//! done with scraper: hyperlinks from `a[href]`, text by walking the DOM with
//! the configured structural tags and overlay elements removed.

use crate::config::FetchConfig;
use crate::fetch::{FetchOptions, FetchedPage, PageFetcher};
use crate::GleanError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Substrings in class/id attributes that mark overlay elements
const OVERLAY_MARKERS: &[&str] = &["modal", "popup", "overlay", "cookie-banner", "cookie-consent"];

/// Tags never included in extracted text, regardless of configuration
const ALWAYS_EXCLUDED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Page fetcher backed by a reqwest HTTP client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the configured user agent and timeouts
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, GleanError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection failed".to_string()
            } else {
                e.to_string()
            };
            GleanError::Fetch {
                url: url.to_string(),
                message,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GleanError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !content_type.contains("text/html") {
            return Err(GleanError::Fetch {
                url: url.to_string(),
                message: format!("Expected HTML, got {}", content_type),
            });
        }

        let base_url = response.url().clone();
        let html = response.text().await.map_err(|e| GleanError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(extract_page(&html, &base_url, options))
    }
}

/// Parses HTML and extracts links and text according to the options
///
/// Kept synchronous: `scraper::Html` is not `Send`, so parsing must not
/// straddle an await point.
fn extract_page(html: &str, base_url: &Url, options: &FetchOptions) -> FetchedPage {
    let document = Html::parse_document(html);

    let internal_links = extract_links(&document, base_url, options.internal_only);
    let body = extract_text(&document, base_url, options);

    FetchedPage {
        internal_links,
        body,
    }
}

/// Extracts hyperlink targets from `a[href]` elements
///
/// Excluded: `javascript:`, `mailto:`, `tel:`, and data URIs, anchors with a
/// `download` attribute, and (with `internal_only`) any target whose host
/// differs from the fetched page's host. Fragments are dropped so `/page#a`
/// and `/page#b` resolve to one link.
fn extract_links(document: &Html, base_url: &Url, internal_only: bool) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };

            let lower = href.trim().to_lowercase();
            if lower.starts_with("javascript:")
                || lower.starts_with("mailto:")
                || lower.starts_with("tel:")
                || lower.starts_with("data:")
            {
                continue;
            }

            let Ok(mut resolved) = base_url.join(href) else {
                continue;
            };
            resolved.set_fragment(None);

            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                continue;
            }

            if internal_only && !same_host(&resolved, base_url) {
                continue;
            }

            links.push(resolved.to_string());
        }
    }

    links
}

fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Extracts a normalized text body from the document
///
/// With `magic_extraction`, the first `main`/`article`/`[role="main"]`
/// element is used as the root when present; otherwise the whole body is
/// walked. Excluded tags and overlay elements are dropped wholesale.
fn extract_text(document: &Html, base_url: &Url, options: &FetchOptions) -> String {
    let mut excluded: HashSet<String> = ALWAYS_EXCLUDED_TAGS
        .iter()
        .map(|t| t.to_string())
        .collect();
    excluded.extend(options.excluded_tags.iter().map(|t| t.to_lowercase()));
    if !options.process_iframes {
        excluded.insert("iframe".to_string());
    }

    let root = content_root(document, options.magic_extraction);

    let mut out = String::new();
    if let Some(root) = root {
        walk_element(root, base_url, options, &excluded, &mut out);
    }

    normalize_whitespace(&out)
}

/// Picks the root element for text extraction
fn content_root(document: &Html, magic: bool) -> Option<ElementRef<'_>> {
    if magic {
        for sel in ["main", "article", "[role='main']"] {
            if let Ok(selector) = Selector::parse(sel) {
                if let Some(element) = document.select(&selector).next() {
                    return Some(element);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            return Some(body);
        }
    }

    Some(document.root_element())
}

fn walk_element(
    element: ElementRef<'_>,
    base_url: &Url,
    options: &FetchOptions,
    excluded: &HashSet<String>,
    out: &mut String,
) {
    let name = element.value().name().to_lowercase();

    if excluded.contains(&name) {
        return;
    }

    if options.remove_overlays && is_overlay(&element) {
        return;
    }

    match name.as_str() {
        "br" => {
            out.push('\n');
            return;
        }
        "img" => {
            push_image(&element, base_url, options, out);
            return;
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name.as_bytes()[1] - b'0';
            out.push_str("\n\n");
            for _ in 0..level {
                out.push('#');
            }
            out.push(' ');
        }
        "li" => {
            out.push('\n');
            out.push_str("- ");
        }
        "p" | "div" | "section" | "article" | "blockquote" | "tr" | "ul" | "ol" | "table"
        | "pre" => {
            out.push_str("\n\n");
        }
        _ => {}
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk_element(child_element, base_url, options, excluded, out);
                }
            }
            _ => {}
        }
    }

    if matches!(
        name.as_str(),
        "p" | "div"
            | "section"
            | "article"
            | "blockquote"
            | "tr"
            | "ul"
            | "ol"
            | "table"
            | "pre"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    ) {
        out.push_str("\n\n");
    }
}

/// Contributes an image's alt text, honoring external-image exclusion
fn push_image(element: &ElementRef<'_>, base_url: &Url, options: &FetchOptions, out: &mut String) {
    if options.exclude_external_images {
        if let Some(src) = element.value().attr("src") {
            if let Ok(resolved) = base_url.join(src) {
                if !same_host(&resolved, base_url) {
                    return;
                }
            }
        }
    }

    if let Some(alt) = element.value().attr("alt") {
        let alt = alt.trim();
        if !alt.is_empty() {
            out.push(' ');
            out.push_str(alt);
            out.push(' ');
        }
    }
}

/// True when a class or id attribute carries an overlay marker
fn is_overlay(element: &ElementRef<'_>) -> bool {
    for attr in ["class", "id"] {
        if let Some(value) = element.value().attr(attr) {
            let value = value.to_lowercase();
            if OVERLAY_MARKERS.iter().any(|m| value.contains(m)) {
                return true;
            }
        }
    }
    false
}

/// Collapses runs of whitespace into readable paragraphs
fn normalize_whitespace(raw: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();

    for block in raw.split("\n\n") {
        let lines: Vec<String> = block
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect();

        if !lines.is_empty() {
            paragraphs.push(lines.join("\n"));
        }
    }

    paragraphs.join("\n\n")
}
