//! Page fetching
//!
//! The pipeline talks to pages through the [`PageFetcher`] trait: given a URL
//! and a set of extraction options, a fetcher returns the page's internal
//! links and a normalized text body. [`HttpFetcher`] is the default
//! implementation (reqwest + scraper); tests substitute fakes.

mod http;

pub use http::HttpFetcher;

use crate::config::FetchConfig;
use crate::GleanError;
use async_trait::async_trait;

/// Options controlling link collection and text extraction for one fetch
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Keep only links whose host matches the fetched page's host
    pub internal_only: bool,

    /// Drop overlay elements (modals, popups, cookie walls) from the text
    pub remove_overlays: bool,

    /// Include iframe content in the text
    pub process_iframes: bool,

    /// Tag names excluded from text extraction entirely
    pub excluded_tags: Vec<String>,

    /// Prefer the main content region (main/article) over the whole body
    pub magic_extraction: bool,

    /// Drop external images from the text
    pub exclude_external_images: bool,
}

impl FetchOptions {
    /// Options for the seed fetch during link discovery
    ///
    /// Discovery only needs the link set, so no structural tags are excluded
    /// and no content heuristics apply.
    pub fn discovery() -> Self {
        Self {
            internal_only: true,
            remove_overlays: true,
            process_iframes: false,
            excluded_tags: Vec::new(),
            magic_extraction: false,
            exclude_external_images: false,
        }
    }

    /// Options for per-page fetches during harvest, from configuration
    pub fn harvest(config: &FetchConfig) -> Self {
        Self {
            internal_only: true,
            remove_overlays: config.remove_overlays,
            process_iframes: config.process_iframes,
            excluded_tags: config.excluded_tags.clone(),
            magic_extraction: config.magic_extraction,
            exclude_external_images: config.exclude_external_images,
        }
    }
}

/// Result of fetching and extracting one page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Absolute URLs of hyperlinks found on the page
    pub internal_links: Vec<String>,

    /// Normalized markdown-ish text body
    pub body: String,
}

/// Capability to render a page into links and text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, GleanError>;
}
