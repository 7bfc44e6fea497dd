//! Link discovery stage

use crate::fetch::{FetchOptions, PageFetcher};
use crate::url::canonicalize_link;
use crate::Result;
use std::collections::BTreeSet;
use url::Url;

/// Discovers the internal link set of a site from its seed page
///
/// Fetches the seed once with internal-links-only and overlay suppression,
/// canonicalizes every returned link (trailing separators stripped), and
/// collects them into a set. A failed seed fetch is fatal to the whole run;
/// there is no retry.
pub async fn discover<F: PageFetcher + ?Sized>(
    fetcher: &F,
    seed: &Url,
) -> Result<BTreeSet<String>> {
    tracing::info!(seed = %seed, "discovering internal links");

    let page = fetcher.fetch(seed.as_str(), &FetchOptions::discovery()).await?;

    let links: BTreeSet<String> = page
        .internal_links
        .iter()
        .map(|link| canonicalize_link(link))
        .filter(|link| !link.is_empty())
        .collect();

    tracing::info!(count = links.len(), "link discovery complete");
    Ok(links)
}
