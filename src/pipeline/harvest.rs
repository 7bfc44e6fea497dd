//! Content harvest stage

use crate::config::FetchFailurePolicy;
use crate::fetch::{FetchOptions, FetchedPage, PageFetcher};
use crate::url::derive_key;
use crate::{GleanError, Result};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};

/// Harvests page content for every link in the set
///
/// Each page's body is stored under `derive_key(link)`. Keys are not
/// guaranteed unique: when two links derive the same key, the later one (in
/// link order) wins and the earlier entry is overwritten with a WARN.
///
/// `concurrency` of 1 is the baseline: strictly sequential fetches, and
/// under [`FetchFailurePolicy::Abort`] the first failure stops the harvest
/// before any further fetch is issued. Higher values overlap up to that many
/// fetches; completion order does not affect the resulting map, and under
/// `Abort` the error reported is the one from the smallest failing link.
pub async fn harvest<F: PageFetcher + ?Sized>(
    fetcher: &F,
    links: &BTreeSet<String>,
    options: &FetchOptions,
    policy: FetchFailurePolicy,
    concurrency: usize,
) -> Result<BTreeMap<String, String>> {
    tracing::info!(links = links.len(), concurrency, "harvesting page content");

    let mut files = BTreeMap::new();

    if concurrency <= 1 {
        for link in links {
            match fetcher.fetch(link, options).await {
                Ok(page) => insert_page(&mut files, link, page),
                Err(e) => handle_failure(link, e, policy)?,
            }
        }
    } else {
        let mut results: Vec<(&String, Result<FetchedPage>)> = stream::iter(links)
            .map(|link| async move { (link, fetcher.fetch(link, options).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Fold in link order so collisions and error reporting stay
        // deterministic regardless of completion order.
        results.sort_by(|a, b| a.0.cmp(b.0));

        for (link, result) in results {
            match result {
                Ok(page) => insert_page(&mut files, link, page),
                Err(e) => handle_failure(link, e, policy)?,
            }
        }
    }

    tracing::info!(pages = files.len(), "harvest complete");
    Ok(files)
}

fn insert_page(files: &mut BTreeMap<String, String>, link: &str, page: FetchedPage) {
    let key = derive_key(link);
    tracing::debug!(%link, %key, "harvested page");
    if files.insert(key.clone(), page.body).is_some() {
        tracing::warn!(%key, %link, "key collision, overwriting earlier entry");
    }
}

fn handle_failure(link: &str, error: GleanError, policy: FetchFailurePolicy) -> Result<()> {
    match policy {
        FetchFailurePolicy::Abort => Err(error),
        FetchFailurePolicy::Skip => {
            tracing::warn!(%link, %error, "skipping link after fetch failure");
            Ok(())
        }
    }
}
