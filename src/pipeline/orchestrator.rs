//! Pipeline orchestration
//!
//! Composes discover → harvest → curate → persist over explicitly owned
//! values. Errors from any stage propagate and end the run; nothing is
//! written to the sink unless every enabled stage before it succeeded.

use crate::classify::{Classifier, ClassifyError};
use crate::config::Config;
use crate::fetch::{FetchOptions, PageFetcher};
use crate::pipeline::{curate, discover, harvest};
use crate::sink::Sink;
use crate::url::{parse_seed, site_name};
use crate::{GleanError, Result};
use chrono::{DateTime, Utc};

/// Which optional stages run after the harvest
#[derive(Debug, Clone, Copy)]
pub struct Stages {
    pub curate: bool,
    pub persist: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            curate: true,
            persist: true,
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: String,
    pub site: String,
    pub links_discovered: usize,
    pub pages_harvested: usize,
    pub pages_kept: usize,
    pub pages_removed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs the full pipeline for one seed URL
///
/// The site identity for sink naming is derived from the seed independently
/// of discovery. `classifier` may be `None` only when `stages.curate` is
/// off; requesting curation without a classifier is an error rather than a
/// silent skip.
pub async fn run_pipeline<F, C, S>(
    fetcher: &F,
    classifier: Option<&C>,
    sink: &S,
    seed_url: &str,
    config: &Config,
    stages: Stages,
) -> Result<RunSummary>
where
    F: PageFetcher + ?Sized,
    C: Classifier + ?Sized,
    S: Sink + ?Sized,
{
    let started_at = Utc::now();

    let seed = parse_seed(seed_url)?;
    let site = site_name(&seed)?;
    tracing::info!(seed = %seed, %site, "starting pipeline run");

    let links = discover(fetcher, &seed).await?;
    let links_discovered = links.len();

    let options = FetchOptions::harvest(&config.fetch);
    let files = harvest(
        fetcher,
        &links,
        &options,
        config.fetch.on_fetch_error,
        config.fetch.max_concurrent_fetches as usize,
    )
    .await?;
    let pages_harvested = files.len();

    let files = if stages.curate {
        let classifier =
            classifier.ok_or(GleanError::Classify(ClassifyError::NotConfigured))?;
        curate(classifier, files, config.classifier.fail_open).await?
    } else {
        tracing::info!("curation stage disabled, keeping all harvested pages");
        files
    };
    let pages_kept = files.len();

    if stages.persist {
        sink.write(&site, &files).await?;
    } else {
        tracing::info!("persist stage disabled, discarding results");
    }

    let summary = RunSummary {
        seed: seed.to_string(),
        site,
        links_discovered,
        pages_harvested,
        pages_kept,
        pages_removed: pages_harvested - pages_kept,
        started_at,
        finished_at: Utc::now(),
    };

    tracing::info!(
        links = summary.links_discovered,
        harvested = summary.pages_harvested,
        kept = summary.pages_kept,
        removed = summary.pages_removed,
        duration_ms = summary.duration().num_milliseconds(),
        "pipeline run complete"
    );

    Ok(summary)
}
