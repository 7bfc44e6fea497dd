//! Curation stage

use crate::classify::{parse_verdict, Classifier, Verdict, CLASSIFY_INSTRUCTION};
use crate::Result;
use std::collections::BTreeMap;

/// Filters the harvested map down to entries the oracle deems useful
///
/// Consumes the harvested map and returns a new one: curation only ever
/// removes entries, never adds or rewrites them. Each entry's raw text is
/// submitted with the fixed instruction; a response containing "useless"
/// (case-insensitive) drops the entry.
///
/// With `fail_open`, an entry whose classification fails persistently (after
/// the classifier's own retries) is retained and logged at WARN rather than
/// dropped; ambiguity never silently loses content. Without it, the first
/// persistent failure aborts curation.
pub async fn curate<C: Classifier + ?Sized>(
    classifier: &C,
    files: BTreeMap<String, String>,
    fail_open: bool,
) -> Result<BTreeMap<String, String>> {
    let total = files.len();
    tracing::info!(entries = total, "curating harvested content");

    let mut kept = BTreeMap::new();

    for (key, body) in files {
        match classifier.classify(CLASSIFY_INSTRUCTION, &body).await {
            Ok(response) => match parse_verdict(&response) {
                Verdict::Useless => {
                    tracing::info!(%key, "dropping page classified as useless");
                }
                Verdict::Useful => {
                    kept.insert(key, body);
                }
            },
            Err(e) if fail_open => {
                tracing::warn!(%key, error = %e, "classification failed, keeping entry");
                kept.insert(key, body);
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        kept = kept.len(),
        removed = total - kept.len(),
        "curation complete"
    );
    Ok(kept)
}
