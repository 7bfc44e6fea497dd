//! End-to-end pipeline tests
//!
//! These tests stand up wiremock servers for the site, the classification
//! API, and the object-storage account, then drive the real fetcher,
//! classifier, and sinks through the full pipeline.

use gleaner::classify::LlmClassifier;
use gleaner::config::{
    ClassifierConfig, Config, FetchConfig, FetchFailurePolicy, SinkConfig, SinkKind,
};
use gleaner::fetch::HttpFetcher;
use gleaner::pipeline::{curate, run_pipeline, Stages};
use gleaner::sink::{LocalDirSink, ObjectStoreSink, Sink};
use gleaner::{derive_key, GleanError};
use std::collections::BTreeMap;
use wiremock::matchers::{body_string_contains, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY_ENV: &str = "GLEANER_E2E_KEY";
const SAS_ENV: &str = "GLEANER_E2E_SAS";

fn test_config(classifier_endpoint: &str, sink: SinkConfig) -> Config {
    std::env::set_var(API_KEY_ENV, "test-key");

    Config {
        fetch: FetchConfig {
            user_agent: "gleaner-test/0.1".to_string(),
            request_timeout_secs: 5,
            max_concurrent_fetches: 1,
            on_fetch_error: FetchFailurePolicy::Abort,
            remove_overlays: true,
            process_iframes: false,
            excluded_tags: vec![
                "form".to_string(),
                "header".to_string(),
                "footer".to_string(),
                "nav".to_string(),
            ],
            magic_extraction: true,
            exclude_external_images: true,
        },
        classifier: ClassifierConfig {
            endpoint: classifier_endpoint.to_string(),
            model: "test-model".to_string(),
            api_key_env: API_KEY_ENV.to_string(),
            max_output_tokens: 20,
            max_retries: 1,
            retry_delay_ms: 1,
            fail_open: true,
        },
        sink,
    }
}

fn local_sink_config(folder: &str) -> SinkConfig {
    SinkConfig {
        kind: SinkKind::Local,
        folder_path: Some(folder.to_string()),
        account_url: None,
        sas_token_env: SAS_ENV.to_string(),
    }
}

fn verdict_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    }))
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Mounts a three-page site: a useful about page, a useful contact page, and
/// an error placeholder page reachable from the seed.
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<html><body>
            <a href="/about">About</a>
            <a href="/about/">About again</a>
            <a href="/contact">Contact</a>
            <a href="/error">Broken</a>
            <a href="https://elsewhere.example/off-site">External</a>
            <a href="mailto:hi@example.com">Mail</a>
            </body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_response(
            r#"<html><body><main><p>We build things with substance.</p></main></body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html_response(
            r#"<html><body><main><p>Reach us at 1 Main Street.</p></main></body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(html_response(
            r#"<html><body><main><p>Page not found. Nothing to see.</p></main></body></html>"#,
        ))
        .mount(server)
        .await;
}

/// Mounts classifier verdicts keyed on distinctive page content markers.
async fn mount_classifier(server: &MockServer) {
    let classify_path = "/v1beta/models/test-model:generateContent";

    Mock::given(method("POST"))
        .and(path(classify_path))
        .and(body_string_contains("Page not found"))
        .respond_with(verdict_response("This page is USELESS."))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(classify_path))
        .and(body_string_contains("substance"))
        .respond_with(verdict_response("USEFUL"))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(classify_path))
        .and(body_string_contains("Reach us"))
        .respond_with(verdict_response("USEFUL"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_pipeline_with_local_sink() {
    let site = MockServer::start().await;
    let oracle = MockServer::start().await;
    mount_site(&site).await;
    mount_classifier(&oracle).await;

    let out_dir = tempfile::TempDir::new().unwrap();
    let config = test_config(
        &oracle.uri(),
        local_sink_config(out_dir.path().to_str().unwrap()),
    );

    let fetcher = HttpFetcher::new(&config.fetch).unwrap();
    let classifier = LlmClassifier::from_config(&config.classifier).unwrap();
    let sink = LocalDirSink::new(out_dir.path());

    let seed = format!("{}/", site.uri());
    let summary = run_pipeline(
        &fetcher,
        Some(&classifier),
        &sink,
        &seed,
        &config,
        Stages::default(),
    )
    .await
    .expect("pipeline run failed");

    // /about and /about/ collapse; the external and mailto links are skipped
    assert_eq!(summary.links_discovered, 3);
    assert_eq!(summary.pages_harvested, 3);
    assert_eq!(summary.pages_kept, 2);
    assert_eq!(summary.pages_removed, 1);

    let about_key = derive_key(&format!("{}/about", site.uri()));
    let contact_key = derive_key(&format!("{}/contact", site.uri()));
    let error_key = derive_key(&format!("{}/error", site.uri()));

    let about = std::fs::read_to_string(out_dir.path().join(format!("{}.txt", about_key)))
        .expect("about page missing from sink");
    assert!(about.contains("We build things with substance."));

    assert!(out_dir
        .path()
        .join(format!("{}.txt", contact_key))
        .exists());
    assert!(!out_dir.path().join(format!("{}.txt", error_key)).exists());

    // Exactly the two curated files were written
    let written = std::fs::read_dir(out_dir.path()).unwrap().count();
    assert_eq!(written, 2);
}

#[tokio::test]
async fn test_seed_failure_writes_nothing() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;

    let out_dir = tempfile::TempDir::new().unwrap();
    let config = test_config(
        "https://oracle.invalid",
        local_sink_config(out_dir.path().to_str().unwrap()),
    );

    let fetcher = HttpFetcher::new(&config.fetch).unwrap();
    let sink = LocalDirSink::new(out_dir.path());

    let result = run_pipeline::<_, LlmClassifier, _>(
        &fetcher,
        None,
        &sink,
        &format!("{}/", site.uri()),
        &config,
        Stages {
            curate: false,
            persist: true,
        },
    )
    .await;

    assert!(matches!(result.unwrap_err(), GleanError::Fetch { .. }));
    assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_classifier_outage_fails_open() {
    let site = MockServer::start().await;
    let oracle = MockServer::start().await;
    mount_site(&site).await;

    // Oracle is down hard; fail-open must retain every harvested page.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&oracle)
        .await;

    let out_dir = tempfile::TempDir::new().unwrap();
    let config = test_config(
        &oracle.uri(),
        local_sink_config(out_dir.path().to_str().unwrap()),
    );

    let fetcher = HttpFetcher::new(&config.fetch).unwrap();
    let classifier = LlmClassifier::from_config(&config.classifier).unwrap();
    let sink = LocalDirSink::new(out_dir.path());

    let summary = run_pipeline(
        &fetcher,
        Some(&classifier),
        &sink,
        &format!("{}/", site.uri()),
        &config,
        Stages::default(),
    )
    .await
    .expect("fail-open run should succeed");

    assert_eq!(summary.pages_harvested, 3);
    assert_eq!(summary.pages_kept, 3);
    assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 3);
}

#[tokio::test]
async fn test_classifier_recovers_after_transient_error() {
    let oracle = MockServer::start().await;

    // First request fails with a retryable status, the retry succeeds
    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&oracle)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .respond_with(verdict_response("USELESS"))
        .expect(1)
        .mount(&oracle)
        .await;

    let config = test_config(&oracle.uri(), local_sink_config("/tmp/unused"));
    let mut classifier_config = config.classifier;
    classifier_config.max_retries = 2;
    let classifier = LlmClassifier::from_config(&classifier_config).unwrap();

    let files: BTreeMap<String, String> =
        [("page".to_string(), "Placeholder text.".to_string())]
            .into_iter()
            .collect();

    // fail_open is off: only a recovered retry can drop the entry cleanly
    let kept = curate(&classifier, files, false)
        .await
        .expect("retry should recover, not surface the transient error");

    assert!(kept.is_empty());
}

#[tokio::test]
async fn test_object_sink_replaces_existing_container() {
    std::env::set_var(SAS_ENV, "sv=2024&sig=test");

    let storage = MockServer::start().await;

    // Container exists: creation conflicts, old blobs get listed and deleted
    Mock::given(method("PUT"))
        .and(path("/example"))
        .and(query_param("restype", "container"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&storage)
        .await;

    let listing = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults>
  <Blobs>
    <Blob><Name>old1.txt</Name></Blob>
    <Blob><Name>old2.txt</Name></Blob>
  </Blobs>
</EnumerationResults>"#;

    Mock::given(method("GET"))
        .and(path("/example"))
        .and(query_param("comp", "list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing)
                .insert_header("content-type", "application/xml"),
        )
        .expect(1)
        .mount(&storage)
        .await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"^/example/old\d\.txt$"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&storage)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/example/.+\.txt$"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&storage)
        .await;

    let sink_config = SinkConfig {
        kind: SinkKind::ObjectStorage,
        folder_path: None,
        account_url: Some(storage.uri()),
        sas_token_env: SAS_ENV.to_string(),
    };
    let sink = ObjectStoreSink::from_config(&sink_config).unwrap();

    let files: BTreeMap<String, String> = [
        ("example_about".to_string(), "about body".to_string()),
        ("example_contact".to_string(), "contact body".to_string()),
    ]
    .into_iter()
    .collect();

    sink.write("example", &files).await.unwrap();
    // Mock expectations (delete old, upload new) verify on server drop
}

#[tokio::test]
async fn test_object_sink_clears_paginated_listing() {
    std::env::set_var(SAS_ENV, "sv=2024&sig=test");

    let storage = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/paged"))
        .and(query_param("restype", "container"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&storage)
        .await;

    let page_two = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults>
  <Blobs>
    <Blob><Name>old2.txt</Name></Blob>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#;

    // Continuation request; mounted first so it wins over the unmarked one
    Mock::given(method("GET"))
        .and(path("/paged"))
        .and(query_param("comp", "list"))
        .and(query_param("marker", "page2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_two)
                .insert_header("content-type", "application/xml"),
        )
        .expect(1)
        .mount(&storage)
        .await;

    let page_one = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults>
  <Blobs>
    <Blob><Name>old1.txt</Name></Blob>
  </Blobs>
  <NextMarker>page2</NextMarker>
</EnumerationResults>"#;

    Mock::given(method("GET"))
        .and(path("/paged"))
        .and(query_param("comp", "list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_one)
                .insert_header("content-type", "application/xml"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&storage)
        .await;

    // Both pages' blobs must go, not just the first page's
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/paged/old\d\.txt$"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&storage)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/paged/.+\.txt$"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&storage)
        .await;

    let sink_config = SinkConfig {
        kind: SinkKind::ObjectStorage,
        folder_path: None,
        account_url: Some(storage.uri()),
        sas_token_env: SAS_ENV.to_string(),
    };
    let sink = ObjectStoreSink::from_config(&sink_config).unwrap();

    let files: BTreeMap<String, String> =
        [("page".to_string(), "body".to_string())].into_iter().collect();

    sink.write("paged", &files).await.unwrap();
}

#[tokio::test]
async fn test_object_sink_fresh_container_skips_listing() {
    std::env::set_var(SAS_ENV, "sv=2024&sig=test");

    let storage = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/fresh"))
        .and(query_param("restype", "container"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&storage)
        .await;

    Mock::given(method("GET"))
        .and(query_param("comp", "list"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&storage)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/fresh/.+\.txt$"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&storage)
        .await;

    let sink_config = SinkConfig {
        kind: SinkKind::ObjectStorage,
        folder_path: None,
        account_url: Some(storage.uri()),
        sas_token_env: SAS_ENV.to_string(),
    };
    let sink = ObjectStoreSink::from_config(&sink_config).unwrap();

    let files: BTreeMap<String, String> =
        [("page".to_string(), "body".to_string())].into_iter().collect();

    sink.write("fresh", &files).await.unwrap();
}

#[tokio::test]
async fn test_skip_policy_survives_broken_page() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<html><body>
            <a href="/good">Good</a>
            <a href="/broken">Broken</a>
            </body></html>"#,
        ))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(html_response(
            r#"<html><body><main><p>Fine content.</p></main></body></html>"#,
        ))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let out_dir = tempfile::TempDir::new().unwrap();
    let mut config = test_config(
        "https://oracle.invalid",
        local_sink_config(out_dir.path().to_str().unwrap()),
    );
    config.fetch.on_fetch_error = FetchFailurePolicy::Skip;

    let fetcher = HttpFetcher::new(&config.fetch).unwrap();
    let sink = LocalDirSink::new(out_dir.path());

    let summary = run_pipeline::<_, LlmClassifier, _>(
        &fetcher,
        None,
        &sink,
        &format!("{}/", site.uri()),
        &config,
        Stages {
            curate: false,
            persist: true,
        },
    )
    .await
    .expect("skip policy should tolerate the broken page");

    assert_eq!(summary.links_discovered, 2);
    assert_eq!(summary.pages_harvested, 1);
    assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 1);
}
