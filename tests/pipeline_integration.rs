//! Integration tests for the multi-stage pipeline: fallback between
//! mirrors, retry budgets, conservation, and cancellation.

use std::collections::HashSet;
use std::time::Duration;

use osz_core::{HostDescriptor, Pipeline, PipelineError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn host(server: &MockServer, prefix: &str, attempts: u32) -> HostDescriptor {
    HostDescriptor::new(format!("{}{}{{id}}", server.uri(), prefix), attempts, None)
        .expect("valid template")
}

async fn mount_ok(server: &MockServer, path_str: &str, expect: u64) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
        .expect(expect)
        .mount(server)
        .await;
}

async fn mount_failing(server: &MockServer, path_str: &str, expect: u64) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(500))
        .expect(expect)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_stage_fallback_with_duplicate_input() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    // Stage 1: "10" and "30" succeed; "20" fails its full 3-attempt budget.
    mount_ok(&primary, "/b/10", 1).await;
    mount_ok(&primary, "/b/30", 1).await;
    mount_failing(&primary, "/b/20", 3).await;

    // Stage 2 sees exactly the stage-1 failures: only "20".
    mount_ok(&fallback, "/d/20", 1).await;
    mount_ok(&fallback, "/d/10", 0).await;
    mount_ok(&fallback, "/d/30", 0).await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        vec![host(&primary, "/b/", 3), host(&fallback, "/d/", 5)],
        temp_dir.path(),
        20,
    )
    .unwrap();

    let report = pipeline.run(ids(&["10", "20", "10", "30"])).await.unwrap();

    let expected: HashSet<String> = ids(&["10", "20", "30"]).into_iter().collect();
    assert_eq!(report.downloaded, expected);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_identifier_failing_every_stage_lands_in_final_failure_list() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    mount_ok(&primary, "/b/10", 1).await;
    mount_failing(&primary, "/b/20", 3).await;
    // Exhausts the full 5-attempt fallback budget too.
    mount_failing(&fallback, "/d/20", 5).await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        vec![host(&primary, "/b/", 3), host(&fallback, "/d/", 5)],
        temp_dir.path(),
        20,
    )
    .unwrap();

    let report = pipeline.run(ids(&["10", "20"])).await.unwrap();

    assert_eq!(report.downloaded, ids(&["10"]).into_iter().collect());
    assert_eq!(report.failed, ids(&["20"]));
}

#[tokio::test]
async fn test_conservation_across_stages() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    mount_ok(&primary, "/b/10", 1).await;
    mount_failing(&primary, "/b/20", 2).await;
    mount_failing(&primary, "/b/30", 2).await;
    mount_failing(&primary, "/b/40", 2).await;

    mount_ok(&fallback, "/d/20", 1).await;
    mount_failing(&fallback, "/d/30", 1).await;
    mount_failing(&fallback, "/d/40", 1).await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        vec![host(&primary, "/b/", 2), host(&fallback, "/d/", 1)],
        temp_dir.path(),
        20,
    )
    .unwrap();

    let input = ids(&["10", "20", "30", "40", "10", "20"]);
    let unique: HashSet<String> = input.iter().cloned().collect();
    let report = pipeline.run(input).await.unwrap();

    // No identifier is lost or double-counted.
    assert_eq!(
        report.downloaded.len() + report.failed.len(),
        unique.len()
    );
    assert_eq!(report.downloaded, ids(&["10", "20"]).into_iter().collect());
    let failed: HashSet<String> = report.failed.iter().cloned().collect();
    assert_eq!(failed, ids(&["30", "40"]).into_iter().collect());
}

#[tokio::test]
async fn test_empty_input_makes_zero_http_calls() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&primary)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(vec![host(&primary, "/b/", 3)], temp_dir.path(), 20).unwrap();

    let report = pipeline.run(Vec::new()).await.unwrap();
    assert!(report.downloaded.is_empty());
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_retry_stops_on_first_success() {
    let primary = MockServer::start().await;

    // Two failures, then success; the budget of 5 must not be spent.
    Mock::given(method("GET"))
        .and(path("/b/77"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&primary)
        .await;
    mount_ok(&primary, "/b/77", 1).await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(vec![host(&primary, "/b/", 5)], temp_dir.path(), 20).unwrap();

    let report = pipeline.run(ids(&["77"])).await.unwrap();
    assert_eq!(report.downloaded, ids(&["77"]).into_iter().collect());
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_cancellation_reports_in_flight_identifiers() {
    let primary = MockServer::start().await;

    // Everything hangs long enough that the signal fires mid-stage.
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"PK".to_vec())
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&primary)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(vec![host(&primary, "/b/", 3)], temp_dir.path(), 20).unwrap();
    let shutdown = pipeline.shutdown_handle();

    let input = ids(&["1", "2", "3"]);
    let (result, ()) = tokio::join!(pipeline.run(input.clone()), async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown.trigger();
    });

    match result {
        Err(PipelineError::Cancelled { stage, unfinished }) => {
            assert_eq!(stage, 1);
            let unfinished: HashSet<String> = unfinished.into_iter().collect();
            assert_eq!(unfinished, input.into_iter().collect());
        }
        other => panic!("expected Cancelled, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancellation_reports_only_unsettled_identifiers() {
    let primary = MockServer::start().await;

    mount_ok(&primary, "/b/fast1", 1).await;
    mount_ok(&primary, "/b/fast2", 1).await;
    Mock::given(method("GET"))
        .and(path("/b/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"PK".to_vec())
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&primary)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(vec![host(&primary, "/b/", 3)], temp_dir.path(), 20).unwrap();
    let shutdown = pipeline.shutdown_handle();

    let (result, ()) = tokio::join!(pipeline.run(ids(&["fast1", "fast2", "slow"])), async {
        // Give the fast identifiers time to settle before interrupting.
        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.trigger();
    });

    match result {
        Err(PipelineError::Cancelled { stage: 1, unfinished }) => {
            assert_eq!(unfinished, ids(&["slow"]));
        }
        other => panic!("expected Cancelled in stage 1, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_pool_width_one_still_processes_whole_batch() {
    let primary = MockServer::start().await;
    mount_ok(&primary, "/b/1", 1).await;
    mount_ok(&primary, "/b/2", 1).await;
    mount_ok(&primary, "/b/3", 1).await;

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(vec![host(&primary, "/b/", 1)], temp_dir.path(), 1).unwrap();

    let report = pipeline.run(ids(&["1", "2", "3"])).await.unwrap();
    assert_eq!(report.downloaded.len(), 3);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_downloaded_files_land_in_output_dir() {
    let primary = MockServer::start().await;
    mount_ok(&primary, "/b/555", 1).await;

    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("downloaded");
    let pipeline = Pipeline::new(vec![host(&primary, "/b/", 1)], &out, 20).unwrap();

    let report = pipeline.run(ids(&["555"])).await.unwrap();
    assert_eq!(report.downloaded.len(), 1);
    assert!(out.join("555.osz").exists());
}
