//! Integration tests for failed test discovery with MemoryHistoryClient.

use failtrail_core::fakes::MemoryHistoryClient;
use failtrail_core::history::{failed_runs_path, job_log_path, run_jobs_path};
use failtrail_core::{filter_expression, FailedTestFinder, RunFilter};
use serde_json::{json, Value};

const REPO: &str = "owner/repo";

fn filter() -> RunFilter {
    RunFilter::new(REPO, "main.yml", "main", 5).unwrap()
}

fn runs(ids: &[u64]) -> Value {
    json!({ "workflow_runs": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>() })
}

fn jobs(entries: &[(u64, &str)]) -> Value {
    json!({
        "jobs": entries
            .iter()
            .map(|(id, conclusion)| json!({"id": id, "conclusion": conclusion}))
            .collect::<Vec<_>>()
    })
}

/// Client with one run (id 1) holding the given jobs.
fn single_run(job_entries: &[(u64, &str)]) -> MemoryHistoryClient {
    MemoryHistoryClient::new()
        .with_json(failed_runs_path(&filter()), runs(&[1]))
        .with_json(run_jobs_path(REPO, 1), jobs(job_entries))
}

/// Test: a single failing job's log is mined
#[tokio::test]
async fn test_extracts_failed_tests_from_single_job_log() {
    let log = "There was 1 failure:\n\n\
               1) Acme\\Tests\\FooTest::testSomething\n\
               Failed asserting that false is true.";
    let client = single_run(&[(10, "failure")]).with_raw(job_log_path(REPO, 10), log);

    let result = FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(result, vec!["Acme\\Tests\\FooTest::testSomething"]);
}

/// Test: identical failures across runs collapse to one entry
#[tokio::test]
async fn test_deduplicates_same_test_across_runs() {
    let log = "1) Acme\\Tests\\FooTest::testSomething\nFailed.";
    let client = MemoryHistoryClient::new()
        .with_json(failed_runs_path(&filter()), runs(&[1, 2]))
        .with_json(run_jobs_path(REPO, 1), jobs(&[(10, "failure")]))
        .with_json(run_jobs_path(REPO, 2), jobs(&[(20, "failure")]))
        .with_raw(job_log_path(REPO, 10), log)
        .with_raw(job_log_path(REPO, 20), log);

    let result = FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(result, vec!["Acme\\Tests\\FooTest::testSomething"]);
}

/// Test: several failed jobs in one run all contribute
#[tokio::test]
async fn test_collects_tests_from_multiple_failed_jobs() {
    let client = single_run(&[(10, "failure"), (20, "failure")])
        .with_raw(job_log_path(REPO, 10), "1) Acme\\Tests\\FooTest::testOne\nFailed.")
        .with_raw(job_log_path(REPO, 20), "1) Acme\\Tests\\BarTest::testTwo\nFailed.");

    let result = FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(result.len(), 2);
    assert!(result.iter().any(|t| t == "Acme\\Tests\\FooTest::testOne"));
    assert!(result.iter().any(|t| t == "Acme\\Tests\\BarTest::testTwo"));
}

/// Test: logs are fetched only for jobs that concluded with "failure"
#[tokio::test]
async fn test_only_fetches_logs_for_failed_jobs() {
    let client = single_run(&[(10, "success"), (20, "failure"), (30, "cancelled")])
        .with_raw(job_log_path(REPO, 20), "1) Acme\\Tests\\FooTest::testOne\nFailed.");

    FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(
        client.raw_requests(),
        vec!["/repos/owner/repo/actions/jobs/20/logs"]
    );
}

/// Test: output is sorted regardless of discovery order
#[tokio::test]
async fn test_results_are_sorted() {
    let client = single_run(&[(10, "failure")]).with_raw(
        job_log_path(REPO, 10),
        "1) Acme\\Tests\\ZTest::testLast\n2) Acme\\Tests\\ATest::testFirst",
    );

    let result = FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(
        result,
        vec!["Acme\\Tests\\ATest::testFirst", "Acme\\Tests\\ZTest::testLast"]
    );
}

/// Test: the run listing request carries workflow, branch, status and page size
#[tokio::test]
async fn test_passes_correct_path_to_runs_api() {
    let client = MemoryHistoryClient::new();
    let filter = RunFilter::new(REPO, "ci.yml", "develop", 3).unwrap();

    FailedTestFinder::new(&client).find(&filter).await;

    assert_eq!(
        client.json_requests(),
        vec!["/repos/owner/repo/actions/workflows/ci.yml/runs?status=failure&branch=develop&per_page=3"]
    );
}

/// Test: each "nothing found" path yields an empty result
#[tokio::test]
async fn test_empty_result_cases() {
    // run listing absent
    let client = MemoryHistoryClient::new();
    assert!(FailedTestFinder::new(&client).find(&filter()).await.is_empty());

    // no failed runs
    let client = MemoryHistoryClient::new().with_json(failed_runs_path(&filter()), runs(&[]));
    assert!(FailedTestFinder::new(&client).find(&filter()).await.is_empty());

    // job listing absent
    let client = MemoryHistoryClient::new().with_json(failed_runs_path(&filter()), runs(&[1]));
    assert!(FailedTestFinder::new(&client).find(&filter()).await.is_empty());

    // no failed jobs
    let client = single_run(&[(10, "success")]);
    assert!(FailedTestFinder::new(&client).find(&filter()).await.is_empty());
    assert!(client.raw_requests().is_empty());

    // every log absent
    let client = single_run(&[(10, "failure")]);
    assert!(FailedTestFinder::new(&client).find(&filter()).await.is_empty());
    assert_eq!(client.raw_requests().len(), 1);

    // logs without failures
    let client = single_run(&[(10, "failure")])
        .with_raw(job_log_path(REPO, 10), "Fatal error: out of memory");
    assert!(FailedTestFinder::new(&client).find(&filter()).await.is_empty());
}

/// Test: one run whose jobs cannot be listed does not hide the others
#[tokio::test]
async fn test_job_listing_failure_is_isolated_to_its_run() {
    let client = MemoryHistoryClient::new()
        .with_json(failed_runs_path(&filter()), runs(&[1, 2, 3]))
        // run 1 has no job listing registered
        .with_json(run_jobs_path(REPO, 2), json!({"message": "Server Error"}))
        .with_json(run_jobs_path(REPO, 3), jobs(&[(30, "failure")]))
        .with_raw(job_log_path(REPO, 30), "1) Acme\\Tests\\FooTest::testOne");

    let result = FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(result, vec!["Acme\\Tests\\FooTest::testOne"]);
    assert_eq!(client.json_requests().len(), 4);
}

/// Test: a missing log only drops its own job
#[tokio::test]
async fn test_log_failure_is_isolated_to_its_job() {
    let client = single_run(&[(10, "failure"), (20, "failure")])
        .with_raw(job_log_path(REPO, 20), "1) BarTest::testTwo");

    let result = FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(result, vec!["BarTest::testTwo"]);
    assert_eq!(
        client.raw_requests(),
        vec![job_log_path(REPO, 10), job_log_path(REPO, 20)]
    );
}

/// Test: runs are visited in listing order
#[tokio::test]
async fn test_runs_visited_in_listing_order() {
    let client = MemoryHistoryClient::new().with_json(failed_runs_path(&filter()), runs(&[9, 3, 5]));

    FailedTestFinder::new(&client).find(&filter()).await;

    assert_eq!(
        client.json_requests()[1..],
        [
            run_jobs_path(REPO, 9),
            run_jobs_path(REPO, 3),
            run_jobs_path(REPO, 5)
        ]
    );
}

/// Test: two runs, one failing job each, feed a combined filter
#[tokio::test]
async fn test_end_to_end_two_runs() {
    let client = MemoryHistoryClient::new()
        .with_json(failed_runs_path(&filter()), runs(&[100, 200]))
        .with_json(run_jobs_path(REPO, 100), jobs(&[(1, "failure"), (2, "success")]))
        .with_json(run_jobs_path(REPO, 200), jobs(&[(3, "failure")]))
        .with_raw(job_log_path(REPO, 1), "1) FooTest::testOne\nFailed.")
        .with_raw(job_log_path(REPO, 3), "1) BarTest::testTwo\nFailed.");

    let result = FailedTestFinder::new(&client)
        .with_concurrency(2)
        .find(&filter())
        .await;

    assert_eq!(result, vec!["BarTest::testTwo", "FooTest::testOne"]);
    assert_eq!(
        filter_expression(result.as_slice()).as_deref(),
        Some("BarTest::testTwo|FooTest::testOne")
    );
}
