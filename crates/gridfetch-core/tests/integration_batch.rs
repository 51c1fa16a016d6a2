//! Integration test: a local export service and download host, driven through
//! the curl-backed resolver and downloader.
//!
//! Tasks run on a single worker so the export endpoint sees requests in
//! planning order.

mod common;

use std::time::Duration;

use common::export_server::{ExportServer, Reply};
use gridfetch_core::downloader::{CurlDownloader, CurlOptions, Downloader};
use gridfetch_core::executor::{Executor, FailureReason};
use gridfetch_core::planner::Planner;
use gridfetch_core::product::{ProductRequest, ProductType};
use gridfetch_core::resolver::{HttpResolver, ResolvedDownload, Resolver};
use gridfetch_core::resume::ResumptionState;
use gridfetch_core::retry::{ErrorKind, FetchError, RetryPolicy};
use tempfile::tempdir;

fn mosaic_only() -> Vec<ProductRequest> {
    let product = ProductType::MultispectralMosaic;
    vec![ProductRequest::new(product, product.default_render())]
}

fn download_reply(server: &ExportServer, path: &str) -> Reply {
    Reply::json(serde_json::json!({ "url": server.url(path) }).to_string())
}

fn resolver(server: &ExportServer) -> HttpResolver {
    HttpResolver::new(
        &server.url("/export"),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_header("Authorization", "Bearer test-token")
}

fn downloader() -> CurlDownloader {
    CurlDownloader::new(CurlOptions {
        stall_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(5),
        transfer_timeout: Duration::from_secs(30),
    })
}

#[test]
fn batch_resolves_downloads_and_publishes() {
    let server = ExportServer::start();
    server.route(
        "/export",
        vec![download_reply(&server, "/dl/0"), download_reply(&server, "/dl/1")],
    );
    server.route(
        "/dl/0",
        vec![Reply::ok(common::zip_bytes(&[("0.tif", &b"band data 0"[..])]))],
    );
    server.route(
        "/dl/1",
        vec![
            Reply::status(503),
            Reply::ok(common::zip_bytes(&[("1.tif", &b"band data 1"[..]), ("1.json", &b"{}"[..])])),
        ],
    );

    let out = tempdir().unwrap();
    let cells = vec![common::cell(0), common::cell(1)];
    let tasks = Planner::new(mosaic_only(), out.path()).plan(&cells, &ResumptionState::new(), usize::MAX);
    assert_eq!(tasks.len(), 2);

    let exec = Executor::new(resolver(&server), downloader())
        .with_retry_policy(RetryPolicy::immediate(3))
        .with_concurrency(1);
    let report = exec.run(tasks, None);

    assert!(report.is_complete(), "failed: {:?}", report.failed_keys());
    let second = report.outcome("1-multispectral-mosaic").unwrap();
    assert_eq!(second.attempts, 2);
    assert_eq!(second.failures, vec![ErrorKind::Throttled]);
    assert_eq!(server.hits("/dl/1"), 2);

    assert_eq!(
        std::fs::read(out.path().join("0-multispectral-mosaic/0.tif")).unwrap(),
        b"band data 0"
    );
    assert!(out.path().join("1-multispectral-mosaic/1.json").exists());

    let exports = server.requests("/export");
    assert_eq!(exports.len(), 3);
    assert_eq!(exports[0].method, "POST");
    assert_eq!(exports[0].header("authorization"), Some("Bearer test-token"));
    let body: serde_json::Value = serde_json::from_slice(&exports[0].body).unwrap();
    assert_eq!(body["name"], "0-multispectral-mosaic");
    assert_eq!(body["region"]["type"], "Polygon");

    // A second pass over the same output root plans nothing.
    let resumption = ResumptionState::scan(out.path()).unwrap();
    let again = Planner::new(mosaic_only(), out.path()).plan(&cells, &resumption, usize::MAX);
    assert!(again.is_empty());
}

#[test]
fn rejected_export_is_retried_then_reported() {
    let server = ExportServer::start();
    server.route("/export", vec![Reply::status(400)]);

    let out = tempdir().unwrap();
    let tasks = Planner::new(mosaic_only(), out.path()).plan(
        &[common::cell(4)],
        &ResumptionState::new(),
        usize::MAX,
    );
    let exec = Executor::new(resolver(&server), downloader())
        .with_retry_policy(RetryPolicy::immediate(2))
        .with_concurrency(1);
    let report = exec.run(tasks, None);

    let outcome = report.outcome("4-multispectral-mosaic").unwrap();
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.failures, vec![ErrorKind::Resolve, ErrorKind::Resolve]);
    assert!(matches!(outcome.failure(), Some(FailureReason::Exhausted(FetchError::Resolve(_)))));
    assert_eq!(server.hits("/export"), 2);
    assert!(!out.path().join("4-multispectral-mosaic").exists());
}

#[test]
fn non_archive_body_leaves_no_output() {
    let server = ExportServer::start();
    server.route("/export", vec![download_reply(&server, "/dl/bad")]);
    server.route("/dl/bad", vec![Reply::ok(b"<html>quota exceeded</html>".to_vec())]);

    let out = tempdir().unwrap();
    let tasks = Planner::new(mosaic_only(), out.path()).plan(
        &[common::cell(2)],
        &ResumptionState::new(),
        usize::MAX,
    );
    let exec = Executor::new(resolver(&server), downloader())
        .with_retry_policy(RetryPolicy::immediate(2))
        .with_concurrency(1);
    let report = exec.run(tasks, None);

    assert_eq!(report.failed_keys(), vec!["2-multispectral-mosaic"]);
    assert_eq!(
        report.outcome("2-multispectral-mosaic").unwrap().failures,
        vec![ErrorKind::Archive, ErrorKind::Archive]
    );
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn downloader_reports_http_status() {
    let server = ExportServer::start();
    let mut sink = Vec::new();
    let err = downloader()
        .fetch(&ResolvedDownload::new(server.url("/missing")), &mut sink)
        .unwrap_err();
    assert!(matches!(err, FetchError::Http(404)));

    server.route("/blob", vec![Reply::ok(vec![7u8; 10_000])]);
    let mut sink = Vec::new();
    let n = downloader()
        .fetch(&ResolvedDownload::new(server.url("/blob")), &mut sink)
        .unwrap();
    assert_eq!(n, 10_000);
    assert_eq!(sink.len(), 10_000);
}

#[test]
fn reachability_check_distinguishes_endpoints() {
    let server = ExportServer::start();
    server.route("/export", vec![Reply::status(405)]);
    resolver(&server).check_reachable().unwrap();
    assert_eq!(server.requests("/export")[0].method, "HEAD");

    let dead = closed_port();
    let unreachable = HttpResolver::new(
        &format!("http://127.0.0.1:{}/export", dead),
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = unreachable.check_reachable().unwrap_err();
    assert!(format!("{:#}", err).contains("unreachable"));
}

/// A port that was just bound and released, so nothing is listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
