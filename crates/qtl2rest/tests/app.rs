//! Application assembly tests.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use flate2::read::GzDecoder;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use http::{HeaderValue, StatusCode};
use qtl2rest::api::ScanParams;
use qtl2rest::prelude::*;
use qtl2rest::server::TIMEOUT_MESSAGE;
use qtl2rest::telemetry::RequestLogEntry;
use qtl2rest::{build_app, build_app_with_logger, load_backend};
use serde_json::Value;

const SNAPSHOT: &str = r#"{
    "datasets": [{"id": "dataset.islet.rnaseq", "datatype": "mrna",
                  "annotations": [{"gene_id": "ENSMUSG00000000001"}]}],
    "markers": [
        {"marker_id": "1_3000000", "chr": "1", "pos": 3.0},
        {"marker_id": "2_4500000", "chr": "2", "pos": 4.5}
    ],
    "ids": ["rs123"]
}"#;

fn backend() -> Arc<MemoryBackend> {
    Arc::new(MemoryBackend::from_json_str(SNAPSHOT).unwrap())
}

/// A snapshot backend whose LOD scan outlives the request timeout.
struct SlowScanBackend(MemoryBackend);

impl Qtl2Backend for SlowScanBackend {
    fn env_info(&self) -> ApiResult<Value> {
        self.0.env_info()
    }

    fn datasets(&self) -> ApiResult<Vec<DatasetHandle>> {
        self.0.datasets()
    }

    fn datasets_stats(&self) -> ApiResult<Value> {
        self.0.datasets_stats()
    }

    fn dataset(&self, id: &str) -> ApiResult<DatasetHandle> {
        self.0.dataset(id)
    }

    fn markers(&self, chrom: Option<&str>) -> ApiResult<Vec<Marker>> {
        self.0.markers(chrom)
    }

    fn id_exists(&self, id: &str, dataset: Option<&Dataset>) -> ApiResult<bool> {
        self.0.id_exists(id, dataset)
    }

    fn lod_scan(&self, _dataset: &Dataset, _params: &ScanParams) -> ApiResult<Table> {
        std::thread::sleep(Duration::from_millis(100));
        Ok(Table::new(["marker_id", "lod"]))
    }
}

fn gzip_request(uri: &str) -> Request {
    Request::get(uri).with_header(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"))
}

#[test]
fn test_compression_enabled_by_default() {
    let app = build_app(backend(), &Qtl2RestConfig::default()).unwrap();
    assert_eq!(app.pipeline().stage_ids(), vec!["gzip"]);

    let response = app.dispatch(&gzip_request("/markers?chrom=2"));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");

    let mut decoded = Vec::new();
    GzDecoder::new(response.body().as_ref())
        .read_to_end(&mut decoded)
        .unwrap();
    let body: Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(body["result"][0]["marker_id"], "2_4500000");
}

#[test]
fn test_compression_can_be_disabled() {
    let mut config = Qtl2RestConfig::default();
    config.compression.enabled = false;
    let app = build_app(backend(), &config).unwrap();

    assert_eq!(app.pipeline().stage_count(), 0);
    let response = app.dispatch(&gzip_request("/idexists?id=rs123"));
    assert!(response.headers().get(CONTENT_ENCODING).is_none());

    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["result"], true);
}

#[test]
fn test_error_envelopes_are_compressed_too() {
    let app = build_app(backend(), &Qtl2RestConfig::default()).unwrap();
    let response = app.dispatch(&gzip_request("/lodscan?dataset=bad_id&id=x"));

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.is_encoded());
}

#[test]
fn test_handlers_log_through_given_logger() {
    let logger = RequestLogger::recording();
    let app = build_app_with_logger(backend(), &Qtl2RestConfig::default(), logger.clone()).unwrap();

    app.dispatch(&Request::get("/idexists?id=rs123"));
    app.dispatch(&Request::get("/idexists"));
    app.dispatch(&Request::get("/unknown"));

    let entries = logger.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].message().starts_with("/idexists|"));
    assert_eq!(entries[1].message(), "/idexists||id is required");
}

#[test]
fn test_load_backend_from_configured_snapshot() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SNAPSHOT.as_bytes()).unwrap();

    let mut config = Qtl2RestConfig::default();
    config.data.snapshot_path = Some(file.path().to_path_buf());
    assert_eq!(load_backend(&config).unwrap().dataset_count(), 1);
    assert_eq!(load_backend(&Qtl2RestConfig::default()).unwrap().dataset_count(), 0);
}

#[test]
fn test_load_backend_missing_file_fails() {
    let mut config = Qtl2RestConfig::default();
    config.data.snapshot_path = Some("/nonexistent/snapshot.json".into());
    assert!(load_backend(&config).is_err());
}

#[tokio::test]
async fn test_timeout_logged_once_and_compressed() {
    let logger = RequestLogger::recording();
    let slow = SlowScanBackend(MemoryBackend::from_json_str(SNAPSHOT).unwrap());
    let app = build_app_with_logger(Arc::new(slow), &Qtl2RestConfig::default(), logger.clone())
        .unwrap();
    let server = Server::builder(app)
        .request_timeout(Some(Duration::from_millis(10)))
        .build();

    let response = server
        .dispatch(gzip_request("/lodscan?dataset=dataset.islet.rnaseq&id=x"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
    let mut decoded = Vec::new();
    GzDecoder::new(response.body().as_ref())
        .read_to_end(&mut decoded)
        .unwrap();
    let body: Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(body["error"], TIMEOUT_MESSAGE);
    assert_eq!(body["details"], "no response within 10 ms");

    // The scan finishes after the timeout and must stay silent.
    tokio::time::sleep(Duration::from_millis(250)).await;
    let entries = logger.entries();
    assert_eq!(entries.len(), 1);
    assert!(matches!(&entries[0], RequestLogEntry::Failure { .. }));
    assert_eq!(
        entries[0].message(),
        "/lodscan|dataset=dataset.islet.rnaseq&id=x|no response within 10 ms"
    );
}
