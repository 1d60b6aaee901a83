//! In-memory backend loaded from a JSON snapshot.
//!
//! The snapshot is a single document:
//!
//! ```json
//! {
//!   "environment": {"ensembl_version": 94},
//!   "datasets": [{"id": "dataset.islet.rnaseq", "datatype": "mrna", "annotations": [...]}],
//!   "markers": [{"marker_id": "1_3000000", "chr": "1", "pos": 3.0}],
//!   "ids": ["rs123"]
//! }
//! ```
//!
//! Every section is optional. The registry is read-only once loaded, so the
//! backend is shared between workers without locking. Lookups are served
//! from the snapshot; computations keep the trait's "not available" defaults.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use qtl2rest_core::{ApiError, ApiResult};

use crate::backend::Qtl2Backend;
use crate::dataset::{Dataset, DatasetHandle, Marker};
use crate::error::SnapshotError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    #[serde(default)]
    environment: Map<String, Value>,
    #[serde(default)]
    datasets: Vec<Dataset>,
    #[serde(default)]
    markers: Vec<Marker>,
    #[serde(default)]
    ids: Vec<String>,
}

/// Read-only dataset registry backed by a snapshot.
///
/// # Example
///
/// ```
/// use qtl2rest_api::{MemoryBackend, Qtl2Backend};
///
/// let backend = MemoryBackend::from_json_str(r#"{
///     "datasets": [{"id": "ds1", "datatype": "mrna", "annotations": [{"gene_id": "G1"}]}],
///     "ids": ["rs123"]
/// }"#).unwrap();
///
/// assert!(backend.id_exists("rs123", None).unwrap());
/// assert!(backend.dataset("missing").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    environment: Map<String, Value>,
    datasets: IndexMap<String, DatasetHandle>,
    markers: Vec<Marker>,
    ids: HashSet<String>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| SnapshotError::read(path, e))?;
        let backend = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            datasets = backend.datasets.len(),
            markers = backend.markers.len(),
            "loaded snapshot"
        );
        Ok(backend)
    }

    /// Parses a snapshot document.
    pub fn from_json_str(content: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        Self::from_snapshot(snapshot)
    }

    fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let mut backend = Self {
            environment: snapshot.environment,
            markers: snapshot.markers,
            ids: snapshot.ids.into_iter().collect(),
            ..Self::default()
        };
        for dataset in snapshot.datasets {
            backend = backend.with_dataset(dataset)?;
        }
        Ok(backend)
    }

    /// Registers a dataset.
    pub fn with_dataset(mut self, dataset: Dataset) -> Result<Self, SnapshotError> {
        if self.datasets.contains_key(&dataset.id) {
            return Err(SnapshotError::DuplicateDataset(dataset.id));
        }
        self.datasets.insert(dataset.id.clone(), Arc::new(dataset));
        Ok(self)
    }

    /// Adds a marker.
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Adds a free-standing identifier such as a SNP id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.ids.insert(id.into());
        self
    }

    /// Number of registered datasets.
    #[must_use]
    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }
}

impl Qtl2Backend for MemoryBackend {
    fn env_info(&self) -> ApiResult<Value> {
        let mut info = self.environment.clone();
        info.insert(
            "qtl2rest_version".to_string(),
            Value::from(env!("CARGO_PKG_VERSION")),
        );
        info.insert("num_datasets".to_string(), Value::from(self.datasets.len()));
        info.insert("num_markers".to_string(), Value::from(self.markers.len()));
        Ok(Value::Object(info))
    }

    fn datasets(&self) -> ApiResult<Vec<DatasetHandle>> {
        Ok(self.datasets.values().cloned().collect())
    }

    fn datasets_stats(&self) -> ApiResult<Value> {
        let stats = self
            .datasets
            .values()
            .map(|dataset| {
                json!({
                    "id": dataset.id,
                    "display_name": dataset.display_name,
                    "datatype": dataset.datatype,
                    "num_annotations": dataset.annotations.len(),
                    "num_covariates": dataset.covar_info.len(),
                    "interactive_covariates": dataset.interactive_covariates().collect::<Vec<_>>(),
                })
            })
            .collect();
        Ok(Value::Array(stats))
    }

    fn dataset(&self, id: &str) -> ApiResult<DatasetHandle> {
        self.datasets
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::dataset_not_found(id))
    }

    fn markers(&self, chrom: Option<&str>) -> ApiResult<Vec<Marker>> {
        let markers = match chrom {
            Some(chrom) => self
                .markers
                .iter()
                .filter(|marker| marker.on_chromosome(chrom))
                .cloned()
                .collect(),
            None => self.markers.clone(),
        };
        Ok(markers)
    }

    fn id_exists(&self, id: &str, dataset: Option<&Dataset>) -> ApiResult<bool> {
        let found = match dataset {
            Some(dataset) => dataset.has_annotation(id),
            None => {
                self.ids.contains(id)
                    || self.markers.iter().any(|marker| marker.marker_id == id)
                    || self.datasets.values().any(|dataset| dataset.has_annotation(id))
            }
        };
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtl2rest_core::ErrorKind;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "environment": {"ensembl_version": 94},
        "datasets": [
            {
                "id": "dataset.islet.rnaseq",
                "display_name": "Islet RNA-Seq",
                "datatype": "mrna",
                "annotations": [{"gene_id": "ENSMUSG00000000001", "symbol": "Gnai3"}],
                "covar_info": [{"sample_column": "sex", "interactive": true}]
            },
            {
                "id": "dataset.clinical",
                "datatype": "pheno",
                "annotations": [{"data_name": "Ins_tAUC"}]
            }
        ],
        "markers": [
            {"marker_id": "1_3000000", "chr": "1", "pos": 3.0},
            {"marker_id": "2_4500000", "chr": "2", "pos": 4.5, "cM": 0.1},
            {"marker_id": "2_9000000", "chr": "2", "pos": 9.0}
        ],
        "ids": ["rs123"]
    }"#;

    fn backend() -> MemoryBackend {
        MemoryBackend::from_json_str(SNAPSHOT).unwrap()
    }

    #[test]
    fn test_markers_filtered_by_chromosome() {
        let backend = backend();
        let markers = backend.markers(Some("2")).unwrap();
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.chr == "2"));
        assert_eq!(markers[0].cm, Some(0.1));

        assert_eq!(backend.markers(None).unwrap().len(), 3);
        assert!(backend.markers(Some("Y")).unwrap().is_empty());
    }

    #[test]
    fn test_dataset_lookup() {
        let backend = backend();
        assert_eq!(backend.dataset("dataset.clinical").unwrap().datatype, "pheno");

        let err = backend.dataset("bad_id").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DatasetNotFound);
        assert_eq!(err.to_string(), "dataset 'bad_id' not found");
    }

    #[test]
    fn test_datasets_keep_snapshot_order() {
        let ids: Vec<String> = backend()
            .datasets()
            .unwrap()
            .iter()
            .map(|d| d.id.clone())
            .collect();
        assert_eq!(ids, vec!["dataset.islet.rnaseq", "dataset.clinical"]);
    }

    #[test]
    fn test_id_exists_globally_and_per_dataset() {
        let backend = backend();
        assert!(backend.id_exists("rs123", None).unwrap());
        assert!(backend.id_exists("2_4500000", None).unwrap());
        assert!(backend.id_exists("Ins_tAUC", None).unwrap());
        assert!(!backend.id_exists("rs999", None).unwrap());

        let islet = backend.dataset("dataset.islet.rnaseq").unwrap();
        assert!(backend.id_exists("ENSMUSG00000000001", Some(islet.as_ref())).unwrap());
        assert!(!backend.id_exists("rs123", Some(islet.as_ref())).unwrap());
    }

    #[test]
    fn test_env_info_and_stats() {
        let backend = backend();
        let info = backend.env_info().unwrap();
        assert_eq!(info["ensembl_version"], 94);
        assert_eq!(info["num_datasets"], 2);
        assert_eq!(info["num_markers"], 3);

        let stats = backend.datasets_stats().unwrap();
        assert_eq!(stats[0]["num_annotations"], 1);
        assert_eq!(stats[0]["interactive_covariates"], serde_json::json!(["sex"]));
        assert_eq!(stats[1]["num_covariates"], 0);
    }

    #[test]
    fn test_duplicate_dataset_rejected() {
        let err = MemoryBackend::from_json_str(
            r#"{"datasets": [{"id": "a", "datatype": "mrna"}, {"id": "a", "datatype": "protein"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateDataset(id) if id == "a"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let err = MemoryBackend::from_json_str(r#"{"dataset": []}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let backend = MemoryBackend::from_json_file(file.path()).unwrap();
        assert_eq!(backend.dataset_count(), 2);
    }

    #[test]
    fn test_from_missing_file() {
        let err = MemoryBackend::from_json_file("/nonexistent/snapshot.json").unwrap_err();
        assert!(matches!(err, SnapshotError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/snapshot.json"));
    }
}
