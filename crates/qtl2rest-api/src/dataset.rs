//! Dataset and marker records served by the API.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ID_FIELDS: [&str; 3] = ["gene_id", "protein_id", "data_name"];

/// Shared, read-only handle to a resolved dataset.
pub type DatasetHandle = Arc<Dataset>;

/// A covariate available for a dataset's samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarInfo {
    /// Column of the sample table holding the covariate.
    pub sample_column: String,
    /// Label shown to users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether the covariate may be used as an interactive covariate.
    #[serde(default)]
    pub interactive: bool,
    /// Any further attributes, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A dataset registered with the backend.
///
/// `datatype` is `mrna`, `protein` or a `pheno*` variant; it decides which
/// annotation field identifies a measurement (see [`Dataset::id_field`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier, e.g. `dataset.islet.rnaseq`.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
    /// Kind of data held.
    pub datatype: String,
    /// One record per measured gene, protein or phenotype.
    #[serde(default)]
    pub annotations: Vec<Map<String, Value>>,
    /// Covariates of the dataset's samples.
    #[serde(default)]
    pub covar_info: Vec<CovarInfo>,
    /// Any further attributes, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    /// Creates a dataset with no annotations or covariates.
    #[must_use]
    pub fn new(id: impl Into<String>, datatype: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            datatype: datatype.into(),
            annotations: Vec::new(),
            covar_info: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Adds an annotation record.
    #[must_use]
    pub fn with_annotation(mut self, annotation: Map<String, Value>) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Adds a covariate.
    #[must_use]
    pub fn with_covariate(mut self, sample_column: impl Into<String>, interactive: bool) -> Self {
        self.covar_info.push(CovarInfo {
            sample_column: sample_column.into(),
            display_name: None,
            interactive,
            extra: Map::new(),
        });
        self
    }

    /// Returns `true` for phenotype datasets.
    #[must_use]
    pub fn is_phenotype(&self) -> bool {
        self.datatype.to_ascii_lowercase().starts_with("pheno")
    }

    /// The annotation field naming a measurement, by datatype.
    #[must_use]
    pub fn id_field(&self) -> Option<&'static str> {
        match self.datatype.to_ascii_lowercase().as_str() {
            "mrna" => Some("gene_id"),
            "protein" => Some("protein_id"),
            _ if self.is_phenotype() => Some("data_name"),
            _ => None,
        }
    }

    /// Returns `true` if an annotation carries `id`.
    ///
    /// Unknown datatypes match against any of `gene_id`, `protein_id` and
    /// `data_name`.
    #[must_use]
    pub fn has_annotation(&self, id: &str) -> bool {
        let id_field = self.id_field();
        let is_id_field = |name: &str| match id_field {
            Some(field) => field == name,
            None => ID_FIELDS.contains(&name),
        };
        self.annotations.iter().any(|annotation| {
            annotation
                .iter()
                .any(|(name, value)| is_id_field(name) && value.as_str() == Some(id))
        })
    }

    /// Sample columns usable as interactive covariates.
    pub fn interactive_covariates(&self) -> impl Iterator<Item = &str> {
        self.covar_info
            .iter()
            .filter(|covar| covar.interactive)
            .map(|covar| covar.sample_column.as_str())
    }
}

/// A genetic marker on the physical map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Identifier, conventionally `<chr>_<position>`.
    pub marker_id: String,
    /// Chromosome.
    pub chr: String,
    /// Position on the chromosome.
    pub pos: f64,
    /// Genetic position in centimorgans.
    #[serde(default, rename = "cM", skip_serializing_if = "Option::is_none")]
    pub cm: Option<f64>,
}

impl Marker {
    /// Creates a marker without a genetic position.
    #[must_use]
    pub fn new(marker_id: impl Into<String>, chr: impl Into<String>, pos: f64) -> Self {
        Self {
            marker_id: marker_id.into(),
            chr: chr.into(),
            pos,
            cm: None,
        }
    }

    /// Returns `true` if the marker lies on `chrom` (case-insensitive).
    #[must_use]
    pub fn on_chromosome(&self, chrom: &str) -> bool {
        self.chr.eq_ignore_ascii_case(chrom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_id_field_by_datatype() {
        assert_eq!(Dataset::new("a", "mrna").id_field(), Some("gene_id"));
        assert_eq!(Dataset::new("b", "protein").id_field(), Some("protein_id"));
        assert_eq!(Dataset::new("c", "phenotype").id_field(), Some("data_name"));
        assert_eq!(Dataset::new("d", "pheno_other").id_field(), Some("data_name"));
        assert_eq!(Dataset::new("e", "metabolite").id_field(), None);
    }

    #[test]
    fn test_has_annotation_uses_datatype_field() {
        let dataset = Dataset::new("ds1", "mrna")
            .with_annotation(annotation(json!({"gene_id": "ENSMUSG00000000001", "symbol": "Gnai3"})));

        assert!(dataset.has_annotation("ENSMUSG00000000001"));
        assert!(!dataset.has_annotation("Gnai3"));
    }

    #[test]
    fn test_has_annotation_unknown_datatype_checks_all_fields() {
        let dataset = Dataset::new("ds2", "metabolite")
            .with_annotation(annotation(json!({"data_name": "glucose"})));
        assert!(dataset.has_annotation("glucose"));
    }

    #[test]
    fn test_deserialize_keeps_extra_fields() {
        let dataset: Dataset = serde_json::from_value(json!({
            "id": "dataset.clinical",
            "display_name": "Clinical",
            "datatype": "pheno",
            "covar_info": [
                {"sample_column": "sex", "interactive": true, "lod_peaks": "sex_int"},
                {"sample_column": "batch"}
            ],
            "ensembl_version": 94
        }))
        .unwrap();

        assert_eq!(dataset.interactive_covariates().collect::<Vec<_>>(), vec!["sex"]);
        assert_eq!(dataset.covar_info[0].extra["lod_peaks"], "sex_int");
        assert_eq!(dataset.extra["ensembl_version"], 94);
    }

    #[test]
    fn test_marker_chromosome_match() {
        let marker = Marker::new("X_3000000", "X", 3.0);
        assert!(marker.on_chromosome("x"));
        assert!(!marker.on_chromosome("1"));
    }
}
