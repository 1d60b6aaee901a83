//! The analysis collaborator interface.
//!
//! Handlers never compute statistics themselves. They validate parameters,
//! resolve datasets and hand typed requests to a [`Qtl2Backend`]. The lookup
//! operations are required; every computation has a default that reports
//! the analysis as unavailable, so a backend implements only what it serves.

use serde_json::Value;

use qtl2rest_core::{ApiError, ApiResult, Table};

use crate::dataset::{Dataset, DatasetHandle, Marker};

/// Parameters of a LOD scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanParams {
    /// Annotation identifier to scan.
    pub id: String,
    /// Interactive covariate, if any.
    pub intcovar: Option<String>,
    /// Worker cores; `0` lets the backend decide.
    pub cores: usize,
}

/// Parameters of a per-sample LOD scan on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleScanParams {
    /// Annotation identifier to scan.
    pub id: String,
    /// Chromosome.
    pub chrom: String,
    /// Interactive covariate, if any.
    pub intcovar: Option<String>,
    /// Worker cores; `0` lets the backend decide.
    pub cores: usize,
}

/// Parameters of a founder-coefficient estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FounderParams {
    /// Annotation identifier.
    pub id: String,
    /// Chromosome.
    pub chrom: String,
    /// Interactive covariate, if any.
    pub intcovar: Option<String>,
    /// Estimate best linear unbiased predictors.
    pub blup: bool,
    /// Center the coefficients.
    pub center: bool,
    /// Worker cores; `0` lets the backend decide.
    pub cores: usize,
}

/// Parameters of a LOD-peak ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingParams {
    /// Restrict to one chromosome.
    pub chrom: Option<String>,
    /// Maximum number of ranked values.
    pub max_value: i64,
}

/// Parameters of a mediation analysis.
#[derive(Debug, Clone)]
pub struct MediateParams {
    /// Annotation identifier.
    pub id: String,
    /// Marker to mediate at.
    pub marker_id: String,
    /// Dataset providing the mediators; the scanned dataset when absent.
    pub dataset_mediate: Option<DatasetHandle>,
}

/// Parameters of a SNP association scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnpAssocParams {
    /// Annotation identifier.
    pub id: String,
    /// Chromosome.
    pub chrom: String,
    /// Centre of the window.
    pub location: i64,
    /// Window width around `location`.
    pub window_size: i64,
    /// Interactive covariate, if any.
    pub intcovar: Option<String>,
    /// Worker cores; `0` lets the backend decide.
    pub cores: usize,
}

/// Parameters of a correlation search.
#[derive(Debug, Clone)]
pub struct CorrelationParams {
    /// Annotation identifier.
    pub id: String,
    /// Dataset to correlate against; the source dataset when absent.
    pub dataset_correlate: Option<DatasetHandle>,
    /// Interactive covariate, if any.
    pub intcovar: Option<String>,
    /// Maximum number of correlated items.
    pub max_items: usize,
}

/// Parameters of a pairwise correlation plot.
#[derive(Debug, Clone)]
pub struct CorrelationPlotParams {
    /// Annotation identifier in the source dataset.
    pub id: String,
    /// Dataset holding `id_correlate`.
    pub dataset_correlate: DatasetHandle,
    /// Annotation identifier in `dataset_correlate`.
    pub id_correlate: String,
    /// Interactive covariate, if any.
    pub intcovar: Option<String>,
}

fn unavailable(analysis: &str) -> ApiError {
    ApiError::domain(format!("{analysis} is not available from this backend"))
}

/// Dataset registry and analysis engine behind the endpoints.
///
/// Implementations are shared across worker threads and may block.
pub trait Qtl2Backend: Send + Sync + 'static {
    /// Describes the serving environment.
    fn env_info(&self) -> ApiResult<Value>;

    /// All registered datasets, in registration order.
    fn datasets(&self) -> ApiResult<Vec<DatasetHandle>>;

    /// Summary statistics per dataset.
    fn datasets_stats(&self) -> ApiResult<Value>;

    /// Resolves a dataset id, failing with
    /// [`ApiError::DatasetNotFound`] when it is unknown.
    fn dataset(&self, id: &str) -> ApiResult<DatasetHandle>;

    /// Markers, optionally restricted to one chromosome.
    fn markers(&self, chrom: Option<&str>) -> ApiResult<Vec<Marker>>;

    /// Whether `id` is known, within `dataset` when one is given.
    fn id_exists(&self, id: &str, dataset: Option<&Dataset>) -> ApiResult<bool>;

    /// Significant LOD peaks of a dataset.
    fn lod_peaks(&self, _dataset: &Dataset) -> ApiResult<Table> {
        Err(unavailable("LOD peaks"))
    }

    /// Ranked LOD peaks per chromosome.
    fn rankings(&self, _dataset: &Dataset, _params: &RankingParams) -> ApiResult<Value> {
        Err(unavailable("rankings"))
    }

    /// Genome-wide LOD scan.
    fn lod_scan(&self, _dataset: &Dataset, _params: &ScanParams) -> ApiResult<Table> {
        Err(unavailable("LOD scan"))
    }

    /// LOD scan split by sample covariate value.
    fn lod_scan_samples(&self, _dataset: &Dataset, _params: &SampleScanParams) -> ApiResult<Table> {
        Err(unavailable("LOD scan by sample"))
    }

    /// Founder allele effects along a chromosome.
    fn founder_coefficients(&self, _dataset: &Dataset, _params: &FounderParams) -> ApiResult<Table> {
        Err(unavailable("founder coefficients"))
    }

    /// Expression values of one measurement.
    fn expression(&self, _dataset: &Dataset, _id: &str) -> ApiResult<Value> {
        Err(unavailable("expression data"))
    }

    /// Mediation scan at a marker.
    fn mediate(&self, _dataset: &Dataset, _params: &MediateParams) -> ApiResult<Table> {
        Err(unavailable("mediation"))
    }

    /// SNP association in a window.
    fn snp_assoc(&self, _dataset: &Dataset, _params: &SnpAssocParams) -> ApiResult<Table> {
        Err(unavailable("SNP association"))
    }

    /// Items most correlated with `id`.
    fn correlation(&self, _dataset: &Dataset, _params: &CorrelationParams) -> ApiResult<Table> {
        Err(unavailable("correlation"))
    }

    /// Paired values behind a correlation plot.
    fn correlation_plot(
        &self,
        _dataset: &Dataset,
        _params: &CorrelationPlotParams,
    ) -> ApiResult<Value> {
        Err(unavailable("correlation plot data"))
    }
}
