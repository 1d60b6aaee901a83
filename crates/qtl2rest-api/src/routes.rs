//! The route catalogue.
//!
//! Each entry pairs a `GET` path with its failure message and a handler
//! body. Handlers read every declared parameter before resolving datasets,
//! so a missing parameter is reported ahead of an unknown dataset, and then
//! make exactly one collaborator call.

use std::sync::Arc;

use serde_json::{json, Value};

use qtl2rest_core::ApiResult;
use qtl2rest_extract::ParamReader;
use qtl2rest_router::DuplicateRouteError;
use qtl2rest_server::AppBuilder;
use qtl2rest_telemetry::RequestLogger;

use crate::backend::{
    CorrelationParams, CorrelationPlotParams, FounderParams, MediateParams, Qtl2Backend,
    RankingParams, SampleScanParams, ScanParams, SnpAssocParams,
};
use crate::dataset::{Dataset, DatasetHandle};
use crate::endpoint::{respond, to_json};

/// Default `max_value` for `/rankings`.
pub const DEFAULT_MAX_VALUE: i64 = 1000;
/// Default `window_size` for `/snpassoc`.
pub const DEFAULT_WINDOW_SIZE: i64 = 500_000;
/// Default `max_items` for `/correlation`.
pub const DEFAULT_MAX_ITEMS: usize = 10_000;

type Compute = fn(&dyn Qtl2Backend, &ParamReader<'_>) -> ApiResult<Value>;

/// A catalogue entry.
#[derive(Clone, Copy)]
pub struct ApiRoute {
    /// Request path.
    pub path: &'static str,
    /// Envelope `error` for collaborator failures.
    pub failure_message: &'static str,
    compute: Compute,
}

impl std::fmt::Debug for ApiRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRoute")
            .field("path", &self.path)
            .field("failure_message", &self.failure_message)
            .finish_non_exhaustive()
    }
}

const fn route(path: &'static str, failure_message: &'static str, compute: Compute) -> ApiRoute {
    ApiRoute {
        path,
        failure_message,
        compute,
    }
}

/// Every route served by the API, in registration order.
pub const ROUTES: &[ApiRoute] = &[
    route("/envinfo", "Unable to retrieve environment information", env_info),
    route("/datasets", "Unable to retrieve datasets", datasets),
    route("/datasetsstats", "Unable to retrieve dataset statistics", datasets_stats),
    route("/markers", "Unable to retrieve markers", markers),
    route("/idexists", "Unable to check id", id_exists),
    route("/lodpeaks", "Unable to retrieve LOD peaks", lod_peaks),
    route("/rankings", "Unable to retrieve rankings", rankings),
    route("/lodscan", "Unable to perform LOD scan", lod_scan),
    route("/lodscansamples", "Unable to perform LOD scan by sample", lod_scan_samples),
    route("/foundercoefs", "Unable to calculate founder coefficients", founder_coefficients),
    route("/expression", "Unable to retrieve expression data", expression),
    route("/mediate", "Unable to perform mediation", mediate),
    route("/snpassoc", "Unable to perform SNP association", snp_assoc),
    route("/correlation", "Unable to calculate correlation", correlation),
    route("/correlationplot", "Unable to retrieve correlation plot data", correlation_plot),
];

/// Registers every catalogue route on `builder`.
///
/// Each handler shares `backend` and writes its log line through `logger`.
pub fn register_routes(
    mut builder: AppBuilder,
    backend: Arc<dyn Qtl2Backend>,
    logger: &RequestLogger,
) -> Result<AppBuilder, DuplicateRouteError> {
    for api_route in ROUTES.iter().copied() {
        let backend = Arc::clone(&backend);
        let logger = logger.clone();
        builder = builder.get(api_route.path, move |request, response| {
            respond(
                request,
                response,
                &logger,
                api_route.failure_message,
                |params| (api_route.compute)(&*backend, params),
            )
        })?;
    }
    tracing::debug!(routes = ROUTES.len(), "registered API routes");
    Ok(builder)
}

fn optional_dataset(
    backend: &dyn Qtl2Backend,
    id: Option<&str>,
) -> ApiResult<Option<DatasetHandle>> {
    id.map(|id| backend.dataset(id)).transpose()
}

fn optional_string(params: &ParamReader<'_>, name: &str) -> Option<String> {
    params.optional(name).map(str::to_string)
}

fn env_info(backend: &dyn Qtl2Backend, _params: &ParamReader<'_>) -> ApiResult<Value> {
    backend.env_info()
}

fn datasets(backend: &dyn Qtl2Backend, _params: &ParamReader<'_>) -> ApiResult<Value> {
    let datasets = backend.datasets()?;
    let records: Vec<&Dataset> = datasets.iter().map(AsRef::as_ref).collect();
    Ok(json!({ "datasets": to_json(&records)? }))
}

fn datasets_stats(backend: &dyn Qtl2Backend, _params: &ParamReader<'_>) -> ApiResult<Value> {
    backend.datasets_stats()
}

fn markers(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let chrom = params.optional("chrom");
    to_json(&backend.markers(chrom)?)
}

fn id_exists(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let id = params.required("id")?;
    let dataset = optional_dataset(backend, params.optional("dataset"))?;
    Ok(Value::Bool(backend.id_exists(id, dataset.as_deref())?))
}

fn lod_peaks(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let expand = params.flag("expand");

    let dataset = backend.dataset(dataset_id)?;
    Ok(backend.lod_peaks(&dataset)?.shape(expand))
}

fn rankings(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let ranking = RankingParams {
        chrom: optional_string(params, "chrom"),
        max_value: params.int_or("max_value", DEFAULT_MAX_VALUE)?,
    };

    let dataset = backend.dataset(dataset_id)?;
    backend.rankings(&dataset, &ranking)
}

fn lod_scan(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let scan = ScanParams {
        id: params.required("id")?.to_string(),
        intcovar: optional_string(params, "intcovar"),
        cores: params.count_or("cores", 0)?,
    };
    let expand = params.flag("expand");

    let dataset = backend.dataset(dataset_id)?;
    Ok(backend.lod_scan(&dataset, &scan)?.shape(expand))
}

fn lod_scan_samples(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let scan = SampleScanParams {
        id: params.required("id")?.to_string(),
        chrom: params.required("chrom")?.to_string(),
        intcovar: optional_string(params, "intcovar"),
        cores: params.count_or("cores", 0)?,
    };
    let expand = params.flag("expand");

    let dataset = backend.dataset(dataset_id)?;
    Ok(backend.lod_scan_samples(&dataset, &scan)?.shape(expand))
}

fn founder_coefficients(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let founder = FounderParams {
        id: params.required("id")?.to_string(),
        chrom: params.required("chrom")?.to_string(),
        intcovar: optional_string(params, "intcovar"),
        blup: params.flag_or("blup", false),
        center: params.flag_or("center", true),
        cores: params.count_or("cores", 0)?,
    };
    let expand = params.flag("expand");

    let dataset = backend.dataset(dataset_id)?;
    Ok(backend.founder_coefficients(&dataset, &founder)?.shape(expand))
}

fn expression(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let id = params.required("id")?;

    let dataset = backend.dataset(dataset_id)?;
    backend.expression(&dataset, id)
}

fn mediate(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let id = params.required("id")?;
    let marker_id = params.required("marker_id")?;
    let expand = params.flag("expand");

    let dataset = backend.dataset(dataset_id)?;
    let mediation = MediateParams {
        id: id.to_string(),
        marker_id: marker_id.to_string(),
        dataset_mediate: optional_dataset(backend, params.optional("dataset_mediate"))?,
    };
    Ok(backend.mediate(&dataset, &mediation)?.shape(expand))
}

fn snp_assoc(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let assoc = SnpAssocParams {
        id: params.required("id")?.to_string(),
        chrom: params.required("chrom")?.to_string(),
        location: params.required_int("location")?,
        window_size: params.int_or("window_size", DEFAULT_WINDOW_SIZE)?,
        intcovar: optional_string(params, "intcovar"),
        cores: params.count_or("cores", 0)?,
    };
    let expand = params.flag("expand");

    let dataset = backend.dataset(dataset_id)?;
    Ok(backend.snp_assoc(&dataset, &assoc)?.shape(expand))
}

/// `/correlation` answers with plot data instead when `id_correlate` is given.
fn correlation(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let id = params.required("id")?;
    let intcovar = optional_string(params, "intcovar");
    let max_items = params.count_or("max_items", DEFAULT_MAX_ITEMS)?;
    let id_correlate = params.optional("id_correlate");
    let expand = params.flag("expand");

    let dataset = backend.dataset(dataset_id)?;
    let dataset_correlate = optional_dataset(backend, params.optional("dataset_correlate"))?;

    if let Some(id_correlate) = id_correlate {
        let plot = CorrelationPlotParams {
            id: id.to_string(),
            dataset_correlate: dataset_correlate.unwrap_or_else(|| Arc::clone(&dataset)),
            id_correlate: id_correlate.to_string(),
            intcovar,
        };
        return backend.correlation_plot(&dataset, &plot);
    }

    let search = CorrelationParams {
        id: id.to_string(),
        dataset_correlate,
        intcovar,
        max_items,
    };
    Ok(backend.correlation(&dataset, &search)?.shape(expand))
}

fn correlation_plot(backend: &dyn Qtl2Backend, params: &ParamReader<'_>) -> ApiResult<Value> {
    let dataset_id = params.required("dataset")?;
    let id = params.required("id")?;
    let dataset_correlate_id = params.required("dataset_correlate")?;
    let id_correlate = params.required("id_correlate")?;
    let intcovar = optional_string(params, "intcovar");

    let dataset = backend.dataset(dataset_id)?;
    let plot = CorrelationPlotParams {
        id: id.to_string(),
        dataset_correlate: backend.dataset(dataset_correlate_id)?,
        id_correlate: id_correlate.to_string(),
        intcovar,
    };
    backend.correlation_plot(&dataset, &plot)
}
