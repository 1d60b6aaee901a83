//! Ordered pre/post hook pipeline.
//!
//! The pipeline owns an immutable list of middlewares, built once at startup.
//! [`Pipeline::execute`] walks the list, runs the handler, and unwinds the
//! post-hooks of every middleware whose pre-hook completed, in reverse order.
//! A pre-hook that halts stops the descent; a pre-hook that fails does not
//! count as entered, so its own post-hook is skipped.
//!
//! [`Pipeline::finish`] runs every post-hook over a response built outside
//! the pipeline, such as a timeout envelope written by the transport.
//!
//! Failures never escape `execute`: an error or panic from any hook or from
//! the handler replaces the response with a 400 error envelope, is recorded
//! as a [`PipelineFault`] on the returned [`PipelineOutcome`], and unwinding
//! carries on.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use qtl2rest_core::{Envelope, Request, Response};
use thiserror::Error;

use crate::middleware::{Flow, HandlerResult, HookError, Middleware};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Envelope `error` text for faults caught at the pipeline boundary.
pub const FAULT_MESSAGE: &str = "Unable to process request";

/// Where in the pipeline a fault happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// The pre-hook of the named middleware.
    Pre(String),
    /// The route handler.
    Handler,
    /// The post-hook of the named middleware.
    Post(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre(id) => write!(f, "pre-hook '{id}'"),
            Self::Handler => f.write_str("handler"),
            Self::Post(id) => write!(f, "post-hook '{id}'"),
        }
    }
}

/// A failure caught at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFault {
    /// Where the failure happened.
    pub stage: Stage,
    /// Error or panic message.
    pub message: String,
    /// `true` if the stage panicked rather than returning an error.
    pub panicked: bool,
}

impl fmt::Display for PipelineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.panicked { "panicked" } else { "failed" };
        write!(f, "{} {verb}: {}", self.stage, self.message)
    }
}

impl std::error::Error for PipelineFault {}

/// Errors raised while building a [`Pipeline`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineBuildError {
    /// Two middlewares share an id.
    #[error("duplicate middleware id: {0}")]
    DuplicateId(String),
}

/// Result of running a request through the pipeline.
#[derive(Debug)]
pub struct PipelineOutcome {
    response: Response,
    faults: Vec<PipelineFault>,
    halted_by: Option<String>,
    handler_ran: bool,
}

impl PipelineOutcome {
    /// The final response.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Consumes the outcome, returning the response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }

    /// Faults caught during execution, in the order they happened.
    #[must_use]
    pub fn faults(&self) -> &[PipelineFault] {
        &self.faults
    }

    /// Id of the middleware whose pre-hook short-circuited, if any.
    #[must_use]
    pub fn halted_by(&self) -> Option<&str> {
        self.halted_by.as_deref()
    }

    /// Whether the handler was invoked.
    #[must_use]
    pub fn handler_ran(&self) -> bool {
        self.handler_ran
    }

    /// `true` when no fault was caught.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// The middleware pipeline.
///
/// Cannot be modified after construction.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_ids())
            .finish()
    }
}

enum Failure {
    Error(String),
    Panic(String),
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `handler` inside the pipeline.
    pub fn execute<H>(&self, request: &Request, handler: H) -> PipelineOutcome
    where
        H: FnOnce(&Request, &mut Response) -> HandlerResult,
    {
        let started = Instant::now();
        let mut response = Response::new();
        let mut faults = Vec::new();
        let mut halted_by = None;
        let mut handler_ran = false;

        // Pre-hooks that completed; exactly these post-hooks are unwound.
        let mut entered: Vec<&BoxedMiddleware> = Vec::with_capacity(self.stages.len());
        let mut descend = true;

        for middleware in &self.stages {
            match guarded(|| middleware.pre(request, &mut response)) {
                Ok(Flow::Continue) => entered.push(middleware),
                Ok(Flow::Halt) => {
                    tracing::debug!(
                        middleware = middleware.id(),
                        path = request.path(),
                        "pre-hook short-circuited"
                    );
                    halted_by = Some(middleware.id().to_string());
                    descend = false;
                    break;
                }
                Err(failure) => {
                    let fault = to_fault(Stage::Pre(middleware.id().to_string()), failure);
                    response = fault_response(request, &fault, started);
                    faults.push(fault);
                    descend = false;
                    break;
                }
            }
        }

        if descend {
            handler_ran = true;
            if let Err(failure) = guarded(|| handler(request, &mut response)) {
                let fault = to_fault(Stage::Handler, failure);
                response = fault_response(request, &fault, started);
                faults.push(fault);
            }
        }

        unwind(entered, request, &mut response, &mut faults, started);

        PipelineOutcome {
            response,
            faults,
            halted_by,
            handler_ran,
        }
    }

    /// Runs the post-hook of every middleware, innermost first, over
    /// `response`.
    ///
    /// The handler is not invoked and no pre-hook runs. Faults are caught
    /// the same way as in [`execute`](Self::execute).
    pub fn finish(&self, request: &Request, response: Response) -> PipelineOutcome {
        let started = Instant::now();
        let mut response = response;
        let mut faults = Vec::new();
        unwind(self.stages.iter().collect(), request, &mut response, &mut faults, started);

        PipelineOutcome {
            response,
            faults,
            halted_by: None,
            handler_ran: false,
        }
    }

    /// Returns the middleware ids in execution order.
    #[must_use]
    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|m| m.id()).collect()
    }

    /// Returns the number of middlewares.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

fn unwind(
    mut entered: Vec<&BoxedMiddleware>,
    request: &Request,
    response: &mut Response,
    faults: &mut Vec<PipelineFault>,
    started: Instant,
) {
    while let Some(middleware) = entered.pop() {
        if let Err(failure) = guarded(|| middleware.post(request, response)) {
            let fault = to_fault(Stage::Post(middleware.id().to_string()), failure);
            *response = fault_response(request, &fault, started);
            faults.push(fault);
        }
    }
}

fn guarded<T>(f: impl FnOnce() -> Result<T, HookError>) -> Result<T, Failure> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Failure::Error(err.to_string())),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn to_fault(stage: Stage, failure: Failure) -> PipelineFault {
    let (message, panicked) = match failure {
        Failure::Error(message) => (message, false),
        Failure::Panic(message) => (message, true),
    };
    PipelineFault {
        stage,
        message,
        panicked,
    }
}

fn fault_response(request: &Request, fault: &PipelineFault, started: Instant) -> Response {
    let envelope = Envelope::failure(
        request.path(),
        request.query(),
        FAULT_MESSAGE,
        fault.to_string(),
        started.elapsed(),
    );
    Response::json(StatusCode::BAD_REQUEST, &envelope).unwrap_or_else(|_| {
        let mut response = Response::new();
        response.set_status(StatusCode::BAD_REQUEST);
        response
    })
}

/// Builder for constructing a [`Pipeline`].
///
/// Middlewares run in the order they are added; the first added is the
/// outermost.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    #[must_use]
    pub fn stage<M: Middleware>(self, middleware: M) -> Self {
        self.boxed_stage(Arc::new(middleware))
    }

    /// Appends an already shared middleware.
    #[must_use]
    pub fn boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline, checking that ids are unique.
    pub fn build(self) -> Result<Pipeline, PipelineBuildError> {
        let mut seen = HashSet::new();
        for middleware in &self.stages {
            if !seen.insert(middleware.id().to_string()) {
                return Err(PipelineBuildError::DuplicateId(middleware.id().to_string()));
            }
        }
        Ok(Pipeline {
            stages: self.stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::HookMiddleware;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn recording(id: &'static str, trace: &Trace) -> HookMiddleware {
        let pre_trace = Arc::clone(trace);
        let post_trace = Arc::clone(trace);
        HookMiddleware::new(id)
            .pre(move |_req, _res| {
                pre_trace.lock().unwrap().push(format!("{id}.pre"));
                Ok(Flow::Continue)
            })
            .post(move |_req, _res| {
                post_trace.lock().unwrap().push(format!("{id}.post"));
                Ok(())
            })
    }

    fn ok_handler(trace: &Trace) -> impl FnOnce(&Request, &mut Response) -> HandlerResult {
        let trace = Arc::clone(trace);
        move |_req: &Request, res: &mut Response| {
            trace.lock().unwrap().push("handler".to_string());
            res.set_body("ok")?;
            Ok(())
        }
    }

    #[test]
    fn test_empty_pipeline_runs_handler() {
        let pipeline = Pipeline::builder().build().unwrap();
        let trace = Trace::default();

        let outcome = pipeline.execute(&Request::get("/"), ok_handler(&trace));

        assert!(outcome.is_clean());
        assert!(outcome.handler_ran());
        assert_eq!(outcome.response().body().as_ref(), b"ok");
    }

    #[test]
    fn test_lifo_order() {
        let trace = Trace::default();
        let pipeline = Pipeline::builder()
            .stage(recording("a", &trace))
            .stage(recording("b", &trace))
            .stage(recording("c", &trace))
            .build()
            .unwrap();

        pipeline.execute(&Request::get("/"), ok_handler(&trace));

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["a.pre", "b.pre", "c.pre", "handler", "c.post", "b.post", "a.post"]
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Pipeline::builder()
            .stage(HookMiddleware::new("gzip"))
            .stage(HookMiddleware::new("gzip"))
            .build();

        assert_eq!(
            result.unwrap_err(),
            PipelineBuildError::DuplicateId("gzip".to_string())
        );
    }

    #[test]
    fn test_handler_error_becomes_envelope() {
        let pipeline = Pipeline::builder().build().unwrap();
        let request = Request::get("/lodscan?dataset=ds1");

        let outcome = pipeline.execute(&request, |_req, _res| Err(HookError::new("boom")));

        assert_eq!(outcome.response().status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(outcome.response().body()).unwrap();
        assert_eq!(body["path"], "/lodscan");
        assert_eq!(body["parameters"]["dataset"], "ds1");
        assert_eq!(body["error"], FAULT_MESSAGE);
        assert_eq!(body["details"], "handler failed: boom");
        assert!(body.get("result").is_none());

        assert_eq!(
            outcome.faults(),
            &[PipelineFault {
                stage: Stage::Handler,
                message: "boom".to_string(),
                panicked: false,
            }]
        );
    }

    #[test]
    fn test_handler_panic_is_caught() {
        let pipeline = Pipeline::builder().build().unwrap();

        let outcome = pipeline.execute(&Request::get("/"), |_req, _res| panic!("index out of bounds"));

        assert_eq!(outcome.response().status(), StatusCode::BAD_REQUEST);
        let fault = &outcome.faults()[0];
        assert!(fault.panicked);
        assert_eq!(fault.message, "index out of bounds");
        assert_eq!(fault.to_string(), "handler panicked: index out of bounds");
    }

    #[test]
    fn test_failed_pre_hook_is_not_unwound() {
        let trace = Trace::default();
        let post_trace = Arc::clone(&trace);
        let pipeline = Pipeline::builder()
            .stage(recording("outer", &trace))
            .stage(
                HookMiddleware::new("broken")
                    .pre(|_req, _res| Err(HookError::new("bad header")))
                    .post(move |_req, _res| {
                        post_trace.lock().unwrap().push("broken.post".to_string());
                        Ok(())
                    }),
            )
            .build()
            .unwrap();

        let outcome = pipeline.execute(&Request::get("/"), ok_handler(&trace));

        assert!(!outcome.handler_ran());
        assert_eq!(outcome.faults()[0].stage, Stage::Pre("broken".to_string()));
        assert_eq!(*trace.lock().unwrap(), vec!["outer.pre", "outer.post"]);
    }

    #[test]
    fn test_finish_runs_every_post_hook() {
        let trace = Trace::default();
        let pipeline = Pipeline::builder()
            .stage(recording("a", &trace))
            .stage(recording("b", &trace))
            .build()
            .unwrap();
        let mut prepared = Response::new();
        prepared.set_status(StatusCode::BAD_REQUEST);

        let outcome = pipeline.finish(&Request::get("/lodscan"), prepared);

        assert!(outcome.is_clean());
        assert!(!outcome.handler_ran());
        assert_eq!(outcome.response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(*trace.lock().unwrap(), vec!["b.post", "a.post"]);
    }

    #[test]
    fn test_finish_catches_post_hook_fault() {
        let pipeline = Pipeline::builder()
            .stage(HookMiddleware::new("gzip").post(|_req, _res| Err(HookError::new("encoder"))))
            .build()
            .unwrap();

        let outcome = pipeline.finish(&Request::get("/lodscan"), Response::new());

        assert_eq!(outcome.response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(outcome.faults()[0].to_string(), "post-hook 'gzip' failed: encoder");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Pre("gzip".into()).to_string(), "pre-hook 'gzip'");
        assert_eq!(Stage::Post("gzip".into()).to_string(), "post-hook 'gzip'");
        assert_eq!(Stage::Handler.to_string(), "handler");
    }

    #[test]
    fn test_stage_ids() {
        let pipeline = Pipeline::builder()
            .stage(HookMiddleware::new("outer"))
            .stage(HookMiddleware::new("inner"))
            .build()
            .unwrap();
        assert_eq!(pipeline.stage_ids(), vec!["outer", "inner"]);
        assert_eq!(pipeline.stage_count(), 2);
    }
}
