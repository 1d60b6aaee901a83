//! # qtl2rest Server
//!
//! Request dispatch and the HTTP transport for qtl2rest.
//!
//! - [`Application`] - exact-match routes run inside the middleware pipeline
//! - [`Server`] - hyper HTTP/1.1 accept loop with per-request timeouts
//! - [`ShutdownSignal`] / [`ConnectionTracker`] - graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use qtl2rest_server::{Application, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Application::builder()
//!         .get("/ping", |_req, res| Ok(res.set_body("pong")?))?
//!         .build();
//!
//!     Server::builder(app).build().run("0.0.0.0:8001".parse()?).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/qtl2rest-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod server;
mod shutdown;

pub use app::{not_found, AppBuilder, Application, Handler};
pub use error::ServerError;
pub use server::{into_http, HttpResponse, Server, ServerBuilder, TIMEOUT_MESSAGE, WORKER_FAILURE_MESSAGE};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
