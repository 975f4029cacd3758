//! Mirage guard - interception middleware for protected applications.
//!
//! Wraps every inbound request, asks the classification service for a
//! verdict, and enforces it before the application's own handler runs:
//! pass through, stall (tarpit delay), serve a deceptive body, or redirect
//! to a honeypot. If the classifier is unreachable the request proceeds
//! unmodified - the protected application must never go dark because the
//! classifier did.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use mirage_guard::{Guard, GuardConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let guard = Guard::new(GuardConfig::from_env());
//!     let app: Router = Router::new()
//!         .route("/", get(|| async { "hello" }))
//!         .layer(axum::middleware::from_fn_with_state(
//!             guard,
//!             mirage_guard::intercept,
//!         ));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

mod classifier;
mod config;
mod middleware;
mod report;

pub use classifier::{ClassifierClient, ClassifyError};
pub use config::GuardConfig;
pub use middleware::{intercept, Guard};
pub use report::EventReporter;
