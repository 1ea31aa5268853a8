//! # corsgate
//!
//! **corsgate** is a framework-agnostic Cross-Origin Resource Sharing (CORS)
//! negotiation engine for HTTP services, built on the [`http`] crate's
//! request/response types.
//!
//! ## Overview
//!
//! The crate decides whether a request's origin, method, and headers are
//! permitted by a configured policy and annotates the outgoing response with
//! the matching `Access-Control-*` headers, including synthesizing complete
//! responses for browser preflight (`OPTIONS`) checks. It owns the decision
//! logic only: routing, body handling, and transport belong to the embedding
//! server or middleware stack.
//!
//! ## Architecture
//!
//! - **[`options`]** - loosely-typed configuration intake with dual-spelling
//!   keys, plus the fluent [`CorsOptions`] builder surface
//! - **[`policy`]** - the immutable [`CorsPolicy`] snapshot: origin/method/
//!   header matching and response header construction
//! - **[`engine`]** - the shared [`CorsService`]: lock-free snapshot reads,
//!   atomic reconfiguration
//! - **[`vary`]** - cache-correctness bookkeeping for the `Vary` header
//! - **[`error`]** - configuration-time error type; request evaluation never
//!   errors
//!
//! ## Example
//!
//! ```rust
//! use corsgate::{is_preflight_request, CorsOptions, CorsService};
//! use http::Request;
//!
//! let cors = CorsService::new(
//!     CorsOptions::new()
//!         .allowed_origins(&["https://*.example.com"])
//!         .allowed_methods(&["GET", "POST", "DELETE"])
//!         .allowed_headers(&["Content-Type", "Authorization"])
//!         .max_age(3600),
//! )
//! .expect("invalid CORS configuration");
//!
//! let preflight = Request::builder()
//!     .method("OPTIONS")
//!     .header("Origin", "https://app.example.com")
//!     .header("Access-Control-Request-Method", "DELETE")
//!     .body(())
//!     .unwrap();
//!
//! assert!(is_preflight_request(&preflight));
//! let response: http::Response<()> = cors.handle_preflight_request(&preflight);
//! assert_eq!(response.status(), 204);
//! assert_eq!(
//!     response.headers()["access-control-allow-methods"],
//!     "GET, POST, DELETE"
//! );
//! ```
//!
//! ## Concurrency
//!
//! Request evaluation is pure with respect to shared state: operations read
//! an immutable policy snapshot and mutate only the request-scoped response.
//! Reconfiguration builds a complete replacement snapshot and publishes it
//! atomically, so it is safe alongside in-flight evaluations.

pub mod engine;
pub mod error;
pub mod options;
pub mod policy;
pub mod vary;

mod origin;

pub use engine::CorsService;
pub use error::CorsConfigError;
pub use options::{CorsOptions, ExposedHeaders};
pub use policy::{is_cors_request, is_preflight_request, CorsPolicy};
pub use vary::vary_header;
