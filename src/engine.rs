use std::sync::Arc;

use arc_swap::ArcSwap;
use http::{Request, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::CorsConfigError;
use crate::options::CorsOptions;
use crate::policy::CorsPolicy;

/// A shared, reconfigurable CORS engine
///
/// Holds the current [`CorsPolicy`] snapshot behind an [`ArcSwap`], so
/// concurrent request evaluation reads a consistent snapshot lock-free
/// while [`reconfigure`](Self::reconfigure) publishes a fully-built
/// replacement with a single atomic store. No reader ever observes a
/// half-updated policy (new origins with stale allow-all flags and the
/// like); it sees either the old snapshot or the new one.
///
/// Concurrent reconfigurations are last-write-wins over whole snapshots.
///
/// # Example
///
/// ```rust
/// use corsgate::{CorsOptions, CorsService};
/// use http::{Request, Response};
///
/// let cors = CorsService::new(
///     CorsOptions::new()
///         .allowed_origins(&["https://app.example.com"])
///         .allowed_methods(&["GET", "POST"]),
/// )
/// .expect("invalid CORS configuration");
///
/// let request = Request::builder()
///     .header("Origin", "https://app.example.com")
///     .body(())
///     .unwrap();
/// let mut response = Response::new(());
/// cors.add_actual_request_headers(&mut response, &request);
/// assert_eq!(
///     response.headers()["access-control-allow-origin"],
///     "https://app.example.com"
/// );
/// ```
#[derive(Debug)]
pub struct CorsService {
    policy: ArcSwap<CorsPolicy>,
}

impl CorsService {
    /// Build a service from an option bag
    ///
    /// # Errors
    ///
    /// Fails fast on invalid configuration; see [`CorsConfigError`].
    pub fn new(options: CorsOptions) -> Result<Self, CorsConfigError> {
        let policy = CorsPolicy::build(None, &options)?;
        Ok(Self {
            policy: ArcSwap::from_pointee(policy),
        })
    }

    /// Build a service from a loosely-typed configuration value
    ///
    /// Convenience over [`CorsOptions::from_value`] + [`CorsService::new`].
    pub fn from_value(value: &Value) -> Result<Self, CorsConfigError> {
        Self::new(CorsOptions::from_value(value)?)
    }

    /// Apply a partial option bag on top of the current policy
    ///
    /// Options the bag does not set retain their current values. The
    /// replacement snapshot is built completely before being published; on
    /// error the current policy stays in force untouched.
    pub fn reconfigure(&self, options: &CorsOptions) -> Result<(), CorsConfigError> {
        let current = self.policy.load();
        let next = CorsPolicy::build(Some(current.as_ref()), options)?;
        self.policy.store(Arc::new(next));
        debug!("cors: policy reconfigured");
        Ok(())
    }

    /// Apply a partial reconfiguration from a loosely-typed value
    pub fn reconfigure_from_value(&self, value: &Value) -> Result<(), CorsConfigError> {
        self.reconfigure(&CorsOptions::from_value(value)?)
    }

    /// Grab the current policy snapshot
    ///
    /// Use this when evaluating one request in multiple steps (classify,
    /// then annotate) so every step sees the same policy even if a
    /// reconfigure lands in between.
    pub fn policy(&self) -> Arc<CorsPolicy> {
        self.policy.load_full()
    }

    /// Check the request's `Origin` against the current policy
    pub fn is_origin_allowed<B>(&self, req: &Request<B>) -> bool {
        self.policy.load().is_origin_allowed(req)
    }

    /// Synthesize a complete preflight response under the current policy
    pub fn handle_preflight_request<B, T: Default>(&self, req: &Request<B>) -> Response<T> {
        self.policy.load().handle_preflight_request(req)
    }

    /// Annotate a preflight response under the current policy
    pub fn add_preflight_request_headers<B, T>(&self, res: &mut Response<T>, req: &Request<B>) {
        self.policy.load().add_preflight_request_headers(res, req);
    }

    /// Annotate an actual-request response under the current policy
    pub fn add_actual_request_headers<B, T>(&self, res: &mut Response<T>, req: &Request<B>) {
        self.policy.load().add_actual_request_headers(res, req);
    }
}

/// Deny-all default, matching [`CorsPolicy::default`]
impl Default for CorsService {
    fn default() -> Self {
        Self {
            policy: ArcSwap::from_pointee(CorsPolicy::default()),
        }
    }
}
