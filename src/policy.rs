use std::collections::HashSet;

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use regex::Regex;
use tracing::debug;

use crate::error::CorsConfigError;
use crate::options::CorsOptions;
use crate::origin::{compile_pattern, wildcard_pattern};
use crate::vary::vary_header;

/// True when the request carries an `Origin` header
///
/// Presence of the header key is what counts; an empty value still
/// classifies the request as cross-origin.
pub fn is_cors_request<B>(req: &Request<B>) -> bool {
    req.headers().contains_key(ORIGIN)
}

/// True when the request is a browser preflight check
///
/// A preflight is an `OPTIONS` request carrying
/// `Access-Control-Request-Method`. The method comparison is exact; an
/// extension method spelled `options` does not qualify.
pub fn is_preflight_request<B>(req: &Request<B>) -> bool {
    req.method() == Method::OPTIONS
        && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// An immutable, normalized CORS policy snapshot
///
/// Built once from a [`CorsOptions`] bag (optionally layered over a previous
/// snapshot) and then read-only for its lifetime, so it can be shared across
/// concurrent request evaluations without locking. Reconfiguration never
/// mutates a live snapshot; it builds a replacement. See
/// [`CorsService`](crate::CorsService) for the shared, swappable form.
///
/// Normalization at build time:
/// - methods are uppercased, request header names lowercased;
/// - the allow-all flags are recomputed from exact `*` membership in the
///   corresponding list;
/// - explicit origin patterns are compiled, then any `*`-wildcard origin is
///   compiled and appended (skipped entirely when all origins are allowed),
///   deduplicated by pattern source so rebuilding from the same inputs
///   yields an identical pattern list;
/// - configured origins, methods, and header names are checked to be legal
///   HTTP header content.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    /// Explicit pattern sources as supplied, kept so a partial reconfigure
    /// that omits them can carry them into the next snapshot.
    pattern_sources: Vec<String>,
    allowed_origin_patterns: Vec<Regex>,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
    exposed_headers: Vec<String>,
    supports_credentials: bool,
    max_age: Option<u64>,
    allow_all_origins: bool,
    allow_all_methods: bool,
    allow_all_headers: bool,
}

/// Deny-all default
///
/// Nothing is allowed until the policy is configured, so an unconfigured
/// engine never annotates a response.
impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            pattern_sources: Vec::new(),
            allowed_origin_patterns: Vec::new(),
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            exposed_headers: Vec::new(),
            supports_credentials: false,
            max_age: None,
            allow_all_origins: false,
            allow_all_methods: false,
            allow_all_headers: false,
        }
    }
}

impl CorsPolicy {
    /// Build a snapshot from an option bag, layered over a previous snapshot
    ///
    /// Options the bag does not set are carried over from `previous`, or
    /// from the deny-all default when there is none. Building is idempotent:
    /// applying the same bag twice yields identical derived state, including
    /// the compiled pattern list.
    ///
    /// # Errors
    ///
    /// Fails fast on invalid regex pattern strings and on configured values
    /// that cannot form HTTP header content. The previous snapshot is not
    /// affected by a failed build.
    pub fn build(
        previous: Option<&CorsPolicy>,
        options: &CorsOptions,
    ) -> Result<CorsPolicy, CorsConfigError> {
        let default = CorsPolicy::default();
        let prev = previous.unwrap_or(&default);

        let allowed_origins = options
            .allowed_origins
            .clone()
            .unwrap_or_else(|| prev.allowed_origins.clone());
        let pattern_sources = options
            .allowed_origin_patterns
            .clone()
            .unwrap_or_else(|| prev.pattern_sources.clone());
        let allowed_methods: Vec<String> = options
            .allowed_methods
            .clone()
            .unwrap_or_else(|| prev.allowed_methods.clone())
            .iter()
            .map(|m| m.to_ascii_uppercase())
            .collect();
        let allowed_headers: Vec<String> = options
            .allowed_headers
            .clone()
            .unwrap_or_else(|| prev.allowed_headers.clone())
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();
        let exposed_headers = match &options.exposed_headers {
            Some(exposed) => exposed.clone().into_list(),
            None => prev.exposed_headers.clone(),
        };
        let supports_credentials = options
            .supports_credentials
            .unwrap_or(prev.supports_credentials);
        let max_age = match options.max_age {
            Some(value) => value,
            None => prev.max_age,
        };

        ensure_header_safe("allowedOrigins", &allowed_origins)?;
        ensure_header_safe("allowedMethods", &allowed_methods)?;
        ensure_header_safe("allowedHeaders", &allowed_headers)?;
        ensure_header_safe("exposedHeaders", &exposed_headers)?;

        let allow_all_origins = allowed_origins.iter().any(|o| o == "*");
        let allow_all_methods = allowed_methods.iter().any(|m| m == "*");
        let allow_all_headers = allowed_headers.iter().any(|h| h == "*");

        // Explicit patterns first, wildcard-derived after, deduplicated by
        // source string so repeated builds cannot grow the list.
        let mut seen: HashSet<String> = HashSet::new();
        let mut allowed_origin_patterns = Vec::new();
        for source in &pattern_sources {
            if seen.insert(source.clone()) {
                allowed_origin_patterns.push(compile_pattern(source)?);
            }
        }
        if !allow_all_origins {
            for origin in &allowed_origins {
                if origin.contains('*') {
                    let source = wildcard_pattern(origin);
                    if seen.insert(source.clone()) {
                        allowed_origin_patterns.push(compile_pattern(&source)?);
                    }
                }
            }
        }

        Ok(CorsPolicy {
            allowed_origins,
            pattern_sources,
            allowed_origin_patterns,
            allowed_methods,
            allowed_headers,
            exposed_headers,
            supports_credentials,
            max_age,
            allow_all_origins,
            allow_all_methods,
            allow_all_headers,
        })
    }

    /// Check the request's `Origin` against the policy
    ///
    /// Returns true immediately when all origins are allowed. Otherwise the
    /// `Origin` value is matched exactly (case-sensitive) against the
    /// configured origins, then against each compiled pattern in order. An
    /// absent, empty, or non-UTF8 `Origin` never matches.
    pub fn is_origin_allowed<B>(&self, req: &Request<B>) -> bool {
        if self.allow_all_origins {
            return true;
        }
        let origin = match req.headers().get(ORIGIN).and_then(|v| v.to_str().ok()) {
            Some(o) if !o.is_empty() => o,
            _ => return false,
        };
        if self.allowed_origins.iter().any(|allowed| allowed == origin) {
            return true;
        }
        self.allowed_origin_patterns
            .iter()
            .any(|pattern| pattern.is_match(origin))
    }

    /// Synthesize a complete preflight response
    ///
    /// Status 204 with an empty (`Default`) body, annotated via
    /// [`add_preflight_request_headers`](Self::add_preflight_request_headers).
    /// A preflight whose origin the policy rejects still gets its 204; it
    /// just carries no `Access-Control-*` headers, which is how CORS
    /// signals denial.
    pub fn handle_preflight_request<B, T: Default>(&self, req: &Request<B>) -> Response<T> {
        let mut response = Response::new(T::default());
        *response.status_mut() = StatusCode::NO_CONTENT;
        self.add_preflight_request_headers(&mut response, req);
        response
    }

    /// Annotate a preflight response
    ///
    /// Applies the origin decision first. When no
    /// `Access-Control-Allow-Origin` header results the remaining headers
    /// are withheld, so a rejected origin learns nothing about the
    /// configured methods, headers, credentials mode, or cache lifetime.
    pub fn add_preflight_request_headers<B, T>(&self, res: &mut Response<T>, req: &Request<B>) {
        if !is_cors_request(req) {
            return;
        }
        self.configure_allow_origin(res, req);
        if !res.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
            debug!("cors: preflight origin rejected, withholding policy headers");
            return;
        }
        self.configure_allowed_methods(res, req);
        self.configure_allowed_headers(res, req);
        self.configure_credentials(res);
        self.configure_max_age(res);
    }

    /// Annotate an actual (non-preflight) response
    ///
    /// Applies the origin decision, then credentials and exposed headers.
    /// As with preflight, a rejected origin short-circuits after the `Vary`
    /// bookkeeping.
    pub fn add_actual_request_headers<B, T>(&self, res: &mut Response<T>, req: &Request<B>) {
        if !is_cors_request(req) {
            return;
        }
        self.configure_allow_origin(res, req);
        if !res.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
            debug!("cors: origin rejected, response left unannotated");
            return;
        }
        self.configure_credentials(res);
        self.configure_exposed_headers(res);
    }

    /// Origin decision, first match wins:
    ///
    /// 1. all origins allowed and credentials unsupported: literal `*`
    ///    (browsers reject `*` on credentialed responses, so that case
    ///    falls through to echoing);
    /// 2. exactly one configured origin and no patterns: that literal
    ///    origin, statically cacheable, no `Vary` needed;
    /// 3. the request's origin is allowed: echo it back and vary on
    ///    `Origin`;
    /// 4. otherwise: vary on `Origin` only, which leaves the allow-origin
    ///    header absent and lets the callers above short-circuit.
    fn configure_allow_origin<B, T>(&self, res: &mut Response<T>, req: &Request<B>) {
        if self.allow_all_origins && !self.supports_credentials {
            res.headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        } else if self.is_single_origin() {
            // Validated at build time; a failed conversion here would mean
            // the snapshot was corrupted, so stay silent rather than panic.
            if let Ok(value) = HeaderValue::from_str(&self.allowed_origins[0]) {
                res.headers_mut().insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
            }
        } else {
            if self.is_origin_allowed(req) {
                if let Some(origin) = req.headers().get(ORIGIN) {
                    res.headers_mut()
                        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
                }
            }
            vary_header(res.headers_mut(), "Origin");
        }
    }

    fn is_single_origin(&self) -> bool {
        !self.allow_all_origins
            && self.allowed_origin_patterns.is_empty()
            && self.allowed_origins.len() == 1
    }

    /// When every method is allowed the response echoes exactly what the
    /// browser asked about and varies on it, because the answer depends on
    /// the question. Otherwise the configured list is emitted verbatim.
    fn configure_allowed_methods<B, T>(&self, res: &mut Response<T>, req: &Request<B>) {
        if self.allow_all_methods {
            let requested = req
                .headers()
                .get(ACCESS_CONTROL_REQUEST_METHOD)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(""));
            res.headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_METHODS, requested);
            vary_header(res.headers_mut(), "Access-Control-Request-Method");
        } else if let Ok(value) = HeaderValue::from_str(&self.allowed_methods.join(", ")) {
            res.headers_mut().insert(ACCESS_CONTROL_ALLOW_METHODS, value);
        }
    }

    fn configure_allowed_headers<B, T>(&self, res: &mut Response<T>, req: &Request<B>) {
        if self.allow_all_headers {
            let requested = req
                .headers()
                .get(ACCESS_CONTROL_REQUEST_HEADERS)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(""));
            res.headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_HEADERS, requested);
            vary_header(res.headers_mut(), "Access-Control-Request-Headers");
        } else if let Ok(value) = HeaderValue::from_str(&self.allowed_headers.join(", ")) {
            res.headers_mut().insert(ACCESS_CONTROL_ALLOW_HEADERS, value);
        }
    }

    fn configure_credentials<T>(&self, res: &mut Response<T>) {
        if self.supports_credentials {
            res.headers_mut().insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }

    fn configure_exposed_headers<T>(&self, res: &mut Response<T>) {
        if self.exposed_headers.is_empty() {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(&self.exposed_headers.join(", ")) {
            res.headers_mut()
                .insert(ACCESS_CONTROL_EXPOSE_HEADERS, value);
        }
    }

    fn configure_max_age<T>(&self, res: &mut Response<T>) {
        if let Some(age) = self.max_age {
            res.headers_mut()
                .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(age));
        }
    }

    /// Configured origins, in insertion order
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    /// Compiled origin pattern sources, in matching order
    pub fn origin_patterns(&self) -> Vec<&str> {
        self.allowed_origin_patterns
            .iter()
            .map(|p| p.as_str())
            .collect()
    }

    /// Configured methods, uppercased, in insertion order
    pub fn allowed_methods(&self) -> &[String] {
        &self.allowed_methods
    }

    /// Configured request headers, lowercased, in insertion order
    pub fn allowed_headers(&self) -> &[String] {
        &self.allowed_headers
    }

    /// Headers exposed to cross-origin JavaScript
    pub fn exposed_headers(&self) -> &[String] {
        &self.exposed_headers
    }

    /// Whether credentialed requests are supported
    pub fn supports_credentials(&self) -> bool {
        self.supports_credentials
    }

    /// Preflight cache lifetime; `None` suppresses the header
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Whether the literal `*` is among the configured origins
    pub fn allow_all_origins(&self) -> bool {
        self.allow_all_origins
    }

    /// Whether the literal `*` is among the configured methods
    pub fn allow_all_methods(&self) -> bool {
        self.allow_all_methods
    }

    /// Whether the literal `*` is among the configured headers
    pub fn allow_all_headers(&self) -> bool {
        self.allow_all_headers
    }
}

fn ensure_header_safe(key: &'static str, values: &[String]) -> Result<(), CorsConfigError> {
    for value in values {
        if HeaderValue::from_str(value).is_err() {
            return Err(CorsConfigError::InvalidHeaderValue {
                key,
                value: value.clone(),
            });
        }
    }
    Ok(())
}
