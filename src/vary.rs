use http::header::VARY;
use http::{HeaderMap, HeaderValue};

/// Merge a token into the response's `Vary` header
///
/// Caches key responses by the request headers listed in `Vary`; a response
/// whose CORS headers depend on the request's `Origin` (or on the preflight
/// `Access-Control-Request-*` headers) must list them or a cache will serve
/// one origin's response to another.
///
/// If the response has no `Vary` header the token becomes its value.
/// Otherwise the existing value is split on commas, each token trimmed, and
/// the new token appended (rejoined with `", "`) only when not already
/// present. Comparison is case-sensitive and exact; existing token order is
/// preserved; repeat calls are no-ops.
pub fn vary_header(headers: &mut HeaderMap, token: &str) {
    let current = match headers.get(VARY) {
        None => {
            if let Ok(value) = HeaderValue::from_str(token) {
                headers.insert(VARY, value);
            }
            return;
        }
        Some(value) => value,
    };

    let current = match current.to_str() {
        Ok(s) => s,
        // Opaque bytes set upstream; leave the header alone rather than
        // clobber something we cannot parse.
        Err(_) => return,
    };

    let mut tokens: Vec<&str> = current
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.iter().any(|t| *t == token) {
        return;
    }
    tokens.push(token);

    if let Ok(value) = HeaderValue::from_str(&tokens.join(", ")) {
        headers.insert(VARY, value);
    }
}
