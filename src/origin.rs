use regex::Regex;

use crate::error::CorsConfigError;

/// Convert a `*`-wildcard origin into an anchored regex pattern string
///
/// Every character except `*` is escaped literally; each `*` matches zero
/// or more characters. The pattern is anchored at both ends and matching is
/// case-sensitive, so `https://*.example.com` becomes
/// `^https://.*\.example\.com$`.
pub(crate) fn wildcard_pattern(origin: &str) -> String {
    format!("^{}$", regex::escape(origin).replace("\\*", ".*"))
}

/// Compile an origin pattern, failing fast on invalid regex syntax
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, CorsConfigError> {
    Regex::new(pattern).map_err(|err| CorsConfigError::InvalidOriginPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}
