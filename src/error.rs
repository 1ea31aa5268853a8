use std::fmt;

/// CORS configuration error
///
/// Returned by [`CorsOptions::from_value`](crate::CorsOptions::from_value),
/// [`CorsPolicy::build`](crate::CorsPolicy::build), and
/// [`CorsService::reconfigure`](crate::CorsService::reconfigure) when the
/// supplied configuration is invalid.
///
/// Request evaluation never produces errors. A request that the policy does
/// not permit simply receives no `Access-Control-*` headers and the browser
/// enforces the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// An option was supplied with an unexpected type or value
    ///
    /// The option bag is loosely typed; each recognized key still has to
    /// carry a value of the right shape (e.g. an array of strings for
    /// `allowedOrigins`, a boolean for `supportsCredentials`).
    InvalidOption {
        /// The canonical (camelCase) name of the offending option
        key: &'static str,
        /// What the option accepts
        expected: &'static str,
    },
    /// An origin pattern failed to compile as a regular expression
    InvalidOriginPattern {
        /// The pattern string as supplied
        pattern: String,
        /// The compiler's explanation
        reason: String,
    },
    /// A configured value cannot be carried in an HTTP header
    ///
    /// Configured origins, methods, and header names end up verbatim in
    /// `Access-Control-*` response headers, so values that are not legal
    /// header content are rejected up front.
    InvalidHeaderValue {
        /// The canonical (camelCase) name of the offending option
        key: &'static str,
        /// The rejected value
        value: String,
    },
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::InvalidOption { key, expected } => {
                write!(
                    f,
                    "CORS configuration error: option '{}' expects {}",
                    key, expected
                )
            }
            CorsConfigError::InvalidOriginPattern { pattern, reason } => {
                write!(
                    f,
                    "CORS configuration error: origin pattern '{}' is not a valid regular expression: {}",
                    pattern, reason
                )
            }
            CorsConfigError::InvalidHeaderValue { key, value } => {
                write!(
                    f,
                    "CORS configuration error: option '{}' contains '{}', which is not a valid HTTP header value",
                    key, value
                )
            }
        }
    }
}

impl std::error::Error for CorsConfigError {}
