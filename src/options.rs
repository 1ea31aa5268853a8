use serde::de::{self, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::CorsConfigError;

/// Headers exposed to cross-origin JavaScript, as supplied at intake
///
/// The configuration surface accepts either a list of header names or the
/// boolean `false` meaning "expose nothing". The union collapses to a plain
/// (possibly empty) list the moment it crosses the intake boundary; the
/// policy itself only ever sees the list form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExposedHeaders {
    /// Expose nothing (`exposedHeaders: false` in the option bag)
    Disabled,
    /// Expose exactly these headers
    List(Vec<String>),
}

impl ExposedHeaders {
    pub(crate) fn into_list(self) -> Vec<String> {
        match self {
            ExposedHeaders::Disabled => Vec::new(),
            ExposedHeaders::List(headers) => headers,
        }
    }
}

/// A partial CORS option bag
///
/// Every field is optional. When the bag is applied to an existing policy
/// via [`CorsService::reconfigure`](crate::CorsService::reconfigure), unset
/// fields retain the value already in force, so callers can adjust a single
/// knob without restating the whole policy.
///
/// Options can be built fluently:
///
/// ```rust
/// use corsgate::CorsOptions;
///
/// let options = CorsOptions::new()
///     .allowed_origins(&["https://app.example.com", "https://*.preview.example.com"])
///     .allowed_methods(&["GET", "POST", "DELETE"])
///     .allowed_headers(&["Content-Type", "Authorization"])
///     .supports_credentials(true)
///     .max_age(3600);
/// ```
///
/// or parsed from a loosely-typed configuration value with
/// [`CorsOptions::from_value`]. The parsed form recognizes each option under
/// two spellings, camelCase first:
///
/// | primary                  | fallback                   |
/// |--------------------------|----------------------------|
/// | `allowedOrigins`         | `allowed_origins`          |
/// | `allowedOriginsPatterns` | `allowed_origins_patterns` |
/// | `allowedMethods`         | `allowed_methods`          |
/// | `allowedHeaders`         | `allowed_headers`          |
/// | `exposedHeaders`         | `exposed_headers`          |
/// | `supportsCredentials`    | `supports_credentials`     |
/// | `maxAge`                 | `max_age`                  |
///
/// When both spellings are present the camelCase key wins. Alias resolution
/// happens here and nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsOptions {
    pub(crate) allowed_origins: Option<Vec<String>>,
    pub(crate) allowed_origin_patterns: Option<Vec<String>>,
    pub(crate) allowed_methods: Option<Vec<String>>,
    pub(crate) allowed_headers: Option<Vec<String>>,
    pub(crate) exposed_headers: Option<ExposedHeaders>,
    pub(crate) supports_credentials: Option<bool>,
    /// Outer `None` retains the previous value; inner `None` suppresses the
    /// `Access-Control-Max-Age` header entirely. `Some(Some(0))` is valid
    /// and emits `0`.
    pub(crate) max_age: Option<Option<u64>>,
}

impl CorsOptions {
    /// Create an empty option bag (nothing set, everything retained)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set allowed origins
    ///
    /// Entries are matched exactly and case-sensitively against the
    /// request's `Origin` header. An entry containing `*` is treated as a
    /// wildcard: `https://*.example.com` matches any number of characters in
    /// place of the `*`. The single entry `"*"` allows every origin.
    pub fn allowed_origins(mut self, origins: &[&str]) -> Self {
        self.allowed_origins = Some(origins.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set explicit origin regex patterns
    ///
    /// Each entry is compiled as-is with [`regex::Regex::new`]; compilation
    /// failures surface as configuration errors at build time.
    pub fn allowed_origin_patterns(mut self, patterns: &[&str]) -> Self {
        self.allowed_origin_patterns = Some(patterns.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set allowed HTTP methods
    ///
    /// Normalized to uppercase. The entry `"*"` allows every method; the
    /// preflight response then echoes whatever method the browser asked
    /// about.
    pub fn allowed_methods(mut self, methods: &[&str]) -> Self {
        self.allowed_methods = Some(methods.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set allowed request headers
    ///
    /// Normalized to lowercase. The entry `"*"` allows every header; the
    /// preflight response then echoes whatever headers the browser asked
    /// about.
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.allowed_headers = Some(headers.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set headers exposed to cross-origin JavaScript
    pub fn exposed_headers(mut self, headers: &[&str]) -> Self {
        self.exposed_headers = Some(ExposedHeaders::List(
            headers.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Expose no headers to cross-origin JavaScript
    pub fn no_exposed_headers(mut self) -> Self {
        self.exposed_headers = Some(ExposedHeaders::Disabled);
        self
    }

    /// Enable or disable credentialed requests
    ///
    /// When enabled, responses carry `Access-Control-Allow-Credentials: true`
    /// and the literal wildcard origin is never emitted; the request's own
    /// origin is echoed instead.
    pub fn supports_credentials(mut self, allow: bool) -> Self {
        self.supports_credentials = Some(allow);
        self
    }

    /// Set the preflight cache duration in seconds
    ///
    /// `0` is meaningful: it tells browsers not to cache the preflight
    /// result and is emitted as `Access-Control-Max-Age: 0`.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(Some(seconds));
        self
    }

    /// Suppress the `Access-Control-Max-Age` header entirely
    pub fn no_max_age(mut self) -> Self {
        self.max_age = Some(None);
        self
    }

    /// Parse an option bag from a loosely-typed configuration value
    ///
    /// Accepts a JSON object; see the type-level table for the recognized
    /// keys and their alias spellings. Unrecognized keys are ignored. Type
    /// mismatches fail fast with a descriptive [`CorsConfigError`] rather
    /// than being coerced.
    ///
    /// ```rust
    /// use corsgate::CorsOptions;
    /// use serde_json::json;
    ///
    /// let options = CorsOptions::from_value(&json!({
    ///     "allowedOrigins": ["https://app.example.com"],
    ///     "allowed_methods": ["GET", "POST"],
    ///     "maxAge": null,
    /// }))
    /// .expect("invalid CORS options");
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, CorsConfigError> {
        let obj = value.as_object().ok_or(CorsConfigError::InvalidOption {
            key: "options",
            expected: "a JSON object",
        })?;

        let mut options = CorsOptions::default();

        if let Some(v) = aliased(obj, "allowedOrigins", "allowed_origins") {
            options.allowed_origins = Some(string_list(v, "allowedOrigins")?);
        }
        if let Some(v) = aliased(obj, "allowedOriginsPatterns", "allowed_origins_patterns") {
            options.allowed_origin_patterns = Some(string_list(v, "allowedOriginsPatterns")?);
        }
        if let Some(v) = aliased(obj, "allowedMethods", "allowed_methods") {
            options.allowed_methods = Some(string_list(v, "allowedMethods")?);
        }
        if let Some(v) = aliased(obj, "allowedHeaders", "allowed_headers") {
            options.allowed_headers = Some(string_list(v, "allowedHeaders")?);
        }
        if let Some(v) = aliased(obj, "exposedHeaders", "exposed_headers") {
            options.exposed_headers = Some(match v {
                Value::Bool(false) => ExposedHeaders::Disabled,
                Value::Bool(true) => {
                    return Err(CorsConfigError::InvalidOption {
                        key: "exposedHeaders",
                        expected: "an array of header names, or false to expose nothing",
                    })
                }
                other => ExposedHeaders::List(string_list(other, "exposedHeaders")?),
            });
        }
        if let Some(v) = aliased(obj, "supportsCredentials", "supports_credentials") {
            let allow = v.as_bool().ok_or(CorsConfigError::InvalidOption {
                key: "supportsCredentials",
                expected: "a boolean",
            })?;
            options.supports_credentials = Some(allow);
        }
        if let Some(v) = aliased(obj, "maxAge", "max_age") {
            options.max_age = Some(match v {
                Value::Null => None,
                other => Some(other.as_u64().ok_or(CorsConfigError::InvalidOption {
                    key: "maxAge",
                    expected: "a non-negative integer number of seconds, or null",
                })?),
            });
        }

        Ok(options)
    }
}

/// Deserialize through the same loose intake as [`CorsOptions::from_value`],
/// so an option bag can sit inside a larger application config struct.
impl<'de> Deserialize<'de> for CorsOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        CorsOptions::from_value(&value).map_err(de::Error::custom)
    }
}

fn aliased<'a>(obj: &'a Map<String, Value>, primary: &str, fallback: &str) -> Option<&'a Value> {
    obj.get(primary).or_else(|| obj.get(fallback))
}

fn string_list(value: &Value, key: &'static str) -> Result<Vec<String>, CorsConfigError> {
    let items = value.as_array().ok_or(CorsConfigError::InvalidOption {
        key,
        expected: "an array of strings",
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(CorsConfigError::InvalidOption {
                    key,
                    expected: "an array of strings",
                })
        })
        .collect()
}
