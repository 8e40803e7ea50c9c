//! Response specification type
//!
//! A captured HTTP response as seen by post-request scripts: status,
//! headers with case-insensitive lookup, body text, timing and size.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP status code with a reason phrase helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for 2xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(self) -> &'static str {
        match self.0 {
            0 => "",
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// HTTP response specification.
///
/// A transport-level failure is represented as a response with status `0`
/// (see [`ResponseSpec::transport_error`]); any non-zero status, including
/// 4xx and 5xx, is a real response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSpec {
    /// HTTP status code, `0` for transport failures.
    pub status: u16,
    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,
    /// Response headers in received order. Names may repeat.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Response body as text.
    #[serde(default)]
    pub body: String,
    /// Elapsed time for the call.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Body size in bytes.
    pub size: usize,
}

impl ResponseSpec {
    /// Creates a response from raw transport data.
    ///
    /// Non UTF-8 bodies are decoded lossily.
    #[must_use]
    pub fn new(
        status: impl Into<StatusCode>,
        headers: Vec<(String, String)>,
        body: &[u8],
        duration: Duration,
    ) -> Self {
        let status = status.into();
        Self {
            status: status.as_u16(),
            status_text: status.reason_phrase().to_string(),
            headers,
            body: String::from_utf8_lossy(body).into_owned(),
            duration,
            size: body.len(),
        }
    }

    /// Creates the synthetic zero-status response used when the transport
    /// call itself failed.
    #[must_use]
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            status_text: "Network Error".to_string(),
            headers: Vec::new(),
            body: message.into(),
            duration: Duration::ZERO,
            size: 0,
        }
    }

    /// Returns true if this is a synthetic transport failure.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        self.status == 0
    }

    /// Returns the status as a `StatusCode`.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::new(self.status)
    }

    /// Gets the first header value by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if a header is present (case-insensitive).
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Attempts to parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the body is not valid JSON.
    pub fn body_as_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Returns the elapsed time in whole milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// Returns a human-readable duration string (e.g., "124 ms").
    #[must_use]
    pub fn duration_display(&self) -> String {
        let millis = self.duration.as_millis();
        if millis < 1000 {
            format!("{millis} ms")
        } else {
            format!("{:.2} s", self.duration.as_secs_f64())
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
