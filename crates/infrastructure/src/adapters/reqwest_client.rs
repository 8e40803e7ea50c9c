//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! It only sees fully resolved requests: every placeholder is already
//! substituted and the body is in its final wire form.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use courier_application::ports::{HttpClient, HttpClientError};
use courier_domain::{HttpMethod, ResolvedBody, ResolvedRequest, ResponseSpec};
use reqwest::{Client, Method, multipart::Form};
use url::Url;

use crate::settings::HttpSettings;

/// HTTP client implementation using reqwest.
pub struct ReqwestHttpClient {
    client: Client,
    timeout_ms: u64,
    max_redirects: usize,
}

impl ReqwestHttpClient {
    /// Creates a client configured from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(settings: &HttpSettings) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: settings.timeout_ms,
            max_redirects: settings.max_redirects,
        })
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Attaches the resolved body.
    ///
    /// Multipart parts are sent as text fields; reqwest writes the boundary
    /// into the `Content-Type` header itself.
    fn attach_body(builder: reqwest::RequestBuilder, body: &ResolvedBody) -> reqwest::RequestBuilder {
        match body {
            ResolvedBody::None => builder,
            ResolvedBody::Text(text) => builder.body(text.clone()),
            ResolvedBody::Multipart(parts) => {
                let form = parts
                    .iter()
                    .fold(Form::new(), |form, (key, value)| form.text(key.clone(), value.clone()));
                builder.multipart(form)
            }
        }
    }

    fn host_of(error: &reqwest::Error) -> String {
        error
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Maps reqwest errors to the port's `HttpClientError`.
    fn map_error(&self, error: &reqwest::Error) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: self.timeout_ms,
            };
        }

        if error.is_connect() {
            let message = error.to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError {
                    host: Self::host_of(error),
                    message,
                };
            }
            if lower.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: Self::host_of(error),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return HttpClientError::TooManyRedirects {
                max: self.max_redirects,
            };
        }

        if error.is_builder() || error.is_request() {
            return HttpClientError::InvalidRequest(error.to_string());
        }

        HttpClientError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &ResolvedRequest) -> Result<ResponseSpec, HttpClientError> {
        let url = Url::parse(&request.url)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", request.url)))?;

        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        builder = Self::attach_body(builder, &request.body);

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?;

        let duration = start.elapsed();
        tracing::debug!(status, elapsed_ms = duration.as_millis(), "response received");

        Ok(ResponseSpec::new(status, headers, &body, duration))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> ReqwestHttpClient {
        ReqwestHttpClient::new(&HttpSettings::default()).unwrap()
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Options),
            Method::OPTIONS
        );
    }

    #[test]
    fn test_text_body_is_attached() {
        let inner = Client::new();
        let builder = inner.post("https://example.com");
        let request = ReqwestHttpClient::attach_body(builder, &ResolvedBody::Text("a=1".into()))
            .build()
            .unwrap();
        assert_eq!(request.body().and_then(|b| b.as_bytes()), Some(&b"a=1"[..]));
    }

    #[test]
    fn test_multipart_sets_boundary_header() {
        let inner = Client::new();
        let builder = inner.post("https://example.com");
        let body = ResolvedBody::Multipart(vec![("name".into(), "courier".into())]);
        let request = ReqwestHttpClient::attach_body(builder, &body).build().unwrap();
        let content_type = request.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_sending() {
        let request = ResolvedRequest {
            url: "{{base}}/users".into(),
            ..ResolvedRequest::default()
        };
        let result = client().execute(&request).await;
        assert!(matches!(result, Err(HttpClientError::InvalidUrl(_))));
    }
}
