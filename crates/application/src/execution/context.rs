//! The context object scripts run against.
//!
//! A context bundles the shared scope store with phase-specific data: the
//! request being sent (with the live outgoing header set), the response in
//! the post-request phase, the console sink and the transport used by
//! nested sends.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use courier_domain::{
    AncestorChain, ApiRequest, Header, HttpMethod, LogEntry, ResponseSpec, ScriptKind,
};
use parking_lot::Mutex;

use super::error::ExecutionError;
use super::resolve::resolve_request_with;
use crate::ports::{HttpClient, LogSink};
use crate::scope::ScopeStore;

#[derive(Debug, Default)]
struct HeaderSet {
    initial: Vec<(String, String)>,
    added: Vec<(String, String)>,
}

/// Live outgoing header set of the request being sent.
///
/// Declared headers are kept raw; headers added by pre-request scripts are
/// tracked separately so resolution can merge them on top.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    inner: Arc<Mutex<HeaderSet>>,
}

impl RequestHeaders {
    /// Creates a header set seeded with declared headers.
    #[must_use]
    pub fn new(initial: Vec<(String, String)>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HeaderSet {
                initial,
                added: Vec::new(),
            })),
        }
    }

    fn add(&self, key: String, value: String) {
        self.inner.lock().added.push((key, value));
    }

    /// Returns the value of a header, case-insensitively. Script-added
    /// headers win, the latest first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let set = self.inner.lock();
        set.added
            .iter()
            .rev()
            .chain(set.initial.iter().rev())
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    /// Returns true if a header with the name exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns all headers, script-added ones overriding declared ones.
    #[must_use]
    pub fn to_object(&self) -> BTreeMap<String, String> {
        let set = self.inner.lock();
        let mut object: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in set.initial.iter().chain(set.added.iter()) {
            object.retain(|existing, _| !existing.eq_ignore_ascii_case(key));
            object.insert(key.clone(), value.clone());
        }
        object
    }

    /// Returns the headers added by scripts, in insertion order.
    #[must_use]
    pub fn added(&self) -> Vec<(String, String)> {
        self.inner.lock().added.clone()
    }
}

/// Identity of the item being executed, as seen through `pm.info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// Id of the target item.
    pub request_id: String,
    /// Name of the target item.
    pub request_name: String,
    /// Ancestor names joined by `/`.
    pub path: String,
}

/// The request being sent, as seen through `pm.request`.
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    /// HTTP method
    pub method: HttpMethod,
    /// URL template, unresolved
    pub url: String,
    /// Live outgoing header set
    pub headers: RequestHeaders,
}

/// Everything a script can reach.
#[derive(Clone)]
pub struct ExecutionContext {
    variables: ScopeStore,
    info: RequestInfo,
    request: RequestView,
    response: Option<Arc<ResponseSpec>>,
    phase: ScriptKind,
    log: Arc<dyn LogSink>,
    transport: Arc<dyn HttpClient>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("variables", &self.variables)
            .field("info", &self.info)
            .field("request", &self.request)
            .field("phase", &self.phase)
            .field("has_response", &self.response.is_some())
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Creates a pre-request context for the item at the end of `chain`.
    #[must_use]
    pub fn new(
        variables: ScopeStore,
        chain: &AncestorChain,
        initial_headers: &[Header],
        log: Arc<dyn LogSink>,
        transport: Arc<dyn HttpClient>,
    ) -> Self {
        let info = RequestInfo {
            request_id: chain.target().map(|t| t.id().to_string()).unwrap_or_default(),
            request_name: chain.target().map(|t| t.name().to_string()).unwrap_or_default(),
            path: chain.path(),
        };
        let headers = initial_headers
            .iter()
            .filter(|h| h.enabled)
            .map(|h| (h.key.clone(), h.value.clone()))
            .collect();
        let request = RequestView {
            method: chain.request().map(|r| r.method).unwrap_or_default(),
            url: chain.request().map(|r| r.url.clone()).unwrap_or_default(),
            headers: RequestHeaders::new(headers),
        };
        Self {
            variables,
            info,
            request,
            response: None,
            phase: ScriptKind::PreRequest,
            log,
            transport,
        }
    }

    /// Switches the context to the post-request phase with `response`.
    pub fn attach_response(&mut self, response: ResponseSpec) {
        self.response = Some(Arc::new(response));
        self.phase = ScriptKind::PostRequest;
    }

    /// Returns the scope store.
    #[must_use]
    pub const fn variables(&self) -> &ScopeStore {
        &self.variables
    }

    /// Returns the item identity.
    #[must_use]
    pub const fn info(&self) -> &RequestInfo {
        &self.info
    }

    /// Returns the request view.
    #[must_use]
    pub const fn request(&self) -> &RequestView {
        &self.request
    }

    /// Returns the response. Only set in the post-request phase.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseSpec> {
        self.response.as_deref()
    }

    /// Returns a shared handle to the response, for bindings that outlive
    /// the borrow.
    #[must_use]
    pub fn shared_response(&self) -> Option<Arc<ResponseSpec>> {
        self.response.clone()
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> ScriptKind {
        self.phase
    }

    /// Sends an entry to the console sink.
    pub fn log(&self, entry: LogEntry) {
        self.log.log(entry);
    }

    /// Returns the console sink.
    #[must_use]
    pub fn log_sink(&self) -> Arc<dyn LogSink> {
        Arc::clone(&self.log)
    }

    /// Appends a header to the outgoing request.
    ///
    /// Only effective during the pre-request phase; afterwards the request
    /// is already sent, so the call is ignored with a warning. Returns true
    /// if the header was added.
    pub fn add_header(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.phase == ScriptKind::PostRequest {
            self.log(LogEntry::warn(format!(
                "pm.request.headers.add is ignored in post-request scripts (header '{key}')"
            )));
            return false;
        }
        self.request.headers.add(key, value.into());
        true
    }

    /// Resolves and sends a request on behalf of a script.
    ///
    /// The request is resolved with the current unified variables. No
    /// scripts run for it.
    ///
    /// # Errors
    ///
    /// Returns a resolution error or the transport failure.
    pub async fn send_request(&self, request: &ApiRequest) -> Result<ResponseSpec, ExecutionError> {
        let variables = self.variables.unified().to_object();
        let resolved = resolve_request_with(request, &variables, &[], self.log.as_ref())?;
        tracing::debug!(url = %resolved.url, "nested sendRequest");
        Ok(self.transport.execute(&resolved).await?)
    }
}
