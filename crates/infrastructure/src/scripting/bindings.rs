//! The `pm` and `console` objects.
//!
//! Every binding is a thin handle over the execution context, so writes made
//! by one script are visible to the next one and to request resolution.

use std::collections::VecDeque;
use std::sync::Arc;

use courier_application::ports::LogSink;
use courier_application::{ExecutionContext, VariableAccessor};
use courier_domain::{
    ApiRequest, Header, HttpMethod, KeyValue, LogEntry, LogLevel, RequestBody, ResponseSpec,
    ScopeKind, ScriptKind,
};
use parking_lot::Mutex;
use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr, Map};

use super::convert::{optional_string, runtime_error, stringify, to_int, to_script_map};

/// Name given to requests built by `pm.sendRequest`.
const NESTED_REQUEST_NAME: &str = "pm.sendRequest";

/// A `pm.sendRequest` call waiting for delivery.
pub struct PendingSend {
    /// The request to resolve and send.
    pub request: ApiRequest,
    /// Receives `(err, res)`.
    pub callback: Option<FnPtr>,
}

struct OutboxState {
    pending: VecDeque<PendingSend>,
    issued: usize,
    limit: usize,
}

/// Queue of nested sends issued during one script run.
#[derive(Clone)]
pub struct Outbox {
    inner: Arc<Mutex<OutboxState>>,
}

impl Outbox {
    /// Creates a queue that accepts at most `limit` sends.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(OutboxState {
                pending: VecDeque::new(),
                issued: 0,
                limit,
            })),
        }
    }

    fn push(&self, send: PendingSend) -> Result<(), Box<EvalAltResult>> {
        let mut state = self.inner.lock();
        if state.issued >= state.limit {
            return Err(runtime_error(format!(
                "pm.sendRequest limit of {} requests per script reached",
                state.limit
            )));
        }
        state.issued += 1;
        state.pending.push_back(send);
        Ok(())
    }

    /// Takes the oldest pending send.
    #[must_use]
    pub fn take(&self) -> Option<PendingSend> {
        self.inner.lock().pending.pop_front()
    }
}

/// The `pm` object.
#[derive(Clone)]
pub struct ScriptPm {
    context: ExecutionContext,
    outbox: Outbox,
}

impl ScriptPm {
    /// Binds `pm` to a context.
    #[must_use]
    pub const fn new(context: ExecutionContext, outbox: Outbox) -> Self {
        Self { context, outbox }
    }

    fn queue(&self, request_like: &Dynamic, callback: Option<FnPtr>) -> Result<(), Box<EvalAltResult>> {
        let request = parse_request_like(request_like)?;
        self.outbox.push(PendingSend { request, callback })
    }
}

#[derive(Clone)]
struct ScriptVariables(VariableAccessor);

#[derive(Clone)]
struct ScriptInfo {
    request_id: String,
    request_name: String,
    path: String,
    event: &'static str,
}

#[derive(Clone)]
struct ScriptRequest(ExecutionContext);

#[derive(Clone)]
struct ScriptRequestHeaders(ExecutionContext);

/// A response as seen by scripts.
#[derive(Clone)]
pub struct ScriptResponse(Arc<ResponseSpec>);

impl ScriptResponse {
    /// Wraps a captured response.
    #[must_use]
    pub const fn new(response: Arc<ResponseSpec>) -> Self {
        Self(response)
    }
}

#[derive(Clone)]
struct ScriptResponseHeaders(Arc<ResponseSpec>);

/// The `console` object.
#[derive(Clone)]
pub struct ScriptConsole(Arc<dyn LogSink>);

impl ScriptConsole {
    /// Routes console calls to `sink`.
    #[must_use]
    pub const fn new(sink: Arc<dyn LogSink>) -> Self {
        Self(sink)
    }

    fn emit(&self, level: LogLevel, args: &[Dynamic]) {
        let parts = args.iter().map(stringify).collect();
        self.0.log(LogEntry::new(level, parts));
    }
}

const fn event_name(phase: ScriptKind) -> &'static str {
    match phase {
        ScriptKind::PreRequest => "prerequest",
        ScriptKind::PostRequest => "test",
    }
}

fn parse_headers(value: &Dynamic) -> Result<Vec<Header>, Box<EvalAltResult>> {
    if let Some(map) = value.read_lock::<Map>() {
        return Ok(map
            .iter()
            .map(|(key, value)| KeyValue::new(key.as_str(), stringify(value)))
            .collect());
    }
    if let Some(list) = value.read_lock::<Array>() {
        return list.iter().map(parse_header_entry).collect();
    }
    Err(runtime_error(
        "pm.sendRequest: 'header' must be an object or a list of #{key, value}",
    ))
}

fn parse_header_entry(entry: &Dynamic) -> Result<Header, Box<EvalAltResult>> {
    let Some(map) = entry.read_lock::<Map>() else {
        return Err(runtime_error("header entries must be #{key, value}"));
    };
    let key = map
        .get("key")
        .map(stringify)
        .ok_or_else(|| runtime_error("header entries must be #{key, value}"))?;
    let value = map.get("value").map(stringify).unwrap_or_default();
    Ok(KeyValue::new(key, value))
}

fn parse_body(value: &Dynamic) -> Result<RequestBody, Box<EvalAltResult>> {
    if value.is_string() {
        return Ok(RequestBody::raw(stringify(value), "text"));
    }
    rhai::serde::from_dynamic::<RequestBody>(value)
        .map_err(|e| runtime_error(format!("pm.sendRequest: invalid body: {e}")))
}

/// Builds a request from a URL string or a `#{url, method, header, body}` map.
fn parse_request_like(value: &Dynamic) -> Result<ApiRequest, Box<EvalAltResult>> {
    if value.is_string() {
        return Ok(ApiRequest::with_url(
            NESTED_REQUEST_NAME,
            HttpMethod::Get,
            stringify(value),
        ));
    }
    let Some(map) = value.read_lock::<Map>() else {
        return Err(runtime_error(format!(
            "pm.sendRequest expects a URL or an object, got {}",
            value.type_name()
        )));
    };

    let url = map
        .get("url")
        .map(stringify)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| runtime_error("pm.sendRequest: missing 'url'"))?;
    let method = match map.get("method") {
        Some(method) => stringify(method)
            .parse::<HttpMethod>()
            .map_err(|e| runtime_error(format!("pm.sendRequest: {e}")))?,
        None => HttpMethod::Get,
    };

    let mut request = ApiRequest::with_url(NESTED_REQUEST_NAME, method, url);
    if let Some(headers) = map.get("header").or_else(|| map.get("headers")) {
        request.headers = parse_headers(headers)?;
    }
    if let Some(body) = map.get("body") {
        request.body = parse_body(body)?;
    }
    Ok(request)
}

fn register_pm(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptPm>("pm")
        .register_get("variables", |pm: &mut ScriptPm| {
            ScriptVariables(pm.context.variables().unified())
        })
        .register_get("environment", |pm: &mut ScriptPm| {
            ScriptVariables(pm.context.variables().scoped(ScopeKind::Environment))
        })
        .register_get("collectionVariables", |pm: &mut ScriptPm| {
            ScriptVariables(pm.context.variables().scoped(ScopeKind::Collection))
        })
        .register_get("globals", |pm: &mut ScriptPm| {
            ScriptVariables(pm.context.variables().scoped(ScopeKind::Global))
        })
        .register_get("info", |pm: &mut ScriptPm| {
            let info = pm.context.info();
            ScriptInfo {
                request_id: info.request_id.clone(),
                request_name: info.request_name.clone(),
                path: info.path.clone(),
                event: event_name(pm.context.phase()),
            }
        })
        .register_get("request", |pm: &mut ScriptPm| ScriptRequest(pm.context.clone()))
        .register_get("response", |pm: &mut ScriptPm| {
            pm.context
                .shared_response()
                .map_or(Dynamic::UNIT, |r| Dynamic::from(ScriptResponse(r)))
        })
        .register_fn(
            "sendRequest",
            |pm: &mut ScriptPm, request: Dynamic, callback: FnPtr| {
                pm.queue(&request, Some(callback))
            },
        )
        .register_fn("sendRequest", |pm: &mut ScriptPm, request: Dynamic| {
            pm.queue(&request, None)
        });
}

fn register_variables(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptVariables>("VariableScope")
        .register_fn("get", |v: &mut ScriptVariables, key: &str| {
            optional_string(v.0.get(key))
        })
        .register_fn("set", |v: &mut ScriptVariables, key: &str, value: Dynamic| {
            v.0.set(key, stringify(&value));
        })
        .register_fn("has", |v: &mut ScriptVariables, key: &str| v.0.has(key))
        .register_fn("unset", |v: &mut ScriptVariables, key: &str| v.0.unset(key))
        .register_fn("clear", |v: &mut ScriptVariables| v.0.clear())
        .register_fn("toObject", |v: &mut ScriptVariables| to_script_map(v.0.to_object()))
        .register_fn("replaceIn", |v: &mut ScriptVariables, value: Dynamic| {
            if value.is_string() {
                Dynamic::from(v.0.replace_in(&stringify(&value)).resolved)
            } else {
                value
            }
        });
}

fn register_info(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptInfo>("Info")
        .register_get("requestId", |i: &mut ScriptInfo| i.request_id.clone())
        .register_get("requestName", |i: &mut ScriptInfo| i.request_name.clone())
        .register_get("eventName", |i: &mut ScriptInfo| i.event.to_string())
        .register_fn("getPath", |i: &mut ScriptInfo| i.path.clone());
}

fn register_request(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptRequest>("Request")
        .register_get("url", |r: &mut ScriptRequest| r.0.request().url.clone())
        .register_get("method", |r: &mut ScriptRequest| {
            r.0.request().method.as_str().to_string()
        })
        .register_get("name", |r: &mut ScriptRequest| r.0.info().request_name.clone())
        .register_get("headers", |r: &mut ScriptRequest| {
            ScriptRequestHeaders(r.0.clone())
        });

    engine
        .register_type_with_name::<ScriptRequestHeaders>("RequestHeaders")
        .register_fn(
            "add",
            |h: &mut ScriptRequestHeaders, header: Map| -> Result<(), Box<EvalAltResult>> {
                let key = header
                    .get("key")
                    .map(stringify)
                    .ok_or_else(|| runtime_error("headers.add expects #{key, value}"))?;
                let value = header.get("value").map(stringify).unwrap_or_default();
                h.0.add_header(key, value);
                Ok(())
            },
        )
        .register_fn(
            "add",
            |h: &mut ScriptRequestHeaders, key: &str, value: Dynamic| {
                h.0.add_header(key, stringify(&value));
            },
        )
        .register_fn("get", |h: &mut ScriptRequestHeaders, name: &str| {
            optional_string(h.0.request().headers.get(name))
        })
        .register_fn("has", |h: &mut ScriptRequestHeaders, name: &str| {
            h.0.request().headers.has(name)
        })
        .register_fn("toObject", |h: &mut ScriptRequestHeaders| {
            to_script_map(h.0.request().headers.to_object())
        });
}

fn register_response(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptResponse>("Response")
        .register_get("code", |r: &mut ScriptResponse| to_int(r.0.status))
        .register_get("status", |r: &mut ScriptResponse| r.0.status_text.clone())
        .register_get("responseTime", |r: &mut ScriptResponse| {
            to_int(r.0.duration_ms())
        })
        .register_get("responseSize", |r: &mut ScriptResponse| to_int(r.0.size))
        .register_get("headers", |r: &mut ScriptResponse| {
            ScriptResponseHeaders(Arc::clone(&r.0))
        })
        .register_fn("text", |r: &mut ScriptResponse| r.0.body.clone())
        .register_fn(
            "json",
            |r: &mut ScriptResponse| -> Result<Dynamic, Box<EvalAltResult>> {
                let value = r
                    .0
                    .body_as_json()
                    .map_err(|e| runtime_error(format!("response body is not valid JSON: {e}")))?;
                rhai::serde::to_dynamic(&value)
            },
        );

    engine
        .register_type_with_name::<ScriptResponseHeaders>("ResponseHeaders")
        .register_fn("get", |h: &mut ScriptResponseHeaders, name: &str| {
            optional_string(h.0.get_header(name).map(str::to_string))
        })
        .register_fn("has", |h: &mut ScriptResponseHeaders, name: &str| {
            h.0.has_header(name)
        })
        .register_fn("toObject", |h: &mut ScriptResponseHeaders| {
            h.0.headers
                .iter()
                .map(|(k, v)| (k.as_str().into(), Dynamic::from(v.clone())))
                .collect::<Map>()
        });
}

/// Registers one `console` method for each listed argument count.
macro_rules! register_console_arities {
    ($engine:ident, $name:ident, $level:ident; $([$($arg:ident),*]),+ $(,)?) => {
        $(
            $engine.register_fn($name, move |c: &mut ScriptConsole $(, $arg: Dynamic)*| {
                c.emit($level, &[$($arg),*]);
            });
        )+
    };
}

fn register_console(engine: &mut Engine) {
    engine.register_type_with_name::<ScriptConsole>("console");
    for (name, level) in [
        ("log", LogLevel::Log),
        ("info", LogLevel::Info),
        ("warn", LogLevel::Warn),
        ("error", LogLevel::Error),
    ] {
        register_console_arities!(engine, name, level;
            [],
            [a],
            [a, b],
            [a, b, c2],
            [a, b, c2, d],
            [a, b, c2, d, e],
            [a, b, c2, d, e, f],
            [a, b, c2, d, e, f, g],
            [a, b, c2, d, e, f, g, h],
        );
    }
}

/// Registers the script-facing types on `engine`.
pub fn register(engine: &mut Engine) {
    register_pm(engine);
    register_variables(engine);
    register_info(engine);
    register_request(engine);
    register_response(engine);
    register_console(engine);
}
