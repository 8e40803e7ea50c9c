//! Turning a request definition into a concrete wire request.

use courier_domain::{
    ApiRequest, BodyMode, KeyValue, LogEntry, RequestBody, ResolvedBody, ResolvedHeaders,
    ResolvedRequest, VariableMap,
};

use super::error::ResolveError;
use crate::ports::LogSink;
use crate::template::resolve_template;

const CONTENT_TYPE: &str = "Content-Type";

/// Resolves `request` against an already flattened variable map.
///
/// `added_headers` are the headers pre-request scripts appended. They are
/// resolved like declared headers and win over them on a case-insensitive
/// name match.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidGraphqlJson`] when GraphQL variables are not
/// valid JSON after resolution.
pub fn resolve_request_with(
    request: &ApiRequest,
    variables: &VariableMap,
    added_headers: &[(String, String)],
    log: &dyn LogSink,
) -> Result<ResolvedRequest, ResolveError> {
    let resolve = |text: &str| resolve_template(text, |key| variables.get(key).cloned());

    let mut headers = ResolvedHeaders::new();
    let declared = request
        .enabled_headers()
        .map(|h| (h.key.as_str(), h.value.as_str()));
    let added = added_headers.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    for (key, value) in declared.chain(added) {
        let key = resolve(key);
        if key.trim().is_empty() {
            continue;
        }
        headers.insert(key, resolve(value));
    }

    let body = resolve_body(&request.body, &mut headers, &resolve, log)?;

    Ok(ResolvedRequest {
        method: request.method,
        url: resolve(&request.url),
        headers,
        body,
    })
}

fn resolve_body(
    body: &RequestBody,
    headers: &mut ResolvedHeaders,
    resolve: &dyn Fn(&str) -> String,
    log: &dyn LogSink,
) -> Result<ResolvedBody, ResolveError> {
    match body.mode {
        BodyMode::None => Ok(ResolvedBody::None),
        BodyMode::Raw => Ok(ResolvedBody::Text(resolve(
            body.raw.as_deref().unwrap_or_default(),
        ))),
        BodyMode::UrlEncoded => {
            let pairs = resolve_pairs(&body.urlencoded, resolve);
            let encoded = serde_urlencoded::to_string(&pairs)
                .map_err(|e| ResolveError::FormEncoding(e.to_string()))?;
            headers.insert_if_absent(CONTENT_TYPE, "application/x-www-form-urlencoded");
            Ok(ResolvedBody::Text(encoded))
        }
        BodyMode::FormData => {
            headers.remove(CONTENT_TYPE);
            Ok(ResolvedBody::Multipart(resolve_pairs(&body.form_data, resolve)))
        }
        BodyMode::Graphql => {
            let graphql = body.graphql.clone().unwrap_or_default();
            let query = resolve(&graphql.query);
            let variables_text = resolve(&graphql.variables);
            let variables = if variables_text.trim().is_empty() {
                serde_json::Value::Object(serde_json::Map::new())
            } else {
                serde_json::from_str(&variables_text).map_err(|e| {
                    ResolveError::InvalidGraphqlJson {
                        field: "variables",
                        message: e.to_string(),
                    }
                })?
            };
            let payload = serde_json::json!({ "query": query, "variables": variables });
            headers.insert_if_absent(CONTENT_TYPE, "application/json");
            Ok(ResolvedBody::Text(payload.to_string()))
        }
        BodyMode::Binary => {
            log.log(LogEntry::warn(
                "Binary request bodies are not supported; the request is sent without a body",
            ));
            Ok(ResolvedBody::None)
        }
    }
}

fn resolve_pairs(pairs: &[KeyValue], resolve: &dyn Fn(&str) -> String) -> Vec<(String, String)> {
    pairs
        .iter()
        .filter(|pair| pair.enabled)
        .map(|pair| (resolve(&pair.key), resolve(&pair.value)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use courier_domain::{HttpMethod, LogLevel};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Collect(Mutex<Vec<LogEntry>>);

    impl LogSink for Collect {
        fn log(&self, entry: LogEntry) {
            self.0.lock().unwrap().push(entry);
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> VariableMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_url_and_headers_resolved() {
        let request = ApiRequest::with_url("Get", HttpMethod::Get, "{{baseUrl}}/users/{{userId}}")
            .with_header(KeyValue::new("Authorization", "Bearer {{token}}"))
            .with_header(KeyValue::disabled("X-Off", "1"));
        let resolved = resolve_request_with(
            &request,
            &vars(&[("baseUrl", "https://api.test"), ("userId", "1"), ("token", "t")]),
            &[],
            &Collect::default(),
        )
        .unwrap();

        assert_eq!(resolved.url, "https://api.test/users/1");
        assert_eq!(resolved.headers.get("authorization"), Some("Bearer t"));
        assert!(!resolved.headers.contains("X-Off"));
        assert_eq!(resolved.body, ResolvedBody::None);
    }

    #[test]
    fn test_script_headers_win_case_insensitively() {
        let request = ApiRequest::new("r").with_header(KeyValue::new("X-Trace", "declared"));
        let added = vec![("x-trace".to_string(), "{{id}}".to_string())];
        let resolved =
            resolve_request_with(&request, &vars(&[("id", "42")]), &added, &Collect::default())
                .unwrap();
        assert_eq!(resolved.headers.len(), 1);
        assert_eq!(resolved.headers.get("X-Trace"), Some("42"));
    }

    #[test]
    fn test_raw_body_is_content_agnostic() {
        let request = ApiRequest::new("r").with_body(RequestBody::raw("<id>{{id}}</id>", "xml"));
        let resolved =
            resolve_request_with(&request, &vars(&[("id", "7")]), &[], &Collect::default()).unwrap();
        assert_eq!(resolved.body.as_text(), Some("<id>7</id>"));
        assert!(!resolved.headers.contains(CONTENT_TYPE));
    }

    #[test]
    fn test_urlencoded_only_enabled_pairs() {
        let request = ApiRequest::new("r").with_body(RequestBody::urlencoded(vec![
            KeyValue::new("user", "{{name}}"),
            KeyValue::new("note", "a b&c"),
            KeyValue::disabled("skip", "x"),
        ]));
        let resolved =
            resolve_request_with(&request, &vars(&[("name", "ana")]), &[], &Collect::default())
                .unwrap();
        assert_eq!(resolved.body.as_text(), Some("user=ana&note=a+b%26c"));
        assert_eq!(
            resolved.headers.get(CONTENT_TYPE),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_urlencoded_keeps_existing_content_type() {
        let request = ApiRequest::new("r")
            .with_header(KeyValue::new("content-type", "text/plain"))
            .with_body(RequestBody::urlencoded(vec![KeyValue::new("a", "1")]));
        let resolved = resolve_request_with(&request, &vars(&[]), &[], &Collect::default()).unwrap();
        assert_eq!(resolved.headers.len(), 1);
        assert_eq!(resolved.headers.get(CONTENT_TYPE), Some("text/plain"));
    }

    #[test]
    fn test_form_data_clears_content_type() {
        let request = ApiRequest::new("r")
            .with_header(KeyValue::new("Content-Type", "application/json"))
            .with_body(RequestBody::form_data(vec![
                KeyValue::new("file", "{{f}}"),
                KeyValue::disabled("x", "y"),
            ]));
        let resolved =
            resolve_request_with(&request, &vars(&[("f", "a.txt")]), &[], &Collect::default())
                .unwrap();
        assert!(!resolved.headers.contains(CONTENT_TYPE));
        assert_eq!(
            resolved.body,
            ResolvedBody::Multipart(vec![("file".to_string(), "a.txt".to_string())])
        );
    }

    #[test]
    fn test_graphql_body() {
        let request = ApiRequest::new("r").with_body(RequestBody::graphql(
            "query { user(id: {{id}}) { name } }",
            r#"{"limit": {{limit}}}"#,
        ));
        let resolved = resolve_request_with(
            &request,
            &vars(&[("id", "3"), ("limit", "10")]),
            &[],
            &Collect::default(),
        )
        .unwrap();
        let body: serde_json::Value = serde_json::from_str(resolved.body.as_text().unwrap()).unwrap();
        assert_eq!(body["query"], "query { user(id: 3) { name } }");
        assert_eq!(body["variables"]["limit"], 10);
        assert_eq!(resolved.headers.get(CONTENT_TYPE), Some("application/json"));
    }

    #[test]
    fn test_graphql_invalid_variables_is_named_error() {
        let request = ApiRequest::new("r").with_body(RequestBody::graphql("{ a }", "{not json"));
        let err = resolve_request_with(&request, &vars(&[]), &[], &Collect::default()).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidGraphqlJson { field: "variables", .. }
        ));
    }

    #[test]
    fn test_binary_sends_nothing_and_warns() {
        let sink = Collect::default();
        let request = ApiRequest::new("r").with_body(RequestBody::binary("/tmp/file.bin"));
        let resolved = resolve_request_with(&request, &vars(&[]), &[], &sink).unwrap();
        assert!(resolved.body.is_none());
        let entries = sink.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Warn);
    }
}
