//! The request executor

use std::sync::Arc;

use courier_domain::{
    AncestorChain, ApiRequest, ErrorDetails, ExecutionState, Header, LogEntry, ProjectTree,
    ResolvedRequest, ResponseSpec, RuntimeVariables, ScriptKind, VariableMap,
};

use super::context::ExecutionContext;
use super::error::ExecutionError;
use super::resolve::resolve_request_with;
use super::runtime::RuntimeVariableStore;
use crate::ports::{AncestorLookup, HttpClient, LogSink, ScriptSandbox};
use crate::scope::ScopeStore;

/// Result of the pre-request phase.
#[derive(Debug, Clone)]
pub struct PreRequestOutcome {
    /// The context the scripts ran against. Reused for the post phase.
    pub context: ExecutionContext,
    /// Unified variables after all pre-request scripts ran, fully resolved.
    pub variables: VariableMap,
}

/// Result of a complete send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The wire request that was sent.
    pub request: ResolvedRequest,
    /// The response, or a synthetic zero-status response if the transport
    /// failed.
    pub response: ResponseSpec,
    /// The overlay written back to the runtime store.
    pub runtime: RuntimeVariables,
    /// Every state the send went through, starting at `Idle`.
    pub states: Vec<ExecutionState>,
}

impl SendOutcome {
    /// Returns the final state.
    #[must_use]
    pub fn final_state(&self) -> ExecutionState {
        self.states.last().copied().unwrap_or_default()
    }
}

#[derive(Debug)]
struct StateTrace {
    item_id: String,
    states: Vec<ExecutionState>,
}

impl StateTrace {
    fn new(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            states: vec![ExecutionState::Idle],
        }
    }

    fn current(&self) -> ExecutionState {
        self.states.last().copied().unwrap_or_default()
    }

    fn advance(&mut self, next: ExecutionState) {
        let current = self.current();
        if !current.can_transition_to(next) {
            tracing::warn!(item = %self.item_id, from = %current, to = %next, "unexpected state transition");
        }
        tracing::debug!(item = %self.item_id, state = %next, "execution state");
        self.states.push(next);
    }
}

/// Orchestrates scripts, resolution and transport for one request at a time.
///
/// The executor holds no per-send state, so it can be shared across
/// concurrent sends.
#[derive(Clone)]
pub struct RequestExecutor {
    http: Arc<dyn HttpClient>,
    sandbox: Arc<dyn ScriptSandbox>,
    log: Arc<dyn LogSink>,
}

impl RequestExecutor {
    /// Creates an executor over the given adapters.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        sandbox: Arc<dyn ScriptSandbox>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self { http, sandbox, log }
    }

    /// Builds the context for an item and runs every pre-request script on
    /// its ancestor chain, collection first.
    ///
    /// `initial_headers` seeds `pm.request.headers`; pass the request's
    /// declared headers.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown item, or the first script error.
    pub async fn run_pre_request_scripts(
        &self,
        project: &ProjectTree,
        item_id: &str,
        ancestors: &dyn AncestorLookup,
        runtime: &RuntimeVariables,
        initial_headers: &[Header],
    ) -> Result<PreRequestOutcome, ExecutionError> {
        let chain = Self::chain(ancestors, item_id)?;
        let store = ScopeStore::build(project.global_variables(), &chain, runtime);
        let context = ExecutionContext::new(
            store,
            &chain,
            initial_headers,
            Arc::clone(&self.log),
            Arc::clone(&self.http),
        );

        self.run_scripts(&chain, &context, ScriptKind::PreRequest)
            .await?;

        let variables = context.variables().unified().to_object();
        Ok(PreRequestOutcome { context, variables })
    }

    /// Resolves a request against the variables of the pre-request phase,
    /// merging the headers scripts added.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`](super::ResolveError) for malformed GraphQL
    /// variables.
    pub fn resolve_request(
        &self,
        request: &ApiRequest,
        variables: &VariableMap,
        context: &ExecutionContext,
    ) -> Result<ResolvedRequest, ExecutionError> {
        let added = context.request().headers.added();
        Ok(resolve_request_with(
            request,
            variables,
            &added,
            self.log.as_ref(),
        )?)
    }

    /// Attaches the response to the context and runs every post-request
    /// script, collection first. Returns the raw environment scope as the
    /// next runtime overlay.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown item, or the first script error.
    pub async fn run_post_request_scripts(
        &self,
        mut context: ExecutionContext,
        item_id: &str,
        ancestors: &dyn AncestorLookup,
        response: ResponseSpec,
    ) -> Result<RuntimeVariables, ExecutionError> {
        let chain = Self::chain(ancestors, item_id)?;
        context.attach_response(response);

        self.run_scripts(&chain, &context, ScriptKind::PostRequest)
            .await?;

        Ok(context.variables().environment_snapshot())
    }

    /// Runs the full cycle for one request and writes the new overlay back
    /// to `runtime`.
    ///
    /// A transport failure is not an error here: it yields a zero-status
    /// response, an error log entry and a `Failed` final state, and the
    /// environment after the pre-request scripts becomes the new overlay.
    /// Post-request scripts do not run in that case.
    ///
    /// # Errors
    ///
    /// Returns lookup, script and resolution errors after logging them.
    /// Nothing is written back to `runtime` then.
    pub async fn send(
        &self,
        project: &ProjectTree,
        ancestors: &dyn AncestorLookup,
        item_id: &str,
        runtime: &RuntimeVariableStore,
    ) -> Result<SendOutcome, ExecutionError> {
        let mut trace = StateTrace::new(item_id);
        let result = self.send_traced(project, ancestors, item_id, runtime, &mut trace).await;
        if let Err(err) = &result {
            self.report(err);
            trace.advance(ExecutionState::Failed);
        }
        result
    }

    async fn send_traced(
        &self,
        project: &ProjectTree,
        ancestors: &dyn AncestorLookup,
        item_id: &str,
        runtime: &RuntimeVariableStore,
        trace: &mut StateTrace,
    ) -> Result<SendOutcome, ExecutionError> {
        let chain = Self::chain(ancestors, item_id)?;
        let request = chain
            .request()
            .cloned()
            .ok_or_else(|| ExecutionError::NotARequest(item_id.to_string()))?;
        let overlay = runtime.snapshot();

        trace.advance(ExecutionState::ResolvingPreScripts);
        let headers: Vec<Header> = request.enabled_headers().cloned().collect();
        let pre = self
            .run_pre_request_scripts(project, item_id, ancestors, &overlay, &headers)
            .await?;

        let resolved = self.resolve_request(&request, &pre.variables, &pre.context)?;
        trace.advance(ExecutionState::Resolved);

        trace.advance(ExecutionState::Sending);
        let response = match self.http.execute(&resolved).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url = %resolved.url, error = %err, "transport failure");
                self.log
                    .log(LogEntry::error(format!("Request to {} failed: {err}", resolved.url)));
                let fallback = pre.context.variables().environment_snapshot();
                runtime.replace(fallback.clone());
                trace.advance(ExecutionState::Failed);
                return Ok(SendOutcome {
                    request: resolved,
                    response: ResponseSpec::transport_error(err.to_string()),
                    runtime: fallback,
                    states: trace.states.clone(),
                });
            }
        };
        trace.advance(ExecutionState::Received);

        trace.advance(ExecutionState::ResolvingPostScripts);
        let next = self
            .run_post_request_scripts(pre.context, item_id, ancestors, response.clone())
            .await?;
        runtime.replace(next.clone());
        trace.advance(ExecutionState::Done);

        Ok(SendOutcome {
            request: resolved,
            response,
            runtime: next,
            states: trace.states.clone(),
        })
    }

    /// Returns what the unified `toObject()` would return for the item with
    /// no scripts executed.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown item.
    pub fn get_scoped_variables(
        project: &ProjectTree,
        item_id: &str,
        ancestors: &dyn AncestorLookup,
        runtime: &RuntimeVariables,
    ) -> Result<VariableMap, ExecutionError> {
        let chain = Self::chain(ancestors, item_id)?;
        Ok(ScopeStore::build(project.global_variables(), &chain, runtime)
            .unified()
            .to_object())
    }

    fn chain(ancestors: &dyn AncestorLookup, item_id: &str) -> Result<AncestorChain, ExecutionError> {
        ancestors
            .find_path(item_id)
            .ok_or_else(|| ExecutionError::ItemNotFound(item_id.to_string()))
    }

    async fn run_scripts(
        &self,
        chain: &AncestorChain,
        context: &ExecutionContext,
        phase: ScriptKind,
    ) -> Result<(), ExecutionError> {
        for (owner, script) in chain.scripts(phase) {
            let label = owner.owner_label();
            tracing::debug!(%phase, owner = %label, "running script");
            self.log
                .log(LogEntry::info(format!("Running {phase} script: {label}")));
            self.sandbox.execute(script, context, &label).await?;
        }
        Ok(())
    }

    fn report(&self, err: &ExecutionError) {
        let entry = match err {
            ExecutionError::Script(script) => {
                LogEntry::error(err.to_string()).with_details(ErrorDetails {
                    phase: Some(script.phase.to_string()),
                    owner: Some(script.owner.clone()),
                    line: script.line,
                    message: script.message.clone(),
                })
            }
            ExecutionError::Resolve(_) => LogEntry::error(format!("Request resolution failed: {err}")),
            ExecutionError::ItemNotFound(_)
            | ExecutionError::NotARequest(_)
            | ExecutionError::Transport(_) => LogEntry::error(err.to_string()),
        };
        self.log.log(entry);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use courier_domain::{
        Collection, Folder, HttpMethod, KeyValue, LogLevel, Project, RequestBody, Script,
        ScopeKind, Variable,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ports::{HttpClientError, ScriptExecutionError};

    struct MockHttp {
        sent: Mutex<Vec<ResolvedRequest>>,
        reply: Result<ResponseSpec, HttpClientError>,
    }

    impl MockHttp {
        fn ok(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                reply: Ok(ResponseSpec::new(
                    status,
                    vec![("Content-Type".into(), "application/json".into())],
                    body.as_bytes(),
                    Duration::from_millis(5),
                )),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                reply: Err(HttpClientError::ConnectionFailed("connection reset".into())),
            })
        }

        fn sent(&self) -> Vec<ResolvedRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttp {
        async fn execute(&self, request: &ResolvedRequest) -> Result<ResponseSpec, HttpClientError> {
            self.sent.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    #[derive(Default)]
    struct MemorySink(Mutex<Vec<LogEntry>>);

    impl MemorySink {
        fn entries(&self) -> Vec<LogEntry> {
            self.0.lock().unwrap().clone()
        }
    }

    impl LogSink for MemorySink {
        fn log(&self, entry: LogEntry) {
            self.0.lock().unwrap().push(entry);
        }
    }

    /// Runs one command per line: `env.set k v`, `env.append k v`,
    /// `vars.set k v`, `header.add k v`, `env.status k`, `throw message`.
    struct LineSandbox;

    #[async_trait]
    impl ScriptSandbox for LineSandbox {
        async fn execute(
            &self,
            script: &Script,
            context: &ExecutionContext,
            owner: &str,
        ) -> Result<(), ScriptExecutionError> {
            let env = context.variables().scoped(ScopeKind::Environment);
            for (index, line) in script.content.lines().enumerate() {
                let parts: Vec<&str> = line.split_whitespace().collect();
                match parts.as_slice() {
                    ["env.set", key, value] => env.set(*key, *value),
                    ["env.append", key, value] => {
                        let current = env.get(key).unwrap_or_default();
                        env.set(*key, format!("{current}{value}"));
                    }
                    ["vars.set", key, value] => context.variables().unified().set(*key, *value),
                    ["header.add", key, value] => {
                        context.add_header(*key, *value);
                    }
                    ["env.status", key] => {
                        let status = context.response().map(|r| r.status).unwrap_or_default();
                        env.set(*key, status.to_string());
                    }
                    ["throw", message @ ..] => {
                        return Err(ScriptExecutionError::new(
                            context.phase(),
                            owner,
                            message.join(" "),
                        )
                        .at_line(Some(index + 1)));
                    }
                    _ => {}
                }
            }
            Ok(())
        }
    }

    fn project() -> ProjectTree {
        let request = ApiRequest {
            id: "req".into(),
            ..ApiRequest::with_url("Get user", HttpMethod::Get, "{{baseUrl}}/users/{{userId}}")
        }
        .with_header(KeyValue::new("X-Trace", "declared"))
        .with_script(Script::pre_request("env.append order r"))
        .with_script(Script::post_request("env.status last_status\nenv.append post r"));

        let folder = Folder {
            id: "folder".into(),
            ..Folder::new("Users")
        }
        .with_variable(Variable::new("userId", "1"))
        .with_script(Script::pre_request("env.append order f"))
        .with_script(Script::post_request("env.append post f"))
        .with_item(request);

        let collection = Collection {
            id: "col".into(),
            ..Collection::new("Api")
        }
        .with_script(Script::pre_request("env.set order c"))
        .with_script(Script::post_request("env.set post c"))
        .with_item(folder);

        ProjectTree::from_project(
            &Project::new()
                .with_collection(collection)
                .with_global(Variable::new("baseUrl", "https://api.test")),
        )
    }

    fn executor(http: Arc<MockHttp>, sink: Arc<MemorySink>) -> RequestExecutor {
        RequestExecutor::new(http, Arc::new(LineSandbox), sink)
    }

    #[tokio::test]
    async fn test_send_end_to_end() {
        let http = MockHttp::ok(201, r#"{"ok":true}"#);
        let sink = Arc::new(MemorySink::default());
        let tree = project();
        let runtime = RuntimeVariableStore::default();

        let outcome = executor(Arc::clone(&http), sink)
            .send(&tree, &tree, "req", &runtime)
            .await
            .unwrap();

        let sent = http.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://api.test/users/1");
        assert_eq!(outcome.response.status, 201);
        assert_eq!(outcome.final_state(), ExecutionState::Done);
        assert_eq!(
            outcome.states,
            vec![
                ExecutionState::Idle,
                ExecutionState::ResolvingPreScripts,
                ExecutionState::Resolved,
                ExecutionState::Sending,
                ExecutionState::Received,
                ExecutionState::ResolvingPostScripts,
                ExecutionState::Done,
            ]
        );
        assert_eq!(runtime.snapshot(), outcome.runtime);
    }

    #[tokio::test]
    async fn test_scripts_run_root_to_leaf_in_both_phases() {
        let tree = project();
        let runtime = RuntimeVariableStore::default();
        let outcome = executor(MockHttp::ok(200, "{}"), Arc::new(MemorySink::default()))
            .send(&tree, &tree, "req", &runtime)
            .await
            .unwrap();

        assert_eq!(outcome.runtime["order"], "cfr");
        assert_eq!(outcome.runtime["post"], "cfr");
        assert_eq!(outcome.runtime["last_status"], "200");
        assert_eq!(outcome.runtime["userId"], "1");
    }

    #[tokio::test]
    async fn test_runtime_overlay_feeds_next_send() {
        let tree = project();
        let runtime = RuntimeVariableStore::new(
            [("userId".to_string(), "99".to_string())].into_iter().collect(),
        );
        let http = MockHttp::ok(200, "{}");
        executor(Arc::clone(&http), Arc::new(MemorySink::default()))
            .send(&tree, &tree, "req", &runtime)
            .await
            .unwrap();

        assert_eq!(http.sent()[0].url, "https://api.test/users/99");
        assert_eq!(runtime.snapshot()["userId"], "99");
    }

    #[tokio::test]
    async fn test_script_headers_override_declared() {
        let tree = project();
        let sink = Arc::new(MemorySink::default());
        let exec = executor(MockHttp::ok(200, "{}"), Arc::clone(&sink));
        let request = tree.find_path("req").unwrap().request().cloned().unwrap();

        let pre = exec
            .run_pre_request_scripts(
                &tree,
                "req",
                &tree,
                &RuntimeVariables::new(),
                &request.headers,
            )
            .await
            .unwrap();
        pre.context.add_header("x-trace", "{{userId}}");
        assert_eq!(pre.context.request().headers.get("X-TRACE").unwrap(), "{{userId}}");

        let resolved = exec
            .resolve_request(&request, &pre.variables, &pre.context)
            .unwrap();
        assert_eq!(resolved.headers.len(), 1);
        assert_eq!(resolved.headers.get("X-Trace"), Some("1"));
    }

    #[tokio::test]
    async fn test_each_script_start_is_logged_root_to_leaf() {
        let tree = project();
        let sink = Arc::new(MemorySink::default());

        executor(MockHttp::ok(200, "{}"), Arc::clone(&sink))
            .send(&tree, &tree, "req", &RuntimeVariableStore::default())
            .await
            .unwrap();

        let started: Vec<String> = sink
            .entries()
            .iter()
            .filter(|e| e.level == LogLevel::Info)
            .map(LogEntry::text)
            .collect();
        assert_eq!(
            started,
            vec![
                "Running pre-request script: collection 'Api'",
                "Running pre-request script: folder 'Users'",
                "Running pre-request script: request 'Get user'",
                "Running post-request script: collection 'Api'",
                "Running post-request script: folder 'Users'",
                "Running post-request script: request 'Get user'",
            ]
        );
    }

    #[tokio::test]
    async fn test_post_phase_header_add_is_ignored() {
        let tree = project();
        let sink = Arc::new(MemorySink::default());
        let exec = executor(MockHttp::ok(200, "{}"), Arc::clone(&sink));
        let pre = exec
            .run_pre_request_scripts(&tree, "req", &tree, &RuntimeVariables::new(), &[])
            .await
            .unwrap();

        let mut context = pre.context;
        context.attach_response(ResponseSpec::new(200, Vec::new(), b"", Duration::ZERO));
        assert!(!context.add_header("X-Late", "1"));
        assert!(!context.request().headers.has("X-Late"));
        assert_eq!(sink.entries().last().unwrap().level, LogLevel::Warn);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_zero_status() {
        let tree = project();
        let sink = Arc::new(MemorySink::default());
        let runtime = RuntimeVariableStore::default();

        let outcome = executor(MockHttp::failing(), Arc::clone(&sink))
            .send(&tree, &tree, "req", &runtime)
            .await
            .unwrap();

        assert_eq!(outcome.response.status, 0);
        assert_eq!(outcome.final_state(), ExecutionState::Failed);
        assert_eq!(outcome.runtime["order"], "cfr");
        assert!(!outcome.runtime.contains_key("post"));
        assert_eq!(runtime.snapshot(), outcome.runtime);

        let errors: Vec<_> = sink
            .entries()
            .into_iter()
            .filter(|e| e.level == LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].text().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_script_error_aborts_and_is_logged() {
        let project = Project::new().with_collection(
            Collection {
                id: "col".into(),
                ..Collection::new("Api")
            }
            .with_script(Script::pre_request("env.set a 1\nenv.set b 2\nthrow bad token"))
            .with_item(ApiRequest {
                id: "req".into(),
                ..ApiRequest::with_url("R", HttpMethod::Get, "http://x")
            }),
        );
        let tree = ProjectTree::from_project(&project);
        let http = MockHttp::ok(200, "");
        let sink = Arc::new(MemorySink::default());
        let runtime = RuntimeVariableStore::new(
            [("keep".to_string(), "me".to_string())].into_iter().collect(),
        );

        let err = executor(Arc::clone(&http), Arc::clone(&sink))
            .send(&tree, &tree, "req", &runtime)
            .await
            .unwrap_err();

        let ExecutionError::Script(script_err) = err else {
            panic!("expected a script error");
        };
        assert_eq!(script_err.phase, ScriptKind::PreRequest);
        assert_eq!(script_err.line, Some(3));
        assert_eq!(script_err.message, "bad token");
        assert_eq!(script_err.owner, "collection 'Api'");
        assert!(http.sent().is_empty());
        assert_eq!(runtime.snapshot().len(), 1);

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text(), "Running pre-request script: collection 'Api'");
        assert_eq!(entries[1].error_details.as_ref().unwrap().line, Some(3));
    }

    #[tokio::test]
    async fn test_invalid_graphql_stops_before_transport() {
        let project = Project::new().with_collection(
            Collection::new("Api").with_item(
                ApiRequest {
                    id: "gql".into(),
                    ..ApiRequest::with_url("Q", HttpMethod::Post, "http://x/graphql")
                }
                .with_body(RequestBody::graphql("{ me }", "{oops")),
            ),
        );
        let tree = ProjectTree::from_project(&project);
        let http = MockHttp::ok(200, "");

        let err = executor(Arc::clone(&http), Arc::new(MemorySink::default()))
            .send(&tree, &tree, "gql", &RuntimeVariableStore::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Resolve(_)));
        assert!(http.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let tree = project();
        let err = executor(MockHttp::ok(200, ""), Arc::new(MemorySink::default()))
            .send(&tree, &tree, "gone", &RuntimeVariableStore::default())
            .await
            .unwrap_err();
        assert_eq!(err, ExecutionError::ItemNotFound("gone".into()));

        let err = RequestExecutor::get_scoped_variables(&tree, "gone", &tree, &RuntimeVariables::new())
            .unwrap_err();
        assert_eq!(err, ExecutionError::ItemNotFound("gone".into()));
    }

    #[tokio::test]
    async fn test_folder_is_not_sendable() {
        let tree = project();
        let err = executor(MockHttp::ok(200, ""), Arc::new(MemorySink::default()))
            .send(&tree, &tree, "folder", &RuntimeVariableStore::default())
            .await
            .unwrap_err();
        assert_eq!(err, ExecutionError::NotARequest("folder".into()));
    }

    #[test]
    fn test_scoped_variables_match_unified_to_object() {
        let tree = project();
        let runtime: RuntimeVariables = [("token".to_string(), "{{userId}}-t".to_string())]
            .into_iter()
            .collect();

        let hints = RequestExecutor::get_scoped_variables(&tree, "req", &tree, &runtime).unwrap();

        let chain = tree.find_path("req").unwrap();
        let expected = ScopeStore::build(tree.global_variables(), &chain, &runtime)
            .unified()
            .to_object();
        assert_eq!(hints, expected);
        assert_eq!(hints["token"], "1-t");
        assert_eq!(hints["baseUrl"], "https://api.test");
    }

    #[tokio::test]
    async fn test_nested_send_resolves_without_scripts() {
        let tree = project();
        let http = MockHttp::ok(200, "{}");
        let exec = executor(Arc::clone(&http), Arc::new(MemorySink::default()));
        let pre = exec
            .run_pre_request_scripts(&tree, "req", &tree, &RuntimeVariables::new(), &[])
            .await
            .unwrap();

        let nested = ApiRequest::with_url("side", HttpMethod::Get, "{{baseUrl}}/ping?o={{order}}")
            .with_script(Script::pre_request("throw never runs"));
        let response = pre.context.send_request(&nested).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(http.sent()[0].url, "https://api.test/ping?o=cfr");
    }
}
