//! Script sandbox backed by the `rhai` interpreter.

use std::sync::Arc;

use async_trait::async_trait;
use courier_application::ExecutionContext;
use courier_application::ports::{LogSink, ScriptExecutionError, ScriptSandbox};
use courier_domain::{LogEntry, Script};
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, Scope};

use super::bindings::{self, Outbox, ScriptConsole, ScriptPm, ScriptResponse};
use super::convert::{from_eval_error, from_parse_error};
use super::modules;
use crate::settings::ScriptSettings;

/// Runs scripts in a fresh interpreter per call.
///
/// The only bindings a script sees are `pm`, `console`, `require` and the
/// interpreter's core language. `eval` and `import` are unavailable;
/// `print` and `debug` go to the console sink.
#[derive(Debug, Clone, Default)]
pub struct RhaiSandbox {
    settings: ScriptSettings,
}

impl RhaiSandbox {
    /// Creates a sandbox with the given limits.
    #[must_use]
    pub const fn new(settings: ScriptSettings) -> Self {
        Self { settings }
    }

    fn build_engine(&self, sink: &Arc<dyn LogSink>) -> Engine {
        let mut engine = Engine::new();
        engine
            .set_max_operations(self.settings.max_operations)
            .set_max_call_levels(self.settings.max_call_levels)
            .set_max_string_size(self.settings.max_string_size)
            .set_module_resolver(DummyModuleResolver::new())
            .disable_symbol("eval");

        let print_sink = Arc::clone(sink);
        engine.on_print(move |text| print_sink.log(LogEntry::log(text)));
        let debug_sink = Arc::clone(sink);
        engine.on_debug(move |text, _source, _position| debug_sink.log(LogEntry::info(text)));

        modules::register(&mut engine);
        bindings::register(&mut engine);
        engine
    }
}

#[async_trait]
impl ScriptSandbox for RhaiSandbox {
    async fn execute(
        &self,
        script: &Script,
        context: &ExecutionContext,
        owner: &str,
    ) -> Result<(), ScriptExecutionError> {
        let phase = context.phase();
        let sink = context.log_sink();
        let engine = self.build_engine(&sink);
        let ast = engine
            .compile(&script.content)
            .map_err(|e| from_parse_error(&e, phase, owner))?;

        let outbox = Outbox::new(self.settings.max_nested_requests);
        {
            let mut scope = Scope::new();
            scope.push("pm", ScriptPm::new(context.clone(), outbox.clone()));
            scope.push("console", ScriptConsole::new(sink));
            engine
                .run_ast_with_scope(&mut scope, &ast)
                .map_err(|e| from_eval_error(e, phase, owner))?;
        }

        // Nested sends are delivered after the body; callbacks may queue more.
        while let Some(pending) = outbox.take() {
            let result = context.send_request(&pending.request).await;
            let Some(callback) = pending.callback else {
                if let Err(e) = result {
                    context.log(LogEntry::warn(format!("pm.sendRequest failed: {e}")));
                }
                continue;
            };
            let (err, res) = match result {
                Ok(response) => (
                    Dynamic::UNIT,
                    Dynamic::from(ScriptResponse::new(Arc::new(response))),
                ),
                Err(e) => (Dynamic::from(e.to_string()), Dynamic::UNIT),
            };
            let _returned = callback
                .call::<Dynamic>(&engine, &ast, (err, res))
                .map_err(|e| from_eval_error(e, phase, owner))?;
        }
        Ok(())
    }
}
