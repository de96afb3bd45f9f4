use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rquickjs::{AsyncContext, AsyncRuntime, Ctx};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::context::ContextResolver;
use super::evaluator::{self, EvalFailure};
use super::page::{PageEngine, stringify_page_value};
use super::{bindings, exception};
use crate::api::ConsoleApi;
use crate::completion::CompletionSink;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, EvalOutcome, Result};
use crate::request::{EvalRequest, ScriptSource};
use crate::selector::ContextSelector;

/// Runtime type reported by script console output
const RUNTIME_TYPE: &str = "js";

/// Script bridge over QuickJS and an optional page engine
///
/// Owns one QuickJS runtime and the persistent context created with it. Every
/// request, whatever its target, is answered with a single [`EvalOutcome`].
pub struct ScriptBridge {
    resolver: ContextResolver,
    page: Option<Arc<dyn PageEngine>>,
    config: BridgeConfig,
}

impl ScriptBridge {
    /// Create the bridge and its persistent context
    ///
    /// The persistent context gets the root object, the configured host
    /// values and, when enabled, the console API.
    pub async fn new(config: BridgeConfig) -> Result<Self> {
        debug!("Initializing QuickJS async runtime for the script bridge");

        let runtime = AsyncRuntime::new()?;
        let persistent = AsyncContext::full(&runtime).await?;

        let root_object = config.root_object.as_str();
        let host_values = &config.host_values;
        let console = config.console;

        persistent
            .with(|ctx| {
                bindings::setup_root_object(&ctx, root_object)?;

                for (name, value) in host_values {
                    bindings::set_host_value(&ctx, root_object, name, value)?;
                }

                if console {
                    let console_api = ConsoleApi::new(RUNTIME_TYPE, ContextSelector::Persistent.name());
                    bindings::setup_console_api(&ctx, console_api)?;
                }

                Ok::<(), rquickjs::Error>(())
            })
            .await?;

        info!(
            "Script bridge ready (root object '{}', {} host values)",
            config.root_object,
            config.host_values.len()
        );

        Ok(Self {
            resolver: ContextResolver::new(runtime, persistent),
            page: None,
            config,
        })
    }

    /// Attach the engine serving `page` requests
    pub fn with_page(mut self, page: Arc<dyn PageEngine>) -> Self {
        self.page = Some(page);
        self
    }

    /// Run a request to completion
    pub async fn execute(&self, request: EvalRequest) -> EvalOutcome {
        let label = request.resolved_label(&self.config.command_label);
        let EvalRequest { context, source, .. } = request;

        debug!("Evaluating '{}' in {} context", label, context);

        if !context.is_native() {
            let script = source.into_script()?;
            return self.execute_in_page(script).await;
        }

        let handle = self
            .resolver
            .resolve(context)
            .await?
            .ok_or_else(|| BridgeError::Engine(format!("No native context for {}", context)))?;

        let script = source.into_script()?;

        let outcome = handle
            .context()
            .with(|ctx| run_script(&ctx, &script, &label))
            .await;

        // Released before the caller sees the outcome
        drop(handle);

        if let Err(error) = &outcome {
            debug!("Evaluation of '{}' failed: {}", label, error);
        }
        outcome
    }

    async fn execute_in_page(&self, script: String) -> EvalOutcome {
        let page = self.page.as_ref().ok_or(BridgeError::NoPage)?;

        let (tx, rx) = oneshot::channel();
        page.run_javascript(
            script,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );

        match rx.await {
            Ok(Ok(value)) => Ok(value.as_ref().map(stringify_page_value)),
            Ok(Err(error)) => Err(BridgeError::Page(error.message)),
            Err(_) => {
                warn!("Page engine dropped an evaluation without reporting");
                Err(BridgeError::Page("page engine dropped the request".to_string()))
            }
        }
    }

    /// Run a request on a new task and report to `sink`
    pub fn submit(self: &Arc<Self>, request: EvalRequest, sink: CompletionSink) -> JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = bridge.execute(request).await;
            sink.complete(outcome);
        })
    }

    /// Run `source` in the context named `context`
    ///
    /// An unknown context name is reported to `sink` like any other failure.
    pub fn submit_named(self: &Arc<Self>, context: &str, source: ScriptSource, sink: CompletionSink) -> JoinHandle<()> {
        match context.parse::<ContextSelector>() {
            Ok(selector) => {
                let request = EvalRequest {
                    context: selector,
                    source,
                    label: None,
                };
                self.submit(request, sink)
            }
            Err(error) => {
                warn!("Rejected script request: {}", error);
                tokio::spawn(async move { sink.complete(Err(error)) })
            }
        }
    }

    /// Evaluate inline `source`, reporting errors under `label`
    pub async fn run_string(&self, context: ContextSelector, source: &str, label: Option<&str>) -> EvalOutcome {
        let request = EvalRequest::inline(context, source);
        match label {
            Some(label) => self.execute(request.with_label(label)).await,
            None => self.execute(request).await,
        }
    }

    /// Evaluate a script file after substituting `args`
    pub async fn run_file(&self, context: ContextSelector, path: impl Into<PathBuf>, args: &[String]) -> EvalOutcome {
        self.execute(EvalRequest::file(context, path, args.iter().cloned())).await
    }

    /// Publish a JSON value as `<root>.<name>` on the persistent context
    pub async fn set_host_value(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        let root_object = self.config.root_object.as_str();
        self.resolver
            .persistent()
            .with(|ctx| bindings::set_host_value(&ctx, root_object, name, value))
            .await?;
        debug!("Host value '{}.{}' published", root_object, name);
        Ok(())
    }

    /// Run queued promise jobs until the runtime is idle
    pub async fn drain_pending_jobs(&self) {
        self.resolver.runtime().idle().await;
    }

    /// Number of disposable contexts currently alive
    pub fn live_disposable_contexts(&self) -> usize {
        self.resolver.live_disposable_contexts()
    }
}

impl fmt::Debug for ScriptBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptBridge")
            .field("config", &self.config)
            .field("page", &self.page.is_some())
            .field("live_disposable", &self.live_disposable_contexts())
            .finish()
    }
}

fn run_script(ctx: &Ctx<'_>, script: &str, label: &str) -> EvalOutcome {
    let result = evaluator::evaluate(ctx, script, label).and_then(|value| evaluator::stringify(ctx, value));

    match result {
        Ok(text) => Ok(text),
        Err(EvalFailure::Exception(thrown)) => Err(BridgeError::Evaluation(exception::extract(ctx, thrown))),
        Err(EvalFailure::Engine(error)) => Err(error.into()),
    }
}
