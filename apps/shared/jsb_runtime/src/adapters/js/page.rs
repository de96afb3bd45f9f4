//! Page engine boundary
//!
//! Page scripts are evaluated by an external rendering engine with its own
//! script engine and event loop. The bridge only hands it source text and
//! receives one callback with either a value or an error.

use std::fmt;

use rquickjs::convert::Coerced;
use rquickjs::{AsyncContext, AsyncRuntime, Ctx, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::Result;

/// Value or error reported by a page engine; `Ok(None)` means no value
pub type PageResult = std::result::Result<Option<serde_json::Value>, PageError>;

/// Completion callback handed to a page engine
pub type PageCallback = Box<dyn FnOnce(PageResult) + Send + 'static>;

/// Error reported by a page engine
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PageError {
    pub message: String,
}

impl PageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An external engine that evaluates scripts inside a rendered page
pub trait PageEngine: Send + Sync {
    /// Submit `script` for evaluation
    ///
    /// Must return without waiting for the result. `callback` is invoked once,
    /// later, from the engine's own event loop.
    fn run_javascript(&self, script: String, callback: PageCallback);
}

/// Text form of a page value
///
/// Follows the language's own string conversion so a page result reads the
/// same as a native one: arrays join their elements with `,` (nulls become
/// empty), objects print as `[object Object]`, and integral numbers have no
/// fraction.
pub fn stringify_page_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Array(items) => join_array(items),
        other => scalar_text(other),
    }
}

fn join_array(items: &[serde_json::Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            serde_json::Value::Null => String::new(),
            serde_json::Value::Array(nested) => join_array(nested),
            other => scalar_text(other),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Number(number) => number_text(number),
        serde_json::Value::Bool(flag) => flag.to_string(),
        serde_json::Value::Object(_) => "[object Object]".to_string(),
        serde_json::Value::Null | serde_json::Value::Array(_) => stringify_page_value(value),
    }
}

fn number_text(number: &serde_json::Number) -> String {
    if !number.is_f64() {
        return number.to_string();
    }
    let Some(float) = number.as_f64() else {
        return number.to_string();
    };

    if float == 0.0 {
        return "0".to_string();
    }
    if float.fract() == 0.0 && float.abs() < 1e21 {
        return format!("{:.0}", float);
    }

    // Exponents print with an explicit sign, as in `1e+21`
    let text = number.to_string();
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
        _ => text,
    }
}

/// Page engine backed by a private QuickJS context
///
/// Stands in for a browser page when no renderer is attached: it has a
/// `window` alias of its global object and shares nothing with the bridge's
/// native contexts.
pub struct HeadlessPage {
    _runtime: AsyncRuntime,
    context: AsyncContext,
}

impl HeadlessPage {
    pub async fn new() -> Result<Self> {
        debug!("Initializing headless page engine");

        let runtime = AsyncRuntime::new()?;
        let context = AsyncContext::full(&runtime).await?;

        context
            .with(|ctx| {
                let globals = ctx.globals();
                globals.set("window", globals.clone())
            })
            .await?;

        info!("Headless page engine ready");
        Ok(Self {
            _runtime: runtime,
            context,
        })
    }
}

impl fmt::Debug for HeadlessPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessPage").finish_non_exhaustive()
    }
}

impl PageEngine for HeadlessPage {
    fn run_javascript(&self, script: String, callback: PageCallback) {
        let context = self.context.clone();
        tokio::spawn(async move {
            let result = context.with(move |ctx| evaluate_in_page(&ctx, &script)).await;
            callback(result);
        });
    }
}

fn evaluate_in_page(ctx: &Ctx<'_>, script: &str) -> PageResult {
    match ctx.eval::<Value, _>(script) {
        Ok(value) => page_value(ctx, value),
        Err(error) => Err(page_error(ctx, error)),
    }
}

fn page_value<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> PageResult {
    if value.is_undefined() {
        return Ok(None);
    }

    // Functions and symbols have no JSON form and count as no value
    let Some(json) = ctx.json_stringify(value).map_err(|error| page_error(ctx, error))? else {
        return Ok(None);
    };
    let text = json.to_string().map_err(|error| page_error(ctx, error))?;

    serde_json::from_str(&text)
        .map(Some)
        .map_err(|error| PageError::new(format!("Unreadable page value: {}", error)))
}

fn page_error(ctx: &Ctx<'_>, error: rquickjs::Error) -> PageError {
    if !matches!(error, rquickjs::Error::Exception) {
        return PageError::new(error.to_string());
    }

    let exception = ctx.catch();
    match exception.get::<Coerced<String>>() {
        Ok(Coerced(message)) => PageError::new(message),
        Err(_) => {
            ctx.catch();
            PageError::new("Unknown page exception")
        }
    }
}
