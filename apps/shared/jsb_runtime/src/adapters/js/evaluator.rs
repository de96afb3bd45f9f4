//! Script evaluation against a native context

use rquickjs::context::EvalOptions;
use rquickjs::convert::Coerced;
use rquickjs::{Ctx, Value};
use tracing::trace;

/// Property the source label is reported under
pub const SOURCE_LABEL_PROPERTY: &str = "sourceURL";

/// Why an evaluation produced no value
pub enum EvalFailure<'js> {
    /// The script threw; the raw thrown value is kept for diagnostics
    Exception(Value<'js>),
    /// The engine failed outside of script semantics
    Engine(rquickjs::Error),
}

impl<'js> EvalFailure<'js> {
    fn from_error(ctx: &Ctx<'js>, error: rquickjs::Error) -> Self {
        match error {
            rquickjs::Error::Exception => EvalFailure::Exception(ctx.catch()),
            other => EvalFailure::Engine(other),
        }
    }
}

/// Run `source` against the global object of `ctx`
///
/// Scripts run as sloppy-mode global code, so bare assignments create
/// globals. When the script throws, `label` is recorded on the thrown object
/// under [`SOURCE_LABEL_PROPERTY`] unless the engine already set it.
pub fn evaluate<'js>(ctx: &Ctx<'js>, source: &str, label: &str) -> Result<Value<'js>, EvalFailure<'js>> {
    let mut options = EvalOptions::default();
    options.strict = false;

    match ctx.eval_with_options::<Value, _>(source, options) {
        Ok(value) => Ok(value),
        Err(error) => {
            let failure = EvalFailure::from_error(ctx, error);
            if let EvalFailure::Exception(exception) = &failure {
                attach_label(ctx, exception, label);
            }
            Err(failure)
        }
    }
}

fn attach_label<'js>(ctx: &Ctx<'js>, exception: &Value<'js>, label: &str) {
    let Some(object) = exception.as_object() else {
        return;
    };

    match object.get::<_, Option<Value>>(SOURCE_LABEL_PROPERTY) {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(error) => {
            clear_pending(ctx, &error);
            return;
        }
    }

    if let Err(error) = object.set(SOURCE_LABEL_PROPERTY, label) {
        // Frozen exception objects refuse new properties
        clear_pending(ctx, &error);
        trace!("Could not record source label on exception: {}", error);
    }
}

/// Drop the exception a failed engine call left pending on `ctx`
pub(crate) fn clear_pending(ctx: &Ctx<'_>, error: &rquickjs::Error) {
    if matches!(error, rquickjs::Error::Exception) {
        ctx.catch();
    }
}

/// Convert an evaluation result to text
///
/// `undefined` has no textual form and yields `None`. Every other value goes
/// through the language's own string conversion, which may itself throw.
pub fn stringify<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<Option<String>, EvalFailure<'js>> {
    if value.is_undefined() {
        return Ok(None);
    }

    value
        .get::<Coerced<String>>()
        .map(|Coerced(text)| Some(text))
        .map_err(|error| EvalFailure::from_error(ctx, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn with_context<R: Send>(f: impl FnOnce(Ctx<'_>) -> R + Send) -> R {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        context.with(f)
    }

    fn run(ctx: &Ctx<'_>, source: &str) -> Option<String> {
        match evaluate(ctx, source, "test.js").and_then(|value| stringify(ctx, value)) {
            Ok(text) => text,
            Err(_) => panic!("evaluation of {:?} failed", source),
        }
    }

    #[test]
    fn test_arithmetic() {
        with_context(|ctx| assert_eq!(run(&ctx, "1+1").as_deref(), Some("2")));
    }

    #[test]
    fn test_undefined_is_absent() {
        with_context(|ctx| {
            assert_eq!(run(&ctx, "undefined"), None);
            assert_eq!(run(&ctx, "var x = 3;"), None);
        });
    }

    #[test]
    fn test_null_and_empty_string_are_values() {
        with_context(|ctx| {
            assert_eq!(run(&ctx, "null").as_deref(), Some("null"));
            assert_eq!(run(&ctx, "''").as_deref(), Some(""));
        });
    }

    #[test]
    fn test_sloppy_assignment_creates_global() {
        with_context(|ctx| {
            assert_eq!(run(&ctx, "implicitGlobal = 5"), Some("5".to_string()));
            assert_eq!(run(&ctx, "implicitGlobal * 2").as_deref(), Some("10"));
        });
    }

    #[test]
    fn test_throw_returns_exception_with_label() {
        with_context(|ctx| match evaluate(&ctx, "throw new Error('boom')", "test.js") {
            Err(EvalFailure::Exception(exception)) => {
                let object = exception.as_object().unwrap();
                let label: String = object.get(SOURCE_LABEL_PROPERTY).unwrap();
                assert_eq!(label, "test.js");
            }
            _ => panic!("expected an exception"),
        });
    }

    #[test]
    fn test_thrown_primitive_is_kept() {
        with_context(|ctx| match evaluate(&ctx, "throw 'plain'", "test.js") {
            Err(EvalFailure::Exception(exception)) => {
                assert_eq!(exception.as_string().unwrap().to_string().unwrap(), "plain");
            }
            _ => panic!("expected an exception"),
        });
    }

    #[test]
    fn test_unconvertible_result_is_exception() {
        with_context(|ctx| {
            let value = evaluate(&ctx, "({ toString() { throw new Error('no text'); } })", "test.js")
                .ok()
                .unwrap();
            assert!(matches!(stringify(&ctx, value), Err(EvalFailure::Exception(_))));
        });
    }
}
