//! Exception diagnostics
//!
//! A thrown value can have any shape: an `Error` object, a plain object, a
//! string, or an object whose properties throw when read. Extraction is
//! best-effort per field and never fails; whatever is missing becomes an
//! empty string.

use rquickjs::convert::Coerced;
use rquickjs::{Ctx, Object, Value};

use super::evaluator::{SOURCE_LABEL_PROPERTY, clear_pending};
use crate::error::Diagnostic;

/// Properties probed for the source file, in order
const FILE_PROPERTIES: &[&str] = &[SOURCE_LABEL_PROPERTY, "fileName"];

/// Properties probed for the line number, in order
const LINE_PROPERTIES: &[&str] = &["line", "lineNumber"];

/// Backtrace property, read when no line property is set
const STACK_PROPERTY: &str = "stack";

/// Build a diagnostic from a thrown value
pub fn extract<'js>(ctx: &Ctx<'js>, exception: Value<'js>) -> Diagnostic {
    let (file, line) = match exception.as_object() {
        Some(object) => (
            probe(ctx, object, FILE_PROPERTIES),
            probe_line(ctx, object),
        ),
        None => (String::new(), String::new()),
    };

    let message = coerce(ctx, &exception).unwrap_or_default();

    Diagnostic { file, line, message }
}

/// First present property among `names`, as text
fn probe<'js>(ctx: &Ctx<'js>, object: &Object<'js>, names: &[&str]) -> String {
    for name in names {
        match object.get::<_, Option<Coerced<String>>>(*name) {
            Ok(Some(Coerced(text))) => return text,
            Ok(None) => {}
            Err(error) => clear_pending(ctx, &error),
        }
    }
    String::new()
}

fn probe_line<'js>(ctx: &Ctx<'js>, object: &Object<'js>) -> String {
    let line = probe(ctx, object, LINE_PROPERTIES);
    if !line.is_empty() {
        return line;
    }
    line_from_stack(&probe(ctx, object, &[STACK_PROPERTY])).unwrap_or_default()
}

/// Line of the innermost frame that has one
///
/// Frames read `at name (file:line:column)`, `at name (file:line)` or
/// `at file:line`; native frames carry no location and are skipped.
fn line_from_stack(stack: &str) -> Option<String> {
    let is_number = |text: &str| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());

    stack.lines().find_map(|frame| {
        let location = frame.trim().strip_prefix("at ")?;
        let location = match (location.rfind('('), location.rfind(')')) {
            (Some(open), Some(close)) if open < close => &location[open + 1..close],
            _ => location,
        };

        let mut parts = location.rsplit(':');
        let last = parts.next()?;
        let before = parts.next()?;
        match (is_number(before), is_number(last)) {
            (true, true) => Some(before.to_string()),
            (false, true) => Some(last.to_string()),
            _ => None,
        }
    })
}

fn coerce<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> Option<String> {
    match value.get::<Coerced<String>>() {
        Ok(Coerced(text)) => Some(text),
        Err(error) => {
            clear_pending(ctx, &error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::js::evaluator::{EvalFailure, evaluate};
    use rquickjs::{Context, Runtime};

    fn diagnose(source: &str) -> Diagnostic {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        let source = source.to_string();
        context.with(move |ctx| match evaluate(&ctx, &source, "test.js") {
            Err(EvalFailure::Exception(exception)) => extract(&ctx, exception),
            _ => panic!("expected {:?} to throw", source),
        })
    }

    #[test]
    fn test_error_object() {
        let diagnostic = diagnose("throw new Error('boom')");
        assert_eq!(diagnostic.file, "test.js");
        assert_eq!(diagnostic.message, "Error: boom");
        assert!(diagnostic.to_string().starts_with("test.js:"));
        assert!(diagnostic.to_string().ends_with(": Error: boom"));
    }

    #[test]
    fn test_error_object_reports_its_line() {
        let diagnostic = diagnose("\n\nthrow new Error('boom')");
        assert_eq!(diagnostic.line, "3");
        assert_eq!(diagnostic.to_string(), "test.js:3: Error: boom");
    }

    #[test]
    fn test_line_from_stack() {
        assert_eq!(line_from_stack("    at <eval> (eval_script:3:7)\n").as_deref(), Some("3"));
        assert_eq!(line_from_stack("    at f (lib.js:12)\n    at <eval> (main.js:2)").as_deref(), Some("12"));
        assert_eq!(line_from_stack("    at parse (native)\n    at <eval> (c:\\a.js:9:1)").as_deref(), Some("9"));
        assert_eq!(line_from_stack("    at eval_script:5:10\n").as_deref(), Some("5"));
        assert_eq!(line_from_stack(""), None);
        assert_eq!(line_from_stack("    at parse (native)"), None);
    }

    #[test]
    fn test_line_property_is_preferred() {
        let diagnostic = diagnose("throw { line: 42, toString() { return 'custom'; } }");
        assert_eq!(diagnostic.line, "42");
        assert_eq!(diagnostic.to_string(), "test.js:42: custom");
    }

    #[test]
    fn test_thrown_string_has_no_location() {
        let diagnostic = diagnose("throw 'plain failure'");
        assert_eq!(diagnostic.to_string(), ":: plain failure");
    }

    #[test]
    fn test_throwing_getters_degrade_to_empty() {
        let diagnostic = diagnose(
            "throw Object.freeze({ get sourceURL() { throw 1; }, get fileName() { throw 2; }, \
             get line() { throw 3; }, get lineNumber() { throw 4; }, toString() { throw 5; } })",
        );
        assert_eq!(diagnostic, Diagnostic::default());
        assert_eq!(diagnostic.to_string(), ":: ");
    }

    #[test]
    fn test_syntax_error() {
        let diagnostic = diagnose("function (");
        assert_eq!(diagnostic.file, "test.js");
        assert!(diagnostic.message.starts_with("SyntaxError"));
    }
}
