//! JavaScript bindings for host APIs
//!
//! Only the persistent context receives bindings; disposable contexts start
//! with the language's standard globals and nothing else.

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::object::Property;
use rquickjs::{Ctx, Function, Object};

use tracing::debug;

use crate::api::{ConsoleApi, ConsoleLevel};

/// Methods installed on the `console` object
const CONSOLE_METHODS: &[&str] = &["log", "info", "warn", "error", "debug"];

/// Global function printing like `console.log`
const PRINT_FUNCTION: &str = "print";

/// Define the root object on the global object
///
/// The property is read-only and cannot be deleted, so scripts can add to
/// the root object but never replace it.
pub fn setup_root_object(ctx: &Ctx<'_>, name: &str) -> rquickjs::Result<()> {
    let root = Object::new(ctx.clone())?;
    ctx.globals().prop(name, Property::from(root))?;
    Ok(())
}

/// Publish a JSON value as `<root>.<name>`
pub fn set_host_value(
    ctx: &Ctx<'_>,
    root_name: &str,
    name: &str,
    value: &serde_json::Value,
) -> rquickjs::Result<()> {
    let root: Object = ctx.globals().get(root_name)?;
    let js_value = ctx.json_parse(value.to_string())?;
    root.set(name, js_value)
}

fn console_function<'js>(ctx: &Ctx<'js>, console: ConsoleApi, level: ConsoleLevel) -> rquickjs::Result<Function<'js>> {
    Function::new(ctx.clone(), move |args: Rest<Coerced<String>>| {
        let parts: Vec<String> = args.0.into_iter().map(|Coerced(text)| text).collect();
        console.write(level, &ConsoleApi::join_args(&parts));
    })
}

/// Setup console API in the JavaScript context
///
/// Provides console.log/info/warn/error/debug and a global `print`. All accept
/// variadic arguments, converted to strings and joined with spaces.
pub fn setup_console_api(ctx: &Ctx<'_>, console: ConsoleApi) -> rquickjs::Result<()> {
    let globals = ctx.globals();
    let console_object = Object::new(ctx.clone())?;

    for method in CONSOLE_METHODS {
        let level = ConsoleLevel::from_method(method).unwrap_or(ConsoleLevel::Info);
        console_object.set(*method, console_function(ctx, console.clone(), level)?)?;
    }

    let print_level = ConsoleLevel::from_method(PRINT_FUNCTION).unwrap_or(ConsoleLevel::Info);
    debug!("Console API installed for {} context", console.context());

    globals.set("console", console_object)?;
    globals.set(PRINT_FUNCTION, console_function(ctx, console, print_level)?)?;

    Ok(())
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

    #[test]
    fn test_root_object_is_read_only() {
        with_context(|ctx| {
            setup_root_object(&ctx, "host").unwrap();

            let deleted: bool = ctx
                .eval("(() => { try { return delete globalThis.host; } catch (e) { return false; } })()")
                .unwrap();
            let kind: String = ctx.eval("try { host = 1; } catch (e) {} typeof host").unwrap();

            assert!(!deleted);
            assert_eq!(kind, "object");
        });
    }

    #[test]
    fn test_host_value_is_visible() {
        with_context(|ctx| {
            setup_root_object(&ctx, "host").unwrap();
            set_host_value(&ctx, "host", "limits", &serde_json::json!({ "tabs": 4, "names": ["a"] })).unwrap();

            let tabs: i32 = ctx.eval("host.limits.tabs").unwrap();
            let name: String = ctx.eval("host.limits.names[0]").unwrap();
            assert_eq!(tabs, 4);
            assert_eq!(name, "a");
        });
    }

    #[test]
    fn test_console_functions_exist() {
        with_context(|ctx| {
            setup_console_api(&ctx, ConsoleApi::new("js", "persistent")).unwrap();

            let kinds: String = ctx
                .eval("[console.log, console.info, console.warn, console.error, console.debug, print].map(f => typeof f).join()")
                .unwrap();
            assert_eq!(kinds, "function,function,function,function,function,function");

            let result: rquickjs::Value = ctx.eval("console.log('value', 1, { a: 1 }); print('done')").unwrap();
            assert!(result.is_undefined());
        });
    }
}
