//! Centralized logging for JsBridge applications
//!
//! Log lines look like `2026/01/02 10:00:00.1234  INFO #001 session: ready`.
//! Script console output carries `runtime_type` and `context` fields and is
//! printed as `js::persistent: message` instead of its target. Logs from other
//! crates are hidden unless `JSB_LOGDEPS` asks for them.
//!
//! # Environment
//!
//! - `JSB_LOGDEPS`: Set to `1` to enable logging from external dependencies (tokio, rquickjs, ...).
//!   Default is `0` which only shows logs from JsBridge code.
//! - `RUST_LOG`: overrides the computed filter directives entirely.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = jsb_log::LogConfig::<std::fs::File>::new("jsb_cli::").with_level(tracing::Level::DEBUG);
//! jsb_log::init_logging(config)?;
//! ```

use std::fmt as std_fmt;
use std::io::Write;
use tracing::Level;
use tracing::field::Field;
use tracing_subscriber::field::Visit;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, format::Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose logs are shown when dependency logging is off
const OWN_TARGETS: &[&str] = &["jsb_cli", "jsb_runtime", "jsb_schema", "jsb_log", "js"];

/// Field extractor for the script console fields
///
/// Script console output is logged with `runtime_type` and `context` fields;
/// when both are present the formatter prints them as the event prefix.
#[derive(Default)]
pub struct FieldExtractor {
    pub runtime_type: Option<String>,
    pub context: Option<String>,
    pub message: Option<String>,
}

impl FieldExtractor {
    /// Runtime and context of a script console event
    pub fn script_source(&self) -> Option<(&str, &str)> {
        Some((self.runtime_type.as_deref()?, self.context.as_deref()?))
    }

    fn store(&mut self, field: &Field, value: String) {
        match field.name() {
            "runtime_type" => self.runtime_type = Some(value),
            "context" => self.context = Some(value),
            "message" => self.message = Some(value),
            _ => {}
        }
    }
}

impl Visit for FieldExtractor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std_fmt::Debug) {
        self.store(field, format!("{:?}", value).trim_matches('"').to_string());
    }
}

/// Event formatter shared by the stderr and file layers
#[derive(Clone)]
pub struct CustomFormatter<T> {
    timer: T,
    ansi: bool,
    app_prefix: Option<String>,
}

impl<T> CustomFormatter<T> {
    pub fn new(timer: T, ansi: bool) -> Self {
        Self {
            timer,
            ansi,
            app_prefix: None,
        }
    }

    /// Hide `prefix` (e.g. `jsb_cli::`) from the targets of the application's own events
    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.app_prefix = Some(prefix.into());
        self
    }

    /// Target shown for an event, or `None` when it should be hidden
    fn display_target<'a>(&self, target: &'a str) -> Option<&'a str> {
        let Some(prefix) = &self.app_prefix else {
            return (!target.is_empty()).then_some(target);
        };

        let app_name = prefix.trim_end_matches("::");
        if target == app_name {
            return None;
        }

        let shown = target.strip_prefix(prefix.as_str()).unwrap_or(target);
        (!shown.is_empty()).then_some(shown)
    }
}

/// ANSI escape codes, or nothing when colors are off
#[derive(Debug, Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    fn paint(self, code: &'static str) -> &'static str {
        if self.enabled { code } else { "" }
    }

    fn dim(self) -> &'static str {
        self.paint("\x1b[2m")
    }

    fn reset(self) -> &'static str {
        self.paint("\x1b[0m")
    }

    fn level(self, level: &Level) -> &'static str {
        self.paint(match *level {
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            Level::DEBUG => "\x1b[34m",
            Level::TRACE => "\x1b[35m",
        })
    }
}

/// Numeric part of the current thread id
fn thread_number() -> Option<u64> {
    let id = format!("{:?}", std::thread::current().id());
    id.strip_prefix("ThreadId(")?.strip_suffix(')')?.parse().ok()
}

impl<S, N, T> FormatEvent<S, N> for CustomFormatter<T>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    T: fmt::time::FormatTime,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std_fmt::Result {
        let metadata = event.metadata();
        let palette = Palette { enabled: self.ansi };
        let (dim, reset) = (palette.dim(), palette.reset());

        write!(writer, "{}", dim)?;
        self.timer.format_time(&mut writer)?;
        write!(
            writer,
            "{} {}{:>5}{} ",
            reset,
            palette.level(metadata.level()),
            metadata.level().as_str(),
            reset
        )?;

        if let Some(thread) = thread_number() {
            write!(writer, "#{:03} ", thread)?;
        }

        let mut fields = FieldExtractor::default();
        event.record(&mut fields);

        match fields.script_source() {
            Some((runtime_type, context)) => {
                let message = fields.message.as_deref().unwrap_or_default();
                write!(writer, "{}{}::{}{}: {}", dim, runtime_type, context, reset, message)?;
            }
            None => {
                if let Some(target) = self.display_target(metadata.target()) {
                    write!(writer, "{}{}{}: ", dim, target, reset)?;
                }
                ctx.field_format().format_fields(writer.by_ref(), event)?;
            }
        }

        writeln!(writer)
    }
}

/// Local-time timer printing `2026/01/02 10:00:00.1234`, or UTC when the offset is unknown
pub fn create_custom_timer()
-> OffsetTime<&'static [time::format_description::BorrowedFormatItem<'static>]> {
    use time::macros::format_description;

    let format =
        format_description!("[year]/[month]/[day] [hour]:[minute]:[second].[subsecond digits:4]");
    let offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    OffsetTime::new(offset, format)
}

/// Whether `JSB_LOGDEPS=1` is set
pub fn is_dependency_logging_enabled() -> bool {
    matches!(std::env::var("JSB_LOGDEPS").as_deref(), Ok("1"))
}

/// Parse a textual log level, as found in configuration files
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// `EnvFilter` directives for `level`
///
/// Without dependency logging only JsBridge targets pass; everything else is off.
pub fn build_filter_directives(level: Level, log_deps: bool) -> String {
    let level_str = level.as_str().to_ascii_lowercase();

    if log_deps {
        return level_str;
    }

    let mut directives = String::from("off");
    for target in OWN_TARGETS {
        directives.push_str(&format!(",{}={}", target, level_str));
    }
    directives
}

/// Colors are used only on a stderr terminal, and never with `NO_COLOR` or `TERM=dumb`
pub fn should_use_ansi() -> bool {
    let dumb_terminal = matches!(std::env::var("TERM").as_deref(), Ok("dumb"));
    atty::is(atty::Stream::Stderr) && std::env::var_os("NO_COLOR").is_none() && !dumb_terminal
}

/// Settings for [`init_logging`]
///
/// `W` is the sink of the optional plain-text copy of the log, usually a file.
pub struct LogConfig<W: Write + Send + 'static = std::fs::File> {
    /// Target prefix of the application's own events
    pub app_prefix: String,
    /// `None` detects colors with [`should_use_ansi`]
    pub ansi: Option<bool>,
    pub level: Level,
    pub copy_to: Option<W>,
}

impl<W: Write + Send + 'static> LogConfig<W> {
    /// Info level, detected colors and no copy
    pub fn new(app_prefix: impl Into<String>) -> Self {
        Self {
            app_prefix: app_prefix.into(),
            ansi: None,
            level: Level::INFO,
            copy_to: None,
        }
    }

    pub fn with_ansi(self, ansi: bool) -> Self {
        Self { ansi: Some(ansi), ..self }
    }

    pub fn with_level(self, level: Level) -> Self {
        Self { level, ..self }
    }

    pub fn with_log_file(self, file: W) -> Self {
        Self { copy_to: Some(file), ..self }
    }
}

/// Install the global subscriber
///
/// Log lines go to stderr so that evaluation results printed on stdout stay
/// machine readable. `RUST_LOG`, when set, replaces the computed directives.
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init_logging<W: Write + Send + 'static>(config: LogConfig<W>) -> Result<(), Box<dyn std::error::Error>> {
    let LogConfig { app_prefix, ansi, level, copy_to } = config;
    let ansi = ansi.unwrap_or_else(should_use_ansi);
    let formatter = CustomFormatter::new(create_custom_timer(), false).with_strip_prefix(app_prefix);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(build_filter_directives(level, is_dependency_logging_enabled()))
    });

    let terminal = fmt::layer()
        .event_format(CustomFormatter { ansi, ..formatter.clone() })
        .with_ansi(ansi)
        .with_writer(std::io::stderr);
    let copy = copy_to.map(|sink| fmt::layer().event_format(formatter).with_ansi(false).with_writer(std::sync::Mutex::new(sink)));

    tracing_subscriber::registry().with(filter).with(terminal).with(copy).try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_without_deps() {
        let directives = build_filter_directives(Level::DEBUG, false);
        assert!(directives.starts_with("off,"));
        assert!(directives.contains("jsb_runtime=debug"));
        assert!(directives.contains("js=debug"));
    }

    #[test]
    fn test_filter_directives_with_deps() {
        assert_eq!(build_filter_directives(Level::WARN, true), "warn");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Some(Level::TRACE));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_script_source_needs_both_fields() {
        let mut fields = FieldExtractor {
            runtime_type: Some("js".to_string()),
            ..FieldExtractor::default()
        };
        assert_eq!(fields.script_source(), None);

        fields.context = Some("persistent".to_string());
        assert_eq!(fields.script_source(), Some(("js", "persistent")));
    }

    #[test]
    fn test_palette_without_colors_is_empty() {
        let palette = Palette { enabled: false };
        assert_eq!(palette.dim(), "");
        assert_eq!(palette.level(&Level::ERROR), "");

        let colored = Palette { enabled: true };
        assert_eq!(colored.level(&Level::WARN), "\x1b[33m");
    }

    #[test]
    fn test_thread_number() {
        assert!(thread_number().is_some());
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::new("jsb_cli::")
            .with_level(Level::TRACE)
            .with_ansi(false)
            .with_log_file(Vec::<u8>::new());
        assert_eq!(config.app_prefix, "jsb_cli::");
        assert_eq!(config.level, Level::TRACE);
        assert_eq!(config.ansi, Some(false));
        assert!(config.copy_to.is_some());
    }

    #[test]
    fn test_display_target_strips_prefix() {
        let formatter = CustomFormatter::new((), false).with_strip_prefix("jsb_cli::");
        assert_eq!(formatter.display_target("jsb_cli::session"), Some("session"));
        assert_eq!(formatter.display_target("jsb_cli"), None);
        assert_eq!(formatter.display_target("jsb_runtime::bridge"), Some("jsb_runtime::bridge"));
    }
}
