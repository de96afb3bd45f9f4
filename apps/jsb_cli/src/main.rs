use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{debug, error, info};

use jsb_log::{LogConfig, init_logging};
use jsb_runtime::{
    CompletionSink, ContextSelector, EvalOutcome, HeadlessPage, ScriptBridge, ScriptSource,
};
use jsb_schema::Validatable;

mod config;
use config::Config;

mod session;
use session::Session;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get default config path based on executable location
fn default_config_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe_path| {
            let stem = exe_path.file_stem()?;
            let parent = exe_path.parent()?;
            Some(parent.join(stem).with_extension("json"))
        })
        .unwrap_or_else(|| PathBuf::from("./jsb.json"))
}

/// JsBridge - run JavaScript in persistent, disposable or page contexts
#[derive(Parser, Debug)]
#[command(name = "jsb")]
#[command(version = VERSION)]
#[command(about = "Evaluate JavaScript through the script bridge", long_about = None)]
struct Args {
    /// Path to configuration file (JSON); defaults to jsb.json next to the executable
    #[arg(short, long, env = "JSB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable logging to file (jsb.log in current directory)
    #[arg(long, env = "JSB_LOG_FILE")]
    log_file: bool,

    /// Print the configuration JSON Schema and exit
    #[arg(long)]
    schema: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a script given on the command line
    Eval {
        /// Context name: persistent (global), disposable (clean) or page
        #[arg(short = 'x', long, default_value = "persistent")]
        context: String,

        /// Script source
        script: String,
    },

    /// Evaluate a script file, substituting %1, %2, ... with ARGS
    Run {
        /// Context name: persistent (global), disposable (clean) or page
        #[arg(short = 'x', long, default_value = "persistent")]
        context: String,

        /// Script file
        path: PathBuf,

        /// Positional arguments
        args: Vec<String>,
    },

    /// Read `js` and `script` commands from stdin
    Session {
        /// Attach a headless page engine for the `page` context
        #[arg(long)]
        page: bool,
    },
}

impl Command {
    fn wants_page(&self) -> bool {
        match self {
            Command::Eval { context, .. } | Command::Run { context, .. } => {
                context.parse::<ContextSelector>().ok() == Some(ContextSelector::Page)
            }
            Command::Session { page } => *page,
        }
    }
}

async fn create_bridge(config: &Config, with_page: bool) -> jsb_runtime::Result<Arc<ScriptBridge>> {
    let mut bridge = ScriptBridge::new(config.bridge.clone()).await?;
    if with_page {
        bridge = bridge.with_page(Arc::new(HeadlessPage::new().await?));
    }
    Ok(Arc::new(bridge))
}

/// Submit a single request and wait for its completion
async fn run_once(bridge: &Arc<ScriptBridge>, context: &str, source: ScriptSource) -> EvalOutcome {
    let (sink, rx) = CompletionSink::channel();
    bridge.submit_named(context, source, sink);
    let outcome = rx.await.unwrap_or(Err(jsb_runtime::BridgeError::Abandoned));
    bridge.drain_pending_jobs().await;
    outcome
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if args.schema {
        match Config::schema_json() {
            Ok(schema) => {
                println!("{}", schema);
                return;
            }
            Err(e) => {
                eprintln!("Failed to generate schema: {}", e);
                process::exit(1);
            }
        }
    }

    let Some(command) = args.command else {
        let _ = Args::command().print_help();
        process::exit(2);
    };

    // Load configuration first to get log level
    // We can't log errors yet, so we use eprintln! for early failures
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = match Config::load(&config_path, args.config.is_some()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from '{}': {}", config_path.display(), e);
            process::exit(1);
        }
    };

    let log_config = if args.log_file {
        let file = match std::fs::File::create("jsb.log") {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Unable to create jsb.log: {}", e);
                process::exit(1);
            }
        };
        LogConfig::new("jsb_cli::").with_level(config.level()).with_log_file(file)
    } else {
        LogConfig::<std::fs::File>::new("jsb_cli::").with_level(config.level())
    };

    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    debug!("JsBridge v{}", VERSION);
    debug!("Configuration: {}", config_path.display());
    debug!("  Log Level: {}", config.log_level);
    debug!("  Root Object: {}", config.bridge.root_object);

    let bridge = match create_bridge(&config, command.wants_page()).await {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Failed to start script bridge: {}", e);
            process::exit(1);
        }
    };

    let outcome = match command {
        Command::Eval { context, script } => run_once(&bridge, &context, ScriptSource::Inline(script)).await,
        Command::Run { context, path, args } => {
            run_once(&bridge, &context, ScriptSource::File { path, args }).await
        }
        Command::Session { .. } => {
            Session::new(Arc::clone(&bridge))
                .run(BufReader::new(tokio::io::stdin()))
                .await;
            info!("Session closed");
            return;
        }
    };

    match outcome {
        Ok(Some(text)) => println!("{}", text),
        Ok(None) => {}
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
