//! # Magnet CLI Entry Point
//!
//! Main binary for the Magnet script-execution gateway.
//!
//! ## Usage
//!
//! ```bash
//! # Serve scripts from a document root
//! magnet serve -r ./site -b 0.0.0.0:8080
//!
//! # Expose values to every script through the base environment
//! magnet serve -r ./site -g SITE_NAME=example -g MOTD="hello"
//!
//! # Run a single script and print its output (for piping)
//! magnet run ./site/hello.rhai
//! ```
//!
//! Each request maps its URL path to a script under the document root. The
//! script's compiled form is cached and reused until the file's modification
//! time changes; its `print` output becomes the response body.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use argh::FromArgs;

use magnet_common::OutputSink;
use magnet_server::{BaseEnv, ExecLimits, Gateway, GatewayRouter, HttpServer};

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// Magnet - request-time script-execution gateway
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Run(RunArgs),
}

/// Arguments for the gateway daemon.
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// serve scripts from a document root over HTTP
struct ServeArgs {
    /// document root containing the scripts
    ///
    /// URL paths resolve relative to this directory; requests cannot
    /// escape it. Defaults to the current directory.
    #[argh(option, short = 'r', default = "\".\".into()")]
    root: PathBuf,

    /// address to bind the HTTP server to
    #[argh(option, short = 'b', default = "\"0.0.0.0:8080\".into()")]
    bind: String,

    /// script served for directory requests
    #[argh(option, long = "index", default = "\"index.rhai\".into()")]
    index: String,

    /// base-environment binding as NAME=VALUE (repeatable)
    ///
    /// Bindings are visible to every script unless shadowed; values are
    /// strings.
    #[argh(option, short = 'g', long = "global")]
    globals: Vec<String>,

    /// maximum script execution time in milliseconds
    ///
    /// Prevents a runaway script from hanging its request indefinitely.
    /// Defaults to 30000ms.
    #[argh(option, long = "max-execution-time-ms", default = "30000")]
    max_execution_time_ms: u64,

    /// optional operation budget per script execution
    ///
    /// When set, an execution is terminated after this many engine
    /// operations. Unbounded by default.
    #[argh(option, long = "max-operations")]
    max_operations: Option<u64>,
}

/// Arguments for one-shot script execution.
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
/// run a single script and print its output to stdout
struct RunArgs {
    /// path to the script to execute
    #[argh(positional)]
    script: PathBuf,

    /// base-environment binding as NAME=VALUE (repeatable)
    #[argh(option, short = 'g', long = "global")]
    globals: Vec<String>,
}

/// Parses a `NAME=VALUE` base-environment binding.
fn parse_global(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(anyhow::anyhow!(
            "invalid global binding '{}': expected NAME=VALUE",
            raw
        )),
    }
}

fn base_env_from_globals(globals: &[String]) -> Result<BaseEnv> {
    let mut base = BaseEnv::new().with_value("MAGNET_VERSION", env!("CARGO_PKG_VERSION"));
    for raw in globals {
        let (name, value) = parse_global(raw)?;
        base = base.with_value(name, value);
    }
    Ok(base)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Logging is skipped for `run` to keep stdout clean for unix tool
    // usage (piping script output to other programs).
    if !matches!(cli.command, Commands::Run(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => {
            let root = args
                .root
                .canonicalize()
                .map_err(|e| anyhow::anyhow!("invalid document root {}: {}", args.root.display(), e))?;

            tracing::info!("starting magnet gateway");
            tracing::info!("document root: {}", root.display());
            tracing::info!("maximum execution time: {}ms", args.max_execution_time_ms);

            let mut limits = ExecLimits::unbounded().with_execution_timeout(
                std::time::Duration::from_millis(args.max_execution_time_ms),
            );
            if let Some(max) = args.max_operations {
                tracing::info!("operation budget: {}", max);
                limits = limits.with_max_operations(max);
            }

            let base = base_env_from_globals(&args.globals)?
                .with_value("DOCUMENT_ROOT", root.display().to_string());

            let gateway = Arc::new(Gateway::with_limits(base, limits));
            let router = GatewayRouter::new(gateway, root).with_index(args.index);
            let server = HttpServer::new(router);

            let addr: SocketAddr = args
                .bind
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid bind address {}: {}", args.bind, e))?;
            server.run(addr).await?;

            Ok(())
        }
        Commands::Run(args) => {
            let base = base_env_from_globals(&args.globals)?;
            let gateway = Gateway::with_limits(base, ExecLimits::unbounded());

            let sink = OutputSink::new();
            match gateway.handle(&args.script, sink.clone()) {
                Ok(()) => {
                    print!("{}", sink.take());
                    Ok(())
                }
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }
}
