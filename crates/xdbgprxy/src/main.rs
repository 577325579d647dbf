//! `XdbgPrxy`
//!
//! Sits between PHP (Xdebug) and the IDE, relaying every debug connection
//! to a single IDE listener.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use xdbgprxy::banner::print_banner;
use xdbgprxy::console::Console;
use xdbgprxy::preflight::{self, PreflightError};
use xdbgprxy::server::ProxyServer;
use xdbgprxy_core::config::resolve_config;
use xdbgprxy_core::tracing_init::{default_filter, init_tracing};
use xdbgprxy_core::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "xdbgprxy")]
#[command(version, about = "XdbgPrxy - Xdebug proxy between PHP and your IDE")]
struct Args {
    /// IP to your IDE
    #[arg(long, env = "XDBGPRXY_IDE_HOST")]
    ide_host: Option<String>,

    /// Port to your IDE [default: 9003]
    #[arg(long, env = "XDBGPRXY_IDE_PORT")]
    ide_port: Option<u16>,

    /// IP to listen on [default: 127.0.0.1]
    #[arg(long, env = "XDBGPRXY_LISTEN_HOST")]
    listen_host: Option<String>,

    /// Port to listen on [default: 9003]
    #[arg(long, env = "XDBGPRXY_LISTEN_PORT")]
    listen_port: Option<u16>,

    /// Print full PHP -> IDE payloads instead of byte counts.
    #[arg(long, env = "XDBGPRXY_VERBOSE")]
    verbose: bool,

    /// No ANSI color output
    #[arg(long, env = "XDBGPRXY_NO_COLOR")]
    no_color: bool,

    /// Relay one connection at a time instead of one task per connection.
    #[arg(long, env = "XDBGPRXY_SEQUENTIAL")]
    sequential: bool,

    /// Path to a JSON settings file.
    #[arg(long, env = "XDBGPRXY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter for diagnostics on stderr (e.g. "info", "debug").
    #[arg(long, default_value = "warn", env = "XDBGPRXY_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "XDBGPRXY_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ide_host: self.ide_host.clone(),
            ide_port: self.ide_port,
            listen_host: self.listen_host.clone(),
            listen_port: self.listen_port,
            verbose: self.verbose,
            no_color: self.no_color,
            sequential: self.sequential,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&default_filter(&args.log_level), args.log_json);

    let config = resolve_config(args.config.as_deref(), args.overrides())?;
    let console = Console::new(&config);

    print_banner(&console, env!("CARGO_PKG_VERSION"));
    info!(
        version = env!("CARGO_PKG_VERSION"),
        ide = %config.ide,
        listen = %config.listen,
        sequential = config.sequential,
        "Starting xdbgprxy"
    );

    console.status(&format!(
        "+ Checking if connection to the IDE can be made at {}",
        config.ide
    ));
    if let Err(e) = preflight::check_ide_reachable(&config.ide).await {
        report_preflight(&console, &e);
        return Ok(ExitCode::FAILURE);
    }

    console.status(&format!(
        "+ Checking if listening port is available at {}",
        config.listen
    ));
    let listener = match preflight::bind_listener(&config.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            report_preflight(&console, &e);
            return Ok(ExitCode::FAILURE);
        }
    };

    for line in preflight::php_ini_hint(&config.listen) {
        console.status(&line);
    }

    let server = ProxyServer::new(listener, &config, console);
    tokio::select! {
        () = server.serve() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Proxy stopped");
    Ok(ExitCode::SUCCESS)
}

/// Report a fatal startup check on the console; the caller exits non-zero.
fn report_preflight(console: &Console, error: &PreflightError) {
    console.error(&format!("! {error}"));
    console.error(&format!("  {}", error.guidance()));
}
