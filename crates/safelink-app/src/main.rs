//! Safe Link Checker - routes outbound links through a safe check page.
//!
//! This binary runs the HTTP host (content filter, settings page, save
//! endpoint) and offers offline commands for rewriting documents and
//! editing the stored settings.

mod commands;

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use safelink_server::{Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SITE_HOST};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Safe Link Checker - route external links through a safe check redirector
#[derive(Parser, Debug)]
#[command(name = "safelink", version, about)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Database file (defaults to the app data directory)
    #[arg(long, global = true, env = "SAFELINK_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP host
    Serve {
        /// Address to bind to
        #[arg(long, env = "SAFELINK_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind to
        #[arg(long, env = "SAFELINK_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Host name whose links are internal
        #[arg(long, env = "SAFELINK_SITE_HOST", default_value = DEFAULT_SITE_HOST)]
        site_host: String,
    },

    /// Rewrite an HTML document with the stored settings and print it
    Rewrite {
        /// Input file (reads stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Host name whose links are internal
        #[arg(long, env = "SAFELINK_SITE_HOST", default_value = DEFAULT_SITE_HOST)]
        site_host: String,
    },

    /// Inspect or change the stored settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the current settings
    Show,
    /// Set the safe check URL
    SetUrl { url: String },
    /// Set the comma-separated whitelist
    SetWhitelist { list: String },
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "safelink", "safelink").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging.
///
/// Console output always goes to stderr so `rewrite` can print the document
/// on stdout. The server additionally logs to a daily rotated file.
fn init_logging(args: &Args, to_file: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "safelink={level},safelink_core={level},safelink_server={level},safelink_storage={level},warn",
            level = log_level
        ))
    });

    if to_file {
        if let Some(log_dir) = logs_dir() {
            if std::fs::create_dir_all(&log_dir).is_ok() {
                let file_appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .max_log_files(5)
                    .filename_prefix("safelink")
                    .filename_suffix("log")
                    .build(&log_dir)
                    .ok();

                if let Some(appender) = file_appender {
                    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stderr))
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();

                    tracing::info!("Logging to {:?}", log_dir);
                    return Some(guard);
                }
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if to_file {
        tracing::warn!("File logging unavailable, using console only");
    }
    None
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

async fn serve(args: &Args, host: &str, port: u16, site_host: &str) -> Result<()> {
    let db = commands::open_database(args.db.as_deref())?;
    let config = ServerConfig::default()
        .with_host(host)
        .with_port(port)
        .with_site_host(site_host);

    tracing::info!(site_host, "Serving content filter");
    let server = Server::with_database(config, db)?;
    server.run().await?;
    Ok(())
}

fn run_config(args: &Args, action: &ConfigCommand) -> Result<()> {
    let db = commands::open_database(args.db.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match action {
        ConfigCommand::Show => {
            writeln!(stdout, "{}", commands::show_config(&db)?)?;
        }
        ConfigCommand::SetUrl { url } => {
            let stored = commands::set_redirect_url(&db, url)?;
            writeln!(stdout, "Safe check URL set to {}", stored)?;
        }
        ConfigCommand::SetWhitelist { list } => {
            let entries = commands::set_whitelist(&db, list)?;
            writeln!(stdout, "Whitelist set ({} entries)", entries.len())?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args, matches!(args.command, Command::Serve { .. }));

    match &args.command {
        Command::Serve {
            host,
            port,
            site_host,
        } => serve(&args, host, *port, site_host).await,
        Command::Rewrite { input, site_host } => {
            let db = commands::open_database(args.db.as_deref())?;
            let document = read_input(input.as_ref())?;
            let report = commands::rewrite_document(&db, &document, site_host)?;
            std::io::stdout()
                .write_all(report.content.as_bytes())
                .context("failed to write output")?;
            Ok(())
        }
        Command::Config { action } => run_config(&args, action),
    }
}
