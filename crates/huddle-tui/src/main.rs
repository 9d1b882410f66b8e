//! Huddle TUI entry point.

use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};

use clap::Parser;
use huddle_app::{Environment, Runtime, Settings, SystemEnv, settings};
use huddle_client::{ConnectionConfig, DEFAULT_SERVER_URL, transport};
use huddle_harness::{SimHub, spawn_loopback};
use huddle_tui::{FileSettings, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Huddle terminal client
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Terminal client for Huddle chat servers")]
#[command(version)]
struct Args {
    /// WebSocket endpoint, e.g. ws://localhost:8081/ws
    #[arg(short, long, env = "HUDDLE_SERVER_URL")]
    server: Option<String>,

    /// Settings file (defaults to the per-user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Use this identity and remember it
    #[arg(short, long)]
    username: Option<String>,

    /// Run against an in-process simulated server
    #[arg(long)]
    simulate: bool,

    /// Write logs to this file. Nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(filter)
            .init();
    }

    let settings_path = match args.settings {
        Some(path) => path,
        None => FileSettings::default_path()?,
    };
    let mut settings = FileSettings::load(settings_path)?;
    if let Some(username) = &args.username {
        settings.set(settings::USERNAME, username)?;
    }

    let url = args
        .server
        .or_else(|| settings.get(settings::SERVER_URL))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_owned());
    let config = ConnectionConfig::with_url(url);

    tracing::info!(
        url = %config.url,
        simulate = args.simulate,
        settings = %settings.path().display(),
        "Huddle starting"
    );

    let env = SystemEnv;
    let connection = if args.simulate {
        spawn_loopback(SimHub::acme(env.local_now()), config)
    } else {
        transport::spawn(config)
    };

    let driver = TerminalDriver::new(settings::username(&settings))?;
    Runtime::new(driver, settings, env, connection).run().await?;

    tracing::info!("Huddle stopped");
    Ok(())
}
