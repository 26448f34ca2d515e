use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use togglr::config::{DEFAULT_HOST, DEFAULT_PORT, ServerSettings, Settings};
use togglr::dates::parse_date;
use togglr::server::{self, AppState};
use togglr::toggl::{HttpTransport, ReportClient};

/// Serve Toggl weekly totals as Geckoboard number widgets.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// JSON settings file; overrides TOGGLR_SETTINGS.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Report on the week of this day (YYYY-MM-DD) instead of today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("togglr=info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.settings);
    settings.warn_missing();

    // The blocking client owns its own runtime and has to be built outside ours.
    let transport = HttpTransport::new()?;
    let reports = ReportClient::new(settings, Arc::new(transport));
    let mut state = AppState::new(reports);
    if let Some(date) = cli.date {
        info!(%date, "reference date pinned");
        state = state.with_fixed_date(date);
    }

    let bind = ServerSettings {
        host: cli.host,
        port: cli.port,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(state.clone(), bind))?;
    drop(runtime);

    Ok(())
}

async fn serve(state: AppState, bind: ServerSettings) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind.bind_addr()).await?;
    info!(addr = %bind.bind_addr(), "listening");

    axum::serve(listener, server::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
