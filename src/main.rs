mod board;
mod calibrate;
mod config;
mod controller;
mod dispatch;
mod error;
mod input;
mod server;
mod storage;
mod ui;

use anyhow::{Context, Result};
use config::{RunMode, Settings};
use controller::Clicker;
use dispatch::EnigoInjector;
use input::RdevPointerSource;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = config::command().get_matches();
    let settings = Settings::from_matches(&matches);
    init_logging();

    info!("Column clicker starting");
    let clicker = Clicker::new(
        &settings,
        Arc::new(EnigoInjector),
        Arc::new(RdevPointerSource::new()),
    );

    if settings.load_on_start {
        match clicker.load() {
            Ok(set) => info!(columns = ?set.columns(), "Loaded saved calibration"),
            Err(e) => warn!(error = %e, "Starting uncalibrated"),
        }
    }

    match settings.mode {
        RunMode::Headless => {
            println!("Press Ctrl+C to stop.");
            let listener = server::bind(settings.bind_addr()?).await?;
            server::serve(listener, clicker, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
        }
        RunMode::MenuOnly => run_menu(clicker).await,
        RunMode::Both => {
            let listener = server::bind(settings.bind_addr()?).await?;
            let (stop_tx, stop_rx) = oneshot::channel::<()>();
            let bridge = tokio::spawn(server::serve(listener, clicker.clone(), async move {
                let _ = stop_rx.await;
            }));

            let menu_result = run_menu(clicker).await;
            let _ = stop_tx.send(());
            bridge.await.context("Extension bridge task panicked")??;
            menu_result
        }
    }
}

async fn run_menu(clicker: Clicker) -> Result<()> {
    tokio::task::spawn_blocking(move || ui::run_menu(&clicker))
        .await
        .context("Menu thread panicked")?
}
