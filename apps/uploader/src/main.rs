mod backend_bridge;
mod controller;
mod ui;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{config::load_settings, ApiConfig, ProcessingClient, Settings, UploadController};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::UploaderApp;

#[derive(Parser, Debug)]
#[command(about = "Send an image to the processing service and preview the result")]
struct Args {
    /// Host the client is served from; `localhost` and `127.0.0.1` select the local endpoint.
    #[arg(long)]
    origin_host: Option<String>,
    /// Processing endpoint to use regardless of the origin host.
    #[arg(long)]
    base_url: Option<String>,
    /// Give up on a processing request after this many seconds (default: wait indefinitely).
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl Args {
    fn api_config(&self, mut settings: Settings) -> ApiConfig {
        if let Some(host) = &self.origin_host {
            settings.origin_host = host.clone();
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout_secs = Some(secs);
        }
        let config = ApiConfig::from_settings(&settings);
        match &self.base_url {
            Some(base_url) => {
                let overridden = ApiConfig::new(base_url.clone());
                match config.request_timeout() {
                    Some(timeout) => overridden.with_request_timeout(timeout),
                    None => overridden,
                }
            }
            None => config,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let config = args.api_config(load_settings());
    tracing::info!(
        base_url = config.base_url(),
        timeout_secs = config.request_timeout().map(|t: Duration| t.as_secs()),
        "starting uploader"
    );
    let client = ProcessingClient::new(config.clone()).context("failed to build HTTP client")?;

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, client);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Image Uploader")
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Image Uploader",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(UploaderApp::new(
                UploadController::new(config),
                cmd_tx,
                ui_rx,
            )))
        }),
    )
    .map_err(|err| anyhow!("uploader window failed: {err}"))
}
