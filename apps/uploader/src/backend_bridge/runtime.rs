//! Worker thread hosting the Tokio runtime; one task per upload cycle.

use std::{path::Path, sync::Arc, thread};

use client_core::{run_upload_cycle, DataUrl, ProcessingClient};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, client: ProcessingClient) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = Arc::new(client);
            let events = spawn_event_forwarder(ui_tx);
            tracing::info!(base_url = client.config().base_url(), "backend worker ready");

            while let Ok(cmd) = cmd_rx.recv() {
                let events = events.clone();
                match cmd {
                    BackendCommand::ProcessFile { cycle, path } => {
                        let client = Arc::clone(&client);
                        // Overlapping cycles run independently; the UI discards stale ones.
                        tokio::spawn(async move {
                            run_upload_cycle(client.as_ref(), cycle, &path, |event| {
                                if events.send(UiEvent::Upload(event)).is_err() {
                                    tracing::debug!(cycle = cycle.0, "ui closed; dropping upload event");
                                }
                            })
                            .await;
                        });
                    }
                    BackendCommand::SaveDownload {
                        output_path,
                        destination,
                    } => {
                        let client = Arc::clone(&client);
                        tokio::spawn(async move {
                            let event = match client.download(&output_path).await {
                                Ok(bytes) => write_result(&destination, bytes).await,
                                Err(err) => UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Download,
                                    err.to_string(),
                                )),
                            };
                            let _ = events.send(event);
                        });
                    }
                    BackendCommand::SavePreview {
                        image_data,
                        destination,
                    } => {
                        tokio::spawn(async move {
                            let _ = events.send(save_preview(&image_data, &destination).await);
                        });
                    }
                }
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}

/// Hands events to the UI queue from a blocking thread, in order, so runtime
/// workers never block on a full UI queue.
fn spawn_event_forwarder(ui_tx: Sender<UiEvent>) -> UnboundedSender<UiEvent> {
    let (events_tx, mut events_rx) = unbounded_channel::<UiEvent>();
    tokio::task::spawn_blocking(move || {
        while let Some(event) = events_rx.blocking_recv() {
            if ui_tx.send(event).is_err() {
                tracing::debug!("ui queue disconnected; stopping event forwarder");
                break;
            }
        }
    });
    events_tx
}

async fn save_preview(image_data: &str, destination: &Path) -> UiEvent {
    match DataUrl::parse(image_data).and_then(|url| url.decode()) {
        Ok(bytes) => write_result(destination, bytes).await,
        Err(err) => UiEvent::Error(UiError::from_message(
            UiErrorContext::SaveResult,
            format!("processed image is not an embedded data URL: {err}"),
        )),
    }
}

async fn write_result(destination: &Path, bytes: Vec<u8>) -> UiEvent {
    match tokio::fs::write(destination, bytes).await {
        Ok(()) => UiEvent::Info(format!(
            "Saved processed image to {}",
            destination.display()
        )),
        Err(err) => UiEvent::Error(UiError::from_message(
            UiErrorContext::SaveResult,
            format!("Failed to save {}: {err}", destination.display()),
        )),
    }
}
