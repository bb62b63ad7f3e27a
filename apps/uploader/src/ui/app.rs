use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    path::PathBuf,
    time::Duration,
};

use client_core::{DataUrl, RegionView, UploadController, UploadState};
use crossbeam_channel::{Receiver, Sender};
use egui::TextureHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{events::UiEvent, orchestration::dispatch_backend_command};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];
const PREVIEW_MAX_DIMENSION: u32 = 1024;

#[derive(Clone)]
pub struct PreviewImage {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

/// Identity of a region's source: length plus content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceFingerprint {
    len: usize,
    hash: u64,
}

impl SourceFingerprint {
    fn of(source: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        Self {
            len: source.len(),
            hash: hasher.finish(),
        }
    }
}

/// Texture for one image region, rebuilt only when its source changes.
///
/// `revision` gates the fingerprint check so sources are only hashed after
/// the upload state changed.
#[derive(Default)]
struct PreviewSlot {
    revision: Option<u64>,
    fingerprint: Option<SourceFingerprint>,
    texture: Option<TextureHandle>,
    error: Option<String>,
}

impl PreviewSlot {
    fn sync(&mut self, ctx: &egui::Context, name: &str, revision: u64, source: Option<&str>) {
        let Some(source) = source else {
            *self = Self::default();
            return;
        };
        if self.revision == Some(revision) {
            return;
        }
        self.revision = Some(revision);

        let fingerprint = SourceFingerprint::of(source);
        if self.fingerprint == Some(fingerprint) {
            return;
        }

        self.fingerprint = Some(fingerprint);
        self.texture = None;
        self.error = None;
        match decode_data_url_image(source) {
            Ok(image) => {
                let color_image =
                    egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
                self.texture = Some(ctx.load_texture(
                    format!("{name}:{revision}"),
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
            Err(reason) => {
                tracing::warn!(region = name, "cannot render preview: {reason}");
                self.error = Some(reason);
            }
        }
    }

    fn show(&self, ui: &mut egui::Ui) {
        if let Some(texture) = &self.texture {
            let max_width = ui.available_width().clamp(120.0, 520.0);
            let mut size = texture.size_vec2();
            if size.x > max_width {
                size *= max_width / size.x;
            }
            ui.image((texture.id(), size));
        } else if let Some(reason) = &self.error {
            ui.colored_label(
                ui.visuals().warn_fg_color,
                format!("Preview unavailable: {reason}"),
            );
        }
    }
}

pub struct UploaderApp {
    controller: UploadController,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    status: String,
    selected_file: Option<PathBuf>,
    /// Bumped whenever an upload event changes the controller state.
    view_revision: u64,
    original: PreviewSlot,
    processed: PreviewSlot,
}

impl UploaderApp {
    pub fn new(
        controller: UploadController,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        let status = format!("Processing endpoint: {}", controller.config().base_url());
        Self {
            controller,
            cmd_tx,
            ui_rx,
            status,
            selected_file: None,
            view_revision: 0,
            original: PreviewSlot::default(),
            processed: PreviewSlot::default(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Upload(event) => {
                    if self.controller.apply(event) {
                        self.view_revision = self.view_revision.wrapping_add(1);
                        tracing::debug!(state = self.controller.state().name(), "upload state changed");
                    }
                }
                UiEvent::Error(err) => {
                    tracing::warn!(
                        context = ?err.context(),
                        category = ?err.category(),
                        "{}",
                        err.message()
                    );
                    self.status = err.status_line();
                }
            }
        }
    }

    fn handle_file_selection(&mut self, file: Option<PathBuf>) {
        let Some(cycle) = self.controller.select_file(file.as_deref()) else {
            return;
        };
        let Some(path) = file else {
            return;
        };
        self.selected_file = Some(path.clone());
        self.status = format!("Reading {}", path.display());
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::ProcessFile { cycle, path },
            &mut self.status,
        );
    }

    fn save_download(&mut self, output_path: &str) {
        let Some(destination) = rfd::FileDialog::new()
            .set_file_name(suggested_file_name(output_path))
            .save_file()
        else {
            return;
        };
        self.status = format!("Downloading {output_path}");
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::SaveDownload {
                output_path: output_path.to_string(),
                destination,
            },
            &mut self.status,
        );
    }

    fn save_processed_preview(&mut self, image_data: &str, output_path: &str) {
        if let Err(err) = DataUrl::parse(image_data) {
            self.status = format!("Processed image is not an embedded data URL: {err}");
            return;
        }
        let Some(destination) = rfd::FileDialog::new()
            .set_file_name(suggested_file_name(output_path))
            .save_file()
        else {
            return;
        };
        self.status = format!("Saving {}", destination.display());
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::SavePreview {
                image_data: image_data.to_string(),
                destination,
            },
            &mut self.status,
        );
    }

    fn show_regions(&mut self, ui: &mut egui::Ui, view: &RegionView) {
        let revision = self.view_revision;
        self.original
            .sync(ui.ctx(), "original", revision, view.original_preview.as_deref());
        self.processed
            .sync(ui.ctx(), "processed", revision, view.processed_image.as_deref());

        ui.columns(2, |columns| {
            if view.original_preview.is_some() {
                columns[0].heading("Original");
                self.original.show(&mut columns[0]);
            }
            if view.processed_image.is_some() {
                columns[1].heading("Processed");
                self.processed.show(&mut columns[1]);
            }
        });

        if view.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Processing image…");
            });
        }

        if let Some(message) = &view.error_message {
            ui.colored_label(ui.visuals().error_fg_color, message);
        }

        let result = match self.controller.state() {
            UploadState::Success { result, .. } => Some(result.clone()),
            _ => None,
        };
        if let (Some(link), Some(result)) = (view.download_link.as_deref(), result) {
            ui.horizontal(|ui| {
                ui.hyperlink_to("Download processed image", link);
                if ui.button("Save as…").clicked() {
                    self.save_download(&result.output_path);
                }
                if ui.button("Save preview…").clicked() {
                    self.save_processed_preview(&result.image_data, &result.output_path);
                }
            });
        }
    }
}

impl eframe::App for UploaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Image Uploader");
            ui.horizontal(|ui| {
                if ui.button("Choose image…").clicked() {
                    let picked = rfd::FileDialog::new()
                        .add_filter("Images", IMAGE_EXTENSIONS)
                        .pick_file();
                    self.handle_file_selection(picked);
                }
                if let Some(path) = &self.selected_file {
                    ui.label(path.display().to_string());
                }
            });
            ui.separator();

            let view = self.controller.view();
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_regions(ui, &view);
            });
        });

        let interval = if self.controller.view().loading {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(100)
        };
        ctx.request_repaint_after(interval);
    }
}

/// Last path segment of the server's output path, for save dialogs.
pub fn suggested_file_name(output_path: &str) -> String {
    output_path
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("processed-image")
        .to_string()
}

pub fn decode_data_url_image(source: &str) -> Result<PreviewImage, String> {
    let bytes = DataUrl::parse(source)
        .and_then(|url| url.decode())
        .map_err(|err| err.to_string())?;
    decode_preview_image(&bytes)
}

fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    // `thumbnail` also enlarges, so only call it for oversized images.
    let resized = if dynamic.width() > PREVIEW_MAX_DIMENSION || dynamic.height() > PREVIEW_MAX_DIMENSION {
        dynamic.thumbnail(PREVIEW_MAX_DIMENSION, PREVIEW_MAX_DIMENSION)
    } else {
        dynamic
    }
    .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}
