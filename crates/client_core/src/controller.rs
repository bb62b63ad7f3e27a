//! Upload cycle state machine and the single state -> UI region mapping.

use std::path::Path;

use shared::domain::{CycleId, ProcessingResult};
use tracing::{debug, info};

use crate::{config::ApiConfig, data_url::DataUrl, error::ProcessError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Previewing {
        preview: DataUrl,
    },
    Loading {
        preview: DataUrl,
    },
    Success {
        preview: DataUrl,
        result: ProcessingResult,
        download_url: String,
    },
    Failed {
        preview: Option<DataUrl>,
        message: String,
    },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Previewing { .. } => "previewing",
            Self::Loading { .. } => "loading",
            Self::Success { .. } => "success",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn preview(&self) -> Option<&DataUrl> {
        match self {
            Self::Idle => None,
            Self::Previewing { preview }
            | Self::Loading { preview }
            | Self::Success { preview, .. } => Some(preview),
            Self::Failed { preview, .. } => preview.as_ref(),
        }
    }
}

/// Progress reported by an upload cycle, tagged with the cycle that produced it.
#[derive(Debug)]
pub enum UploadEvent {
    PreviewReady {
        cycle: CycleId,
        preview: DataUrl,
    },
    ReadFailed {
        cycle: CycleId,
        error: ProcessError,
    },
    /// Emitted right before the processing request is sent.
    Submitted {
        cycle: CycleId,
    },
    Finished {
        cycle: CycleId,
        outcome: Result<ProcessingResult, ProcessError>,
    },
}

impl UploadEvent {
    pub fn cycle(&self) -> CycleId {
        match self {
            Self::PreviewReady { cycle, .. }
            | Self::ReadFailed { cycle, .. }
            | Self::Submitted { cycle }
            | Self::Finished { cycle, .. } => *cycle,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::PreviewReady { .. } => "preview_ready",
            Self::ReadFailed { .. } => "read_failed",
            Self::Submitted { .. } => "submitted",
            Self::Finished { .. } => "finished",
        }
    }
}

/// What each UI region shows; `None` means hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionView {
    pub original_preview: Option<String>,
    pub loading: bool,
    pub processed_image: Option<String>,
    pub download_link: Option<String>,
    pub error_message: Option<String>,
}

pub fn render(state: &UploadState) -> RegionView {
    match state {
        UploadState::Idle => RegionView::default(),
        UploadState::Previewing { preview } => RegionView {
            original_preview: Some(preview.to_string()),
            ..RegionView::default()
        },
        UploadState::Loading { preview } => RegionView {
            original_preview: Some(preview.to_string()),
            loading: true,
            ..RegionView::default()
        },
        UploadState::Success {
            preview,
            result,
            download_url,
        } => RegionView {
            original_preview: Some(preview.to_string()),
            loading: false,
            processed_image: Some(result.image_data.clone()),
            download_link: Some(download_url.clone()),
            error_message: None,
        },
        UploadState::Failed { preview, message } => RegionView {
            original_preview: preview.as_ref().map(DataUrl::to_string),
            error_message: Some(message.clone()),
            ..RegionView::default()
        },
    }
}

pub struct UploadController {
    config: ApiConfig,
    state: UploadState,
    last_cycle: CycleId,
    active_cycle: Option<CycleId>,
}

impl UploadController {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            state: UploadState::Idle,
            last_cycle: CycleId(0),
            active_cycle: None,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn view(&self) -> RegionView {
        render(&self.state)
    }

    pub fn active_cycle(&self) -> Option<CycleId> {
        self.active_cycle
    }

    /// Starts a new cycle for `file`. A cancelled picker (`None`) changes nothing.
    ///
    /// The visible state is left alone until the file has been read; any event
    /// from an earlier cycle is ignored from here on.
    pub fn select_file(&mut self, file: Option<&Path>) -> Option<CycleId> {
        let path = file?;
        let cycle = self.last_cycle.next();
        self.last_cycle = cycle;
        self.active_cycle = Some(cycle);
        info!(cycle = cycle.0, path = %path.display(), "upload: file selected");
        Some(cycle)
    }

    /// Applies an event; returns `false` when it was stale or out of order.
    pub fn apply(&mut self, event: UploadEvent) -> bool {
        if self.active_cycle != Some(event.cycle()) {
            debug!(
                cycle = event.cycle().0,
                active = ?self.active_cycle.map(|c| c.0),
                event = event.kind(),
                "upload: discarding event from stale cycle"
            );
            return false;
        }

        let kind = event.kind();
        let current = std::mem::take(&mut self.state);
        let (next, applied) = match (current, event) {
            (_, UploadEvent::PreviewReady { preview, .. }) => {
                (UploadState::Previewing { preview }, true)
            }
            (_, UploadEvent::ReadFailed { error, .. }) => (
                UploadState::Failed {
                    preview: None,
                    message: error.to_string(),
                },
                true,
            ),
            (UploadState::Previewing { preview }, UploadEvent::Submitted { .. }) => {
                (UploadState::Loading { preview }, true)
            }
            (
                UploadState::Loading { preview } | UploadState::Previewing { preview },
                UploadEvent::Finished { outcome, .. },
            ) => {
                let next = match outcome {
                    Ok(result) => {
                        let download_url = self.config.download_url(&result.output_path);
                        UploadState::Success {
                            preview,
                            result,
                            download_url,
                        }
                    }
                    Err(error) => UploadState::Failed {
                        preview: Some(preview),
                        message: error.to_string(),
                    },
                };
                (next, true)
            }
            (state, _) => (state, false),
        };

        if !applied {
            debug!(state = next.name(), event = kind, "upload: ignoring out-of-order event");
        }
        self.state = next;
        applied
    }
}
