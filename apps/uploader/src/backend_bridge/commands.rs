//! Backend commands queued from UI to backend worker.

use shared::domain::CycleId;
use std::path::PathBuf;

pub enum BackendCommand {
    /// Read `path` and submit it; events are tagged with `cycle`.
    ProcessFile { cycle: CycleId, path: PathBuf },
    SaveDownload {
        output_path: String,
        destination: PathBuf,
    },
    /// Write the decoded `imageData` returned by the server to `destination`.
    SavePreview {
        image_data: String,
        destination: PathBuf,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProcessFile { .. } => "process_file",
            Self::SaveDownload { .. } => "save_download",
            Self::SavePreview { .. } => "save_preview",
        }
    }
}
