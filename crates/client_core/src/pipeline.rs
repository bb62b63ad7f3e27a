use std::path::Path;

use shared::domain::CycleId;
use tracing::{info, warn};

use crate::{controller::UploadEvent, data_url::read_data_url, ImageProcessor};

/// Runs one read -> submit cycle, reporting progress through `emit`.
///
/// `PreviewReady` and `Submitted` are always emitted before the processor is
/// called; a failed read ends the cycle with `ReadFailed` and no request.
pub async fn run_upload_cycle<P, F>(processor: &P, cycle: CycleId, path: &Path, mut emit: F)
where
    P: ImageProcessor + ?Sized,
    F: FnMut(UploadEvent) + Send,
{
    let preview = match read_data_url(path).await {
        Ok(preview) => preview,
        Err(error) => {
            warn!(cycle = cycle.0, %error, "upload: failed to read selected file");
            emit(UploadEvent::ReadFailed { cycle, error });
            return;
        }
    };

    if !preview.is_image() {
        warn!(
            cycle = cycle.0,
            mime = preview.mime_type(),
            "upload: selected file does not look like an image; server may reject it"
        );
    }

    emit(UploadEvent::PreviewReady {
        cycle,
        preview: preview.clone(),
    });
    emit(UploadEvent::Submitted { cycle });

    let outcome = processor.process(&preview).await;
    match &outcome {
        Ok(result) => info!(cycle = cycle.0, output_path = %result.output_path, "upload: cycle succeeded"),
        Err(error) => warn!(cycle = cycle.0, %error, "upload: cycle failed"),
    }
    emit(UploadEvent::Finished { cycle, outcome });
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
