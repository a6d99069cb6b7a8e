//! `leadscan scan`: digitize one card or form from image files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use leadscan_logging::spawn_event_logger;
use leadscan_media::{is_model_supported, read_image_file, NoCamera};
use leadscan_session::{ScanController, ScanOutcome, ScanStatus, SessionError};
use tokio::sync::broadcast;

use crate::context::AppContext;
use crate::records_cmd::render_detail;
use crate::terminal_output::{note_error, note_info, note_success, note_warn};

/// Scan `files`. Together they are the sides or pages of one source, unless
/// `each` is set, in which case every file becomes its own record.
pub async fn run(ctx: &mut AppContext, files: Vec<PathBuf>, each: bool) -> Result<()> {
    if files.is_empty() {
        bail!("{}", SessionError::EmptyCapture);
    }
    ctx.workspace.records_mut()?;
    let extractor = ctx.extractor()?;
    let (tx, rx) = broadcast::channel(64);
    let logger = spawn_event_logger(rx);
    let mut controller = ScanController::new(Arc::new(NoCamera), extractor)
        .with_success_delay(ctx.config.success_delay())
        .with_events(tx);

    let batches: Vec<Vec<PathBuf>> = if each {
        files.into_iter().map(|f| vec![f]).collect()
    } else {
        vec![files]
    };

    let mut created = 0usize;
    let total = batches.len();
    for (i, batch) in batches.into_iter().enumerate() {
        if i > 0 {
            controller.settle().await;
        }
        if scan_batch(ctx, &mut controller, &batch).await? {
            created += 1;
        }
    }

    drop(controller);
    let _ = logger.await;
    if total > 1 {
        note_info(&format!("{created} of {total} scans stored"));
    }
    if created == 0 {
        bail!("No records were created");
    }
    Ok(())
}

async fn scan_batch(
    ctx: &mut AppContext,
    controller: &mut ScanController,
    files: &[PathBuf],
) -> Result<bool> {
    controller.start_scan()?;
    if !controller.has_camera() {
        note_info("No camera available; using uploaded images");
    }
    for path in files {
        match read_image_file(path).await {
            Ok(image) => {
                if !is_model_supported(&image.mime_type) {
                    note_warn(&format!(
                        "{} is {}; the model may not accept it",
                        path.display(),
                        image.mime_type
                    ));
                }
                controller.add_image(image)?
            }
            Err(e) => note_warn(&format!("Skipping {}: {e}", path.display())),
        }
    }
    if controller.image_count() == 0 {
        controller.cancel()?;
        note_error("No readable images; scan cancelled");
        return Ok(false);
    }

    note_info(&format!("Extracting from {} image(s)...", controller.image_count()));
    let records = ctx.workspace.records_mut()?;
    match controller.finalize(records).await? {
        ScanOutcome::Created(record) => {
            note_success(&format!("Saved {record}"));
            if record.fields.is_blank() {
                note_warn("Nothing could be read from the image(s); the record is empty");
            }
            print!("{}", render_detail(&record));
            Ok(true)
        }
        ScanOutcome::Failed(err) => {
            if let ScanStatus::Error { message } = controller.status() {
                note_error(message);
            }
            tracing::debug!(error = %err, "Scan failed");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscan_config::LeadScanConfig;

    #[tokio::test]
    async fn signed_out_scan_fails_before_any_extraction_setup() {
        let dir = std::env::temp_dir().join(format!("leadscan-scan-{}", uuid::Uuid::new_v4()));
        // An unknown provider would fail extractor setup if it were reached.
        let config: LeadScanConfig =
            serde_yaml::from_str("extraction:\n  provider: nobody\n").unwrap();
        let mut ctx = AppContext::with_config(dir.clone(), config).unwrap();

        let err = run(&mut ctx, vec![dir.join("card.jpg")], false).await.unwrap_err();
        assert_eq!(err.to_string(), "not signed in");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
