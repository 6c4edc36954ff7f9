use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Bytes between progress bar refreshes.
pub const PROGRESS_INTERVAL: u64 = 64 * 1024;

pub fn create_progress_bar(
    multi: Option<&MultiProgress>,
    message: &str,
) -> Result<Option<ProgressBar>> {
    let Some(multi) = multi else {
        return Ok(None);
    };

    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} {msg} {bytes} | elapsed: {elapsed_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(message.to_string());

    Ok(Some(pb))
}

pub fn update_progress(pb: &Option<ProgressBar>, bytes: u64) {
    if let Some(pb) = pb {
        if bytes.is_multiple_of(PROGRESS_INTERVAL) {
            pb.set_position(bytes);
        }
    }
}

pub fn finish_progress(pb: Option<ProgressBar>, bytes: u64) {
    if let Some(pb) = pb {
        pb.set_position(bytes);
        pb.finish_and_clear();
    }
}
