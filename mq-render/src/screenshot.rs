use std::io::Cursor;
use std::path::PathBuf;

use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, ScreenshotCaptured, save_to_disk};
use crossbeam::channel::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("captured frame could not be converted: {0}")]
    Convert(String),
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Save the next rendered frame of the primary window to `path`.
pub fn capture_to_disk(commands: &mut Commands, path: PathBuf) {
    info!("saving screenshot to {:?}", path);
    commands
        .spawn(Screenshot::primary_window())
        .observe(save_to_disk(path));
}

/// Encode the next rendered frame as PNG and hand the bytes to `reply`.
pub fn capture_png_bytes(commands: &mut Commands, reply: Sender<Vec<u8>>) {
    commands.spawn(Screenshot::primary_window()).observe(
        move |trigger: Trigger<ScreenshotCaptured>| match encode_png(trigger.event().0.clone()) {
            Ok(bytes) => {
                if reply.send(bytes).is_err() {
                    warn!("screenshot requester went away before the capture finished");
                }
            }
            Err(err) => warn!("screenshot capture failed: {err}"),
        },
    );
}

pub fn encode_png(frame: Image) -> Result<Vec<u8>, ScreenshotError> {
    let dynamic = frame
        .try_into_dynamic()
        .map_err(|err| ScreenshotError::Convert(err.to_string()))?;
    let mut bytes = Vec::new();
    dynamic.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}
