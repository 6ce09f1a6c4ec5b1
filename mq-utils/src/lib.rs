use std::path::{Path, PathBuf};

use bevy::prelude::Resource;
use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use thiserror::Error;

pub mod category;
pub mod config;
pub use category::{
    BodyRegion, CATEGORY_ALIASES, GarmentCategory, GarmentSlot, TargetRegion, normalize_category,
};
pub use config::{ConfigError, FitStrategy, FittingConfig, MatchPolicy, PaintMode, WindowConfig};

pub const MANNEQUIN_ASSETS_ROOT_ENV: &str = "MANNEQUIN_ASSETS_ROOT";

pub fn mannequin_assets_root() -> PathBuf {
    if let Ok(explicit) = std::env::var(MANNEQUIN_ASSETS_ROOT_ENV) {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return path;
        }
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        let sibling_assets = exe_dir.join("assets");
        if sibling_assets.exists() {
            return sibling_assets;
        }
    }

    let repo_assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("../mq-client/assets");
    if repo_assets.exists() {
        return repo_assets;
    }

    PathBuf::from("assets")
}

/// Operations the surrounding UI can issue against a running session.
#[derive(Debug)]
pub enum FittingCommand {
    WearImage {
        category: String,
        url: String,
    },
    /// `None` removes every garment.
    RemoveClothing {
        category: Option<String>,
    },
    ResetView,
    SetMannequinColor(String),
    Resize {
        width: f32,
        height: f32,
    },
    TakeScreenshot {
        path: Option<PathBuf>,
    },
    TakeScreenshotBlob {
        reply: Sender<Vec<u8>>,
    },
    SetRotationAngle(f32),
    /// Close the window and end the session.
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("mannequin session has shut down")]
pub struct SessionClosed;

/// Handle to a running fitting session. Cheap to clone; every clone talks to
/// the same session.
#[derive(Debug, Clone)]
pub struct MannequinHandle(Sender<FittingCommand>);

/// Receiving end of [`MannequinHandle`], drained by the session every frame.
#[derive(Resource)]
pub struct FittingInbox(pub Receiver<FittingCommand>);

pub fn fitting_channel() -> (MannequinHandle, FittingInbox) {
    let (tx, rx) = unbounded();
    (MannequinHandle(tx), FittingInbox(rx))
}

impl MannequinHandle {
    fn send(&self, command: FittingCommand) -> Result<(), SessionClosed> {
        self.0.send(command).map_err(|_| SessionClosed)
    }

    pub fn wear_image(&self, category: &str, url: &str) -> Result<(), SessionClosed> {
        if url.trim().is_empty() {
            return Ok(());
        }
        self.send(FittingCommand::WearImage {
            category: category.to_string(),
            url: url.to_string(),
        })
    }

    pub fn remove_clothing(&self, category: Option<&str>) -> Result<(), SessionClosed> {
        self.send(FittingCommand::RemoveClothing {
            category: category.map(str::to_string),
        })
    }

    pub fn reset_view(&self) -> Result<(), SessionClosed> {
        self.send(FittingCommand::ResetView)
    }

    pub fn set_mannequin_color(&self, hex: &str) -> Result<(), SessionClosed> {
        self.send(FittingCommand::SetMannequinColor(hex.to_string()))
    }

    pub fn resize(&self, width: f32, height: f32) -> Result<(), SessionClosed> {
        self.send(FittingCommand::Resize { width, height })
    }

    pub fn take_screenshot(&self, path: Option<PathBuf>) -> Result<(), SessionClosed> {
        self.send(FittingCommand::TakeScreenshot { path })
    }

    /// PNG bytes of the next rendered frame arrive on the returned receiver.
    /// The sender is dropped without a value if the capture fails.
    pub fn take_screenshot_blob(&self) -> Result<Receiver<Vec<u8>>, SessionClosed> {
        let (reply, rx) = bounded(1);
        self.send(FittingCommand::TakeScreenshotBlob { reply })?;
        Ok(rx)
    }

    pub fn set_rotation_angle(&self, angle: f32) -> Result<(), SessionClosed> {
        self.send(FittingCommand::SetRotationAngle(angle))
    }

    pub fn quit(&self) -> Result<(), SessionClosed> {
        self.send(FittingCommand::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_forwards_commands_in_order() {
        let (handle, inbox) = fitting_channel();
        handle.wear_image("상의", "https://example.com/top.png").unwrap();
        handle.remove_clothing(None).unwrap();
        handle.set_rotation_angle(0.2).unwrap();

        let received: Vec<_> = inbox.0.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert!(matches!(
            &received[0],
            FittingCommand::WearImage { category, .. } if category == "상의"
        ));
        assert!(matches!(
            &received[1],
            FittingCommand::RemoveClothing { category: None }
        ));
        assert!(matches!(received[2], FittingCommand::SetRotationAngle(a) if a == 0.2));
    }

    #[test]
    fn empty_url_is_ignored() {
        let (handle, inbox) = fitting_channel();
        handle.wear_image("top", "  ").unwrap();
        assert!(inbox.0.try_recv().is_err());
    }

    #[test]
    fn closed_session_is_reported() {
        let (handle, inbox) = fitting_channel();
        drop(inbox);
        assert!(handle.reset_view().is_err());
        assert!(handle.take_screenshot_blob().is_err());
    }
}
