//! Control surface - Pause and exit the switch loop
//!
//! The surface never calls into the switch loop. Both actions only touch the
//! shared [`RuntimeFlags`]:
//! - Windows: a tray icon with a "Paused" check item and "Exit"
//! - elsewhere: the console (Ctrl+C exits, SIGUSR1 toggles pause)

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::switcher::RuntimeFlags;

#[cfg(any(target_os = "windows", test))]
mod icon;

#[cfg(target_os = "windows")]
mod tray;

#[cfg(not(target_os = "windows"))]
mod console;

#[cfg(target_os = "windows")]
pub use icon::IconImage;

/// Image handed to the surface. Only the tray shows one.
#[cfg(target_os = "windows")]
pub type TrayImage = IconImage;

/// Image handed to the surface. Only the tray shows one.
#[cfg(not(target_os = "windows"))]
pub type TrayImage = ();

/// Tooltip shown on the tray icon
#[cfg(target_os = "windows")]
pub const TOOLTIP: &str = "hidswitch";

/// Errors that stop the control surface from starting
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[cfg(any(target_os = "windows", test))]
    #[error("Icon error: {0}")]
    Icon(String),

    #[cfg(target_os = "windows")]
    #[error("Menu error: {0}")]
    Menu(String),

    #[cfg(target_os = "windows")]
    #[error("Tray error: {0}")]
    Tray(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// User actions offered by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    TogglePause,
    Exit,
}

/// Whether the UI event loop keeps running after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies menu actions to the shared flags
pub struct ControlSurface {
    flags: Arc<RuntimeFlags>,
}

impl ControlSurface {
    pub fn new(flags: Arc<RuntimeFlags>) -> Self {
        Self { flags }
    }

    #[cfg(target_os = "windows")]
    pub fn flags(&self) -> &RuntimeFlags {
        &self.flags
    }

    pub fn handle(&self, action: MenuAction) -> Flow {
        match action {
            MenuAction::TogglePause => {
                let paused = self.flags.toggle_pause();
                tracing::info!("Paused: {}", paused);
                Flow::Continue
            }
            MenuAction::Exit => {
                tracing::info!("Exit requested");
                self.flags.stop();
                Flow::Quit
            }
        }
    }
}

/// Load the tray image: the configured file, or the built-in glyph.
/// A file that cannot be decoded is an error.
#[cfg(target_os = "windows")]
pub fn load_tray_image(path: Option<&Path>) -> SurfaceResult<TrayImage> {
    IconImage::resolve(path)
}

/// The console has no icon, so the configured file is never opened
#[cfg(not(target_os = "windows"))]
pub fn load_tray_image(path: Option<&Path>) -> SurfaceResult<TrayImage> {
    if let Some(path) = path {
        tracing::debug!("No tray on this platform, ignoring icon {}", path.display());
    }
    Ok(())
}

/// Run the platform surface on the current thread until the user exits
#[cfg(target_os = "windows")]
pub fn run(surface: &ControlSurface, image: TrayImage) -> SurfaceResult<()> {
    tray::run(surface, image)
}

/// Run the platform surface on the current thread until the user exits
#[cfg(not(target_os = "windows"))]
pub fn run(surface: &ControlSurface, _image: TrayImage) -> SurfaceResult<()> {
    console::run(surface)
}
