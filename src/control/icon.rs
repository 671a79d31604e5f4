//! Tray icon image
//!
//! Either decoded from a user-supplied file or drawn in memory. A file that
//! cannot be decoded is a startup error.

use std::path::Path;

use super::{SurfaceError, SurfaceResult};

const BUILTIN_SIZE: u32 = 32;

const FRAME: [u8; 4] = [0x2b, 0x2f, 0x36, 0xff];
const SCREEN: [u8; 4] = [0x3d, 0x8b, 0xd9, 0xff];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// Raw RGBA pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl IconImage {
    /// The configured icon file, or the built-in glyph when none is set
    pub fn resolve(path: Option<&Path>) -> SurfaceResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Decode a PNG or JPEG file
    pub fn load(path: &Path) -> SurfaceResult<Self> {
        let image = image::open(path)
            .map_err(|e| SurfaceError::Icon(format!("{}: {}", path.display(), e)))?
            .into_rgba8();
        let (width, height) = image.dimensions();

        Ok(Self {
            rgba: image.into_raw(),
            width,
            height,
        })
    }

    /// A small monitor on a stand
    pub fn builtin() -> Self {
        let size = BUILTIN_SIZE;
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let pixel = match (x, y) {
                    // bezel
                    (2..=29, 4..=23) if x <= 3 || x >= 28 || y <= 5 || y >= 22 => FRAME,
                    // panel
                    (4..=27, 6..=21) => SCREEN,
                    // neck
                    (14..=17, 24..=26) => FRAME,
                    // foot
                    (9..=22, 27..=28) => FRAME,
                    _ => CLEAR,
                };
                rgba.extend_from_slice(&pixel);
            }
        }

        Self {
            rgba,
            width: size,
            height: size,
        }
    }
}
