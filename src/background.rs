//! Background image loading.
//!
//! Decoding is the only asynchronous step in the editor. A load is started with
//! [`BackgroundLoader::start`] and the result is picked up by polling, which
//! gives the editor a single "image ready" signal to react to. Starting a new
//! load drops the previous receiver, so a stale decode can never win.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::Context as _;
use image::RgbaImage;

/// Whether the editor has an image to map pointer input against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageReadiness {
    #[default]
    Empty,
    Loading,
    Ready {
        width: u32,
        height: u32,
    },
}

impl ImageReadiness {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Where an image comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

impl ImageSource {
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.to_string_lossy().into_owned(),
            Self::Bytes { name, .. } => name.clone(),
        }
    }
}

/// A decoded background image.
pub struct LoadedImage {
    pub name: String,
    pub pixels: RgbaImage,
}

impl LoadedImage {
    pub fn size(&self) -> [u32; 2] {
        [self.pixels.width(), self.pixels.height()]
    }
}

pub fn decode(source: ImageSource) -> anyhow::Result<LoadedImage> {
    let name = source.name();
    let pixels = match source {
        ImageSource::Path(path) => image::open(&path)
            .with_context(|| format!("Failed to open image '{}'", path.display()))?,
        ImageSource::Bytes { bytes, .. } => image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode image '{name}'"))?,
    }
    .to_rgba8();
    if pixels.width() == 0 || pixels.height() == 0 {
        anyhow::bail!("Image '{name}' has no pixels");
    }
    Ok(LoadedImage { name, pixels })
}

#[derive(Default)]
pub struct BackgroundLoader {
    pending: Option<(String, Receiver<anyhow::Result<LoadedImage>>)>,
}

impl BackgroundLoader {
    pub fn start(&mut self, source: ImageSource) {
        let name = source.name();
        log::info!("loading background image {name}");
        let (tx, rx) = mpsc::channel();

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(move || {
            // The receiver is gone if another load replaced this one.
            let _ = tx.send(decode(source));
        });

        #[cfg(target_arch = "wasm32")]
        let _ = tx.send(decode(source));

        self.pending = Some((name, rx));
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_name(&self) -> Option<&str> {
        self.pending.as_ref().map(|(name, _)| name.as_str())
    }

    /// Returns the finished decode once, then goes idle.
    pub fn poll(&mut self) -> Option<anyhow::Result<LoadedImage>> {
        let (name, rx) = self.pending.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                Err(anyhow::anyhow!("Decoder for '{name}' stopped unexpectedly"))
            }
        };
        self.pending = None;
        Some(result)
    }
}
