#![warn(clippy::all, rust_2018_idioms)]
//! Interactive rectangle editor over a background image.
//!
//! The same editor serves template design areas and mockup masks. Regions are
//! stored in the image's natural pixels and shown scaled to fit the canvas.

mod app;
pub mod background;
pub mod canvas;
pub mod editor;
mod file_picker;
pub mod geometry;
pub mod interaction;
pub mod paint;
pub mod persistence;
pub mod properties;
pub mod region;
pub mod render;

pub use app::RegionEditorApp;
pub use editor::{EditorConfig, RegionEditor};
pub use persistence::{DesignArea, JsonFileSink, Mask, RegionSink, SaveMode};
pub use region::{Region, RegionId, RegionKind, RegionSeed};

use eframe::NativeOptions;

#[cfg(target_os = "android")]
use egui_winit::winit;

impl RegionEditorApp {
    /// Run the app with provided NativeOptions (used by the desktop and Android entrypoints).
    pub fn run(options: NativeOptions) -> Result<(), eframe::Error> {
        eframe::run_native(
            "region_canvas",
            options,
            Box::new(|cc| Ok(Box::new(RegionEditorApp::new(cc)))),
        )
    }
}

#[cfg(target_os = "android")]
#[allow(unsafe_code)]
#[unsafe(no_mangle)]
pub extern "C" fn android_main(app: winit::platform::android::activity::AndroidApp) {
    use eframe::Renderer;

    unsafe {
        std::env::set_var("RUST_BACKTRACE", "full");
    }
    android_logger::init_once(
        android_logger::Config::default().with_max_level(log::LevelFilter::Info),
    );

    let options = NativeOptions {
        android_app: Some(app),
        renderer: Renderer::Wgpu,
        ..Default::default()
    };

    if let Err(err) = RegionEditorApp::run(options) {
        log::error!("region_canvas exited with an error: {err}");
    }
}
