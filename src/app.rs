use std::path::{Path, PathBuf};

use anyhow::Context as _;
use egui::{ColorImage, TextureOptions};

use crate::background::{BackgroundLoader, ImageReadiness, ImageSource, LoadedImage};
use crate::canvas::RegionCanvas;
use crate::editor::{EditorConfig, RegionEditor};
use crate::file_picker::{self, PickKind};
use crate::interaction::InteractionState;
use crate::paint;
use crate::persistence::{self, JsonFileSink, SaveMode};
use crate::properties::{PropertyPanel, format_number};
use crate::region::{RegionKind, RegionSeed};

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct RegionEditorApp {
    config: EditorConfig,

    // Reopened on the next start (native only)
    image_path: Option<String>,
    regions_path: Option<String>,

    #[serde(skip)]
    editor: RegionEditor,

    #[serde(skip)]
    loader: BackgroundLoader,

    #[serde(skip)]
    background: Option<LoadedImage>,

    #[serde(skip)]
    texture: Option<egui::TextureHandle>,

    #[serde(skip)]
    canvas: RegionCanvas,

    #[serde(skip)]
    panel: PropertyPanel,

    #[serde(skip)]
    status: Option<String>,

    #[serde(skip)]
    error: Option<String>,
}

impl Default for RegionEditorApp {
    fn default() -> Self {
        Self {
            config: EditorConfig::default(),
            image_path: None,
            regions_path: None,
            editor: RegionEditor::default(),
            loader: BackgroundLoader::default(),
            background: None,
            texture: None,
            canvas: RegionCanvas::default(),
            panel: PropertyPanel::default(),
            status: None,
            error: None,
        }
    }
}

impl RegionEditorApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Load previous app state (if any).
        // Note that you must enable the `persistence` feature for this to work.
        let mut this: Self = if let Some(storage) = cc.storage {
            eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default()
        } else {
            Default::default()
        };

        this.editor = RegionEditor::new(this.config.clone());
        this.reopen_last_session();

        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        this
    }

    fn reopen_last_session(&mut self) {
        if cfg!(target_arch = "wasm32") {
            return;
        }
        let seeds = match self.regions_path.clone() {
            Some(path) => match persistence::load_regions(Path::new(&path)) {
                Ok(seeds) => {
                    self.editor.set_sink(JsonFileSink::new(&path));
                    seeds
                }
                Err(err) => {
                    log::warn!("could not reopen regions: {err:#}");
                    self.regions_path = None;
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        if let Some(path) = self.image_path.clone() {
            self.start_image(ImageSource::Path(PathBuf::from(path)), seeds);
        } else if !seeds.is_empty() {
            self.editor.replace_regions(seeds);
        }
    }

    /// Swaps the background. The region list is replaced by `seeds` right away;
    /// editing resumes once the decode reports back.
    fn start_image(&mut self, source: ImageSource, seeds: Vec<RegionSeed>) {
        if let ImageSource::Path(path) = &source {
            self.image_path = Some(path.to_string_lossy().to_string());
        }
        self.texture = None;
        self.background = None;
        self.editor.begin_loading(seeds);
        self.loader.start(source);
    }

    fn poll_background(&mut self, ctx: &egui::Context) {
        if let Some(result) = self.loader.poll() {
            match result {
                Ok(image) => {
                    let [width, height] = image.size();
                    let color = ColorImage::from_rgba_unmultiplied(
                        [width as usize, height as usize],
                        image.pixels.as_raw(),
                    );
                    self.texture = Some(ctx.load_texture("background", color, TextureOptions::LINEAR));
                    self.editor.image_ready(width, height);
                    self.status = Some(format!("Loaded {} ({width}×{height})", image.name));
                    self.background = Some(image);
                    self.error = None;
                }
                Err(err) => {
                    log::warn!("background failed to load: {err:#}");
                    self.error = Some(format!("{err:#}"));
                    self.image_path = None;
                    self.editor.clear_background();
                }
            }
        }
        if self.loader.is_loading() {
            ctx.request_repaint();
        }
    }

    fn poll_picked_files(&mut self) {
        if let Some((bytes, name)) = file_picker::take_picked(PickKind::Image) {
            self.open_background(ImageSource::Bytes { name, bytes });
        }
        if let Some((bytes, name)) = file_picker::take_picked(PickKind::Regions) {
            let parsed = String::from_utf8(bytes)
                .with_context(|| format!("'{name}' is not UTF-8 text"))
                .and_then(|json| persistence::parse_regions(&json));
            self.apply_imported(parsed, &name);
        }
    }

    fn open_image(&mut self) {
        if cfg!(target_arch = "wasm32") {
            file_picker::open_picker(PickKind::Image);
        } else if let Some(path) = dialogs::pick_image() {
            self.open_background(ImageSource::Path(path));
        }
    }

    /// A background chosen by the user starts with no regions, so the previous
    /// region file must not receive them.
    fn open_background(&mut self, source: ImageSource) {
        self.regions_path = None;
        self.editor.clear_sink();
        self.start_image(source, Vec::new());
    }

    fn import_regions(&mut self) {
        if cfg!(target_arch = "wasm32") {
            file_picker::open_picker(PickKind::Regions);
        } else if let Some(path) = dialogs::pick_regions() {
            let loaded = persistence::load_regions(&path);
            if loaded.is_ok() {
                self.use_regions_file(&path);
            }
            self.apply_imported(loaded, &path.to_string_lossy());
        }
    }

    fn apply_imported(&mut self, result: anyhow::Result<Vec<RegionSeed>>, name: &str) {
        match result {
            Ok(seeds) => {
                self.status = Some(format!("Imported {} regions from {name}", seeds.len()));
                self.editor.replace_regions(seeds);
                self.error = None;
            }
            Err(err) => {
                log::warn!("import failed: {err:#}");
                self.error = Some(format!("{err:#}"));
            }
        }
    }

    fn use_regions_file(&mut self, path: &Path) {
        self.regions_path = Some(path.to_string_lossy().to_string());
        self.editor.set_sink(JsonFileSink::new(path));
    }

    fn save_regions(&mut self, ctx: &egui::Context) {
        if self.editor.has_sink() {
            let result = self.editor.save().map(|()| "Regions saved".to_owned());
            self.report(result);
        } else if cfg!(target_arch = "wasm32") {
            self.copy_json(ctx);
        } else {
            self.save_regions_as();
        }
    }

    fn save_regions_as(&mut self) {
        if let Some(path) = dialogs::save_json() {
            self.use_regions_file(&path);
            let result = self
                .editor
                .save()
                .map(|()| format!("Regions saved to {}", path.display()));
            self.report(result);
        }
    }

    fn copy_json(&mut self, ctx: &egui::Context) {
        let result = self.editor.to_json().map(|json| {
            ctx.copy_text(json);
            format!("Copied {} regions as JSON", self.editor.regions().len())
        });
        self.report(result);
    }

    fn export_preview(&mut self) {
        let Some(path) = dialogs::save_png() else {
            return;
        };
        let scene = self.editor.scene(&self.canvas.style);
        let pixels = paint::rasterize(&scene, self.background.as_ref().map(|image| &image.pixels));
        let result = pixels
            .save(&path)
            .with_context(|| format!("Failed to write '{}'", path.display()))
            .map(|()| format!("Preview exported to {}", path.display()));
        self.report(result);
    }

    fn report(&mut self, result: anyhow::Result<String>) {
        match result {
            Ok(message) => {
                log::info!("{message}");
                self.status = Some(message);
                self.error = None;
            }
            Err(err) => {
                log::warn!("{err:#}");
                self.error = Some(format!("{err:#}"));
            }
        }
    }

    fn status_line(&self) -> String {
        let state = match self.editor.state() {
            InteractionState::Idle => "Idle".to_owned(),
            InteractionState::Drawing { .. } => "Drawing".to_owned(),
            InteractionState::Selected(id) => format!("Selected {id}"),
            InteractionState::Resizing { id, corner } => format!("Resizing {id} ({corner:?})"),
        };
        let image = match self.editor.readiness() {
            ImageReadiness::Empty => "no image".to_owned(),
            ImageReadiness::Loading => format!(
                "loading {}",
                self.loader.pending_name().unwrap_or("image")
            ),
            ImageReadiness::Ready { width, height } => {
                let scale = self.editor.mapper().map_or(0.0, |mapper| mapper.scale());
                format!("{width}×{height} at {}%", format_number(scale * 100.0))
            }
        };
        format!("{state} | {image} | {} regions", self.editor.regions().len())
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        egui::MenuBar::new().ui(ui, |ui| {
            let is_web = cfg!(target_arch = "wasm32");
            ui.menu_button("File", |ui| {
                if ui.button("Open image…").clicked() {
                    self.open_image();
                    ui.close();
                }
                if ui.button("Import regions…").clicked() {
                    self.import_regions();
                    ui.close();
                }
                ui.separator();
                if ui.button("Save regions").clicked() {
                    self.save_regions(ctx);
                    ui.close();
                }
                if !is_web && ui.button("Save regions as…").clicked() {
                    self.save_regions_as();
                    ui.close();
                }
                if ui.button("Copy regions JSON").clicked() {
                    self.copy_json(ctx);
                    ui.close();
                }
                if !is_web && ui.button("Export preview PNG…").clicked() {
                    self.export_preview();
                    ui.close();
                }
                // NOTE: no File->Quit on web pages!
                if !is_web {
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                }
            });

            ui.menu_button("Editor", |ui| {
                let mut kind = self.editor.config().kind;
                for option in RegionKind::ALL {
                    ui.radio_value(&mut kind, option, option.label());
                }
                self.editor.set_kind(kind);
                ui.separator();

                let mut save_mode = self.editor.config().save_mode;
                for option in [SaveMode::Explicit, SaveMode::OnCommit] {
                    ui.radio_value(&mut save_mode, option, option.label());
                }
                self.editor.set_save_mode(save_mode);
                ui.separator();

                ui.horizontal(|ui| {
                    ui.label("Max display height:");
                    let mut height = self.editor.config().max_display_height;
                    ui.add(
                        egui::DragValue::new(&mut height)
                            .range(100.0..=4000.0)
                            .suffix(" px"),
                    );
                    self.editor.set_max_display_height(height);
                });
            });
            ui.add_space(16.0);

            egui::widgets::global_theme_preference_buttons(ui);
        });
    }
}

impl eframe::App for RegionEditorApp {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.config = self.editor.config().clone();
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background(ctx);
        self.poll_picked_files();

        if ctx.input_mut(|input| input.consume_key(egui::Modifiers::COMMAND, egui::Key::S)) {
            self.save_regions(ctx);
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.menu_bar(ui, ctx);
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_line());
                if let Some(message) = &self.status {
                    ui.separator();
                    ui.label(message);
                }
            });
            if let Some(err) = self.error.as_deref().or(self.editor.last_save_error()) {
                ui.colored_label(egui::Color32::RED, err);
            }
        });

        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.panel.show(ui, &mut self.editor);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.editor.readiness() == ImageReadiness::Empty && !self.loader.is_loading() {
                ui.horizontal(|ui| {
                    ui.label("Open a template or mockup image to start.");
                    if ui.button("Open image…").clicked() {
                        self.open_image();
                    }
                });
                ui.separator();
            }
            self.canvas.show(ui, &mut self.editor, self.texture.as_ref());
            egui::warn_if_debug_build(ui);
        });
    }
}

#[cfg(all(not(target_arch = "wasm32"), not(target_os = "android")))]
mod dialogs {
    use rfd::FileDialog;
    use std::path::PathBuf;

    pub fn pick_image() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "webp"])
            .pick_file()
    }

    pub fn pick_regions() -> Option<PathBuf> {
        FileDialog::new().add_filter("JSON", &["json"]).pick_file()
    }

    pub fn save_json() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("regions.json")
            .save_file()
    }

    pub fn save_png() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("preview.png")
            .save_file()
    }
}

// No native dialogs here; web builds go through `file_picker` instead.
#[cfg(not(all(not(target_arch = "wasm32"), not(target_os = "android"))))]
mod dialogs {
    use std::path::PathBuf;

    pub fn pick_image() -> Option<PathBuf> {
        None
    }

    pub fn pick_regions() -> Option<PathBuf> {
        None
    }

    pub fn save_json() -> Option<PathBuf> {
        None
    }

    pub fn save_png() -> Option<PathBuf> {
        None
    }
}
