//! The region editor: one component serving both template design areas and
//! mockup masks, selected by [`RegionKind`].
//!
//! Pointer coordinates arrive in display space relative to the canvas origin.
//! Until the background image reports ready there is no mapping, and pointer
//! input is dropped.

use egui::{Pos2, Rect, Vec2, vec2};
use serde::{Deserialize, Serialize};

use crate::background::ImageReadiness;
use crate::geometry::{CoordinateMapper, Corner};
use crate::interaction::{InteractionMachine, InteractionState, MIN_REGION_SIZE, Outcome};
use crate::persistence::{self, DesignArea, Mask, RegionSink, SaveMode};
use crate::region::{Region, RegionField, RegionId, RegionKind, RegionSeed, RegionStore};
use crate::render::{self, Frame, RenderStyle, Scene};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub kind: RegionKind,
    /// Upper bound for the displayed image height, in display pixels.
    pub max_display_height: f32,
    /// Natural pixels.
    pub min_region_size: f32,
    /// Side of the square corner handles, in display pixels.
    pub handle_size: f32,
    pub save_mode: SaveMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            kind: RegionKind::default(),
            max_display_height: 600.0,
            min_region_size: MIN_REGION_SIZE,
            handle_size: 8.0,
            save_mode: SaveMode::default(),
        }
    }
}

pub struct RegionEditor {
    config: EditorConfig,
    store: RegionStore,
    machine: InteractionMachine,
    readiness: ImageReadiness,
    container: Vec2,
    mapper: Option<CoordinateMapper>,
    sink: Option<Box<dyn RegionSink>>,
    revision: u64,
    last_save_error: Option<String>,
}

impl Default for RegionEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl RegionEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            store: RegionStore::new(config.kind),
            machine: InteractionMachine::new(config.min_region_size),
            config,
            readiness: ImageReadiness::Empty,
            container: Vec2::ZERO,
            mapper: None,
            sink: None,
            revision: 0,
            last_save_error: None,
        }
    }

    pub fn with_sink(mut self, sink: impl RegionSink + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn set_sink(&mut self, sink: impl RegionSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Detaches the save target, e.g. when the regions no longer belong to it.
    pub fn clear_sink(&mut self) {
        self.sink = None;
        self.last_save_error = None;
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_kind(&mut self, kind: RegionKind) {
        if self.config.kind != kind {
            self.config.kind = kind;
            self.store.set_kind(kind);
            self.touch();
        }
    }

    pub fn set_save_mode(&mut self, save_mode: SaveMode) {
        self.config.save_mode = save_mode;
    }

    pub fn set_max_display_height(&mut self, max_display_height: f32) {
        if max_display_height > 0.0 && self.config.max_display_height != max_display_height {
            self.config.max_display_height = max_display_height;
            self.refit();
        }
    }

    // --- image lifecycle ---

    /// A new background is on its way. Any gesture is abandoned and the region
    /// list is replaced wholesale by `initial`.
    pub fn begin_loading(&mut self, initial: impl IntoIterator<Item = RegionSeed>) {
        self.replace_store(initial);
        self.readiness = ImageReadiness::Loading;
        self.mapper = None;
        self.touch();
    }

    /// The background decoded; pointer input is accepted from here on.
    pub fn image_ready(&mut self, width: u32, height: u32) {
        log::info!("background ready at {width}x{height}");
        self.readiness = ImageReadiness::Ready { width, height };
        self.refit();
        self.touch();
    }

    /// The background is gone (or failed to load). Regions are kept but cannot be edited.
    pub fn clear_background(&mut self) {
        self.machine.cancel(&mut self.store);
        self.readiness = ImageReadiness::Empty;
        self.mapper = None;
        self.touch();
    }

    /// Replaces the region list for the current background.
    pub fn replace_regions(&mut self, regions: impl IntoIterator<Item = RegionSeed>) {
        self.replace_store(regions);
        self.touch();
    }

    /// Space available to the canvas, in display pixels.
    pub fn resize_container(&mut self, container: Vec2) {
        if self.container != container {
            self.container = container;
            self.refit();
        }
    }

    // --- pointer input, display space ---

    pub fn pointer_down(&mut self, display: Pos2) -> bool {
        let Some(mapper) = self.mapper else {
            log::debug!("pointer down ignored, no image yet");
            return false;
        };
        let natural = mapper.to_natural(display);
        let handle = self.handle_at(&mapper, display);
        if handle.is_none() && !mapper.contains_natural(natural) {
            return false;
        }
        let outcome = self.machine.pointer_down(&mut self.store, natural, handle);
        self.apply(outcome)
    }

    pub fn pointer_move(&mut self, display: Pos2) -> bool {
        let Some(mapper) = self.mapper else {
            return false;
        };
        let natural = mapper.clamp_natural(mapper.to_natural(display));
        let outcome = self.machine.pointer_move(&mut self.store, natural);
        self.apply(outcome)
    }

    pub fn pointer_up(&mut self, display: Pos2) -> bool {
        let Some(mapper) = self.mapper else {
            return false;
        };
        let natural = mapper.clamp_natural(mapper.to_natural(display));
        let outcome = self.machine.pointer_up(&mut self.store, natural);
        self.apply(outcome)
    }

    /// Escape: abandon the gesture in progress, or else drop the selection.
    pub fn cancel(&mut self) -> bool {
        let outcome = if self.machine.is_busy() {
            self.machine.cancel(&mut self.store)
        } else if self.store.select(None) {
            Outcome::Redraw
        } else {
            Outcome::Unchanged
        };
        self.apply(outcome)
    }

    // --- side panel ---

    pub fn select(&mut self, id: Option<RegionId>) -> bool {
        if self.machine.is_busy() {
            return false;
        }
        let changed = self.store.select(id);
        if changed {
            self.touch();
        }
        changed
    }

    /// Writes raw user input into a field of the selected region.
    pub fn edit_field(&mut self, field: RegionField, input: &str) -> bool {
        let Some(id) = self.store.selected() else {
            return false;
        };
        if self.machine.is_busy() {
            return false;
        }
        let changed = self.store.edit(id, field, input);
        if changed {
            self.committed();
        }
        changed
    }

    pub fn delete(&mut self, id: RegionId) -> bool {
        if self.machine.is_busy() {
            return false;
        }
        let removed = self.store.remove(id).is_some();
        if removed {
            log::debug!("deleted {id}");
            self.committed();
        }
        removed
    }

    pub fn delete_selected(&mut self) -> bool {
        self.store.selected().is_some_and(|id| self.delete(id))
    }

    // --- output ---

    /// Hands the current list to the sink regardless of save mode.
    pub fn save(&mut self) -> anyhow::Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            anyhow::bail!("No save target configured");
        };
        let result = sink.save(self.config.kind, self.store.regions());
        self.last_save_error = result.as_ref().err().map(|err| format!("{err:#}"));
        result
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn design_areas(&self) -> Vec<DesignArea> {
        persistence::design_areas(self.store.regions())
    }

    /// The current masks, for hosts that pull rather than subscribe.
    pub fn masks(&self) -> Vec<Mask> {
        persistence::masks(self.store.regions())
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        persistence::to_json(self.config.kind, self.store.regions())
    }

    // --- read access ---

    pub fn regions(&self) -> &[Region] {
        self.store.regions()
    }

    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    pub fn selected(&self) -> Option<RegionId> {
        self.store.selected()
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.store.selected_region()
    }

    pub fn state(&self) -> InteractionState {
        self.machine.state(&self.store)
    }

    /// A draw or resize is in progress.
    pub fn is_busy(&self) -> bool {
        self.machine.is_busy()
    }

    pub fn readiness(&self) -> ImageReadiness {
        self.readiness
    }

    pub fn mapper(&self) -> Option<&CoordinateMapper> {
        self.mapper.as_ref()
    }

    /// Bumped on every change that needs a repaint.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Canvas size the editor wants: the scaled image, or a placeholder box.
    pub fn canvas_size(&self) -> Vec2 {
        match &self.mapper {
            Some(mapper) => {
                let display = mapper.display_size();
                vec2(self.container.x.max(display.x), display.y)
            }
            None => vec2(
                self.container.x,
                self.container.y.min(self.config.max_display_height),
            ),
        }
    }

    pub fn scene(&self, style: &RenderStyle) -> Scene {
        render::render(
            &Frame {
                canvas_size: self.canvas_size(),
                readiness: self.readiness,
                mapper: self.mapper.as_ref(),
                regions: self.store.regions(),
                selected: self.store.selected(),
                transient: self.machine.transient(),
                handle_size: self.config.handle_size,
            },
            style,
        )
    }

    fn handle_at(&self, mapper: &CoordinateMapper, display: Pos2) -> Option<Corner> {
        let region = self.store.selected_region()?;
        let rect = mapper.rect_to_display(region.rect());
        let size = vec2(self.config.handle_size, self.config.handle_size);
        Corner::ALL
            .into_iter()
            .find(|corner| Rect::from_center_size(corner.of(rect), size).contains(display))
    }

    fn replace_store(&mut self, seeds: impl IntoIterator<Item = RegionSeed>) {
        self.machine.reset();
        self.store = RegionStore::seeded(self.config.kind, seeds);
    }

    fn refit(&mut self) {
        let ImageReadiness::Ready { width, height } = self.readiness else {
            return;
        };
        let image_size = vec2(width as f32, height as f32);
        let fitted =
            CoordinateMapper::fit(self.container, image_size, self.config.max_display_height);
        if fitted.is_some() && fitted != self.mapper {
            if let Some(mapper) = &fitted {
                log::debug!("display scale {:.3}, offset {:?}", mapper.scale(), mapper.offset());
            }
            self.mapper = fitted;
            self.touch();
        }
    }

    fn apply(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Unchanged => false,
            Outcome::Redraw => {
                self.touch();
                true
            }
            Outcome::Committed => {
                self.committed();
                true
            }
        }
    }

    fn committed(&mut self) {
        self.touch();
        if self.config.save_mode == SaveMode::OnCommit && self.sink.is_some() {
            if let Err(err) = self.save() {
                log::warn!("saving regions failed: {err:#}");
            }
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorConfig, RegionEditor};
    use crate::background::ImageReadiness;
    use crate::interaction::InteractionState;
    use crate::persistence::SaveMode;
    use crate::region::{RegionField, RegionKind, RegionSeed};
    use crate::render::{DrawCommand, RenderStyle};
    use egui::{pos2, vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ready_editor(config: EditorConfig) -> RegionEditor {
        let mut editor = RegionEditor::new(config);
        editor.resize_container(vec2(400.0, 1000.0));
        editor.begin_loading(Vec::new());
        editor.image_ready(800, 600);
        editor
    }

    fn config() -> EditorConfig {
        EditorConfig {
            max_display_height: 300.0,
            ..EditorConfig::default()
        }
    }

    #[test]
    fn pointer_is_ignored_until_image_is_ready() {
        let mut editor = RegionEditor::new(config());
        editor.resize_container(vec2(400.0, 300.0));
        editor.begin_loading(Vec::new());
        assert_eq!(editor.readiness(), ImageReadiness::Loading);
        assert!(!editor.pointer_down(pos2(10.0, 10.0)));
        assert!(!editor.pointer_up(pos2(200.0, 200.0)));
        assert!(editor.regions().is_empty());
        assert_eq!(editor.state(), InteractionState::Idle);
    }

    #[test]
    fn container_resize_refits_the_mapping() {
        let mut editor = ready_editor(config());
        assert_eq!(editor.mapper().map(|m| m.scale()), Some(0.5));
        editor.resize_container(vec2(200.0, 1000.0));
        assert_eq!(editor.mapper().map(|m| m.scale()), Some(0.25));
    }

    #[test]
    fn pointer_down_outside_image_is_ignored() {
        let mut editor = ready_editor(config());
        assert!(!editor.pointer_down(pos2(100.0, 350.0)));
        assert_eq!(editor.state(), InteractionState::Idle);
    }

    #[test]
    fn drag_past_image_edge_is_clamped() {
        let mut editor = ready_editor(config());
        editor.pointer_down(pos2(300.0, 200.0));
        editor.pointer_up(pos2(900.0, 900.0));
        let region = &editor.regions()[0];
        assert_eq!((region.x, region.y, region.width, region.height), (600.0, 400.0, 200.0, 200.0));
    }

    #[test]
    fn handle_drag_resizes_selected_region() {
        let mut editor = ready_editor(config());
        editor.pointer_down(pos2(100.0, 100.0));
        editor.pointer_up(pos2(300.0, 250.0));
        let id = editor.selected().expect("new region selected");

        // bottom-right handle sits at display (300, 250)
        editor.pointer_down(pos2(302.0, 251.0));
        assert!(matches!(editor.state(), InteractionState::Resizing { .. }));
        editor.pointer_move(pos2(350.0, 280.0));
        editor.pointer_up(pos2(350.0, 280.0));

        let region = editor.store().get(id).expect("region exists");
        assert_eq!((region.width, region.height), (500.0, 360.0));
        assert_eq!(editor.state(), InteractionState::Selected(id));
    }

    #[test]
    fn new_image_discards_gesture_and_regions() {
        let mut editor = ready_editor(config());
        editor.pointer_down(pos2(10.0, 10.0));
        editor.pointer_up(pos2(100.0, 100.0));
        editor.pointer_down(pos2(200.0, 200.0));
        assert!(matches!(editor.state(), InteractionState::Drawing { .. }));

        editor.begin_loading(vec![RegionSeed {
            x: 5.0,
            y: 5.0,
            width: 50.0,
            height: 50.0,
            ..RegionSeed::default()
        }]);
        assert_eq!(editor.state(), InteractionState::Idle);
        assert_eq!(editor.regions().len(), 1);
        assert!(editor.mapper().is_none());
        assert!(!editor.pointer_up(pos2(300.0, 300.0)));
    }

    #[test]
    fn on_commit_mode_pushes_every_committed_change() {
        let saved = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&saved);
        let mut editor = ready_editor(EditorConfig {
            save_mode: SaveMode::OnCommit,
            ..config()
        })
        .with_sink(move |_kind: RegionKind, regions: &[crate::region::Region]| -> anyhow::Result<()> {
            log.borrow_mut().push(regions.len());
            Ok(())
        });

        editor.pointer_down(pos2(10.0, 10.0));
        editor.pointer_up(pos2(100.0, 100.0));
        editor.edit_field(RegionField::Name, "Chest");
        editor.pointer_down(pos2(390.0, 290.0));
        editor.pointer_up(pos2(391.0, 291.0));
        editor.delete_selected();

        assert_eq!(*saved.borrow(), vec![1, 1]);
    }

    #[test]
    fn explicit_mode_waits_for_save() {
        let saved = Rc::new(RefCell::new(0));
        let count = Rc::clone(&saved);
        let mut editor = ready_editor(config()).with_sink(
            move |_kind: RegionKind, _regions: &[crate::region::Region]| -> anyhow::Result<()> {
                *count.borrow_mut() += 1;
                Ok(())
            },
        );
        editor.pointer_down(pos2(10.0, 10.0));
        editor.pointer_up(pos2(100.0, 100.0));
        assert_eq!(*saved.borrow(), 0);
        editor.save().expect("save");
        assert_eq!(*saved.borrow(), 1);
    }

    #[test]
    fn save_failure_is_recorded_not_fatal() {
        let mut editor = ready_editor(EditorConfig {
            save_mode: SaveMode::OnCommit,
            ..config()
        })
        .with_sink(|_kind: RegionKind, _regions: &[crate::region::Region]| -> anyhow::Result<()> {
            anyhow::bail!("backend unavailable")
        });
        editor.pointer_down(pos2(10.0, 10.0));
        editor.pointer_up(pos2(100.0, 100.0));
        assert_eq!(editor.regions().len(), 1);
        assert_eq!(editor.last_save_error(), Some("backend unavailable"));
    }

    #[test]
    fn masks_accessor_reports_current_list() {
        let mut editor = ready_editor(EditorConfig {
            kind: RegionKind::Mask,
            ..config()
        });
        editor.pointer_down(pos2(50.0, 50.0));
        editor.pointer_up(pos2(150.0, 100.0));
        let masks = editor.masks();
        assert_eq!(masks.len(), 1);
        assert_eq!((masks[0].x, masks[0].y, masks[0].width, masks[0].height), (100.0, 100.0, 200.0, 100.0));
        assert_eq!(editor.regions()[0].name, "Mask 1");
    }

    #[test]
    fn cleared_sink_receives_nothing() {
        let saved = Rc::new(RefCell::new(0));
        let count = Rc::clone(&saved);
        let mut editor = ready_editor(EditorConfig {
            save_mode: SaveMode::OnCommit,
            ..config()
        })
        .with_sink(
            move |_kind: RegionKind, _regions: &[crate::region::Region]| -> anyhow::Result<()> {
                *count.borrow_mut() += 1;
                Ok(())
            },
        );
        editor.clear_sink();
        assert!(!editor.has_sink());

        editor.pointer_down(pos2(10.0, 10.0));
        editor.pointer_up(pos2(100.0, 100.0));
        assert_eq!(editor.regions().len(), 1);
        assert_eq!(*saved.borrow(), 0);
        assert!(editor.save().is_err());
    }

    #[test]
    fn drawn_handles_match_the_clickable_area() {
        let mut editor = ready_editor(EditorConfig {
            handle_size: 20.0,
            ..config()
        });
        editor.pointer_down(pos2(100.0, 100.0));
        editor.pointer_up(pos2(300.0, 250.0));

        let scene = editor.scene(&RenderStyle::default());
        let handle = scene
            .commands
            .iter()
            .find_map(|command| match command {
                DrawCommand::Fill { rect, .. } if rect.center() == pos2(300.0, 250.0) => Some(*rect),
                _ => None,
            })
            .expect("bottom-right handle drawn");
        assert_eq!(handle.size(), vec2(20.0, 20.0));

        // inside the drawn handle but outside the default 8 px one
        editor.pointer_down(pos2(308.0, 258.0));
        assert!(matches!(editor.state(), InteractionState::Resizing { .. }));
    }

    #[test]
    fn switching_kind_gives_masks_a_rotation() {
        let mut editor = ready_editor(EditorConfig {
            kind: RegionKind::Mask,
            ..config()
        });
        editor.pointer_down(pos2(50.0, 50.0));
        editor.pointer_up(pos2(150.0, 100.0));
        assert_eq!(editor.regions()[0].rotation, None);

        editor.set_kind(RegionKind::DesignArea);
        assert_eq!(editor.regions()[0].rotation, Some(0.0));
    }
}
