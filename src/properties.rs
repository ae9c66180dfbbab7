//! Side panel: region list plus text fields for the selected region.
//!
//! Fields hold raw text so the user can type freely; every change is routed
//! through [`RegionEditor::edit_field`], which clamps and repaints.

use egui::{Grid, RichText, ScrollArea, Ui};

use crate::editor::RegionEditor;
use crate::region::{Region, RegionField, RegionId};

#[derive(Default)]
pub struct PropertyPanel {
    bound: Option<RegionId>,
    synced_revision: u64,
    x: String,
    y: String,
    width: String,
    height: String,
    rotation: String,
    name: String,
}

impl PropertyPanel {
    pub fn show(&mut self, ui: &mut Ui, editor: &mut RegionEditor) {
        ui.heading(editor.config().kind.label());
        ui.separator();
        Self::region_list(ui, editor);
        ui.separator();

        let Some(region) = editor.selected_region().cloned() else {
            self.bound = None;
            ui.label("Drag on the image to add a region, click one to edit it.");
            return;
        };
        if self.bound != Some(region.id) || self.synced_revision != editor.revision() {
            self.load(&region);
            self.synced_revision = editor.revision();
        }

        let mut edits: Vec<RegionField> = Vec::new();
        Grid::new("region_properties")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label(RegionField::Name.label());
                if ui.text_edit_singleline(&mut self.name).changed() {
                    edits.push(RegionField::Name);
                }
                ui.end_row();

                for field in RegionField::NUMERIC {
                    ui.label(field.label());
                    if ui.text_edit_singleline(self.buffer_mut(field)).changed() {
                        edits.push(field);
                    }
                    ui.end_row();
                }

                if region.rotation.is_some() {
                    ui.label(RegionField::Rotation.label());
                    if ui.text_edit_singleline(&mut self.rotation).changed() {
                        edits.push(RegionField::Rotation);
                    }
                    ui.end_row();
                }
            });

        for field in edits {
            let input = self.buffer_mut(field).clone();
            editor.edit_field(field, &input);
        }
        // Our own edits must not reload the buffers mid-typing.
        self.synced_revision = editor.revision();

        ui.add_space(8.0);
        if ui.button("Delete region").clicked() {
            editor.delete(region.id);
        }
    }

    fn region_list(ui: &mut Ui, editor: &mut RegionEditor) {
        if editor.regions().is_empty() {
            ui.label(RichText::new("No regions yet").weak());
            return;
        }
        let mut clicked = None;
        ScrollArea::vertical()
            .id_salt("region_list")
            .max_height(200.0)
            .show(ui, |ui| {
                for region in editor.regions() {
                    let selected = editor.selected() == Some(region.id);
                    let text = format!(
                        "{}  {}×{} at ({}, {})",
                        region.name,
                        format_number(region.width),
                        format_number(region.height),
                        format_number(region.x),
                        format_number(region.y),
                    );
                    if ui.selectable_label(selected, text).clicked() {
                        clicked = Some(region.id);
                    }
                }
            });
        if let Some(id) = clicked {
            editor.select(Some(id));
        }
    }

    fn load(&mut self, region: &Region) {
        self.bound = Some(region.id);
        self.x = format_number(region.x);
        self.y = format_number(region.y);
        self.width = format_number(region.width);
        self.height = format_number(region.height);
        self.rotation = format_number(region.rotation.unwrap_or(0.0));
        self.name.clone_from(&region.name);
    }

    fn buffer_mut(&mut self, field: RegionField) -> &mut String {
        match field {
            RegionField::X => &mut self.x,
            RegionField::Y => &mut self.y,
            RegionField::Width => &mut self.width,
            RegionField::Height => &mut self.height,
            RegionField::Rotation => &mut self.rotation,
            RegionField::Name => &mut self.name,
        }
    }
}

/// Whole numbers without a fraction, everything else to one decimal.
pub fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn numbers_are_shown_compactly() {
        assert_eq!(format_number(200.0), "200");
        assert_eq!(format_number(12.3), "12.3");
        assert_eq!(format_number(0.0), "0");
    }
}
