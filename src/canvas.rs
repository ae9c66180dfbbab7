//! egui binding for [`RegionEditor`]: feeds pointer and keyboard input in and
//! paints the editor's scene.

use egui::{Key, Sense, TextureHandle, Ui};

use crate::editor::RegionEditor;
use crate::paint::paint_scene;
use crate::render::{RenderStyle, Scene};

#[derive(Default)]
pub struct RegionCanvas {
    pub style: RenderStyle,
    cached: Option<(u64, Scene)>,
}

impl RegionCanvas {
    pub fn show(&mut self, ui: &mut Ui, editor: &mut RegionEditor, texture: Option<&TextureHandle>) {
        editor.resize_container(ui.available_size());
        let (rect, response) = ui.allocate_exact_size(editor.canvas_size(), Sense::click_and_drag());

        let (pressed, released, pointer) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.latest_pos(),
            )
        });
        if let Some(pos) = pointer {
            let local = pos - rect.min.to_vec2();
            if pressed && response.hovered() {
                editor.pointer_down(local);
            } else if editor.is_busy() && !released {
                editor.pointer_move(local);
            }
            // press and release can land in the same frame
            if released && editor.is_busy() {
                editor.pointer_up(local);
            }
        }

        let typing = ui.memory(|memory| memory.focused().is_some());
        if !typing {
            let (delete, escape) = ui.input(|input| {
                (
                    input.key_pressed(Key::Delete) || input.key_pressed(Key::Backspace),
                    input.key_pressed(Key::Escape),
                )
            });
            if delete {
                editor.delete_selected();
            }
            if escape {
                editor.cancel();
            }
        }

        let revision = editor.revision();
        let size = editor.canvas_size();
        let stale = self
            .cached
            .as_ref()
            .is_none_or(|(cached, scene)| *cached != revision || scene.size != size);
        if stale {
            self.cached = Some((revision, editor.scene(&self.style)));
        }
        if let Some((_, scene)) = &self.cached {
            paint_scene(&ui.painter_at(rect), rect.min, scene, texture.map(TextureHandle::id));
        }
    }
}
