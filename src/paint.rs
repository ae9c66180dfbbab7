//! Scene backends: the live egui painter and an offscreen raster used for
//! preview export.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, StrokeKind, TextureId, Vec2};
use image::{Pixel as _, Rgba, RgbaImage, imageops};

use crate::render::{DrawCommand, LineStyle, Scene};

/// Paints `scene` with its origin at `origin`. Without a texture the image slot
/// is filled flat.
pub fn paint_scene(painter: &Painter, origin: Pos2, scene: &Scene, texture: Option<TextureId>) {
    let shift = origin.to_vec2();
    for command in &scene.commands {
        match command {
            DrawCommand::Fill { rect, color } => {
                painter.rect_filled(rect.translate(shift), 0.0, *color);
            }
            DrawCommand::Image { rect } => {
                let rect = rect.translate(shift);
                match texture {
                    Some(texture) => {
                        painter.image(
                            texture,
                            rect,
                            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                            Color32::WHITE,
                        );
                    }
                    None => {
                        painter.rect_filled(rect, 0.0, Color32::DARK_GRAY);
                    }
                }
            }
            DrawCommand::Outline { rect, line } => {
                stroke_outline(painter, rect.translate(shift), line);
            }
            DrawCommand::Label {
                pos,
                text,
                size,
                color,
            } => {
                painter.text(
                    *pos + shift,
                    Align2::LEFT_TOP,
                    text,
                    FontId::proportional(*size),
                    *color,
                );
            }
        }
    }
}

fn stroke_outline(painter: &Painter, rect: Rect, line: &LineStyle) {
    let stroke = Stroke::new(line.width, line.color);
    match line.dash {
        None => {
            painter.rect_stroke(rect, 0.0, stroke, StrokeKind::Middle);
        }
        Some([on, off]) => {
            let path = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
                rect.left_top(),
            ];
            painter.extend(Shape::dashed_line(&path, stroke, on, off));
        }
    }
}

/// Rasterizes `scene` into a new RGBA image of the scene's size.
///
/// The background is scaled nearest-neighbour and labels are left out, so the
/// output depends only on the scene and the background pixels.
pub fn rasterize(scene: &Scene, background: Option<&RgbaImage>) -> RgbaImage {
    let width = scene.size.x.ceil().max(1.0) as u32;
    let height = scene.size.y.ceil().max(1.0) as u32;
    let mut canvas = RgbaImage::new(width, height);

    for command in &scene.commands {
        match command {
            DrawCommand::Fill { rect, color } => fill_rect(&mut canvas, *rect, *color),
            DrawCommand::Image { rect } => match background {
                Some(image) => blit_scaled(&mut canvas, image, *rect),
                None => fill_rect(&mut canvas, *rect, Color32::DARK_GRAY),
            },
            DrawCommand::Outline { rect, line } => outline_rect(&mut canvas, *rect, line),
            DrawCommand::Label { .. } => {}
        }
    }
    canvas
}

fn to_rgba(color: Color32) -> Rgba<u8> {
    Rgba(color.to_srgba_unmultiplied())
}

/// Pixel span covered by `[min, max)` after rounding, clipped to `0..limit`.
fn pixel_span(min: f32, max: f32, limit: u32) -> std::ops::Range<u32> {
    let start = min.round().clamp(0.0, limit as f32) as u32;
    let end = max.round().clamp(0.0, limit as f32) as u32;
    start..end.max(start)
}

fn blend(canvas: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x < canvas.width() && y < canvas.height() {
        canvas.get_pixel_mut(x, y).blend(&color);
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Color32) {
    let color = to_rgba(color);
    for y in pixel_span(rect.min.y, rect.max.y, canvas.height()) {
        for x in pixel_span(rect.min.x, rect.max.x, canvas.width()) {
            blend(canvas, x, y, color);
        }
    }
}

fn blit_scaled(canvas: &mut RgbaImage, image: &RgbaImage, rect: Rect) {
    let width = rect.width().round().max(1.0) as u32;
    let height = rect.height().round().max(1.0) as u32;
    let scaled = imageops::resize(image, width, height, imageops::FilterType::Nearest);
    imageops::overlay(
        canvas,
        &scaled,
        rect.min.x.round() as i64,
        rect.min.y.round() as i64,
    );
}

fn outline_rect(canvas: &mut RgbaImage, rect: Rect, line: &LineStyle) {
    let color = to_rgba(line.color);
    let thickness = line.width.round().max(1.0);
    let half = thickness / 2.0;
    let edges = [
        (rect.left_top(), Vec2::X, rect.width()),
        (rect.right_top(), Vec2::Y, rect.height()),
        (rect.right_bottom(), -Vec2::X, rect.width()),
        (rect.left_bottom(), -Vec2::Y, rect.height()),
    ];

    // Dash phase carries over from one edge to the next, like a stroked path.
    let mut travelled = 0.0;
    for (start, direction, length) in edges {
        let steps = length.round().max(0.0) as u32;
        for step in 0..=steps {
            let along = travelled + step as f32;
            let visible = match line.dash {
                Some([on, off]) if on + off > 0.0 => along.rem_euclid(on + off) < on,
                _ => true,
            };
            if !visible {
                continue;
            }
            let centre = start + direction * step as f32;
            for y in pixel_span(centre.y - half, centre.y + half, canvas.height()) {
                for x in pixel_span(centre.x - half, centre.x + half, canvas.width()) {
                    blend(canvas, x, y, color);
                }
            }
        }
        travelled += length;
    }
}
