//! Turns editor state into a display list.
//!
//! [`render`] is a pure function: it clears and redraws everything on each call,
//! so the same inputs always give the same [`Scene`]. Backends in
//! [`crate::paint`] turn a scene into pixels.

use egui::{Color32, Pos2, Rect, Vec2, pos2, vec2};

use crate::background::ImageReadiness;
use crate::geometry::{CoordinateMapper, Corner};
use crate::region::{Region, RegionId};

/// Border of a rectangle. `dash` is `[on, off]` lengths in display pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub width: f32,
    pub color: Color32,
    pub dash: Option<[f32; 2]>,
}

impl LineStyle {
    pub const fn solid(width: f32, color: Color32) -> Self {
        Self {
            width,
            color,
            dash: None,
        }
    }

    pub const fn dashed(width: f32, color: Color32, on: f32, off: f32) -> Self {
        Self {
            width,
            color,
            dash: Some([on, off]),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Fill { rect: Rect, color: Color32 },
    /// The background image stretched over `rect`.
    Image { rect: Rect },
    Outline { rect: Rect, line: LineStyle },
    Label {
        pos: Pos2,
        text: String,
        size: f32,
        color: Color32,
    },
}

/// Everything to draw, in canvas-local display coordinates, back to front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub size: Vec2,
    pub commands: Vec<DrawCommand>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderStyle {
    pub canvas: Color32,
    pub placeholder: Color32,
    pub placeholder_text: Color32,
    pub region_fill: Color32,
    pub region_line: LineStyle,
    pub selected_fill: Color32,
    pub selected_line: LineStyle,
    pub transient_fill: Color32,
    pub transient_line: LineStyle,
    pub handle_fill: Color32,
    pub handle_line: LineStyle,
    pub label_size: f32,
    pub label_color: Color32,
    pub label_inset: Vec2,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            canvas: Color32::from_gray(24),
            placeholder: Color32::from_gray(48),
            placeholder_text: Color32::from_gray(160),
            region_fill: Color32::from_rgba_unmultiplied(0, 150, 255, 40),
            region_line: LineStyle::dashed(1.5, Color32::from_rgb(0, 150, 255), 6.0, 4.0),
            selected_fill: Color32::from_rgba_unmultiplied(255, 170, 0, 60),
            selected_line: LineStyle::solid(2.5, Color32::from_rgb(255, 170, 0)),
            transient_fill: Color32::from_rgba_unmultiplied(80, 220, 120, 30),
            transient_line: LineStyle::dashed(1.5, Color32::from_rgb(80, 220, 120), 3.0, 3.0),
            handle_fill: Color32::WHITE,
            handle_line: LineStyle::solid(1.0, Color32::from_rgb(255, 170, 0)),
            label_size: 12.0,
            label_color: Color32::WHITE,
            label_inset: vec2(4.0, 3.0),
        }
    }
}

/// Inputs to one redraw.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    /// Size of the canvas the scene is drawn on.
    pub canvas_size: Vec2,
    pub readiness: ImageReadiness,
    pub mapper: Option<&'a CoordinateMapper>,
    pub regions: &'a [Region],
    pub selected: Option<RegionId>,
    /// In-progress rectangle, natural space.
    pub transient: Option<Rect>,
    /// Side of the square corner handles, display pixels. Matches the editor's hit area.
    pub handle_size: f32,
}

pub fn render(frame: &Frame<'_>, style: &RenderStyle) -> Scene {
    let canvas = Rect::from_min_size(Pos2::ZERO, frame.canvas_size);
    let mut commands = vec![DrawCommand::Fill {
        rect: canvas,
        color: style.canvas,
    }];

    let mapper = match (frame.readiness, frame.mapper) {
        (ImageReadiness::Ready { .. }, Some(mapper)) => mapper,
        (readiness, _) => {
            commands.extend(placeholder(canvas, readiness, style));
            return Scene {
                size: frame.canvas_size,
                commands,
            };
        }
    };

    commands.push(DrawCommand::Image {
        rect: mapper.image_rect(),
    });

    for region in frame.regions {
        let rect = mapper.rect_to_display(region.rect());
        let (fill, line) = if frame.selected == Some(region.id) {
            (style.selected_fill, style.selected_line)
        } else {
            (style.region_fill, style.region_line)
        };
        commands.push(DrawCommand::Fill { rect, color: fill });
        commands.push(DrawCommand::Outline { rect, line });
        commands.push(DrawCommand::Label {
            pos: rect.min + style.label_inset,
            text: region.name.clone(),
            size: style.label_size,
            color: style.label_color,
        });
    }

    if let Some(region) = frame
        .selected
        .and_then(|id| frame.regions.iter().find(|region| region.id == id))
    {
        let rect = mapper.rect_to_display(region.rect());
        for handle in handle_rects(rect, frame.handle_size) {
            commands.push(DrawCommand::Fill {
                rect: handle,
                color: style.handle_fill,
            });
            commands.push(DrawCommand::Outline {
                rect: handle,
                line: style.handle_line,
            });
        }
    }

    if let Some(transient) = frame.transient {
        let rect = mapper.rect_to_display(transient);
        commands.push(DrawCommand::Fill {
            rect,
            color: style.transient_fill,
        });
        commands.push(DrawCommand::Outline {
            rect,
            line: style.transient_line,
        });
    }

    Scene {
        size: frame.canvas_size,
        commands,
    }
}

/// Square handles centred on each corner of `rect`, in [`Corner::ALL`] order.
pub fn handle_rects(rect: Rect, size: f32) -> [Rect; 4] {
    Corner::ALL.map(|corner| Rect::from_center_size(corner.of(rect), vec2(size, size)))
}

fn placeholder(canvas: Rect, readiness: ImageReadiness, style: &RenderStyle) -> Vec<DrawCommand> {
    let text = match readiness {
        ImageReadiness::Loading => "Loading image…",
        ImageReadiness::Empty | ImageReadiness::Ready { .. } => "No image",
    };
    vec![
        DrawCommand::Fill {
            rect: canvas,
            color: style.placeholder,
        },
        DrawCommand::Label {
            pos: pos2(canvas.min.x + 12.0, canvas.min.y + 12.0),
            text: text.to_owned(),
            size: style.label_size,
            color: style.placeholder_text,
        },
    ]
}
