//! Mapping between display space (canvas pixels, possibly scaled down for layout)
//! and natural space (the background image's own pixel grid).
//!
//! Regions are always stored in natural space; only pointer input and painting
//! deal in display coordinates.

use egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

/// One of the four corners of a rectangle, used for resize handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    pub fn of(self, rect: Rect) -> Pos2 {
        match self {
            Self::TopLeft => rect.left_top(),
            Self::TopRight => rect.right_top(),
            Self::BottomRight => rect.right_bottom(),
            Self::BottomLeft => rect.left_bottom(),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }
}

/// Rectangle spanned by an anchor and a moving point, with non-negative extents.
pub fn span(anchor: Pos2, current: Pos2) -> Rect {
    Rect::from_min_max(
        pos2(anchor.x.min(current.x), anchor.y.min(current.y)),
        pos2(anchor.x.max(current.x), anchor.y.max(current.y)),
    )
}

/// Scale and offset relating display space to natural space.
///
/// `scale` is display pixels per natural pixel and is always positive.
/// `offset` is where the image's top-left corner sits on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    scale: f32,
    offset: Vec2,
    image_size: Vec2,
}

impl CoordinateMapper {
    /// Returns `None` unless `scale` is finite and positive and the image has an area.
    pub fn new(scale: f32, offset: Vec2, image_size: Vec2) -> Option<Self> {
        let valid = scale.is_finite()
            && scale > 0.0
            && image_size.x > 0.0
            && image_size.y > 0.0
            && offset.is_finite();
        valid.then_some(Self {
            scale,
            offset,
            image_size,
        })
    }

    /// Largest aspect-preserving fit of `image_size` into a box `container.x` wide
    /// and `min(container.y, max_display_height)` tall, centred horizontally.
    pub fn fit(container: Vec2, image_size: Vec2, max_display_height: f32) -> Option<Self> {
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            return None;
        }
        let box_height = container.y.min(max_display_height);
        if container.x <= 0.0 || box_height <= 0.0 {
            return None;
        }
        let scale = (container.x / image_size.x).min(box_height / image_size.y);
        let displayed_width = image_size.x * scale;
        let offset = vec2(((container.x - displayed_width) * 0.5).max(0.0), 0.0);
        Self::new(scale, offset, image_size)
    }

    /// Refits in place. Leaves the current mapping untouched when the inputs are
    /// degenerate (zero-sized container or image) and reports whether anything changed.
    pub fn recompute(
        &mut self,
        container: Vec2,
        image_size: Vec2,
        max_display_height: f32,
    ) -> bool {
        match Self::fit(container, image_size, max_display_height) {
            Some(next) if next != *self => {
                *self = next;
                true
            }
            _ => false,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn image_size(&self) -> Vec2 {
        self.image_size
    }

    pub fn to_natural(&self, display: Pos2) -> Pos2 {
        ((display - self.offset).to_vec2() / self.scale).to_pos2()
    }

    pub fn to_display(&self, natural: Pos2) -> Pos2 {
        (natural.to_vec2() * self.scale + self.offset).to_pos2()
    }

    pub fn rect_to_display(&self, natural: Rect) -> Rect {
        Rect::from_min_max(self.to_display(natural.min), self.to_display(natural.max))
    }

    pub fn rect_to_natural(&self, display: Rect) -> Rect {
        Rect::from_min_max(self.to_natural(display.min), self.to_natural(display.max))
    }

    /// Where the whole image lands on the canvas.
    pub fn image_rect(&self) -> Rect {
        Rect::from_min_size(self.offset.to_pos2(), self.image_size * self.scale)
    }

    /// Canvas extent needed to show the image at the current scale.
    pub fn display_size(&self) -> Vec2 {
        self.offset + self.image_size * self.scale
    }

    pub fn contains_natural(&self, natural: Pos2) -> bool {
        natural.x >= 0.0
            && natural.y >= 0.0
            && natural.x <= self.image_size.x
            && natural.y <= self.image_size.y
    }

    pub fn clamp_natural(&self, natural: Pos2) -> Pos2 {
        pos2(
            natural.x.clamp(0.0, self.image_size.x),
            natural.y.clamp(0.0, self.image_size.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateMapper, Corner, span};
    use egui::{Rect, pos2, vec2};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn fit_halves_an_image_twice_the_container() {
        let mapper = CoordinateMapper::fit(vec2(400.0, 1000.0), vec2(800.0, 600.0), 300.0)
            .expect("valid mapping");
        assert!(approx(mapper.scale(), 0.5));
        assert_eq!(mapper.offset(), vec2(0.0, 0.0));
        assert_eq!(mapper.display_size(), vec2(400.0, 300.0));
    }

    #[test]
    fn fit_is_limited_by_max_height_and_centres_horizontally() {
        let mapper = CoordinateMapper::fit(vec2(1000.0, 900.0), vec2(800.0, 600.0), 300.0)
            .expect("valid mapping");
        assert!(approx(mapper.scale(), 0.5));
        assert!(approx(mapper.offset().x, 300.0));
        assert!(approx(mapper.offset().y, 0.0));
    }

    #[test]
    fn fit_rejects_degenerate_inputs() {
        assert!(CoordinateMapper::fit(vec2(0.0, 500.0), vec2(800.0, 600.0), 600.0).is_none());
        assert!(CoordinateMapper::fit(vec2(400.0, 500.0), vec2(0.0, 600.0), 600.0).is_none());
        assert!(CoordinateMapper::new(0.0, vec2(0.0, 0.0), vec2(10.0, 10.0)).is_none());
    }

    #[test]
    fn recompute_keeps_previous_mapping_on_bad_input() {
        let mut mapper = CoordinateMapper::fit(vec2(400.0, 300.0), vec2(800.0, 600.0), 600.0)
            .expect("valid mapping");
        let before = mapper;
        assert!(!mapper.recompute(vec2(0.0, 0.0), vec2(800.0, 600.0), 600.0));
        assert_eq!(mapper, before);
        assert!(mapper.recompute(vec2(800.0, 600.0), vec2(800.0, 600.0), 600.0));
        assert!(approx(mapper.scale(), 1.0));
    }

    #[test]
    fn natural_display_round_trip() {
        let mapper = CoordinateMapper::new(0.37, vec2(12.5, 3.0), vec2(1920.0, 1080.0))
            .expect("valid mapping");
        for p in [pos2(0.0, 0.0), pos2(123.4, 987.6), pos2(1919.0, 1.0), pos2(640.5, 360.25)] {
            let back = mapper.to_natural(mapper.to_display(p));
            assert!(approx(back.x, p.x) && approx(back.y, p.y), "{p:?} came back as {back:?}");
        }
    }

    #[test]
    fn span_normalizes_any_drag_direction() {
        let rect = span(pos2(30.0, 5.0), pos2(10.0, 25.0));
        assert_eq!(rect, Rect::from_min_max(pos2(10.0, 5.0), pos2(30.0, 25.0)));
    }

    #[test]
    fn opposite_corner_is_diagonal() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(4.0, 2.0));
        for corner in Corner::ALL {
            let a = corner.of(rect);
            let b = corner.opposite().of(rect);
            assert!(approx((a - b).length_sq(), 20.0));
        }
    }
}
