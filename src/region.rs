//! Regions and the ordered store that owns them.

use std::fmt;

use egui::{Pos2, Rect, pos2, vec2};
use serde::{Deserialize, Serialize};

/// Identifier unique within one [`RegionStore`], never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the regions mean to the host: template design areas carry a name and a
/// rotation, mockup masks only geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    #[default]
    DesignArea,
    Mask,
}

impl RegionKind {
    pub const ALL: [Self; 2] = [Self::DesignArea, Self::Mask];

    pub fn label(self) -> &'static str {
        match self {
            Self::DesignArea => "Design areas",
            Self::Mask => "Masks",
        }
    }

    pub fn has_rotation(self) -> bool {
        matches!(self, Self::DesignArea)
    }

    /// Placeholder name for the region at 1-based `position`.
    pub fn default_name(self, position: usize) -> String {
        match self {
            Self::DesignArea => format!("Area {position}"),
            Self::Mask => format!("Mask {position}"),
        }
    }
}

/// A committed rectangle in natural-image pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

impl Region {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(pos2(self.x, self.y), vec2(self.width, self.height))
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.min.x;
        self.y = rect.min.y;
        self.width = rect.width();
        self.height = rect.height();
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, point: Pos2) -> bool {
        self.x <= point.x
            && point.x <= self.x + self.width
            && self.y <= point.y
            && point.y <= self.y + self.height
    }
}

/// A region as supplied from outside: ids and names may be missing and get
/// filled in when the store is seeded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionSeed {
    #[serde(default)]
    pub id: Option<RegionId>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rotation: Option<f32>,
}

impl From<&Region> for RegionSeed {
    fn from(region: &Region) -> Self {
        Self {
            id: Some(region.id),
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            name: Some(region.name.clone()),
            rotation: region.rotation,
        }
    }
}

/// Field addressed by the property editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionField {
    X,
    Y,
    Width,
    Height,
    Rotation,
    Name,
}

impl RegionField {
    pub const NUMERIC: [Self; 4] = [Self::X, Self::Y, Self::Width, Self::Height];

    pub fn label(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Width => "Width",
            Self::Height => "Height",
            Self::Rotation => "Rotation",
            Self::Name => "Name",
        }
    }
}

/// Parses a position or extent typed by the user. Anything unparseable or
/// non-finite reads as `0`, negatives clamp to `0`.
pub fn parse_extent(input: &str) -> f32 {
    match input.trim().parse::<f32>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Parses a rotation in degrees, wrapped into `[0, 360)`.
pub fn parse_rotation(input: &str) -> f32 {
    match input.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => value.rem_euclid(360.0),
        _ => 0.0,
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Ordered regions (later entries draw on top) plus at most one selection.
///
/// The selection always names a region that is present: removing the selected
/// region clears it, and selecting an unknown id is refused.
#[derive(Clone, Debug)]
pub struct RegionStore {
    kind: RegionKind,
    regions: Vec<Region>,
    selected: Option<RegionId>,
    next_id: u64,
}

impl RegionStore {
    pub fn new(kind: RegionKind) -> Self {
        Self {
            kind,
            regions: Vec::new(),
            selected: None,
            next_id: 1,
        }
    }

    /// Builds a store from an external list. Supplied ids are kept unless they
    /// collide; missing names get the kind's placeholder.
    pub fn seeded(kind: RegionKind, seeds: impl IntoIterator<Item = RegionSeed>) -> Self {
        let seeds: Vec<RegionSeed> = seeds.into_iter().collect();
        let mut store = Self::new(kind);
        store.next_id = seeds
            .iter()
            .filter_map(|seed| seed.id)
            .map(|id| id.0.saturating_add(1))
            .max()
            .unwrap_or(1)
            .max(1);

        for seed in seeds {
            let id = match seed.id {
                Some(id) if store.get(id).is_none() => id,
                _ => store.allocate_id(),
            };
            let position = store.regions.len() + 1;
            let rotation = match (seed.rotation, kind.has_rotation()) {
                (Some(r), _) => Some(if r.is_finite() { r.rem_euclid(360.0) } else { 0.0 }),
                (None, true) => Some(0.0),
                (None, false) => None,
            };
            store.regions.push(Region {
                id,
                x: sanitize(seed.x),
                y: sanitize(seed.y),
                width: sanitize(seed.width),
                height: sanitize(seed.height),
                name: seed.name.unwrap_or_else(|| kind.default_name(position)),
                rotation,
            });
        }
        store
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Changes the placeholder scheme and rotation handling. Existing regions
    /// gain a zero rotation when the new kind carries one.
    pub fn set_kind(&mut self, kind: RegionKind) {
        self.kind = kind;
        if kind.has_rotation() {
            for region in &mut self.regions {
                region.rotation.get_or_insert(0.0);
            }
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|region| region.id == id)
    }

    pub fn selected(&self) -> Option<RegionId> {
        self.selected
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Returns whether the selection changed. Unknown ids leave it as it was.
    pub fn select(&mut self, id: Option<RegionId>) -> bool {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return false;
            }
        }
        let changed = self.selected != id;
        self.selected = id;
        changed
    }

    /// Appends a region covering `rect` and returns its fresh id.
    pub fn insert(&mut self, rect: Rect) -> RegionId {
        let id = self.allocate_id();
        let position = self.regions.len() + 1;
        let mut region = Region {
            id,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            name: self.kind.default_name(position),
            rotation: self.kind.has_rotation().then_some(0.0),
        };
        region.set_rect(rect);
        self.regions.push(region);
        id
    }

    /// Removes `id`, clearing the selection if it pointed there. Missing ids are a no-op.
    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let index = self.regions.iter().position(|region| region.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.regions.remove(index))
    }

    /// Topmost region containing `point`, searching in reverse insertion order.
    pub fn hit_test(&self, point: Pos2) -> Option<RegionId> {
        self.regions
            .iter()
            .rev()
            .find(|region| region.contains(point))
            .map(|region| region.id)
    }

    /// Applies raw user input to one field. Returns whether the region changed.
    pub fn edit(&mut self, id: RegionId, field: RegionField, input: &str) -> bool {
        let Some(region) = self.get_mut(id) else {
            return false;
        };
        let before = region.clone();
        match field {
            RegionField::X => region.x = parse_extent(input),
            RegionField::Y => region.y = parse_extent(input),
            RegionField::Width => region.width = parse_extent(input),
            RegionField::Height => region.height = parse_extent(input),
            RegionField::Rotation => region.rotation = Some(parse_rotation(input)),
            RegionField::Name => input.clone_into(&mut region.name),
        }
        *region != before
    }

    /// Hands out the counter's next id. Once the counter is exhausted, falls
    /// back to the lowest id not currently in use.
    fn allocate_id(&mut self) -> RegionId {
        if let Some(after) = self.next_id.checked_add(1) {
            let id = RegionId(self.next_id);
            if self.get(id).is_none() {
                self.next_id = after;
                return id;
            }
        }
        let mut used: Vec<u64> = self.regions.iter().map(|region| region.id.0).collect();
        used.sort_unstable();
        let mut candidate = 1_u64;
        for id in used {
            if id == candidate {
                candidate = candidate.saturating_add(1);
            } else if id > candidate {
                break;
            }
        }
        RegionId(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        RegionField, RegionId, RegionKind, RegionSeed, RegionStore, parse_extent, parse_rotation,
    };
    use egui::{Rect, pos2};

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(pos2(x, y), egui::vec2(w, h))
    }

    #[test]
    fn insert_assigns_fresh_ids_and_placeholder_names() {
        let mut store = RegionStore::new(RegionKind::DesignArea);
        let a = store.insert(rect(0.0, 0.0, 20.0, 20.0));
        let b = store.insert(rect(5.0, 5.0, 20.0, 20.0));
        assert_ne!(a, b);
        assert_eq!(store.regions()[0].name, "Area 1");
        assert_eq!(store.regions()[1].name, "Area 2");
        assert_eq!(store.regions()[1].rotation, Some(0.0));

        let mut masks = RegionStore::new(RegionKind::Mask);
        masks.insert(rect(0.0, 0.0, 20.0, 20.0));
        assert_eq!(masks.regions()[0].name, "Mask 1");
        assert_eq!(masks.regions()[0].rotation, None);
    }

    #[test]
    fn hit_test_prefers_topmost_and_includes_edges() {
        let mut store = RegionStore::new(RegionKind::Mask);
        let below = store.insert(rect(0.0, 0.0, 100.0, 100.0));
        let above = store.insert(rect(50.0, 50.0, 100.0, 100.0));
        assert_eq!(store.hit_test(pos2(75.0, 75.0)), Some(above));
        assert_eq!(store.hit_test(pos2(10.0, 10.0)), Some(below));
        assert_eq!(store.hit_test(pos2(100.0, 0.0)), Some(below));
        assert_eq!(store.hit_test(pos2(150.0, 150.0)), Some(above));
        assert_eq!(store.hit_test(pos2(151.0, 150.0)), None);
    }

    #[test]
    fn removing_selected_clears_selection() {
        let mut store = RegionStore::new(RegionKind::Mask);
        let a = store.insert(rect(0.0, 0.0, 10.0, 10.0));
        let b = store.insert(rect(20.0, 0.0, 10.0, 10.0));
        assert!(store.select(Some(b)));

        store.remove(a);
        assert_eq!(store.selected(), Some(b));
        store.remove(b);
        assert_eq!(store.selected(), None);
        assert!(store.remove(b).is_none());
    }

    #[test]
    fn selecting_unknown_id_is_refused() {
        let mut store = RegionStore::new(RegionKind::Mask);
        assert!(!store.select(Some(RegionId(42))));
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn numeric_input_is_clamped_not_rejected() {
        assert_eq!(parse_extent("12.5"), 12.5);
        assert_eq!(parse_extent("  7 "), 7.0);
        assert_eq!(parse_extent("-3"), 0.0);
        assert_eq!(parse_extent(""), 0.0);
        assert_eq!(parse_extent("abc"), 0.0);
        assert_eq!(parse_extent("NaN"), 0.0);
        assert_eq!(parse_rotation("-90"), 270.0);
        assert_eq!(parse_rotation("junk"), 0.0);
    }

    #[test]
    fn edit_changes_only_the_named_field() {
        let mut store = RegionStore::new(RegionKind::DesignArea);
        let id = store.insert(rect(10.0, 20.0, 30.0, 40.0));
        assert!(store.edit(id, RegionField::Name, "Front Panel"));
        assert!(store.edit(id, RegionField::Width, "-5"));
        let region = store.get(id).expect("region exists");
        assert_eq!(region.name, "Front Panel");
        assert_eq!(region.width, 0.0);
        assert_eq!((region.x, region.y, region.height), (10.0, 20.0, 40.0));
        assert!(!store.edit(RegionId(99), RegionField::X, "1"));
    }

    #[test]
    fn seeding_keeps_ids_and_continues_counter_above_them() {
        let seeds = vec![
            RegionSeed {
                id: Some(RegionId(7)),
                x: 1.0,
                y: 2.0,
                width: 30.0,
                height: 40.0,
                ..RegionSeed::default()
            },
            RegionSeed {
                id: Some(RegionId(7)),
                x: -4.0,
                width: 10.0,
                height: 10.0,
                name: Some("Sleeve".to_owned()),
                ..RegionSeed::default()
            },
        ];
        let mut store = RegionStore::seeded(RegionKind::DesignArea, seeds);
        let ids: Vec<RegionId> = store.regions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RegionId(7), RegionId(8)]);
        assert_eq!(store.regions()[0].name, "Area 1");
        assert_eq!(store.regions()[1].name, "Sleeve");
        assert_eq!(store.regions()[1].x, 0.0);
        assert_eq!(store.insert(rect(0.0, 0.0, 10.0, 10.0)), RegionId(9));
    }

    #[test]
    fn exhausted_counter_still_yields_unique_ids() {
        let top = RegionSeed {
            id: Some(RegionId(u64::MAX)),
            width: 20.0,
            height: 20.0,
            ..RegionSeed::default()
        };
        let mut store = RegionStore::seeded(RegionKind::Mask, vec![top.clone(), top]);
        let first = store.insert(rect(0.0, 0.0, 10.0, 10.0));
        let second = store.insert(rect(20.0, 0.0, 10.0, 10.0));

        let mut ids: Vec<RegionId> = store.regions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RegionId(u64::MAX), RegionId(1), first, second]);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn switching_to_design_areas_adds_rotation() {
        let mut store = RegionStore::new(RegionKind::Mask);
        let id = store.insert(rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(store.get(id).and_then(|r| r.rotation), None);

        store.set_kind(RegionKind::DesignArea);
        assert_eq!(store.get(id).and_then(|r| r.rotation), Some(0.0));
        assert!(store.edit(id, RegionField::Rotation, "45"));

        // masks keep whatever rotation they already had
        store.set_kind(RegionKind::Mask);
        assert_eq!(store.get(id).and_then(|r| r.rotation), Some(45.0));
    }
}
