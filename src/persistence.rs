//! Handing the region list to whoever stores it.
//!
//! Hosts consume one of two shapes: template design areas (with name and
//! rotation) or mockup masks (id and geometry only). Both are projections of
//! [`Region`].

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::region::{Region, RegionId, RegionKind, RegionSeed};

/// When the editor pushes its regions to the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveMode {
    /// After every committed change: new region, field edit, delete, finished resize.
    OnCommit,
    /// Only when the host asks for a save.
    #[default]
    Explicit,
}

impl SaveMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::OnCommit => "Save on every change",
            Self::Explicit => "Save on request",
        }
    }
}

/// Receives the full, current region list.
pub trait RegionSink {
    fn save(&mut self, kind: RegionKind, regions: &[Region]) -> anyhow::Result<()>;
}

impl<F> RegionSink for F
where
    F: FnMut(RegionKind, &[Region]) -> anyhow::Result<()>,
{
    fn save(&mut self, kind: RegionKind, regions: &[Region]) -> anyhow::Result<()> {
        self(kind, regions)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub name: String,
}

impl From<&Region> for DesignArea {
    fn from(region: &Region) -> Self {
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            rotation: region.rotation.unwrap_or(0.0),
            name: region.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub id: RegionId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<&Region> for Mask {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id,
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        }
    }
}

pub fn design_areas(regions: &[Region]) -> Vec<DesignArea> {
    regions.iter().map(DesignArea::from).collect()
}

pub fn masks(regions: &[Region]) -> Vec<Mask> {
    regions.iter().map(Mask::from).collect()
}

/// Pretty JSON in the shape `kind` asks for.
pub fn to_json(kind: RegionKind, regions: &[Region]) -> anyhow::Result<String> {
    let json = match kind {
        RegionKind::DesignArea => serde_json::to_string_pretty(&design_areas(regions)),
        RegionKind::Mask => serde_json::to_string_pretty(&masks(regions)),
    }?;
    Ok(json)
}

/// Reads a list in either shape; missing ids and names are filled in when seeding.
pub fn parse_regions(json: &str) -> anyhow::Result<Vec<RegionSeed>> {
    let seeds = serde_json::from_str(json).context("Region list is not valid JSON")?;
    Ok(seeds)
}

pub fn load_regions(path: &Path) -> anyhow::Result<Vec<RegionSeed>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    parse_regions(&raw).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Writes the list to a JSON file, replacing it each time.
#[derive(Clone, Debug)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegionSink for JsonFileSink {
    fn save(&mut self, kind: RegionKind, regions: &[Region]) -> anyhow::Result<()> {
        let json = to_json(kind, regions)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write '{}'", self.path.display()))?;
        log::info!("saved {} regions to {}", regions.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonFileSink, RegionSink, load_regions, parse_regions, to_json};
    use crate::region::{RegionId, RegionKind, RegionStore};
    use egui::{Rect, pos2, vec2};

    fn store(kind: RegionKind) -> RegionStore {
        let mut store = RegionStore::new(kind);
        store.insert(Rect::from_min_size(pos2(200.0, 200.0), vec2(400.0, 300.0)));
        store
    }

    #[test]
    fn design_area_shape_has_rotation_and_name_but_no_id() {
        let json = to_json(RegionKind::DesignArea, store(RegionKind::DesignArea).regions())
            .expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        let area = &value[0];
        assert_eq!(area["x"], 200.0);
        assert_eq!(area["height"], 300.0);
        assert_eq!(area["rotation"], 0.0);
        assert_eq!(area["name"], "Area 1");
        assert!(area.get("id").is_none());
    }

    #[test]
    fn mask_shape_has_id_and_geometry_only() {
        let json = to_json(RegionKind::Mask, store(RegionKind::Mask).regions()).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        let mask = &value[0];
        assert_eq!(mask["id"], 1);
        assert_eq!(mask["width"], 400.0);
        assert!(mask.get("name").is_none());
        assert!(mask.get("rotation").is_none());
    }

    #[test]
    fn either_shape_parses_as_seeds() {
        let seeds = parse_regions(
            r#"[{"id": 4, "x": 1, "y": 2, "width": 30, "height": 40},
                {"x": 5, "y": 6, "width": 70, "height": 80, "rotation": 15, "name": "Back"}]"#,
        )
        .expect("parse");
        assert_eq!(seeds[0].id, Some(RegionId(4)));
        assert_eq!(seeds[1].name.as_deref(), Some("Back"));
        assert_eq!(seeds[1].rotation, Some(15.0));
        assert!(parse_regions("{not json").is_err());
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = 0;
        let mut sink = |_kind: RegionKind, regions: &[crate::region::Region]| -> anyhow::Result<()> {
            seen = regions.len();
            Ok(())
        };
        sink.save(RegionKind::Mask, store(RegionKind::Mask).regions())
            .expect("save");
        assert_eq!(seen, 1);
    }

    #[test]
    fn json_file_sink_round_trips_through_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("areas.json");
        let mut sink = JsonFileSink::new(&path);
        sink.save(RegionKind::DesignArea, store(RegionKind::DesignArea).regions())
            .expect("save");

        let seeds = load_regions(&path).expect("load");
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].width, 400.0);
        assert_eq!(seeds[0].name.as_deref(), Some("Area 1"));
    }
}
