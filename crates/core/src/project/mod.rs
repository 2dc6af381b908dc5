//! Project files: a JSON snapshot of every paint and mapping.
//!
//! Loading replays the snapshot through the checked factories, reserving the
//! saved uids so that mapping → paint references stay valid. Entries without
//! a uid are skipped rather than given a fresh one.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    MapError, Mapping, MappingManager, Paint, PaintKind, Point, Result, Rgba, Shape, ShapeKind,
    Uid, DEFAULT_RATE, NULL_UID,
};

pub const PROJECT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub paints: Vec<PaintRecord>,
    /// Back to front.
    pub mappings: Vec<MappingRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintRecord {
    pub uid: Uid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Point,
    #[serde(flatten)]
    pub source: PaintSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaintSource {
    Media {
        uri: String,
        #[serde(default = "default_rate")]
        rate: f64,
        #[serde(default = "default_volume")]
        volume: f64,
        #[serde(default)]
        live: bool,
    },
    Image {
        uri: String,
    },
    Color {
        color: Rgba,
    },
}

fn default_rate() -> f64 {
    DEFAULT_RATE
}

fn default_volume() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub uid: Uid,
    pub paint: Uid,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub locked: bool,
    pub output: ShapeRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<ShapeRecord>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub kind: ShapeKind,
    pub vertices: Vec<Point>,
}

impl From<&Shape> for ShapeRecord {
    fn from(shape: &Shape) -> Self {
        Self {
            kind: shape.kind(),
            vertices: shape.vertices().to_vec(),
        }
    }
}

/// What a load managed to rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub paints: usize,
    pub mappings: usize,
    pub skipped: usize,
}

impl ProjectFile {
    pub fn capture(manager: &MappingManager) -> Self {
        Self {
            version: PROJECT_VERSION,
            paints: manager.paints().map(paint_record).collect(),
            mappings: manager.mappings().map(mapping_record).collect(),
        }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let project: Self = serde_json::from_str(&text)?;
        if project.version > PROJECT_VERSION {
            return Err(MapError::msg(format!(
                "project version {} is newer than supported version {PROJECT_VERSION}",
                project.version
            )));
        }
        Ok(project)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Rebuilds the snapshot into `manager`, which should be empty.
    ///
    /// Entries that fail validation are logged and skipped; a skipped paint
    /// takes its mappings with it.
    pub fn restore(&self, manager: &mut MappingManager) -> LoadReport {
        let mut report = LoadReport::default();

        for record in &self.paints {
            match restore_paint(manager, record) {
                Ok(_) => report.paints += 1,
                Err(err) => {
                    warn!(paint = record.uid, %err, "skipping paint");
                    report.skipped += 1;
                }
            }
        }

        for record in &self.mappings {
            match restore_mapping(manager, record) {
                Ok(_) => report.mappings += 1,
                Err(err) => {
                    warn!(mapping = record.uid, %err, "skipping mapping");
                    report.skipped += 1;
                }
            }
        }

        info!(
            paints = report.paints,
            mappings = report.mappings,
            skipped = report.skipped,
            "project restored"
        );
        report
    }
}

fn paint_record(paint: &Paint) -> PaintRecord {
    let source = match paint.kind() {
        PaintKind::Media(media) => PaintSource::Media {
            uri: media.uri.clone(),
            rate: media.rate,
            volume: media.volume,
            live: media.live,
        },
        PaintKind::Image { uri } => PaintSource::Image { uri: uri.clone() },
        PaintKind::Color(color) => PaintSource::Color { color: *color },
    };
    PaintRecord {
        uid: paint.uid(),
        name: paint.name.clone(),
        position: paint.position,
        source,
    }
}

fn mapping_record(mapping: &Mapping) -> MappingRecord {
    MappingRecord {
        uid: mapping.uid(),
        paint: mapping.paint(),
        name: mapping.name.clone(),
        visible: mapping.visible,
        solo: mapping.solo,
        locked: mapping.locked,
        output: mapping.output().into(),
        input: mapping.input().map(ShapeRecord::from),
    }
}

fn restore_paint(manager: &mut MappingManager, record: &PaintRecord) -> Result<Uid> {
    if record.uid == NULL_UID {
        return Err(MapError::InvalidInput("saved paint has no uid"));
    }
    let uid = match &record.source {
        PaintSource::Media {
            uri,
            rate,
            volume,
            live,
        } => {
            let uid =
                manager.create_media_paint(record.uid, uri.as_str(), record.position, *live, *rate)?;
            if let Some(paint) = manager.paint_by_id_mut(uid) {
                paint.set_volume(*volume)?;
            }
            uid
        }
        PaintSource::Image { uri } => {
            manager.create_image_paint(record.uid, uri.as_str(), record.position)?
        }
        PaintSource::Color { color } => manager.create_color_paint(record.uid, *color)?,
    };
    if let Some(paint) = manager.paint_by_id_mut(uid) {
        if !record.name.is_empty() {
            paint.name = record.name.clone();
        }
        paint.position = record.position;
    }
    Ok(uid)
}

fn restore_mapping(manager: &mut MappingManager, record: &MappingRecord) -> Result<Uid> {
    if record.uid == NULL_UID {
        return Err(MapError::InvalidInput("saved mapping has no uid"));
    }
    let texture = manager
        .paint_by_id(record.paint)
        .ok_or(MapError::UnknownPaint(record.paint))?
        .is_texture();
    let dst = &record.output.vertices;

    let uid = match (texture, record.output.kind, &record.input) {
        (true, ShapeKind::Mesh { columns, rows }, Some(input)) => {
            manager.create_mesh_texture_mapping(
                record.uid,
                record.paint,
                columns,
                rows,
                &input.vertices,
                dst,
            )?
        }
        (true, ShapeKind::Triangle, Some(input)) => {
            manager.create_triangle_texture_mapping(record.uid, record.paint, &input.vertices, dst)?
        }
        (true, ShapeKind::Ellipse, Some(input)) => {
            manager.create_ellipse_texture_mapping(record.uid, record.paint, &input.vertices, dst)?
        }
        (false, ShapeKind::Quad, None) => {
            manager.create_quad_color_mapping(record.uid, record.paint, dst)?
        }
        (false, ShapeKind::Triangle, None) => {
            manager.create_triangle_color_mapping(record.uid, record.paint, dst)?
        }
        (false, ShapeKind::Ellipse, None) => {
            manager.create_ellipse_color_mapping(record.uid, record.paint, dst)?
        }
        (_, kind, _) => {
            return Err(MapError::msg(format!(
                "unsupported {kind} mapping on {} paint",
                if texture { "texture" } else { "color" }
            )))
        }
    };

    if let Some(mapping) = manager.mapping_by_id_mut(uid) {
        if !record.name.is_empty() {
            mapping.name = record.name.clone();
        }
        mapping.visible = record.visible;
        mapping.solo = record.solo;
        mapping.locked = record.locked;
    }
    Ok(uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f32 * 10.0, 5.0)).collect()
    }

    fn sample_manager() -> MappingManager {
        let mut manager = MappingManager::new();
        manager
            .create_media_paint(4, "clips/loop.mov", Point::new(12.0, 8.0), false, 75.0)
            .unwrap();
        manager
            .create_color_paint(9, Rgba::new(255, 128, 0, 200))
            .unwrap();
        manager
            .create_mesh_texture_mapping(30, 4, 2, 3, &points(6), &points(6))
            .unwrap();
        manager.create_quad_color_mapping(11, 9, &points(4)).unwrap();
        manager
            .create_ellipse_texture_mapping(12, 4, &points(5), &points(5))
            .unwrap();
        manager.reorder_mappings(&[11, 12, 30]).unwrap();
        manager.mapping_by_id_mut(12).unwrap().visible = false;
        manager.paint_by_id_mut(4).unwrap().set_volume(0.25).unwrap();
        manager
    }

    #[test]
    fn save_and_open_preserve_uids_and_order() {
        let manager = sample_manager();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("show.json");
        ProjectFile::capture(&manager).write(&path).unwrap();

        let mut loaded = MappingManager::new();
        let report = ProjectFile::read(&path).unwrap().restore(&mut loaded);
        assert_eq!(
            report,
            LoadReport {
                paints: 2,
                mappings: 3,
                skipped: 0
            }
        );
        assert_eq!(loaded.order(), &[11, 12, 30]);
        assert!(!loaded.mapping_by_id(12).unwrap().visible);
        assert_eq!(loaded.mapping_by_id(30).unwrap().paint(), 4);

        let media = loaded.paint_by_id(4).unwrap();
        assert_eq!(media.position, Point::new(12.0, 8.0));
        assert_eq!(media.media_source().unwrap().rate, 75.0);
        assert_eq!(media.media_source().unwrap().volume, 0.25);
        assert_eq!(ProjectFile::capture(&loaded), ProjectFile::capture(&manager));
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let mut project = ProjectFile::capture(&sample_manager());
        project.mappings[0].output.vertices.pop();
        project.paints.retain(|paint| paint.uid != 4);

        let mut loaded = MappingManager::new();
        let report = project.restore(&mut loaded);
        assert_eq!(report.paints, 1);
        assert_eq!(report.mappings, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(loaded.n_mappings(), 0);
    }

    #[test]
    fn entries_without_uid_are_skipped() {
        let text = r#"{
            "version": 1,
            "paints": [
                { "uid": 0, "name": "red", "type": "color", "color": { "r": 255, "g": 0, "b": 0, "a": 255 } },
                { "uid": 1, "name": "blue", "type": "color", "color": { "r": 0, "g": 0, "b": 255, "a": 255 } }
            ],
            "mappings": [
                {
                    "uid": 5,
                    "paint": 1,
                    "output": { "kind": "triangle", "vertices": [
                        { "x": 0, "y": 0 }, { "x": 1, "y": 0 }, { "x": 0, "y": 1 } ] }
                },
                {
                    "uid": 0,
                    "paint": 1,
                    "output": { "kind": "triangle", "vertices": [
                        { "x": 0, "y": 0 }, { "x": 1, "y": 0 }, { "x": 0, "y": 1 } ] }
                }
            ]
        }"#;
        let project: ProjectFile = serde_json::from_str(text).unwrap();
        let mut manager = MappingManager::new();
        let report = project.restore(&mut manager);

        assert_eq!(
            report,
            LoadReport {
                paints: 1,
                mappings: 1,
                skipped: 2
            }
        );
        let bound = manager.mapping_by_id(5).unwrap().paint();
        assert_eq!(bound, 1);
        assert_eq!(manager.paint_by_id(bound).unwrap().name, "blue");
        assert_eq!(manager.n_paints(), 1);
        assert_eq!(manager.n_mappings(), 1);
    }

    #[test]
    fn reads_minimal_hand_written_file() {
        let text = r#"{
            "version": 1,
            "paints": [
                { "uid": 1, "type": "color", "color": { "r": 0, "g": 255, "b": 0, "a": 255 } },
                { "uid": 2, "type": "image", "uri": "wall.png" }
            ],
            "mappings": [
                {
                    "uid": 5,
                    "paint": 2,
                    "output": { "kind": "triangle", "vertices": [
                        { "x": 0, "y": 0 }, { "x": 1, "y": 0 }, { "x": 0, "y": 1 } ] },
                    "input": { "kind": "triangle", "vertices": [
                        { "x": 0, "y": 0 }, { "x": 1, "y": 0 }, { "x": 0, "y": 1 } ] }
                },
                {
                    "uid": 6,
                    "paint": 1,
                    "output": { "kind": { "mesh": { "columns": 2, "rows": 2 } }, "vertices": [
                        { "x": 0, "y": 0 }, { "x": 1, "y": 0 }, { "x": 0, "y": 1 }, { "x": 1, "y": 1 } ] }
                }
            ]
        }"#;
        let project: ProjectFile = serde_json::from_str(text).unwrap();
        let mut manager = MappingManager::new();
        let report = project.restore(&mut manager);

        assert_eq!(report.paints, 2);
        assert_eq!(report.mappings, 1);
        assert_eq!(report.skipped, 1);
        assert!(manager.mapping_by_id(5).unwrap().visible);
        assert_eq!(manager.paint_by_id(1).unwrap().name, "#00ff00");
        assert!(!manager.mapping_exists(6));
        assert!(manager.paint_exists(2));
    }

    #[test]
    fn newer_versions_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        let project = ProjectFile {
            version: PROJECT_VERSION + 1,
            paints: Vec::new(),
            mappings: Vec::new(),
        };
        project.write(&path).unwrap();
        assert!(ProjectFile::read(&path).is_err());
    }
}
