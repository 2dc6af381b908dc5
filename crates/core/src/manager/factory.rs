//! Checked constructors used by interactive actions, remote control and
//! project loading alike.
//!
//! Every factory refuses a requested uid that is already live, refuses a
//! missing paint, and validates vertex counts before anything is inserted,
//! so a failed call leaves the model untouched. Passing [`NULL_UID`] as the
//! requested uid mints a fresh one.

use crate::{
    MapError, Mapping, MappingManager, Paint, Point, Result, Rgba, Shape, ShapeKind, Uid, Universe,
    NULL_UID,
};

impl MappingManager {
    /// Creates a video paint. `rate` is in percent.
    pub fn create_media_paint(
        &mut self,
        paint_id: Uid,
        uri: impl Into<String>,
        position: Point,
        live: bool,
        rate: f64,
    ) -> Result<Uid> {
        self.check_paint_id(paint_id)?;
        let paint = Paint::media(uri, live, rate)
            .with_uid(paint_id)
            .at(position);
        self.add_paint(paint)
    }

    pub fn create_image_paint(
        &mut self,
        paint_id: Uid,
        uri: impl Into<String>,
        position: Point,
    ) -> Result<Uid> {
        self.check_paint_id(paint_id)?;
        self.add_paint(Paint::image(uri).with_uid(paint_id).at(position))
    }

    pub fn create_color_paint(&mut self, paint_id: Uid, color: Rgba) -> Result<Uid> {
        self.check_paint_id(paint_id)?;
        self.add_paint(Paint::color(color).with_uid(paint_id))
    }

    pub fn create_mesh_texture_mapping(
        &mut self,
        mapping_id: Uid,
        paint_id: Uid,
        columns: usize,
        rows: usize,
        src: &[Point],
        dst: &[Point],
    ) -> Result<Uid> {
        self.check_mapping_ids(mapping_id, paint_id)?;
        let input = Shape::mesh(columns, rows, src.to_vec())?;
        let output = Shape::mesh(columns, rows, dst.to_vec())?;
        self.add_mapping(Mapping::texture(paint_id, output, input)?.with_uid(mapping_id))
    }

    pub fn create_triangle_texture_mapping(
        &mut self,
        mapping_id: Uid,
        paint_id: Uid,
        src: &[Point],
        dst: &[Point],
    ) -> Result<Uid> {
        self.check_mapping_ids(mapping_id, paint_id)?;
        let input = Shape::triangle(src.to_vec())?;
        let output = Shape::triangle(dst.to_vec())?;
        self.add_mapping(Mapping::texture(paint_id, output, input)?.with_uid(mapping_id))
    }

    /// Texture ellipses carry a centre control point: five vertices each.
    pub fn create_ellipse_texture_mapping(
        &mut self,
        mapping_id: Uid,
        paint_id: Uid,
        src: &[Point],
        dst: &[Point],
    ) -> Result<Uid> {
        self.check_mapping_ids(mapping_id, paint_id)?;
        let input = five_point_ellipse(src)?;
        let output = five_point_ellipse(dst)?;
        self.add_mapping(Mapping::texture(paint_id, output, input)?.with_uid(mapping_id))
    }

    pub fn create_quad_color_mapping(
        &mut self,
        mapping_id: Uid,
        paint_id: Uid,
        dst: &[Point],
    ) -> Result<Uid> {
        self.check_mapping_ids(mapping_id, paint_id)?;
        let output = Shape::quad(dst.to_vec())?;
        self.add_mapping(Mapping::color(paint_id, output)?.with_uid(mapping_id))
    }

    pub fn create_triangle_color_mapping(
        &mut self,
        mapping_id: Uid,
        paint_id: Uid,
        dst: &[Point],
    ) -> Result<Uid> {
        self.check_mapping_ids(mapping_id, paint_id)?;
        let output = Shape::triangle(dst.to_vec())?;
        self.add_mapping(Mapping::color(paint_id, output)?.with_uid(mapping_id))
    }

    /// Color ellipses have four axis points and no centre.
    pub fn create_ellipse_color_mapping(
        &mut self,
        mapping_id: Uid,
        paint_id: Uid,
        dst: &[Point],
    ) -> Result<Uid> {
        self.check_mapping_ids(mapping_id, paint_id)?;
        if dst.len() != 4 {
            return Err(MapError::VertexCount {
                shape: ShapeKind::Ellipse,
                expected: 4,
                found: dst.len(),
            });
        }
        let output = Shape::ellipse(dst.to_vec())?;
        self.add_mapping(Mapping::color(paint_id, output)?.with_uid(mapping_id))
    }

    /// Duplicates a mapping onto the same paint, offset so it stays visible,
    /// and places it on top.
    pub fn clone_mapping(&mut self, mapping_id: Uid) -> Result<Uid> {
        let copy = self
            .mapping_by_id(mapping_id)
            .ok_or(MapError::UnknownMapping(mapping_id))?
            .duplicate();
        self.add_mapping(copy)
    }

    fn check_paint_id(&self, paint_id: Uid) -> Result<()> {
        if paint_id != NULL_UID && self.paint_exists(paint_id) {
            return Err(MapError::UidConflict {
                universe: Universe::Paint,
                uid: paint_id,
            });
        }
        Ok(())
    }

    fn check_mapping_ids(&self, mapping_id: Uid, paint_id: Uid) -> Result<()> {
        if mapping_id != NULL_UID && self.mapping_exists(mapping_id) {
            return Err(MapError::UidConflict {
                universe: Universe::Mapping,
                uid: mapping_id,
            });
        }
        if paint_id == NULL_UID {
            return Err(MapError::NullPaint);
        }
        if !self.paint_exists(paint_id) {
            return Err(MapError::UnknownPaint(paint_id));
        }
        Ok(())
    }
}

fn five_point_ellipse(vertices: &[Point]) -> Result<Shape> {
    if vertices.len() != 5 {
        return Err(MapError::VertexCount {
            shape: ShapeKind::Ellipse,
            expected: 5,
            found: vertices.len(),
        });
    }
    Shape::ellipse(vertices.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_RATE;

    fn grid(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn quad_color_mapping_then_cascade() {
        let mut manager = MappingManager::new();
        let color = manager
            .create_color_paint(NULL_UID, Rgba::new(0, 255, 0, 255))
            .unwrap();
        assert_eq!(color, 1);

        let mapping = manager
            .create_quad_color_mapping(10, 1, &grid(4))
            .unwrap();
        assert_eq!(mapping, 10);
        assert!(manager.mapping_exists(10));

        manager.remove_paint(1).unwrap();
        assert!(!manager.mapping_exists(10));
    }

    #[test]
    fn mesh_texture_mapping_validates_grid() {
        let mut manager = MappingManager::new();
        manager
            .create_media_paint(5, "loop.mov", Point::default(), false, DEFAULT_RATE)
            .unwrap();

        let err = manager
            .create_mesh_texture_mapping(20, 5, 3, 3, &grid(9), &grid(8))
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::VertexCount {
                expected: 9,
                found: 8,
                ..
            }
        ));
        assert_eq!(manager.n_mappings(), 0);
        assert!(!manager.mapping_exists(20));

        let uid = manager
            .create_mesh_texture_mapping(20, 5, 3, 3, &grid(9), &grid(9))
            .unwrap();
        assert_eq!(uid, 20);
        let mapping = manager.mapping_by_id(20).unwrap();
        assert_eq!(mapping.output().vertex_count(), 9);
        assert_eq!(mapping.input().unwrap().vertex_count(), 9);
    }

    #[test]
    fn duplicate_uids_are_refused() {
        let mut manager = MappingManager::new();
        manager
            .create_color_paint(3, Rgba::new(1, 1, 1, 255))
            .unwrap();
        let err = manager
            .create_image_paint(3, "wall.png", Point::default())
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::UidConflict {
                universe: Universe::Paint,
                uid: 3
            }
        ));

        manager.create_triangle_color_mapping(7, 3, &grid(3)).unwrap();
        assert!(manager
            .create_triangle_color_mapping(7, 3, &grid(3))
            .is_err());
        assert_eq!(manager.n_mappings(), 1);
    }

    #[test]
    fn missing_paint_is_refused() {
        let mut manager = MappingManager::new();
        assert!(matches!(
            manager.create_quad_color_mapping(1, NULL_UID, &grid(4)),
            Err(MapError::NullPaint)
        ));
        assert!(matches!(
            manager.create_quad_color_mapping(1, 8, &grid(4)),
            Err(MapError::UnknownPaint(8))
        ));
    }

    #[test]
    fn ellipse_point_counts_depend_on_paint_kind() {
        let mut manager = MappingManager::new();
        let color = manager
            .create_color_paint(NULL_UID, Rgba::new(0, 0, 255, 255))
            .unwrap();
        let image = manager
            .create_image_paint(NULL_UID, "a.png", Point::default())
            .unwrap();

        assert!(manager
            .create_ellipse_color_mapping(NULL_UID, color, &grid(5))
            .is_err());
        assert!(manager
            .create_ellipse_color_mapping(NULL_UID, color, &grid(4))
            .is_ok());
        assert!(manager
            .create_ellipse_texture_mapping(NULL_UID, image, &grid(4), &grid(4))
            .is_err());
        assert!(manager
            .create_ellipse_texture_mapping(NULL_UID, image, &grid(5), &grid(5))
            .is_ok());
    }

    #[test]
    fn clone_keeps_paint_and_correspondence() {
        let mut manager = MappingManager::new();
        let image = manager
            .create_image_paint(NULL_UID, "a.png", Point::default())
            .unwrap();
        let source = manager
            .create_triangle_texture_mapping(NULL_UID, image, &grid(3), &grid(3))
            .unwrap();

        let copy = manager.clone_mapping(source).unwrap();
        assert_ne!(copy, source);
        assert_eq!(manager.order(), &[source, copy]);

        let cloned = manager.mapping_by_id(copy).unwrap();
        assert_eq!(cloned.paint(), image);
        assert_eq!(
            cloned.output().vertex_count(),
            cloned.input().unwrap().vertex_count()
        );
        assert_eq!(manager.paint_mappings(image).len(), 2);
        assert!(matches!(
            manager.clone_mapping(999),
            Err(MapError::UnknownMapping(999))
        ));
    }
}
