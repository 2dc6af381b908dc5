use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MapError, Result};

/// A 2D position on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Geometry type tag. Fixed for the lifetime of a [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Quad,
    Triangle,
    /// Four axis control points, plus an optional centre point when the
    /// ellipse samples a texture.
    Ellipse,
    Mesh { columns: usize, rows: usize },
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Quad => "quad",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Mesh { .. } => "mesh",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Mesh { columns, rows } => write!(f, "mesh {columns}x{rows}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Ordered vertex set with a type tag.
///
/// Vertices can be moved but their count and the kind never change after
/// construction. Mesh vertices are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    vertices: Vec<Point>,
}

impl Shape {
    pub fn quad(vertices: Vec<Point>) -> Result<Self> {
        Self::checked(ShapeKind::Quad, vertices, 4)
    }

    pub fn triangle(vertices: Vec<Point>) -> Result<Self> {
        Self::checked(ShapeKind::Triangle, vertices, 3)
    }

    /// Builds an ellipse from 4 axis points or 4 axis points plus a centre.
    pub fn ellipse(vertices: Vec<Point>) -> Result<Self> {
        match vertices.len() {
            4 | 5 => Ok(Self {
                kind: ShapeKind::Ellipse,
                vertices,
            }),
            found => Err(MapError::VertexCount {
                shape: ShapeKind::Ellipse,
                expected: if found < 4 { 4 } else { 5 },
                found,
            }),
        }
    }

    pub fn mesh(columns: usize, rows: usize, vertices: Vec<Point>) -> Result<Self> {
        if columns < 2 || rows < 2 {
            return Err(MapError::InvalidMesh { columns, rows });
        }
        Self::checked(ShapeKind::Mesh { columns, rows }, vertices, columns * rows)
    }

    fn checked(kind: ShapeKind, vertices: Vec<Point>, expected: usize) -> Result<Self> {
        if vertices.len() != expected {
            return Err(MapError::VertexCount {
                shape: kind,
                expected,
                found: vertices.len(),
            });
        }
        Ok(Self { kind, vertices })
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertex(&self, index: usize) -> Option<Point> {
        self.vertices.get(index).copied()
    }

    pub fn set_vertex(&mut self, index: usize, point: Point) -> Result<()> {
        let count = self.vertices.len();
        let slot = self
            .vertices
            .get_mut(index)
            .ok_or(MapError::VertexIndex { index, count })?;
        *slot = point;
        Ok(())
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        for vertex in &mut self.vertices {
            *vertex = vertex.offset(dx, dy);
        }
    }

    /// True when `other` can serve as this shape's input/output counterpart.
    pub fn corresponds_to(&self, other: &Shape) -> bool {
        self.kind == other.kind && self.vertices.len() == other.vertices.len()
    }
}

/// Default geometry generated for interactive "add shape" actions, sized to
/// the source canvas.
pub mod defaults {
    use super::{Point, Shape};

    fn frame(width: f32, height: f32) -> (f32, f32, f32, f32) {
        let margin_x = width / 4.0;
        let margin_y = height / 4.0;
        (margin_x, margin_y, width - margin_x, height - margin_y)
    }

    pub fn quad(width: f32, height: f32) -> Shape {
        let (left, top, right, bottom) = frame(width, height);
        Shape {
            kind: super::ShapeKind::Quad,
            vertices: vec![
                Point::new(left, top),
                Point::new(right, top),
                Point::new(right, bottom),
                Point::new(left, bottom),
            ],
        }
    }

    pub fn triangle(width: f32, height: f32) -> Shape {
        let (left, top, right, bottom) = frame(width, height);
        Shape {
            kind: super::ShapeKind::Triangle,
            vertices: vec![
                Point::new(left, bottom),
                Point::new((left + right) / 2.0, top),
                Point::new(right, bottom),
            ],
        }
    }

    /// Axis points go top, right, bottom, left. `with_centre` appends the
    /// centre control point used by texture ellipses.
    pub fn ellipse(width: f32, height: f32, with_centre: bool) -> Shape {
        let (left, top, right, bottom) = frame(width, height);
        let cx = (left + right) / 2.0;
        let cy = (top + bottom) / 2.0;
        let mut vertices = vec![
            Point::new(cx, top),
            Point::new(right, cy),
            Point::new(cx, bottom),
            Point::new(left, cy),
        ];
        if with_centre {
            vertices.push(Point::new(cx, cy));
        }
        Shape {
            kind: super::ShapeKind::Ellipse,
            vertices,
        }
    }

    /// A `columns` x `rows` grid spread evenly over the default frame.
    pub fn mesh(width: f32, height: f32, columns: usize, rows: usize) -> Shape {
        let columns = columns.max(2);
        let rows = rows.max(2);
        let (left, top, right, bottom) = frame(width, height);
        let mut vertices = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            let v = row as f32 / (rows - 1) as f32;
            for column in 0..columns {
                let u = column as f32 / (columns - 1) as f32;
                vertices.push(Point::new(
                    left + (right - left) * u,
                    top + (bottom - top) * v,
                ));
            }
        }
        Shape {
            kind: super::ShapeKind::Mesh { columns, rows },
            vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f32, i as f32 * 2.0)).collect()
    }

    #[test]
    fn rejects_wrong_vertex_counts() {
        assert!(Shape::quad(points(4)).is_ok());
        assert!(Shape::triangle(points(3)).is_ok());

        let err = Shape::quad(points(3)).unwrap_err();
        assert!(matches!(
            err,
            MapError::VertexCount {
                expected: 4,
                found: 3,
                ..
            }
        ));
        assert!(Shape::triangle(points(4)).is_err());
    }

    #[test]
    fn ellipse_takes_four_or_five_points() {
        assert!(Shape::ellipse(points(4)).is_ok());
        assert!(Shape::ellipse(points(5)).is_ok());
        assert!(Shape::ellipse(points(3)).is_err());
        assert!(Shape::ellipse(points(6)).is_err());
    }

    #[test]
    fn mesh_requires_matching_grid() {
        assert!(Shape::mesh(3, 3, points(9)).is_ok());
        assert!(Shape::mesh(3, 3, points(8)).is_err());
        let err = Shape::mesh(1, 4, points(4)).unwrap_err();
        assert!(matches!(err, MapError::InvalidMesh { columns: 1, rows: 4 }));
    }

    #[test]
    fn translate_moves_every_vertex() {
        let mut shape = Shape::triangle(points(3)).unwrap();
        shape.translate(20.0, -1.0);
        assert_eq!(shape.vertex(0), Some(Point::new(20.0, -1.0)));
        assert_eq!(shape.vertex(2), Some(Point::new(22.0, 3.0)));
    }

    #[test]
    fn set_vertex_checks_bounds() {
        let mut shape = Shape::quad(points(4)).unwrap();
        shape.set_vertex(1, Point::new(9.0, 9.0)).unwrap();
        assert_eq!(shape.vertex(1), Some(Point::new(9.0, 9.0)));
        assert!(shape.set_vertex(4, Point::default()).is_err());
    }

    #[test]
    fn default_shapes_have_expected_counts() {
        assert_eq!(defaults::quad(640.0, 480.0).vertex_count(), 4);
        assert_eq!(defaults::triangle(640.0, 480.0).vertex_count(), 3);
        assert_eq!(defaults::ellipse(640.0, 480.0, false).vertex_count(), 4);
        assert_eq!(defaults::ellipse(640.0, 480.0, true).vertex_count(), 5);

        let mesh = defaults::mesh(640.0, 480.0, 3, 2);
        assert_eq!(mesh.kind(), ShapeKind::Mesh { columns: 3, rows: 2 });
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.vertex(0), Some(Point::new(160.0, 120.0)));
        assert_eq!(mesh.vertex(5), Some(Point::new(480.0, 360.0)));
    }
}
