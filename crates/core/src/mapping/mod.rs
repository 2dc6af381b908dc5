use crate::{MapError, Result, Shape, ShapeKind, Uid, NULL_UID};

/// Offset applied to a duplicated mapping so it doesn't sit exactly on top
/// of its source.
pub const CLONE_OFFSET: f32 = 20.0;

/// Binds one paint to an output shape and, for textures, an input shape.
///
/// The paint is referenced by uid; the [`crate::MappingManager`] owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    uid: Uid,
    paint: Uid,
    output: Shape,
    input: Option<Shape>,
    pub name: String,
    pub visible: bool,
    /// Stored and persisted, no effect on compositing yet.
    pub solo: bool,
    /// Stored and persisted, no effect on editing yet.
    pub locked: bool,
}

impl Mapping {
    /// A flat fill of `output` with a color paint.
    pub fn color(paint: Uid, output: Shape) -> Result<Self> {
        if paint == NULL_UID {
            return Err(MapError::NullPaint);
        }
        Ok(Self {
            uid: NULL_UID,
            paint,
            output,
            input: None,
            name: String::new(),
            visible: true,
            solo: false,
            locked: false,
        })
    }

    /// Samples `input` from a texture paint and projects it onto `output`.
    pub fn texture(paint: Uid, output: Shape, input: Shape) -> Result<Self> {
        if !output.corresponds_to(&input) {
            return Err(MapError::ShapeMismatch {
                output: output.kind(),
                input: input.kind(),
            });
        }
        let mut mapping = Self::color(paint, output)?;
        mapping.input = Some(input);
        Ok(mapping)
    }

    /// Requests a specific uid, honoured when the mapping is added to a
    /// manager.
    pub fn with_uid(mut self, uid: Uid) -> Self {
        self.uid = uid;
        self
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub(crate) fn set_uid(&mut self, uid: Uid) {
        self.uid = uid;
    }

    pub fn paint(&self) -> Uid {
        self.paint
    }

    pub fn output(&self) -> &Shape {
        &self.output
    }

    pub fn input(&self) -> Option<&Shape> {
        self.input.as_ref()
    }

    pub fn output_mut(&mut self) -> &mut Shape {
        &mut self.output
    }

    pub fn input_mut(&mut self) -> Option<&mut Shape> {
        self.input.as_mut()
    }

    pub fn is_texture(&self) -> bool {
        self.input.is_some()
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.output.kind()
    }

    /// Display label used until the mapping is renamed, e.g. `Quad 3`.
    pub fn default_label(&self) -> String {
        let kind = match self.output.kind() {
            ShapeKind::Quad => "Quad",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Mesh { .. } => "Mesh",
        };
        format!("{kind} {}", self.uid)
    }

    /// Copies this mapping's geometry into a fresh, uid-less mapping bound
    /// to the same paint, shifted so it is visibly distinct.
    ///
    /// Quads and meshes move diagonally, other shapes move down. The input
    /// shape is copied as-is so the clone samples the same region.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.uid = NULL_UID;
        copy.name = String::new();
        match copy.output.kind() {
            ShapeKind::Quad | ShapeKind::Mesh { .. } => {
                copy.output.translate(CLONE_OFFSET, CLONE_OFFSET)
            }
            ShapeKind::Triangle | ShapeKind::Ellipse => copy.output.translate(0.0, CLONE_OFFSET),
        }
        copy
    }
}
