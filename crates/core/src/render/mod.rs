use crate::{MappingManager, Paint, Result, Shape, Uid};

/// One mapping to composite, as handed to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub mapping: Uid,
    pub paint: Paint,
    pub output: Shape,
    pub input: Option<Shape>,
    pub visible: bool,
}

/// Everything the compositor needs for one redraw, back to front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub frame: u64,
    pub items: Vec<RenderItem>,
}

impl RenderFrame {
    /// Snapshots the manager in draw order.
    pub fn capture(frame: u64, manager: &MappingManager) -> Self {
        let items = manager
            .mappings()
            .filter_map(|mapping| {
                let paint = manager.paint_by_id(mapping.paint())?;
                Some(RenderItem {
                    mapping: mapping.uid(),
                    paint: paint.clone(),
                    output: mapping.output().clone(),
                    input: mapping.input().cloned(),
                    visible: mapping.visible,
                })
            })
            .collect();
        Self { frame, items }
    }

    pub fn visible(&self) -> impl Iterator<Item = &RenderItem> {
        self.items.iter().filter(|item| item.visible)
    }
}

/// Compositing surface. The pixel work lives behind this trait.
pub trait Canvas {
    fn redraw(&mut self, frame: &RenderFrame) -> Result<()>;
}

/// Canvas that remembers what it was last asked to draw. Used by the
/// headless host and by tests.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    last: Option<RenderFrame>,
    redraws: u64,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last.as_ref()
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

impl Canvas for RecordingCanvas {
    fn redraw(&mut self, frame: &RenderFrame) -> Result<()> {
        self.redraws += 1;
        self.last = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shape::defaults, Mapping, Rgba};

    #[test]
    fn capture_follows_draw_order() {
        let mut manager = MappingManager::new();
        let paint = manager
            .add_paint(Paint::color(Rgba::new(9, 9, 9, 255)))
            .unwrap();
        let a = manager
            .add_mapping(Mapping::color(paint, defaults::quad(10.0, 10.0)).unwrap())
            .unwrap();
        let b = manager
            .add_mapping(Mapping::color(paint, defaults::triangle(10.0, 10.0)).unwrap())
            .unwrap();
        manager.reorder_mappings(&[b, a]).unwrap();
        manager.mapping_by_id_mut(a).unwrap().visible = false;

        let frame = RenderFrame::capture(3, &manager);
        let uids: Vec<Uid> = frame.items.iter().map(|item| item.mapping).collect();
        assert_eq!(uids, vec![b, a]);
        assert_eq!(frame.visible().count(), 1);
        assert_eq!(frame.items[0].paint.uid(), paint);
    }

    #[test]
    fn recording_canvas_keeps_last_frame() {
        let mut canvas = RecordingCanvas::new();
        canvas.redraw(&RenderFrame::default()).unwrap();
        canvas
            .redraw(&RenderFrame {
                frame: 7,
                items: Vec::new(),
            })
            .unwrap();
        assert_eq!(canvas.redraws(), 2);
        assert_eq!(canvas.last_frame().map(|f| f.frame), Some(7));
    }
}
