//! Core library for the Mapcast projection mapper.
//!
//! The model is a set of paints (media, image or color sources) and the
//! mappings that place them on the output surface. [`MappingManager`] owns
//! both and keeps the draw order; [`Session`] layers undo, selection,
//! transport and the remote-control channel on top of it.

pub mod command;
pub mod config;
pub mod error;
pub mod manager;
pub mod mapping;
pub mod paint;
pub mod project;
pub mod remote;
pub mod render;
pub mod session;
pub mod shape;
pub mod timeline;
pub mod uid;

pub use command::{Command, History};
pub use config::{AppConfig, CanvasConfig, RemoteConfig};
pub use error::{MapError, Result};
pub use manager::{MappingManager, RemovedMapping, RemovedPaint};
pub use mapping::{Mapping, CLONE_OFFSET};
pub use paint::{MediaSource, Paint, PaintKind, PaintType, Rgba, DEFAULT_RATE};
pub use project::{LoadReport, ProjectFile};
pub use remote::{RemoteCommand, RemoteReceiver};
pub use render::{Canvas, RecordingCanvas, RenderFrame, RenderItem};
pub use session::{Session, ShapeSide};
pub use shape::{Point, Shape, ShapeKind};
pub use timeline::FrameClock;
pub use uid::{Uid, UidAllocator, Universe, NULL_UID};
