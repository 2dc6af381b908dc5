use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MapError, Point, Result, Uid, NULL_UID};

/// Default playback rate of a media paint, in percent.
pub const DEFAULT_RATE: f64 = 100.0;

/// Straight RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb` form, used for default paint names.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Type tag of a [`Paint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintType {
    Media,
    Image,
    Color,
}

impl fmt::Display for PaintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaintType::Media => "media",
            PaintType::Image => "image",
            PaintType::Color => "color",
        })
    }
}

/// State of a video source. Decoding happens elsewhere; these are the flags
/// the decoder reads.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub uri: String,
    /// Playback rate in percent of normal speed.
    pub rate: f64,
    /// Audio volume in `0.0..=1.0`.
    pub volume: f64,
    /// Live or streaming source that can't be seeked.
    pub live: bool,
    pub playing: bool,
    /// Set by [`Paint::rewind`], cleared by the decoder once it has seeked.
    pub rewind_pending: bool,
}

impl MediaSource {
    pub fn new(uri: impl Into<String>, live: bool, rate: f64) -> Self {
        Self {
            uri: uri.into(),
            rate,
            volume: 1.0,
            live,
            playing: false,
            rewind_pending: false,
        }
    }
}

/// Variant-specific state of a paint.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintKind {
    Media(MediaSource),
    Image { uri: String },
    Color(Rgba),
}

/// A visual source that mappings bind to.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    uid: Uid,
    pub name: String,
    pub position: Point,
    kind: PaintKind,
}

impl Paint {
    pub fn media(uri: impl Into<String>, live: bool, rate: f64) -> Self {
        let source = MediaSource::new(uri, live, rate);
        Self::with_kind(file_name(&source.uri), PaintKind::Media(source))
    }

    pub fn image(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self::with_kind(file_name(&uri), PaintKind::Image { uri })
    }

    pub fn color(color: Rgba) -> Self {
        Self::with_kind(color.hex(), PaintKind::Color(color))
    }

    fn with_kind(name: String, kind: PaintKind) -> Self {
        Self {
            uid: NULL_UID,
            name,
            position: Point::default(),
            kind,
        }
    }

    /// Requests a specific uid, honoured when the paint is added to a
    /// manager.
    pub fn with_uid(mut self, uid: Uid) -> Self {
        self.uid = uid;
        self
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub(crate) fn set_uid(&mut self, uid: Uid) {
        self.uid = uid;
    }

    pub fn kind(&self) -> &PaintKind {
        &self.kind
    }

    pub fn paint_type(&self) -> PaintType {
        match self.kind {
            PaintKind::Media(_) => PaintType::Media,
            PaintKind::Image { .. } => PaintType::Image,
            PaintKind::Color(_) => PaintType::Color,
        }
    }

    /// Media and image paints are sampled through an input shape.
    pub fn is_texture(&self) -> bool {
        !matches!(self.kind, PaintKind::Color(_))
    }

    pub fn uri(&self) -> Option<&str> {
        match &self.kind {
            PaintKind::Media(media) => Some(&media.uri),
            PaintKind::Image { uri } => Some(uri),
            PaintKind::Color(_) => None,
        }
    }

    pub fn media_source(&self) -> Option<&MediaSource> {
        match &self.kind {
            PaintKind::Media(media) => Some(media),
            _ => None,
        }
    }

    fn media_mut(&mut self) -> Result<&mut MediaSource> {
        match &mut self.kind {
            PaintKind::Media(media) => Ok(media),
            _ => Err(MapError::NotMedia(self.uid)),
        }
    }

    pub fn play(&mut self) {
        if let PaintKind::Media(media) = &mut self.kind {
            media.playing = true;
        }
    }

    pub fn pause(&mut self) {
        if let PaintKind::Media(media) = &mut self.kind {
            media.playing = false;
        }
    }

    pub fn rewind(&mut self) {
        if let PaintKind::Media(media) = &mut self.kind {
            if !media.live {
                media.rewind_pending = true;
            }
        }
    }

    /// Consumes a pending rewind request. Called by the decoder side.
    pub fn take_rewind(&mut self) -> bool {
        match &mut self.kind {
            PaintKind::Media(media) => std::mem::take(&mut media.rewind_pending),
            _ => false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.media_source().map(|media| media.playing).unwrap_or(false)
    }

    /// Points a media or image paint at a new source.
    pub fn set_uri(&mut self, uri: impl Into<String>) -> Result<()> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(MapError::InvalidInput("media uri cannot be empty"));
        }
        let name = file_name(&uri);
        match &mut self.kind {
            PaintKind::Media(media) => {
                media.uri = uri;
                media.rewind_pending = !media.live;
            }
            PaintKind::Image { uri: current } => *current = uri,
            PaintKind::Color(_) => return Err(MapError::NotTexture(self.uid)),
        }
        self.name = name;
        Ok(())
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() {
            return Err(MapError::InvalidInput("playback rate must be finite"));
        }
        self.media_mut()?.rate = rate;
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        if !volume.is_finite() {
            return Err(MapError::InvalidInput("volume must be finite"));
        }
        self.media_mut()?.volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_color(&mut self, color: Rgba) -> Result<()> {
        match &mut self.kind {
            PaintKind::Color(current) => {
                *current = color;
                Ok(())
            }
            _ => Err(MapError::msg(format!("paint {} is not a color", self.uid))),
        }
    }
}

fn file_name(uri: &str) -> String {
    uri.rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(uri)
        .to_string()
}
