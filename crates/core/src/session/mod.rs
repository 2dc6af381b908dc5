//! The editing session: model, undo history, selection and transport.
//!
//! Interactive actions and remote commands both call into [`Session`], so
//! remote input passes exactly the same uid and geometry checks.

use std::path::{Path, PathBuf};

use rosc::OscMessage;
use tracing::{debug, info, warn};

use crate::{
    shape::defaults, AppConfig, Canvas, Command, History, LoadReport, MapError, Mapping,
    MappingManager, Paint, Point, ProjectFile, RemoteCommand, RemoteReceiver, RenderFrame, Result,
    Rgba, Shape, Uid, DEFAULT_RATE, NULL_UID,
};

/// Which of a mapping's shapes an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSide {
    Output,
    Input,
}

#[derive(Debug)]
pub struct Session {
    manager: MappingManager,
    history: History,
    config: AppConfig,
    current_paint: Uid,
    current_mapping: Uid,
    playing: bool,
    project_path: Option<PathBuf>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            manager: MappingManager::new(),
            history: History::new(config.undo_limit),
            config,
            current_paint: NULL_UID,
            current_mapping: NULL_UID,
            playing: true,
            project_path: None,
        }
    }

    pub fn manager(&self) -> &MappingManager {
        &self.manager
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    pub fn current_paint(&self) -> Uid {
        self.current_paint
    }

    pub fn current_mapping(&self) -> Uid {
        self.current_mapping
    }

    /// Selects a paint; [`NULL_UID`] clears the selection.
    pub fn set_current_paint(&mut self, uid: Uid) -> Result<()> {
        if uid != NULL_UID && !self.manager.paint_exists(uid) {
            return Err(MapError::UnknownPaint(uid));
        }
        self.current_paint = uid;
        Ok(())
    }

    /// Selects a mapping; [`NULL_UID`] clears the selection.
    pub fn set_current_mapping(&mut self, uid: Uid) -> Result<()> {
        if uid != NULL_UID && !self.manager.mapping_exists(uid) {
            return Err(MapError::UnknownMapping(uid));
        }
        self.current_mapping = uid;
        Ok(())
    }

    /// Mapping uids as the layer list shows them: topmost first.
    pub fn mapping_list(&self) -> Vec<Uid> {
        self.manager.order().iter().rev().copied().collect()
    }

    // Paints.

    pub fn import_media(&mut self, uri: &str, live: bool) -> Result<Uid> {
        let uid = self
            .manager
            .create_media_paint(NULL_UID, uri, Point::default(), live, DEFAULT_RATE)?;
        self.follow_transport(uid);
        self.current_paint = uid;
        info!(paint = uid, uri, "media imported");
        Ok(uid)
    }

    pub fn import_image(&mut self, uri: &str) -> Result<Uid> {
        let uid = self
            .manager
            .create_image_paint(NULL_UID, uri, Point::default())?;
        self.current_paint = uid;
        info!(paint = uid, uri, "image imported");
        Ok(uid)
    }

    pub fn add_color_paint(&mut self, color: Rgba) -> Result<Uid> {
        let uid = self.manager.create_color_paint(NULL_UID, color)?;
        self.current_paint = uid;
        info!(paint = uid, color = %color.hex(), "color paint added");
        Ok(uid)
    }

    pub fn rename_paint(&mut self, uid: Uid, name: impl Into<String>) -> Result<()> {
        self.manager
            .paint_by_id_mut(uid)
            .ok_or(MapError::UnknownPaint(uid))?
            .name = name.into();
        Ok(())
    }

    /// Deletes a paint and its mappings as one undoable step.
    pub fn delete_paint(&mut self, uid: Uid) -> Result<()> {
        let command = Command::delete_paint(&self.manager, uid)?;
        self.history.push(command, &mut self.manager)?;
        if self.current_paint == uid {
            self.current_paint = NULL_UID;
        }
        self.drop_stale_selection();
        Ok(())
    }

    // Mappings.

    /// Adds a quad to the current paint: a quad for color paints, a 2x2 mesh
    /// for textures. Returns `None` when no paint is selected.
    pub fn add_quad(&mut self) -> Result<Option<Uid>> {
        let (w, h) = self.canvas_size();
        self.add_shape(|texture| {
            if texture {
                defaults::mesh(w, h, 2, 2)
            } else {
                defaults::quad(w, h)
            }
        })
    }

    pub fn add_triangle(&mut self) -> Result<Option<Uid>> {
        let (w, h) = self.canvas_size();
        self.add_shape(|_| defaults::triangle(w, h))
    }

    pub fn add_ellipse(&mut self) -> Result<Option<Uid>> {
        let (w, h) = self.canvas_size();
        self.add_shape(|texture| defaults::ellipse(w, h, texture))
    }

    fn add_shape(&mut self, build: impl Fn(bool) -> Shape) -> Result<Option<Uid>> {
        if self.current_paint == NULL_UID {
            debug!("no paint selected, nothing to add");
            return Ok(None);
        }
        let paint = self
            .manager
            .paint_by_id(self.current_paint)
            .ok_or(MapError::UnknownPaint(self.current_paint))?;

        let mapping = if paint.is_texture() {
            Mapping::texture(paint.uid(), build(true), build(true))?
        } else {
            Mapping::color(paint.uid(), build(false))?
        };
        let uid = self
            .history
            .push(Command::add_mapping(mapping), &mut self.manager)?;
        self.current_mapping = uid;
        Ok(Some(uid))
    }

    pub fn clone_mapping(&mut self, uid: Uid) -> Result<Uid> {
        let command = Command::clone_mapping(&self.manager, uid)?;
        let copy = self.history.push(command, &mut self.manager)?;
        self.current_mapping = copy;
        Ok(copy)
    }

    pub fn delete_mapping(&mut self, uid: Uid) -> Result<()> {
        let command = Command::delete_mapping(&self.manager, uid)?;
        self.history.push(command, &mut self.manager)?;
        self.drop_stale_selection();
        Ok(())
    }

    /// Applies a new draw order, back to front.
    pub fn reorder_mappings(&mut self, order: Vec<Uid>) -> Result<()> {
        let command = Command::reorder_mappings(&self.manager, order);
        self.history.push(command, &mut self.manager)?;
        Ok(())
    }

    /// Applies the order of a drag-and-dropped layer list, topmost first.
    pub fn reorder_from_list(&mut self, list: &[Uid]) -> Result<()> {
        self.reorder_mappings(list.iter().rev().copied().collect())
    }

    pub fn set_mapping_visible(&mut self, uid: Uid, visible: bool) -> Result<()> {
        let command = Command::set_mapping_visible(&self.manager, uid, visible)?;
        self.history.push(command, &mut self.manager)?;
        Ok(())
    }

    pub fn set_mapping_solo(&mut self, uid: Uid, solo: bool) -> Result<()> {
        self.mapping_mut(uid)?.solo = solo;
        Ok(())
    }

    pub fn set_mapping_locked(&mut self, uid: Uid, locked: bool) -> Result<()> {
        self.mapping_mut(uid)?.locked = locked;
        Ok(())
    }

    pub fn rename_mapping(&mut self, uid: Uid, name: impl Into<String>) -> Result<()> {
        self.mapping_mut(uid)?.name = name.into();
        Ok(())
    }

    /// Drags one vertex of a mapping's output or input shape.
    pub fn move_vertex(&mut self, uid: Uid, side: ShapeSide, index: usize, to: Point) -> Result<()> {
        let mapping = self.mapping_mut(uid)?;
        match side {
            ShapeSide::Output => mapping.output_mut().set_vertex(index, to),
            ShapeSide::Input => mapping
                .input_mut()
                .ok_or(MapError::NotTexture(uid))?
                .set_vertex(index, to),
        }
    }

    pub fn translate_shape(&mut self, uid: Uid, side: ShapeSide, dx: f32, dy: f32) -> Result<()> {
        let mapping = self.mapping_mut(uid)?;
        match side {
            ShapeSide::Output => mapping.output_mut().translate(dx, dy),
            ShapeSide::Input => mapping
                .input_mut()
                .ok_or(MapError::NotTexture(uid))?
                .translate(dx, dy),
        }
        Ok(())
    }

    fn mapping_mut(&mut self, uid: Uid) -> Result<&mut Mapping> {
        self.manager
            .mapping_by_id_mut(uid)
            .ok_or(MapError::UnknownMapping(uid))
    }

    pub fn undo(&mut self) -> Result<bool> {
        let undone = self.history.undo(&mut self.manager)?;
        self.drop_stale_selection();
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let redone = self.history.redo(&mut self.manager)?;
        self.drop_stale_selection();
        Ok(redone)
    }

    fn drop_stale_selection(&mut self) {
        if !self.manager.paint_exists(self.current_paint) {
            self.current_paint = NULL_UID;
        }
        if !self.manager.mapping_exists(self.current_mapping) {
            self.current_mapping = NULL_UID;
        }
    }

    // Transport.

    pub fn play(&mut self) {
        self.playing = true;
        self.manager.paints_mut().for_each(|paint| paint.play());
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.manager.paints_mut().for_each(|paint| paint.pause());
    }

    pub fn rewind(&mut self) {
        self.manager.paints_mut().for_each(|paint| paint.rewind());
    }

    /// Collects and clears pending rewind requests, for the media decoder.
    pub fn take_rewinds(&mut self) -> Vec<Uid> {
        let pending: Vec<Uid> = self
            .manager
            .paints()
            .filter(|paint| paint.media_source().is_some_and(|media| media.rewind_pending))
            .map(Paint::uid)
            .collect();
        for uid in &pending {
            if let Some(paint) = self.manager.paint_by_id_mut(*uid) {
                paint.take_rewind();
            }
        }
        pending
    }

    fn follow_transport(&mut self, uid: Uid) {
        let playing = self.playing;
        if let Some(paint) = self.manager.paint_by_id_mut(uid) {
            if playing {
                paint.play();
            } else {
                paint.pause();
            }
        }
    }

    pub fn set_paint_color(&mut self, paint: Uid, color: Rgba) -> Result<()> {
        self.paint_mut(paint)?.set_color(color)
    }

    pub fn set_texture_uri(&mut self, paint: Uid, uri: &str) -> Result<()> {
        self.paint_mut(paint)?.set_uri(uri)
    }

    pub fn set_texture_rate(&mut self, paint: Uid, rate: f64) -> Result<()> {
        self.paint_mut(paint)?.set_rate(rate)
    }

    pub fn set_texture_volume(&mut self, paint: Uid, volume: f64) -> Result<()> {
        self.paint_mut(paint)?.set_volume(volume)
    }

    /// Plays or pauses a single media paint.
    pub fn set_texture_play_state(&mut self, paint: Uid, playing: bool) -> Result<()> {
        let paint = self.paint_mut(paint)?;
        if paint.media_source().is_none() {
            return Err(MapError::NotMedia(paint.uid()));
        }
        if playing {
            paint.play();
        } else {
            paint.pause();
        }
        Ok(())
    }

    fn paint_mut(&mut self, uid: Uid) -> Result<&mut Paint> {
        self.manager
            .paint_by_id_mut(uid)
            .ok_or(MapError::UnknownPaint(uid))
    }

    // Projects.

    /// Starts an empty project.
    pub fn new_project(&mut self) {
        self.manager.clear_all();
        self.history.clear();
        self.current_paint = NULL_UID;
        self.current_mapping = NULL_UID;
        self.project_path = None;
        info!("new project");
    }

    pub fn save_project(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ProjectFile::capture(&self.manager).write(path)?;
        self.project_path = Some(path.to_path_buf());
        info!(path = %path.display(), "project saved");
        Ok(())
    }

    /// Saves to the file the project was last opened from or saved to.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .project_path
            .clone()
            .ok_or(MapError::InvalidInput("project has no file yet"))?;
        self.save_project(path)
    }

    /// Replaces the current project with the one stored at `path`. The file
    /// is parsed before anything is cleared.
    pub fn open_project(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let project = ProjectFile::read(path)?;
        self.new_project();
        let report = project.restore(&mut self.manager);
        if self.playing {
            self.play();
        } else {
            self.pause();
        }
        self.project_path = Some(path.to_path_buf());
        info!(path = %path.display(), "project opened");
        Ok(report)
    }

    // Remote control and the main loop.

    /// Runs one decoded remote command.
    pub fn execute(&mut self, command: RemoteCommand) -> Result<()> {
        match command {
            RemoteCommand::AddQuad => self.add_quad().map(drop),
            RemoteCommand::AddTriangle => self.add_triangle().map(drop),
            RemoteCommand::AddEllipse => self.add_ellipse().map(drop),
            RemoteCommand::SaveProject(Some(path)) => self.save_project(path),
            RemoteCommand::SaveProject(None) => self.save(),
            RemoteCommand::OpenProject(path) => self.open_project(path).map(drop),
            RemoteCommand::SetUri { paint, uri } => self.set_texture_uri(paint, &uri),
            RemoteCommand::SetRate { paint, rate } => self.set_texture_rate(paint, rate),
            RemoteCommand::SetVolume { paint, volume } => self.set_texture_volume(paint, volume),
            RemoteCommand::SetPlayState { paint, playing } => {
                self.set_texture_play_state(paint, playing)
            }
            RemoteCommand::Play => {
                self.play();
                Ok(())
            }
            RemoteCommand::Pause => {
                self.pause();
                Ok(())
            }
            RemoteCommand::Rewind => {
                self.rewind();
                Ok(())
            }
            RemoteCommand::Undo => self.undo().map(drop),
            RemoteCommand::Redo => self.redo().map(drop),
        }
    }

    /// Decodes and runs a raw remote message. Failures are logged and
    /// dropped; returns whether the message was applied.
    pub fn apply_remote(&mut self, message: &OscMessage) -> bool {
        let command = match RemoteCommand::parse(message) {
            Ok(command) => command,
            Err(err) => {
                warn!(addr = %message.addr, %err, "dropping remote message");
                return false;
            }
        };
        debug!(?command, "remote command");
        match self.execute(command) {
            Ok(()) => true,
            Err(err) => {
                warn!(addr = %message.addr, %err, "remote command failed");
                false
            }
        }
    }

    /// Handles whatever the receiver has queued, up to the configured budget.
    pub fn pump_remote(&mut self, receiver: &RemoteReceiver) -> usize {
        let messages = receiver.drain(self.config.remote.drain_budget);
        messages
            .iter()
            .filter(|message| self.apply_remote(message))
            .count()
    }

    /// Redraws `canvas` if the model changed since the last redraw.
    pub fn render_if_dirty(&mut self, frame: u64, canvas: &mut dyn Canvas) -> Result<bool> {
        if !self.manager.take_dirty() {
            return Ok(false);
        }
        canvas.redraw(&RenderFrame::capture(frame, &self.manager))?;
        Ok(true)
    }

    fn canvas_size(&self) -> (f32, f32) {
        (self.config.canvas.width, self.config.canvas.height)
    }
}
