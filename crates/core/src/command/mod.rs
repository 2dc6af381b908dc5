//! Reversible structural edits and the linear undo history.
//!
//! A [`Command`] records everything it needs to undo itself. Deleted
//! entities keep their uid and draw-order slot, and because allocators never
//! reissue a released uid, reverting puts them back exactly as they were.

use std::fmt;

use tracing::{debug, warn};

use crate::{
    MapError, Mapping, MappingManager, RemovedMapping, RemovedPaint, Result, Uid, NULL_UID,
};

#[derive(Debug, Clone)]
pub enum Command {
    /// Adds a prepared mapping on top of the draw order. After the first
    /// apply the mapping carries its uid so a redo reuses it.
    AddMapping { mapping: Mapping },
    DeleteMapping {
        uid: Uid,
        removed: Option<RemovedMapping>,
    },
    /// Deletes a paint and, through the cascade, all of its mappings.
    DeletePaint {
        uid: Uid,
        removed: Option<RemovedPaint>,
    },
    ReorderMappings { order: Vec<Uid>, previous: Vec<Uid> },
    SetMappingVisible {
        uid: Uid,
        visible: bool,
        previous: bool,
    },
}

impl Command {
    pub fn add_mapping(mapping: Mapping) -> Self {
        Command::AddMapping { mapping }
    }

    /// Adds a duplicate of `source`, see [`Mapping::duplicate`].
    pub fn clone_mapping(manager: &MappingManager, source: Uid) -> Result<Self> {
        let mapping = manager
            .mapping_by_id(source)
            .ok_or(MapError::UnknownMapping(source))?
            .duplicate();
        Ok(Command::AddMapping { mapping })
    }

    pub fn delete_mapping(manager: &MappingManager, uid: Uid) -> Result<Self> {
        if !manager.mapping_exists(uid) {
            return Err(MapError::UnknownMapping(uid));
        }
        Ok(Command::DeleteMapping { uid, removed: None })
    }

    pub fn delete_paint(manager: &MappingManager, uid: Uid) -> Result<Self> {
        if !manager.paint_exists(uid) {
            return Err(MapError::UnknownPaint(uid));
        }
        Ok(Command::DeletePaint { uid, removed: None })
    }

    pub fn reorder_mappings(manager: &MappingManager, order: Vec<Uid>) -> Self {
        Command::ReorderMappings {
            order,
            previous: manager.order().to_vec(),
        }
    }

    pub fn set_mapping_visible(manager: &MappingManager, uid: Uid, visible: bool) -> Result<Self> {
        let mapping = manager
            .mapping_by_id(uid)
            .ok_or(MapError::UnknownMapping(uid))?;
        Ok(Command::SetMappingVisible {
            uid,
            visible,
            previous: mapping.visible,
        })
    }

    /// Performs the edit. Returns the uid of the entity it acted on, or
    /// [`NULL_UID`] for order changes.
    pub fn apply(&mut self, manager: &mut MappingManager) -> Result<Uid> {
        match self {
            Command::AddMapping { mapping } => {
                let uid = manager.add_mapping(mapping.clone())?;
                *mapping = mapping.clone().with_uid(uid);
                Ok(uid)
            }
            Command::DeleteMapping { uid, removed } => {
                *removed = Some(manager.remove_mapping(*uid)?);
                Ok(*uid)
            }
            Command::DeletePaint { uid, removed } => {
                *removed = Some(manager.remove_paint(*uid)?);
                Ok(*uid)
            }
            Command::ReorderMappings { order, .. } => {
                manager.reorder_mappings(order)?;
                Ok(NULL_UID)
            }
            Command::SetMappingVisible { uid, visible, .. } => {
                set_visible(manager, *uid, *visible)?;
                Ok(*uid)
            }
        }
    }

    /// Undoes a previous [`Command::apply`].
    pub fn revert(&mut self, manager: &mut MappingManager) -> Result<()> {
        match self {
            Command::AddMapping { mapping } => {
                // Keep edits made since the add so a redo brings them back.
                *mapping = manager.remove_mapping(mapping.uid())?.mapping;
            }
            Command::DeleteMapping { uid, removed } => {
                let entry = removed.take().ok_or(MapError::UnknownMapping(*uid))?;
                if let Err(err) = manager.insert_mapping_at(entry.mapping.clone(), entry.index) {
                    *removed = Some(entry);
                    return Err(err);
                }
            }
            Command::DeletePaint { uid, removed } => {
                let entry = removed.take().ok_or(MapError::UnknownPaint(*uid))?;
                manager.restore_paint(entry)?;
            }
            Command::ReorderMappings { previous, .. } => {
                manager.reorder_mappings(previous)?;
            }
            Command::SetMappingVisible { uid, previous, .. } => {
                set_visible(manager, *uid, *previous)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::AddMapping { mapping } => write!(f, "add {}", mapping.shape_kind()),
            Command::DeleteMapping { uid, .. } => write!(f, "delete mapping {uid}"),
            Command::DeletePaint { uid, .. } => write!(f, "delete paint {uid}"),
            Command::ReorderMappings { .. } => f.write_str("reorder mappings"),
            Command::SetMappingVisible { uid, visible, .. } => {
                write!(f, "{} mapping {uid}", if *visible { "show" } else { "hide" })
            }
        }
    }
}

fn set_visible(manager: &mut MappingManager, uid: Uid, visible: bool) -> Result<()> {
    manager
        .mapping_by_id_mut(uid)
        .ok_or(MapError::UnknownMapping(uid))?
        .visible = visible;
    Ok(())
}

/// Linear undo history. Pushing a new command discards anything that could
/// have been redone.
#[derive(Debug)]
pub struct History {
    undo: Vec<Command>,
    redo: Vec<Command>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    /// `limit` bounds the number of undoable commands; the oldest are dropped.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Applies `command` and records it. A command that fails to apply is
    /// not recorded.
    pub fn push(&mut self, mut command: Command, manager: &mut MappingManager) -> Result<Uid> {
        let uid = command.apply(manager)?;
        debug!(%command, "command applied");
        self.undo.push(command);
        self.redo.clear();
        if self.undo.len() > self.limit {
            let overflow = self.undo.len() - self.limit;
            self.undo.drain(0..overflow);
        }
        Ok(uid)
    }

    /// Reverts the most recent command. Returns `false` if there was none.
    pub fn undo(&mut self, manager: &mut MappingManager) -> Result<bool> {
        let Some(mut command) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.revert(manager) {
            warn!(%command, %err, "undo failed");
            self.undo.push(command);
            return Err(err);
        }
        debug!(%command, "command reverted");
        self.redo.push(command);
        Ok(true)
    }

    /// Re-applies the most recently undone command.
    pub fn redo(&mut self, manager: &mut MappingManager) -> Result<bool> {
        let Some(mut command) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.apply(manager) {
            warn!(%command, %err, "redo failed");
            self.redo.push(command);
            return Err(err);
        }
        debug!(%command, "command reapplied");
        self.undo.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
