//! Ownership and integrity of paints and mappings.
//!
//! [`MappingManager`] is the aggregate root of the model. It owns every
//! [`Paint`] and [`Mapping`], keeps the paint → mappings index in step with
//! the mapping table, and holds the explicit draw order. All structural
//! edits go through it so that a mapping can never outlive its paint.

mod factory;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{MapError, Mapping, Paint, Result, Uid, UidAllocator, Universe, NULL_UID};

/// A mapping taken out of the manager, with the draw-order slot it occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedMapping {
    pub index: usize,
    pub mapping: Mapping,
}

/// A paint taken out of the manager together with every mapping the cascade
/// removed, in removal order.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedPaint {
    pub index: usize,
    pub paint: Paint,
    pub mappings: Vec<RemovedMapping>,
}

#[derive(Debug)]
pub struct MappingManager {
    paints: BTreeMap<Uid, Paint>,
    /// Paint uids in the order they were added, for index access.
    paint_order: Vec<Uid>,
    mappings: BTreeMap<Uid, Mapping>,
    /// Draw order, back to front.
    order: Vec<Uid>,
    paint_mappings: BTreeMap<Uid, BTreeSet<Uid>>,
    paint_ids: UidAllocator,
    mapping_ids: UidAllocator,
    dirty: bool,
}

impl Default for MappingManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingManager {
    pub fn new() -> Self {
        Self {
            paints: BTreeMap::new(),
            paint_order: Vec::new(),
            mappings: BTreeMap::new(),
            order: Vec::new(),
            paint_mappings: BTreeMap::new(),
            paint_ids: UidAllocator::new(Universe::Paint),
            mapping_ids: UidAllocator::new(Universe::Mapping),
            dirty: false,
        }
    }

    /// Adds a paint, honouring its requested uid if it carries one.
    pub fn add_paint(&mut self, paint: Paint) -> Result<Uid> {
        let index = self.paint_order.len();
        self.insert_paint_at(paint, index)
    }

    pub(crate) fn insert_paint_at(&mut self, mut paint: Paint, index: usize) -> Result<Uid> {
        let uid = claim(&mut self.paint_ids, paint.uid())?;
        paint.set_uid(uid);
        self.paints.insert(uid, paint);
        self.paint_order.insert(index.min(self.paint_order.len()), uid);
        self.paint_mappings.insert(uid, BTreeSet::new());
        self.dirty = true;
        debug!(paint = uid, "paint added");
        Ok(uid)
    }

    /// Adds a mapping on top of the draw order.
    pub fn add_mapping(&mut self, mapping: Mapping) -> Result<Uid> {
        let index = self.order.len();
        self.insert_mapping_at(mapping, index)
    }

    /// Adds a mapping at draw-order slot `index` (clamped to the end).
    pub fn insert_mapping_at(&mut self, mut mapping: Mapping, index: usize) -> Result<Uid> {
        let paint_uid = mapping.paint();
        if paint_uid == NULL_UID {
            return Err(MapError::NullPaint);
        }
        let paint = self
            .paints
            .get(&paint_uid)
            .ok_or(MapError::UnknownPaint(paint_uid))?;
        if paint.is_texture() != mapping.is_texture() {
            return Err(if mapping.is_texture() {
                MapError::NotTexture(paint_uid)
            } else {
                MapError::msg(format!("paint {paint_uid} is a texture, not a color"))
            });
        }

        let uid = claim(&mut self.mapping_ids, mapping.uid())?;
        mapping.set_uid(uid);
        if mapping.name.is_empty() {
            mapping.name = mapping.default_label();
        }
        self.mappings.insert(uid, mapping);
        self.order.insert(index.min(self.order.len()), uid);
        self.paint_mappings.entry(paint_uid).or_default().insert(uid);
        self.dirty = true;
        debug!(mapping = uid, paint = paint_uid, "mapping added");
        Ok(uid)
    }

    pub fn remove_mapping(&mut self, uid: Uid) -> Result<RemovedMapping> {
        let mapping = self
            .mappings
            .remove(&uid)
            .ok_or(MapError::UnknownMapping(uid))?;
        let index = self.mapping_index(uid).unwrap_or(0);
        self.order.retain(|id| *id != uid);
        if let Some(dependents) = self.paint_mappings.get_mut(&mapping.paint()) {
            dependents.remove(&uid);
        }
        self.mapping_ids.release(uid);
        self.dirty = true;
        debug!(mapping = uid, "mapping removed");
        Ok(RemovedMapping { index, mapping })
    }

    /// Removes a paint after removing every mapping that depends on it.
    pub fn remove_paint(&mut self, uid: Uid) -> Result<RemovedPaint> {
        if !self.paints.contains_key(&uid) {
            return Err(MapError::UnknownPaint(uid));
        }

        let dependents: Vec<Uid> = self
            .paint_mappings
            .get(&uid)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let mut mappings = Vec::with_capacity(dependents.len());
        for mapping in dependents {
            mappings.push(self.remove_mapping(mapping)?);
        }

        let paint = self.paints.remove(&uid).ok_or(MapError::UnknownPaint(uid))?;
        let index = self
            .paint_order
            .iter()
            .position(|id| *id == uid)
            .unwrap_or(0);
        self.paint_order.retain(|id| *id != uid);
        self.paint_mappings.remove(&uid);
        self.paint_ids.release(uid);
        self.dirty = true;
        debug!(paint = uid, cascaded = mappings.len(), "paint removed");
        Ok(RemovedPaint {
            index,
            paint,
            mappings,
        })
    }

    /// Puts a removed paint and its cascaded mappings back where they were.
    pub fn restore_paint(&mut self, removed: RemovedPaint) -> Result<Uid> {
        let uid = self.insert_paint_at(removed.paint, removed.index)?;
        for entry in removed.mappings.into_iter().rev() {
            self.insert_mapping_at(entry.mapping, entry.index)?;
        }
        Ok(uid)
    }

    /// Replaces the draw order. `new_order` must be a permutation of the
    /// live mapping uids, otherwise nothing changes.
    pub fn reorder_mappings(&mut self, new_order: &[Uid]) -> Result<()> {
        let requested: BTreeSet<Uid> = new_order.iter().copied().collect();
        if new_order.len() != self.mappings.len()
            || requested.len() != new_order.len()
            || !requested.iter().all(|uid| self.mappings.contains_key(uid))
        {
            return Err(MapError::InvalidOrder);
        }
        self.order = new_order.to_vec();
        self.dirty = true;
        Ok(())
    }

    /// Mappings that draw from `paint`, keyed by uid.
    pub fn paint_mappings(&self, paint: Uid) -> BTreeMap<Uid, &Mapping> {
        self.paint_mappings
            .get(&paint)
            .into_iter()
            .flatten()
            .filter_map(|uid| self.mappings.get(uid).map(|mapping| (*uid, mapping)))
            .collect()
    }

    /// Empties the model and restarts both uid universes.
    pub fn clear_all(&mut self) {
        self.paints.clear();
        self.paint_order.clear();
        self.mappings.clear();
        self.order.clear();
        self.paint_mappings.clear();
        self.paint_ids.clear();
        self.mapping_ids.clear();
        self.dirty = true;
    }

    pub fn n_paints(&self) -> usize {
        self.paints.len()
    }

    pub fn n_mappings(&self) -> usize {
        self.mappings.len()
    }

    /// Paint at `index` in insertion order.
    pub fn paint(&self, index: usize) -> Option<&Paint> {
        self.paint_order
            .get(index)
            .and_then(|uid| self.paints.get(uid))
    }

    pub fn paint_by_id(&self, uid: Uid) -> Option<&Paint> {
        self.paints.get(&uid)
    }

    pub fn paint_by_id_mut(&mut self, uid: Uid) -> Option<&mut Paint> {
        let paint = self.paints.get_mut(&uid)?;
        self.dirty = true;
        Some(paint)
    }

    /// Paints in insertion order.
    pub fn paints(&self) -> impl Iterator<Item = &Paint> {
        self.paint_order
            .iter()
            .filter_map(|uid| self.paints.get(uid))
    }

    pub fn paints_mut(&mut self) -> impl Iterator<Item = &mut Paint> {
        self.dirty = true;
        self.paints.values_mut()
    }

    /// Mapping at draw-order slot `index`; slot 0 is drawn first.
    pub fn mapping(&self, index: usize) -> Option<&Mapping> {
        self.order.get(index).and_then(|uid| self.mappings.get(uid))
    }

    pub fn mapping_by_id(&self, uid: Uid) -> Option<&Mapping> {
        self.mappings.get(&uid)
    }

    pub fn mapping_by_id_mut(&mut self, uid: Uid) -> Option<&mut Mapping> {
        let mapping = self.mappings.get_mut(&uid)?;
        self.dirty = true;
        Some(mapping)
    }

    /// Mappings back to front.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.order.iter().filter_map(|uid| self.mappings.get(uid))
    }

    pub fn order(&self) -> &[Uid] {
        &self.order
    }

    /// Draw-order slot of a mapping.
    pub fn mapping_index(&self, uid: Uid) -> Option<usize> {
        self.order.iter().position(|id| *id == uid)
    }

    pub fn paint_exists(&self, uid: Uid) -> bool {
        self.paint_ids.exists(uid)
    }

    pub fn mapping_exists(&self, uid: Uid) -> bool {
        self.mapping_ids.exists(uid)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the model changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

fn claim(ids: &mut UidAllocator, requested: Uid) -> Result<Uid> {
    if requested == NULL_UID {
        Ok(ids.allocate())
    } else {
        ids.reserve(requested)?;
        Ok(requested)
    }
}
