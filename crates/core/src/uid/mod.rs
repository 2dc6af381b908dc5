use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{MapError, Result};

/// Identifier of a paint or a mapping. Unique within its [`Universe`].
pub type Uid = u32;

/// Marks "no entity". Never handed out by an allocator.
pub const NULL_UID: Uid = 0;

/// The two identifier namespaces. Paint and mapping uids never share an
/// allocator, so a remote message or project file can't confuse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Universe {
    Paint,
    Mapping,
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Universe::Paint => f.write_str("paint"),
            Universe::Mapping => f.write_str("mapping"),
        }
    }
}

/// Issues and tracks live identifiers for one universe.
///
/// Fresh ids are minted monotonically: an id released during the session is
/// not handed out again by [`UidAllocator::allocate`], which lets the undo
/// history restore a deleted entity under its original id. Explicit
/// [`UidAllocator::reserve`] calls may still claim any free id.
#[derive(Debug, Clone)]
pub struct UidAllocator {
    universe: Universe,
    live: BTreeSet<Uid>,
    next: Uid,
}

impl UidAllocator {
    pub fn new(universe: Universe) -> Self {
        Self {
            universe,
            live: BTreeSet::new(),
            next: NULL_UID + 1,
        }
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    pub fn exists(&self, uid: Uid) -> bool {
        self.live.contains(&uid)
    }

    /// Mints the next free id and marks it live.
    pub fn allocate(&mut self) -> Uid {
        while self.live.contains(&self.next) || self.next == NULL_UID {
            self.next = self.next.wrapping_add(1);
        }
        let uid = self.next;
        self.live.insert(uid);
        self.next = uid.wrapping_add(1);
        uid
    }

    /// Claims a specific id, e.g. when replaying a saved project.
    pub fn reserve(&mut self, uid: Uid) -> Result<()> {
        if uid == NULL_UID {
            return Err(MapError::InvalidInput("cannot reserve the null uid"));
        }
        if !self.live.insert(uid) {
            return Err(MapError::UidConflict {
                universe: self.universe,
                uid,
            });
        }
        if uid >= self.next {
            self.next = uid.wrapping_add(1);
        }
        Ok(())
    }

    /// Marks `uid` free again. Returns `false` if it was not live.
    pub fn release(&mut self, uid: Uid) -> bool {
        self.live.remove(&uid)
    }

    /// Forgets every id and restarts numbering, as for a new project.
    pub fn clear(&mut self) {
        self.live.clear();
        self.next = NULL_UID + 1;
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
