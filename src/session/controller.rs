//! Session lifecycle
//!
//! Handles stay valid for exactly one session. Opening a session rebuilds
//! the handle table from a one-level walk of the volume; the table must be
//! regenerated at this single well-defined point, and only here, to avoid
//! identifier drift mid-session. Closing resets the allocator so numbering
//! restarts from 1 next time, and every previously issued handle becomes
//! invalid.

use log::{debug, error, info, warn};

use crate::error::SessionError;
use crate::handles::{HandleEntry, HandleTable, PARENT_ROOT};
use crate::storage::Volume;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
}

pub struct SessionController {
    state: SessionState,
}

impl Default for SessionController {
    fn default() -> Self {
        Self {
            state: SessionState::Closed,
        }
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Operations that touch the handle table call this first.
    pub fn require_open(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(SessionError::NotOpen),
        }
    }

    /// Opens the session and repopulates the handle table from the volume.
    pub fn open(&mut self, table: &mut HandleTable, volume: &Volume) -> Result<(), SessionError> {
        if self.is_open() {
            return Err(SessionError::AlreadyOpen);
        }
        table.clear();
        rebuild(table, volume);
        self.state = SessionState::Open;
        info!("Session opened, {} objects registered", table.count());
        Ok(())
    }

    /// Closes the session. All issued handles are invalid from here on.
    pub fn close(&mut self, table: &mut HandleTable) -> Result<(), SessionError> {
        if !self.is_open() {
            return Err(SessionError::NotOpen);
        }
        table.clear();
        table.reset_allocator();
        self.state = SessionState::Closed;
        info!("Session closed, all handles invalidated");
        Ok(())
    }
}

/// Walks the storage root one level deep: every root entry gets a fresh
/// handle, and every root directory has its immediate children registered
/// too. Deeper nesting is not modeled. A walk failure leaves the table
/// partially filled and the session still opens.
fn rebuild(table: &mut HandleTable, volume: &Volume) {
    let root_entries = match volume.list_dir(volume.root()) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Cannot list storage root {}: {}", volume.root().display(), e);
            return;
        }
    };

    for item in root_entries {
        let handle = table.allocate_handle();
        let is_directory = item.is_dir;
        let entry = HandleEntry {
            handle,
            parent_handle: PARENT_ROOT,
            is_directory,
            name: item.name.clone(),
        };
        if table.insert(entry).is_err() {
            warn!("Handle table full, stopping session walk");
            return;
        }
        debug!("Handle {} = /{}", handle, item.name);

        if !is_directory {
            continue;
        }
        let dir_path = volume.root().join(&item.name);
        let children = match volume.list_dir(&dir_path) {
            Ok(children) => children,
            Err(e) => {
                error!("Cannot list directory {}: {}", dir_path.display(), e);
                continue;
            }
        };
        for child in children {
            let child_handle = table.allocate_handle();
            let child_entry = HandleEntry {
                handle: child_handle,
                parent_handle: handle,
                is_directory: child.is_dir,
                name: child.name.clone(),
            };
            if table.insert(child_entry).is_err() {
                warn!("Handle table full, stopping session walk");
                return;
            }
            debug!("Handle {} = /{}/{}", child_handle, item.name, child.name);
        }
    }
}
