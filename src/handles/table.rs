//! Session handle table
//!
//! MTP requires the responder to hand out object handles that stay valid for
//! the whole session, but the backing filesystem has no stable identifier to
//! map them onto. This table is that mapping: one slot per exposed object, a
//! monotonic handle allocator, and linear scans for lookup. The capacity
//! bounds how many objects a session can expose; with tables this small the
//! O(N) scans are not worth improving on.

use std::path::{Path, PathBuf};

use crate::error::HandleError;

/// Parent reference carried by top-level entries. Handle 0 is never
/// allocated to an object and always denotes the storage root.
pub const PARENT_ROOT: u32 = 0;

/// One filesystem object known to the active session.
#[derive(Debug, Clone)]
pub struct HandleEntry {
    pub handle: u32,
    pub parent_handle: u32,
    pub is_directory: bool,
    pub name: String,
}

/// Fixed-capacity registry mapping handles to filesystem entries.
pub struct HandleTable {
    slots: Vec<Option<HandleEntry>>,
    next_handle: u32,
    count: usize,
}

impl HandleTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            next_handle: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    /// Returns the next unused handle. Handles increase strictly, are never
    /// zero, and are never reused within a session even after deletion.
    pub fn allocate_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Restarts handle numbering from 1. Only valid between sessions.
    pub fn reset_allocator(&mut self) {
        self.next_handle = 0;
    }

    /// Drops every entry. The allocator is left alone; see `reset_allocator`.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.count = 0;
    }

    /// Installs an entry in the first free slot.
    pub fn insert(&mut self, entry: HandleEntry) -> Result<(), HandleError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(HandleError::TableFull)?;
        *slot = Some(entry);
        self.count += 1;
        Ok(())
    }

    /// Looks up a live entry by handle.
    pub fn find(&self, handle: u32) -> Option<&HandleEntry> {
        self.slots
            .iter()
            .flatten()
            .find(|entry| entry.handle == handle)
    }

    /// Clears the slot holding `handle`. The filesystem object itself is the
    /// caller's responsibility.
    pub fn remove(&mut self, handle: u32) -> Result<HandleEntry, HandleError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(entry) if entry.handle == handle))
            .ok_or(HandleError::NotFound(handle))?;
        let entry = slot.take().ok_or(HandleError::NotFound(handle))?;
        self.count -= 1;
        Ok(entry)
    }

    /// Handles of all live entries whose parent is `parent`.
    pub fn children_of(&self, parent: u32) -> Vec<u32> {
        self.slots
            .iter()
            .flatten()
            .filter(|entry| entry.parent_handle == parent)
            .map(|entry| entry.handle)
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HandleEntry> {
        self.slots.iter().flatten()
    }

    /// Maps a handle to its path below `root`. Nesting is at most one
    /// directory deep by construction, so the result has at most two
    /// segments below the root.
    pub fn resolve_path(&self, root: &Path, handle: u32) -> Result<PathBuf, HandleError> {
        if handle == PARENT_ROOT {
            return Ok(root.to_path_buf());
        }
        let entry = self.find(handle).ok_or(HandleError::NotFound(handle))?;
        if entry.parent_handle == PARENT_ROOT {
            return Ok(root.join(&entry.name));
        }
        let parent = self
            .find(entry.parent_handle)
            .ok_or(HandleError::InvalidParent(entry.parent_handle))?;
        Ok(root.join(&parent.name).join(&entry.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(handle: u32, parent: u32, is_directory: bool, name: &str) -> HandleEntry {
        HandleEntry {
            handle,
            parent_handle: parent,
            is_directory,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_handles_strictly_increase_and_never_repeat() {
        let mut table = HandleTable::new(8);
        let mut seen = Vec::new();
        for _ in 0..5 {
            let h = table.allocate_handle();
            assert!(h > 0);
            assert!(seen.last().is_none_or(|last| h > *last));
            seen.push(h);
        }
        // deletion must not recycle handle values
        table.insert(entry(seen[0], PARENT_ROOT, false, "a.txt")).unwrap();
        table.remove(seen[0]).unwrap();
        let h = table.allocate_handle();
        assert!(h > *seen.last().unwrap());
    }

    #[test]
    fn test_insert_find_remove() {
        let mut table = HandleTable::new(4);
        let h = table.allocate_handle();
        table.insert(entry(h, PARENT_ROOT, false, "a.txt")).unwrap();
        assert_eq!(table.count(), 1);
        assert_eq!(table.find(h).unwrap().name, "a.txt");

        table.remove(h).unwrap();
        assert_eq!(table.count(), 0);
        assert!(table.find(h).is_none());
        assert!(matches!(table.remove(h), Err(HandleError::NotFound(_))));
    }

    #[test]
    fn test_table_full() {
        let mut table = HandleTable::new(2);
        for name in ["a", "b"] {
            let h = table.allocate_handle();
            table.insert(entry(h, PARENT_ROOT, false, name)).unwrap();
        }
        let h = table.allocate_handle();
        assert!(matches!(
            table.insert(entry(h, PARENT_ROOT, false, "c")),
            Err(HandleError::TableFull)
        ));
    }

    #[test]
    fn test_children_of_parent() {
        let mut table = HandleTable::new(8);
        let dir = table.allocate_handle();
        table.insert(entry(dir, PARENT_ROOT, true, "music")).unwrap();
        let child = table.allocate_handle();
        table.insert(entry(child, dir, false, "song.mp3")).unwrap();
        let top = table.allocate_handle();
        table.insert(entry(top, PARENT_ROOT, false, "readme")).unwrap();

        let mut root_children = table.children_of(PARENT_ROOT);
        root_children.sort_unstable();
        assert_eq!(root_children, vec![dir, top]);
        assert_eq!(table.children_of(dir), vec![child]);
    }

    #[test]
    fn test_resolve_path_depth_is_bounded() {
        let mut table = HandleTable::new(8);
        let root = Path::new("/storage");
        assert_eq!(table.resolve_path(root, PARENT_ROOT).unwrap(), root);

        let dir = table.allocate_handle();
        table.insert(entry(dir, PARENT_ROOT, true, "music")).unwrap();
        let child = table.allocate_handle();
        table.insert(entry(child, dir, false, "song.mp3")).unwrap();

        assert_eq!(table.resolve_path(root, dir).unwrap(), root.join("music"));
        let resolved = table.resolve_path(root, child).unwrap();
        assert_eq!(resolved, root.join("music").join("song.mp3"));
        assert!(resolved.strip_prefix(root).unwrap().components().count() <= 2);

        assert!(matches!(
            table.resolve_path(root, 99),
            Err(HandleError::NotFound(99))
        ));
    }
}
