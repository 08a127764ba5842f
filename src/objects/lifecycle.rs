//! Object lifecycle
//!
//! Creates and deletes protocol-visible objects while keeping the handle
//! table and the filesystem a consistent pair: when either side refuses, the
//! other is left untouched.

use std::fs::File;

use log::{error, info};

use crate::error::ObjectError;
use crate::handles::{HandleEntry, HandleTable, PARENT_ROOT};
use crate::storage::Volume;

/// A file created through SendObjectInfo: its new handle and the writable
/// stream the transfer engine will fill.
pub struct CreatedObject {
    pub handle: u32,
    pub file: File,
}

/// Creates a plain file below `parent` and installs its table entry.
///
/// Capacity checks run first: a refusal must not mutate the table or the
/// filesystem. `size` is the length the descriptor declared for the
/// upcoming payload.
pub fn create_file(
    table: &mut HandleTable,
    volume: &Volume,
    parent_handle: u32,
    name: &str,
    size: u64,
) -> Result<CreatedObject, ObjectError> {
    if table.is_full() {
        error!("Cannot create {}: no free handle slot", name);
        return Err(ObjectError::StoreFull);
    }
    let free = volume.free_bytes()?;
    if free < size {
        error!("Cannot create {}: {} bytes requested, {} free", name, size, free);
        return Err(ObjectError::StoreFull);
    }

    let dir = table
        .resolve_path(volume.root(), parent_handle)
        .map_err(|_| ObjectError::InvalidParent(parent_handle))?;
    let path = dir.join(name);
    let file = volume.create_write(&path).map_err(|e| {
        error!("Failed to create {}: {}", path.display(), e);
        ObjectError::Io(e)
    })?;

    let handle = table.allocate_handle();
    let entry = HandleEntry {
        handle,
        parent_handle,
        is_directory: false,
        name: name.to_string(),
    };
    if table.insert(entry).is_err() {
        let _ = volume.unlink(&path);
        return Err(ObjectError::StoreFull);
    }

    info!("Created file {} with handle {}", path.display(), handle);
    Ok(CreatedObject { handle, file })
}

/// Creates a directory directly under the storage root. Any other parent is
/// refused: only one directory level is modeled. The new directory gets no
/// table entry; directories are discovered at the next session rebuild.
pub fn create_directory(volume: &Volume, parent_handle: u32, name: &str) -> Result<(), ObjectError> {
    if parent_handle != PARENT_ROOT {
        error!("Refusing to create directory {} below handle {}", name, parent_handle);
        return Err(ObjectError::InvalidParent(parent_handle));
    }
    let path = volume.root().join(name);
    volume.mkdir(&path).map_err(|e| {
        error!("Failed to create directory {}: {}", path.display(), e);
        ObjectError::Io(e)
    })?;
    info!("Created directory {}", path.display());
    Ok(())
}

/// Deletes the object behind `handle`: unlinks the file, then clears the
/// table entry. Directories are refused; recursive deletion is out of scope.
pub fn delete(table: &mut HandleTable, volume: &Volume, handle: u32) -> Result<(), ObjectError> {
    let path = table
        .resolve_path(volume.root(), handle)
        .map_err(|_| ObjectError::InvalidHandle(handle))?;
    let meta = volume.stat(&path).map_err(|e| {
        error!("Failed to stat {}: {}", path.display(), e);
        ObjectError::Io(e)
    })?;
    if meta.is_dir() {
        return Err(ObjectError::IsDirectory(handle));
    }

    volume.unlink(&path).map_err(|e| {
        error!("Failed to delete {}: {}", path.display(), e);
        ObjectError::Io(e)
    })?;
    table
        .remove(handle)
        .map_err(|_| ObjectError::InvalidHandle(handle))?;
    info!("Deleted {} (handle {})", path.display(), handle);
    Ok(())
}
