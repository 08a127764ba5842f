//! Storage descriptor
//!
//! Static description of the single exposed storage volume. Capacity and
//! free-space figures are always queried live from the volume.

use std::io;

use crate::protocol::datasets::{
    ACCESS_READ_WRITE, FILESYSTEM_GENERIC_HIERARCHICAL, STORAGE_TYPE_FIXED_RAM,
};
use crate::protocol::StorageInfo;
use crate::storage::volume::Volume;

/// The single storage id this responder exposes: physical 1, logical 1.
pub const SUPPORTED_STORAGE_ID: u32 = 0x0001_0001;

pub struct StorageDescriptor {
    description: String,
    volume_identifier: String,
}

impl StorageDescriptor {
    pub fn new(description: String, volume_identifier: String) -> Self {
        Self {
            description,
            volume_identifier,
        }
    }

    /// Builds the StorageInfo dataset for the current volume state.
    /// `free_objects` is the number of handle slots still available.
    pub fn info(&self, volume: &Volume, free_objects: u32) -> io::Result<StorageInfo> {
        let capacity = volume.capacity_bytes();
        let used = volume.used_bytes()?;
        Ok(StorageInfo {
            storage_type: STORAGE_TYPE_FIXED_RAM,
            filesystem_type: FILESYSTEM_GENERIC_HIERARCHICAL,
            access_capability: ACCESS_READ_WRITE,
            max_capacity: capacity,
            free_space_bytes: capacity.saturating_sub(used),
            free_space_objects: free_objects,
            description: self.description.clone(),
            volume_identifier: self.volume_identifier.clone(),
        })
    }
}
