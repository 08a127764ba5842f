//! Storage module
//!
//! The filesystem-facing side of the responder: the backing volume and the
//! descriptor of the single storage exposed to the host.

pub mod descriptor;
pub mod volume;

pub use descriptor::{StorageDescriptor, SUPPORTED_STORAGE_ID};
pub use volume::{DirEntryInfo, Volume};
