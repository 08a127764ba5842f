//! MTP protocol definitions
//!
//! Operation and response codes, the generic container header, and the
//! dataset layouts exchanged with the host.

pub mod container;
pub mod datasets;
pub mod ops;
pub mod responses;

pub use container::{
    CommandBlock, ContainerHeader, ContainerType, PayloadReader, PayloadWriter,
    CONTAINER_HEADER_LEN,
};
pub use datasets::{DeviceIdentity, ObjectInfo, StorageInfo};
pub use ops::OperationCode;
pub use responses::ResponseCode;

/// Wildcard parameter meaning "all storages" or "the root parent".
pub const ALL_WILDCARD: u32 = 0xFFFF_FFFF;
