//! Module `datasets`
//!
//! Payload layouts for the datasets this responder exchanges with the host:
//! DeviceInfo, StorageInfo, ObjectInfo and the friendly-name device property.

use crate::error::ProtocolError;
use crate::protocol::container::{PayloadReader, PayloadWriter};
use crate::protocol::ops::OperationCode;

pub const STANDARD_VERSION: u16 = 100;
pub const MTP_VENDOR_EXTENSION_ID: u32 = 0x0000_0006;
pub const VENDOR_EXTENSION_VERSION: u16 = 100;
pub const VENDOR_EXTENSION_DESC: &str = "microsoft.com: 1.0;";

pub const FORMAT_UNDEFINED: u16 = 0x3000;
pub const FORMAT_ASSOCIATION: u16 = 0x3001;

pub const ASSOCIATION_UNDEFINED: u16 = 0x0000;
pub const ASSOCIATION_GENERIC_FOLDER: u16 = 0x0001;

pub const PROTECTION_NONE: u16 = 0x0000;

pub const DEV_PROP_DEVICE_FRIENDLY_NAME: u16 = 0xD402;
pub const DATA_TYPE_STR: u16 = 0xFFFF;
pub const PROP_GET_ONLY: u8 = 0x00;

pub const STORAGE_TYPE_FIXED_RAM: u16 = 0x0003;
pub const FILESYSTEM_GENERIC_HIERARCHICAL: u16 = 0x0002;
pub const ACCESS_READ_WRITE: u16 = 0x0000;

/// Creation and modification dates are not derived from filesystem metadata.
pub const FIXED_DATETIME: &str = "20250808T173500.0";

/// Static identity strings reported by GetDeviceInfo and the friendly-name
/// device property.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub manufacturer: String,
    pub model: String,
    pub device_version: String,
    pub serial: String,
    pub friendly_name: String,
}

/// Writes the full DeviceInfo dataset.
pub fn encode_device_info(w: &mut PayloadWriter, identity: &DeviceIdentity) {
    w.put_u16(STANDARD_VERSION);
    w.put_u32(MTP_VENDOR_EXTENSION_ID);
    w.put_u16(VENDOR_EXTENSION_VERSION);
    w.put_string(VENDOR_EXTENSION_DESC);
    w.put_u16(0); // functional mode: standard

    let ops: Vec<u16> = OperationCode::ALL.iter().map(|op| op.as_u16()).collect();
    w.put_u16_array(&ops);
    w.put_u16_array(&[]); // events supported
    w.put_u16_array(&[DEV_PROP_DEVICE_FRIENDLY_NAME]);
    w.put_u16_array(&[]); // capture formats
    w.put_u16_array(&[FORMAT_UNDEFINED, FORMAT_ASSOCIATION]);

    w.put_string(&identity.manufacturer);
    w.put_string(&identity.model);
    w.put_string(&identity.device_version);
    w.put_string(&identity.serial);
}

/// Writes the DevicePropDesc dataset for the friendly name, the only
/// property this responder describes.
pub fn encode_device_prop_desc(w: &mut PayloadWriter, friendly_name: &str) {
    w.put_u16(DEV_PROP_DEVICE_FRIENDLY_NAME);
    w.put_u16(DATA_TYPE_STR);
    w.put_u8(PROP_GET_ONLY);
    w.put_string(friendly_name); // factory default
    w.put_string(friendly_name); // current value
    w.put_u8(0); // no form
}

/// StorageInfo dataset. Capacity figures are recomputed from the volume on
/// every query, never cached here.
#[derive(Debug, Clone)]
pub struct StorageInfo {
    pub storage_type: u16,
    pub filesystem_type: u16,
    pub access_capability: u16,
    pub max_capacity: u64,
    pub free_space_bytes: u64,
    pub free_space_objects: u32,
    pub description: String,
    pub volume_identifier: String,
}

impl StorageInfo {
    pub fn encode(&self, w: &mut PayloadWriter) {
        w.put_u16(self.storage_type);
        w.put_u16(self.filesystem_type);
        w.put_u16(self.access_capability);
        w.put_u64(self.max_capacity);
        w.put_u64(self.free_space_bytes);
        w.put_u32(self.free_space_objects);
        w.put_string(&self.description);
        w.put_string(&self.volume_identifier);
    }
}

/// ObjectInfo dataset: a 52-byte fixed part followed by the filename and
/// three date/keyword strings.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub storage_id: u32,
    pub object_format: u16,
    pub protection_status: u16,
    pub compressed_size: u32,
    pub thumb_format: u16,
    pub thumb_compressed_size: u32,
    pub thumb_pix_width: u32,
    pub thumb_pix_height: u32,
    pub image_pix_width: u32,
    pub image_pix_height: u32,
    pub image_bit_depth: u32,
    pub parent_object: u32,
    pub association_type: u16,
    pub association_desc: u32,
    pub sequence_number: u32,
    pub filename: String,
}

impl ObjectInfo {
    /// Descriptor for an existing object. Thumbnail and image fields stay
    /// zeroed; this responder serves plain files and folders only.
    pub fn describe(
        storage_id: u32,
        size: u32,
        parent_object: u32,
        association_type: u16,
        filename: String,
    ) -> Self {
        Self {
            storage_id,
            object_format: FORMAT_UNDEFINED,
            protection_status: PROTECTION_NONE,
            compressed_size: size,
            thumb_format: FORMAT_UNDEFINED,
            thumb_compressed_size: 0,
            thumb_pix_width: 0,
            thumb_pix_height: 0,
            image_pix_width: 0,
            image_pix_height: 0,
            image_bit_depth: 0,
            parent_object,
            association_type,
            association_desc: 0,
            sequence_number: 0,
            filename,
        }
    }

    pub fn encode(&self, w: &mut PayloadWriter) {
        w.put_u32(self.storage_id);
        w.put_u16(self.object_format);
        w.put_u16(self.protection_status);
        w.put_u32(self.compressed_size);
        w.put_u16(self.thumb_format);
        w.put_u32(self.thumb_compressed_size);
        w.put_u32(self.thumb_pix_width);
        w.put_u32(self.thumb_pix_height);
        w.put_u32(self.image_pix_width);
        w.put_u32(self.image_pix_height);
        w.put_u32(self.image_bit_depth);
        w.put_u32(self.parent_object);
        w.put_u16(self.association_type);
        w.put_u32(self.association_desc);
        w.put_u32(self.sequence_number);
        w.put_string(&self.filename);
        w.put_string(FIXED_DATETIME); // date created
        w.put_string(FIXED_DATETIME); // date modified
        w.put_string(""); // keywords, not used
    }

    /// Parses a received descriptor. The filename is clamped to
    /// `max_filename` bytes of UTF-8; the trailing date and keyword strings
    /// are not consulted.
    pub fn parse(payload: &[u8], max_filename: usize) -> Result<Self, ProtocolError> {
        let mut r = PayloadReader::new(payload);
        Ok(Self {
            storage_id: r.take_u32()?,
            object_format: r.take_u16()?,
            protection_status: r.take_u16()?,
            compressed_size: r.take_u32()?,
            thumb_format: r.take_u16()?,
            thumb_compressed_size: r.take_u32()?,
            thumb_pix_width: r.take_u32()?,
            thumb_pix_height: r.take_u32()?,
            image_pix_width: r.take_u32()?,
            image_pix_height: r.take_u32()?,
            image_bit_depth: r.take_u32()?,
            parent_object: r.take_u32()?,
            association_type: r.take_u16()?,
            association_desc: r.take_u32()?,
            sequence_number: r.take_u32()?,
            filename: r.take_string(max_filename)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_survives_encode_then_parse() {
        let info = ObjectInfo::describe(0x0001_0001, 5000, 0, ASSOCIATION_UNDEFINED, "a.txt".into());
        let mut w = PayloadWriter::new();
        info.encode(&mut w);
        let parsed = ObjectInfo::parse(&w.into_bytes(), 63).unwrap();
        assert_eq!(parsed.compressed_size, 5000);
        assert_eq!(parsed.parent_object, 0);
        assert_eq!(parsed.association_type, ASSOCIATION_UNDEFINED);
        assert_eq!(parsed.filename, "a.txt");
    }

    #[test]
    fn test_object_info_rejects_short_payload() {
        assert!(ObjectInfo::parse(&[0u8; 20], 63).is_err());
    }

    #[test]
    fn test_filename_clamped_to_limit() {
        let info = ObjectInfo::describe(0, 0, 0, ASSOCIATION_UNDEFINED, "longfilename.txt".into());
        let mut w = PayloadWriter::new();
        info.encode(&mut w);
        let parsed = ObjectInfo::parse(&w.into_bytes(), 4).unwrap();
        assert_eq!(parsed.filename, "long");
    }
}
