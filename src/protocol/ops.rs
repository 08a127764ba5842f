//! Module `ops`
//!
//! Defines the MTP operation codes this responder understands.

/// Operation codes handled by the responder.
///
/// Each variant carries its on-wire code as discriminant. Anything the host
/// sends outside this set is answered with OperationNotSupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum OperationCode {
    GetDeviceInfo = 0x1001,
    OpenSession = 0x1002,
    CloseSession = 0x1003,
    GetStorageIds = 0x1004,
    GetStorageInfo = 0x1005,
    GetObjectHandles = 0x1007,
    GetObjectInfo = 0x1008,
    GetObject = 0x1009,
    DeleteObject = 0x100B,
    SendObjectInfo = 0x100C,
    SendObject = 0x100D,
    GetDevicePropDesc = 0x1014,
    GetDevicePropValue = 0x1015,
}

impl OperationCode {
    /// All supported operations, in the order reported by GetDeviceInfo.
    pub const ALL: [OperationCode; 13] = [
        OperationCode::GetDeviceInfo,
        OperationCode::OpenSession,
        OperationCode::CloseSession,
        OperationCode::GetStorageIds,
        OperationCode::GetStorageInfo,
        OperationCode::GetObjectHandles,
        OperationCode::GetObjectInfo,
        OperationCode::GetObject,
        OperationCode::DeleteObject,
        OperationCode::SendObjectInfo,
        OperationCode::SendObject,
        OperationCode::GetDevicePropDesc,
        OperationCode::GetDevicePropValue,
    ];

    /// Decodes a raw operation code; `None` for anything unsupported.
    pub fn from_u16(raw: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_u16() == raw)
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_and_unknown() {
        assert_eq!(OperationCode::from_u16(0x1001), Some(OperationCode::GetDeviceInfo));
        assert_eq!(OperationCode::from_u16(0x100C), Some(OperationCode::SendObjectInfo));
        // GetNumObjects is deliberately not handled
        assert_eq!(OperationCode::from_u16(0x1006), None);
    }
}
