//! Error types
//!
//! Defines domain-specific error types for each module of the responder,
//! plus the umbrella `ResponderError` and its total mapping onto MTP
//! response codes.

use std::fmt;
use std::io;

use crate::protocol::ResponseCode;

/// Handle table errors
#[derive(Debug)]
pub enum HandleError {
    NotFound(u32),
    TableFull,
    InvalidParent(u32),
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleError::NotFound(h) => write!(f, "Handle not found: {}", h),
            HandleError::TableFull => write!(f, "Handle table full"),
            HandleError::InvalidParent(h) => write!(f, "Invalid parent handle: {}", h),
        }
    }
}

impl std::error::Error for HandleError {}

/// Session lifecycle errors
#[derive(Debug)]
pub enum SessionError {
    AlreadyOpen,
    NotOpen,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AlreadyOpen => write!(f, "Session already open"),
            SessionError::NotOpen => write!(f, "Session not open"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Transfer engine errors
#[derive(Debug)]
pub enum TransferError {
    NoOutboundTransfer,
    NothingStaged,
    Io(io::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NoOutboundTransfer => write!(f, "No outbound transfer in progress"),
            TransferError::NothingStaged => write!(f, "No staged transfer to receive into"),
            TransferError::Io(e) => write!(f, "Transfer I/O error: {}", e),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<io::Error> for TransferError {
    fn from(error: io::Error) -> Self {
        TransferError::Io(error)
    }
}

/// Object lifecycle errors
#[derive(Debug)]
pub enum ObjectError {
    StoreFull,
    InvalidParent(u32),
    InvalidHandle(u32),
    IsDirectory(u32),
    Io(io::Error),
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectError::StoreFull => write!(f, "Store full"),
            ObjectError::InvalidParent(h) => write!(f, "Invalid parent object: {}", h),
            ObjectError::InvalidHandle(h) => write!(f, "Invalid object handle: {}", h),
            ObjectError::IsDirectory(h) => write!(f, "Object {} is a directory", h),
            ObjectError::Io(e) => write!(f, "Object I/O error: {}", e),
        }
    }
}

impl std::error::Error for ObjectError {}

impl From<io::Error> for ObjectError {
    fn from(error: io::Error) -> Self {
        ObjectError::Io(error)
    }
}

/// Container and dataset parse errors
#[derive(Debug)]
pub enum ProtocolError {
    Truncated,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Truncated => write!(f, "Truncated dataset payload"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Umbrella error for the responder, covering all module errors plus the
/// protocol-level rejections raised directly by handlers.
#[derive(Debug)]
pub enum ResponderError {
    Session(SessionError),
    Handle(HandleError),
    Object(ObjectError),
    Transfer(TransferError),
    Protocol(ProtocolError),
    UnsupportedOperation(u16),
    InvalidStorageId(u32),
    ParameterNotSupported(u32),
    InvalidParameter,
    Io(io::Error),
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderError::Session(e) => write!(f, "Session error: {}", e),
            ResponderError::Handle(e) => write!(f, "Handle error: {}", e),
            ResponderError::Object(e) => write!(f, "Object error: {}", e),
            ResponderError::Transfer(e) => write!(f, "Transfer error: {}", e),
            ResponderError::Protocol(e) => write!(f, "Protocol error: {}", e),
            ResponderError::UnsupportedOperation(code) => {
                write!(f, "Unsupported operation: {:#06x}", code)
            }
            ResponderError::InvalidStorageId(id) => write!(f, "Invalid storage id: {:#010x}", id),
            ResponderError::ParameterNotSupported(p) => {
                write!(f, "Parameter not supported: {:#x}", p)
            }
            ResponderError::InvalidParameter => write!(f, "Invalid parameter"),
            ResponderError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ResponderError {}

impl From<SessionError> for ResponderError {
    fn from(error: SessionError) -> Self {
        ResponderError::Session(error)
    }
}

impl From<HandleError> for ResponderError {
    fn from(error: HandleError) -> Self {
        ResponderError::Handle(error)
    }
}

impl From<ObjectError> for ResponderError {
    fn from(error: ObjectError) -> Self {
        ResponderError::Object(error)
    }
}

impl From<TransferError> for ResponderError {
    fn from(error: TransferError) -> Self {
        ResponderError::Transfer(error)
    }
}

impl From<ProtocolError> for ResponderError {
    fn from(error: ProtocolError) -> Self {
        ResponderError::Protocol(error)
    }
}

impl From<io::Error> for ResponderError {
    fn from(error: io::Error) -> Self {
        ResponderError::Io(error)
    }
}

impl ResponderError {
    /// Maps every error onto the response code reported to the host.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            ResponderError::Session(SessionError::AlreadyOpen) => ResponseCode::SessionAlreadyOpen,
            ResponderError::Session(SessionError::NotOpen) => ResponseCode::SessionNotOpen,
            ResponderError::Handle(HandleError::NotFound(_)) => ResponseCode::InvalidObjectHandle,
            ResponderError::Handle(HandleError::TableFull) => ResponseCode::StoreFull,
            ResponderError::Handle(HandleError::InvalidParent(_)) => {
                ResponseCode::InvalidParentObject
            }
            ResponderError::Object(ObjectError::StoreFull) => ResponseCode::StoreFull,
            ResponderError::Object(ObjectError::InvalidParent(_)) => {
                ResponseCode::InvalidParentObject
            }
            ResponderError::Object(ObjectError::InvalidHandle(_)) => {
                ResponseCode::InvalidObjectHandle
            }
            ResponderError::Object(ObjectError::IsDirectory(_)) => {
                ResponseCode::OperationNotSupported
            }
            ResponderError::Object(ObjectError::Io(_)) => ResponseCode::GeneralError,
            ResponderError::Transfer(TransferError::NothingStaged) => {
                ResponseCode::InvalidObjectHandle
            }
            ResponderError::Transfer(_) => ResponseCode::GeneralError,
            ResponderError::Protocol(_) => ResponseCode::InvalidParameter,
            ResponderError::UnsupportedOperation(_) => ResponseCode::OperationNotSupported,
            ResponderError::InvalidStorageId(_) => ResponseCode::InvalidStorageId,
            ResponderError::ParameterNotSupported(_) => ResponseCode::ParameterNotSupported,
            ResponderError::InvalidParameter => ResponseCode::InvalidParameter,
            ResponderError::Io(_) => ResponseCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_code_mapping() {
        let err = ResponderError::from(SessionError::NotOpen);
        assert_eq!(err.response_code(), ResponseCode::SessionNotOpen);
        let err = ResponderError::from(ObjectError::StoreFull);
        assert_eq!(err.response_code(), ResponseCode::StoreFull);
        let err = ResponderError::UnsupportedOperation(0x1006);
        assert_eq!(err.response_code(), ResponseCode::OperationNotSupported);
    }
}
