//! Error handling for the MTP responder
//!
//! Re-exports all error types used across modules.

pub mod types;

pub use types::{
    HandleError, ObjectError, ProtocolError, ResponderError, SessionError, TransferError,
};
