//! Responder module
//!
//! The operation dispatcher and the session context it runs against.

pub mod core;
pub mod effect;
mod handlers;

pub use self::core::MtpResponder;
pub use effect::{Effect, Phase};
