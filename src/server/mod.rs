//! Server module
//!
//! The TCP-based bulk transport emulation that drives the responder.

pub mod core;

pub use self::core::Server;
