//! Session module
//!
//! Owns session open/closed state and the handle table rebuild at open.

pub mod controller;

pub use controller::{SessionController, SessionState};
