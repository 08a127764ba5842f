//! Transfer module
//!
//! The per-operation streaming state machine that copies file bytes through
//! a bounded buffer across multiple transport invocations.

pub mod engine;

pub use engine::{InboundStep, OutboundStep, TransferEngine};
