//! Utility functions for the MTP responder

pub mod serial;
pub mod utf16;
