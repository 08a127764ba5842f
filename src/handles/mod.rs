//! Handle table module
//!
//! Gives filesystem entries protocol-visible persistent identities for the
//! lifetime of a session.

pub mod table;

pub use table::{HandleEntry, HandleTable, PARENT_ROOT};
