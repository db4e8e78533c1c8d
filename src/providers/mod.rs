//! Provider implementations shipping with this crate.

pub mod memory;
