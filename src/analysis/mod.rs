//! Record assembly and persistence
//!
//! - Result types
//! - Record assembly
//! - Manifests
//! - Tag write-back

pub mod assembler;
pub mod manifest;
pub mod result;
pub mod tagging;
