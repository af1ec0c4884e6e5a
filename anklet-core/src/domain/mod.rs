//! Core domain types
//!
//! These types mirror the parts of the Ankaios state tree that the tools
//! read and write. They are shared between the client (which parses them
//! from `ank` output) and the binaries (which display them).

pub mod complete_state;
pub mod field_mask;
pub mod instance;
pub mod state;
pub mod workload;
