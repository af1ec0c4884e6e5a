//! Status monitoring
//!
//! Periodically queries the orchestrator through the `ank` CLI, keeps the
//! latest snapshot and picks out the lines that report failed workloads.

pub mod failures;
pub mod poller;
pub mod source;

pub use poller::{Monitor, Snapshot};
pub use source::AnkStatusSource;
