//! Anklet orchestrator client
//!
//! Blocking access to the Ankaios orchestrator plus the apply-and-await
//! workflow built on it. The CLI, the trigger server and the tests all go
//! through the same [`ControlSession`] trait.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use anklet_client::{AnkCli, Connector, workflow};
//!
//! fn main() -> anklet_client::Result<()> {
//!     let session = AnkCli::default().connect()?;
//!
//!     let instance = workflow::apply(&session, "symphony", "agent_A")?;
//!     let outcome = workflow::await_running(&session, &instance, Duration::from_secs(30))?;
//!
//!     println!("{} -> {}", instance, outcome);
//!     Ok(())
//! }
//! ```

mod ank;
pub mod error;
mod exec;
mod session;
pub mod workflow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use ank::{AnkCli, AnkSession, DEFAULT_COMMAND_TIMEOUT, SessionHandle};
pub use error::{ClientError, Result};
pub use session::{Connector, ControlSession, DEFAULT_STATE_POLL_INTERVAL};
