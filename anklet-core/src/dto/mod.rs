//! Data Transfer Objects
//!
//! Messages sent to clients of the trigger service.

pub mod session;
