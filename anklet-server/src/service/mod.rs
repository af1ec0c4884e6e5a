//! Service Module
//!
//! Session logic, independent of the transport that delivers the messages.

pub mod trigger;
