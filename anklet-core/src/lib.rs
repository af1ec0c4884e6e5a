//! Anklet Core
//!
//! Core types shared by the Anklet tools.
//!
//! This crate contains:
//! - Domain types: workloads, instance names, execution states and the
//!   orchestrator's complete state as reported by `ank`
//! - DTOs: messages exchanged with WebSocket clients

pub mod domain;
pub mod dto;
