//! Anklet trigger server
//!
//! Exposes the apply-and-await workflow over a WebSocket: every connection
//! to `/ws/trigger-update` schedules the pending workload once and reports
//! its progress until it runs, times out or fails.

pub mod api;
pub mod config;
pub mod service;
