//! HTTP API for TETR.IO community tournaments.

pub mod api;
pub mod config;
pub mod logging;
