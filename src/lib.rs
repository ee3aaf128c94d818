//! Citadel - Readiness-Driven Static File Server
//!
//! Core library for the HTTP/1.1 state machine and the reactor that drives it.

pub mod config;
pub mod fs;
pub mod http;
pub mod server;
