//! Configuration and session-held state of the web applications.

pub mod config;
pub mod session;
