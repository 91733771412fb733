//! HTTP handlers for the server.

pub mod export;
pub mod presets;
