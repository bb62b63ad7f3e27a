//! Bridge between the UI thread and the Tokio worker that talks to the processing server.

pub mod commands;
pub mod runtime;
