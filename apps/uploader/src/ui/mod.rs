//! UI layer: the uploader window and its image regions.

pub mod app;

pub use app::UploaderApp;
