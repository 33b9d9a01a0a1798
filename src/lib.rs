pub mod api;
pub mod canvas;
pub mod config;

pub use canvas::{Canvas, CanvasError};
pub use config::CanvasConfig;
