pub mod adjust;
pub mod buffer;
pub mod color;
pub mod commands;
pub mod config;
pub mod effects;
pub mod error;
pub mod filters;
pub mod imgproc;
pub mod session;
pub mod smoothing;
