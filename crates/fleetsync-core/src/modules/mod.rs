//! Control-plane seam, configuration and logging.

pub mod config;
pub mod control_plane;
pub mod logger;
