//! Foundation module - Core utilities and types
//!
//! - Math aliases, rectangles and camera matrices
//! - Frame timing
//! - Logging initialisation

pub mod logging;
pub mod math;
pub mod time;
