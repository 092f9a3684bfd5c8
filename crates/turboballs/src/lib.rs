//! Turboballs
//!
//! Return the ball to keep the rally going. The paddle is steered by a
//! single control level in `[0, 1]`.

pub mod config;
pub mod game;
pub mod gameplay;

pub use config::GameConfig;
pub use game::{Game, GameError};
pub use gameplay::{Gameplay, TickOutcome};
