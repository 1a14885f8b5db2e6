//! Fruit Crush: a renderer-agnostic match-3 engine.
//!
//! [`MatchEngine`] owns an 8×8 [`Grid`] of fruit and the level [`Session`]. Swaps and
//! power-ups resolve synchronously to a stable, match-free grid and come back as an
//! ordered list of [`ResolutionStep`]s for a front end to animate.

pub mod analytics;
pub mod engine;
pub mod error;
pub mod events;
pub mod fruits;
pub mod grid;
pub mod player;
pub mod powerup;
pub mod scoring;
pub mod shop;
pub mod store;

pub use engine::{EngineConfig, LevelStatus, MatchEngine, Session};
pub use error::{EngineError, ErrorKind, Precondition};
pub use events::{LevelEvent, PowerUpOutcome, Resolution, ResolutionStep, SwapOutcome};
pub use fruits::{FruitSource, ScriptedFruits, SeededFruits};
pub use grid::{Cell, FruitKind, Grid, Position};
pub use player::{Achievement, Player};
pub use powerup::{Inventory, PowerUpKind};
pub use shop::{Reward, ShopItem};
