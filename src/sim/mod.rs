//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by target / node ID)
//! - No rendering or platform dependencies (time comes in through `Clock`)

pub mod camera;
pub mod effects;
pub mod game_loop;
pub mod modes;
pub mod raycast;
pub mod scene;
pub mod scoring;
pub mod state;
pub mod target;

pub use camera::{Camera, Viewport, VisibleBounds};
pub use effects::ImpactEffects;
pub use game_loop::GameLoop;
pub use modes::{Gridshot, Microshot, ModeContext, ModeSet, RangeMode, Spidershot};
pub use raycast::{HitProxy, Ray, RayHit, Raycaster};
pub use scene::{Node, NodeId, ParticleCloud, Scene, TargetVisual};
pub use scoring::{ShotResult, score_at};
pub use state::{GameState, GameStats, GameStatus, ModeKind, RoundConfig, SessionEvent};
pub use target::{Target, TargetId};
