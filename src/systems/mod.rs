//! The Entity-Component-System (ECS) module.
//!
//! This module contains the components, resources, and systems that make up one
//! simulation step.

use bevy_ecs::schedule::SystemSet;

pub mod agent;
pub mod bundles;
pub mod collision;
pub mod components;
pub mod item;
pub mod movement;
pub mod navigation;
pub mod player;
pub mod power;
pub mod state;

pub use self::agent::*;
pub use self::bundles::*;
pub use self::collision::*;
pub use self::components::*;
pub use self::item::*;
pub use self::movement::*;
pub use self::navigation::*;
pub use self::player::*;
pub use self::power::*;
pub use self::state::*;

/// Ordering of the work done in one step.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameplaySet {
    /// Clocks and timed state changes.
    Timers,
    /// Player and agent movement.
    Movement,
    /// Pickups and collisions against the new positions.
    Resolve,
    /// Phase changes; runs in every ticking phase.
    Stage,
}
