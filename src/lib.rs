//! Maze-chase simulation library crate.
//!
//! A deterministic, fixed-timestep simulation of a player collecting dots in a maze
//! while pursuit agents hunt them. Rendering, audio and input capture live outside
//! this crate; the [`game::Game`] type exposes the host-facing API.

pub mod constants;
pub mod error;
pub mod events;
pub mod formatter;
pub mod game;
pub mod level;
pub mod map;
pub mod systems;
pub mod timing;
