use std::time::Duration;

use bevy_ecs::{component::Component, resource::Resource};
use rand::{rngs::SmallRng, SeedableRng};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::constants::LOOP_TIME;
use crate::map::{direction::Direction, Cell};

/// A tag component for the entity driven by the host's direction requests.
#[derive(Default, Component, Debug, Clone, Copy)]
pub struct PlayerControlled;

/// Identity of a pursuit agent; assigned by spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum AgentKind {
    Crimson,
    Rose,
    Azure,
    Amber,
}

impl AgentKind {
    /// Kinds repeat in declaration order once every kind has been handed out.
    pub fn from_index(index: usize) -> Self {
        AgentKind::iter().cycle().nth(index).unwrap_or(AgentKind::Crimson)
    }

    /// Display color as RGB.
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            AgentKind::Crimson => (255, 0, 0),
            AgentKind::Rose => (255, 184, 255),
            AgentKind::Azure => (0, 255, 255),
            AgentKind::Amber => (255, 184, 82),
        }
    }
}

/// Per-agent data that does not change during a round.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub kind: AgentKind,
    /// Spawn order; drives release stagger and scatter corner.
    pub index: usize,
    pub home: Cell,
    pub corner: Cell,
    pub release_delay: Duration,
    pub released: bool,
}

/// Behavior state of a pursuit agent.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum AgentState {
    /// Wanders randomly; the state every agent starts and recovers in.
    Patrol,
    /// Heads for the player.
    Chase,
    /// Heads for its home corner.
    Scatter,
    /// Flees the player at reduced speed and can be captured.
    Vulnerable,
    /// Out of play since `since`; returns home once the respawn delay passes.
    Respawning { since: Duration },
}

impl AgentState {
    /// Whether this agent may collide with the player.
    pub fn is_active(&self) -> bool {
        !matches!(self, AgentState::Respawning { .. })
    }
}

/// Simulation time at which the agent entered its current patrol/chase/scatter phase.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeTimer {
    pub entered: Duration,
}

/// Simulation time, advanced by exactly one step per tick.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimClock {
    pub now: Duration,
    pub ticks: u64,
}

impl SimClock {
    pub fn advance(&mut self, step: Duration) {
        self.now += step;
        self.ticks += 1;
    }

    /// Time elapsed since `instant`, zero if `instant` lies in the future.
    pub fn since(&self, instant: Duration) -> Duration {
        self.now.saturating_sub(instant)
    }
}

/// Resource for tracking the length of the current step.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct DeltaTime {
    pub seconds: f32,
}

impl Default for DeltaTime {
    fn default() -> Self {
        Self {
            seconds: LOOP_TIME.as_secs_f32(),
        }
    }
}

/// Simulation time at which the current round (level start or post-recovery) began.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundClock {
    pub started: Duration,
}

/// The host's already-resolved input.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInput {
    /// Consumed by the player movement system on the next step.
    pub requested: Option<Direction>,
    pub boost: bool,
}

/// The single source of randomness for the simulation.
#[derive(Resource, Debug, Clone)]
pub struct GameRng(pub SmallRng);

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}
