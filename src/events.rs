//! Notifications leaving the simulation, commands entering it, and the internal events
//! systems use to talk to each other within a tick.

use std::time::Duration;

use bevy_ecs::{entity::Entity, event::Event};

use crate::map::Cell;
use crate::systems::{AgentKind, GamePhase};

/// Commands a host may issue between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    Start,
    Pause,
    Resume,
    TogglePause,
    Reset,
}

/// Bonus breakdown for a cleared level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    pub level: u32,
    pub level_bonus: u32,
    pub time_bonus: u32,
    pub elapsed: Duration,
    pub next_level: u32,
}

/// Final figures for a finished run, suitable for external persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverSummary {
    pub final_score: u32,
    pub level: u32,
    pub dots_collected: u32,
    pub elapsed: Duration,
}

/// Everything the simulation reports to its collaborators.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScoreChanged { score: u32, delta: u32 },
    LivesChanged { lives: u8 },
    LifeLost { remaining: u8 },
    PowerModeEntered { duration: Duration },
    /// Fraction of the power mode still to run, in `[0, 1]`.
    PowerModeProgress { remaining_fraction: f32 },
    PowerModeExited,
    /// `tier` indexes the capture reward table; it saturates at the last tier.
    AgentCaptured { agent: AgentKind, tier: usize, points: u32 },
    LevelCompleted(LevelSummary),
    GameOver(GameOverSummary),
    PhaseChanged { from: GamePhase, to: GamePhase },
}

/// Receives [`GameEvent`]s synchronously, in the order they were raised.
///
/// Implementations must return promptly; they run inside the simulation step.
pub trait EventSink {
    fn notify(&mut self, event: &GameEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&GameEvent),
{
    fn notify(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Discards every event.
impl EventSink for () {
    fn notify(&mut self, _event: &GameEvent) {}
}

/// Raised when a player-controlled entity finishes a move into `cell`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellArrival {
    pub entity: Entity,
    pub cell: Cell,
}

/// Round-ending outcomes, resolved by the stage system at the end of the tick.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTransition {
    PlayerCaught { agent: AgentKind },
    LevelCleared,
}
