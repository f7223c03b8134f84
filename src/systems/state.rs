use std::time::Duration;

use bevy_ecs::{
    event::{EventReader, EventWriter},
    query::{With, Without},
    resource::Resource,
    system::{Query, Res, ResMut},
};
use strum_macros::IntoStaticStr;
use tracing::{debug, info};

use crate::constants::{
    mechanics::{EXTRA_LIFE_SCORE, MAX_LIVES, STARTING_LIVES},
    timing::{LEVEL_COMPLETE_PAUSE, RECOVERY_DELAY},
};
use crate::events::{GameEvent, GameOverSummary, LevelSummary, StageTransition};
use crate::level::LevelConfig;
use crate::map::builder::Map;
use crate::systems::{
    Agent, AgentState, BufferedDirection, DeltaTime, ModeTimer, PlayerControlled, Position, PowerMode, RoundClock, SimClock,
    Velocity,
};

/// Top-level phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum GamePhase {
    /// No run in progress.
    Idle,
    Playing,
    /// Nothing advances until resumed.
    Paused,
    /// Non-interactive pause after a life was lost, entered at `since`.
    Recovery { since: Duration },
    /// Pause after clearing a level, entered at `since`.
    LevelComplete { since: Duration },
    /// Terminal until reset.
    GameOver,
}

impl GamePhase {
    /// Whether simulation steps are taken in this phase.
    pub fn is_ticking(&self) -> bool {
        matches!(
            self,
            GamePhase::Playing | GamePhase::Recovery { .. } | GamePhase::LevelComplete { .. }
        )
    }
}

/// Everything about the current run that outlives a single level's entities.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub phase: GamePhase,
    /// 1-based; zero before the first level loads.
    pub level: u32,
    pub score: u32,
    pub lives: u8,
    /// Collectibles picked up across the whole run.
    pub dots_collected: u32,
    /// Collectibles left on the current board.
    pub dots_remaining: u32,
    /// Time spent in [`GamePhase::Playing`] on the current level.
    pub level_elapsed: Duration,
    /// Time spent in [`GamePhase::Playing`] across the run.
    pub total_elapsed: Duration,
    /// The phase to return to on resume.
    pub paused_from: Option<GamePhase>,
    /// Set once a level-complete pause runs out; the loop loads this level next.
    pub pending_level: Option<u32>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            level: 0,
            score: 0,
            lives: STARTING_LIVES,
            dots_collected: 0,
            dots_remaining: 0,
            level_elapsed: Duration::ZERO,
            total_elapsed: Duration::ZERO,
            paused_from: None,
            pending_level: None,
        }
    }
}

impl RunState {
    /// Moves to `to`, returning the notification describing the change.
    pub fn set_phase(&mut self, to: GamePhase) -> GameEvent {
        let from = self.phase;
        self.phase = to;
        debug!(?from, ?to, "Phase transition");
        GameEvent::PhaseChanged { from, to }
    }

    /// Adds `points` to the score, awarding an extra life for each threshold crossed.
    pub fn award(&mut self, points: u32, events: &mut EventWriter<GameEvent>) {
        if points == 0 {
            return;
        }
        let before = self.score;
        self.score = self.score.saturating_add(points);
        events.write(GameEvent::ScoreChanged {
            score: self.score,
            delta: points,
        });

        let thresholds = self.score / EXTRA_LIFE_SCORE - before / EXTRA_LIFE_SCORE;
        if thresholds > 0 && self.lives < MAX_LIVES {
            self.lives = (u32::from(self.lives) + thresholds).min(u32::from(MAX_LIVES)) as u8;
            info!(lives = self.lives, score = self.score, "Extra life awarded");
            events.write(GameEvent::LivesChanged { lives: self.lives });
        }
    }

    pub fn game_over_summary(&self) -> GameOverSummary {
        GameOverSummary {
            final_score: self.score,
            level: self.level,
            dots_collected: self.dots_collected,
            elapsed: self.total_elapsed,
        }
    }
}

/// Accumulates playing time for the level-clear time bonus.
pub fn elapsed_time_system(delta: Res<DeltaTime>, mut run: ResMut<RunState>) {
    let step = Duration::from_secs_f32(delta.seconds);
    run.level_elapsed += step;
    run.total_elapsed += step;
}

/// Resolves round-ending outcomes raised during the tick and runs the timed phases.
#[allow(clippy::too_many_arguments)]
pub fn stage_system(
    map: Res<Map>,
    config: Res<LevelConfig>,
    clock: Res<SimClock>,
    mut run: ResMut<RunState>,
    mut power: ResMut<PowerMode>,
    mut round: ResMut<RoundClock>,
    mut transitions: EventReader<StageTransition>,
    mut players: Query<(&mut Position, &mut Velocity, &mut BufferedDirection), With<PlayerControlled>>,
    mut agents: Query<(&mut Agent, &mut AgentState, &mut ModeTimer, &mut Position, &mut Velocity), Without<PlayerControlled>>,
    mut events: EventWriter<GameEvent>,
) {
    let phase = run.phase;
    match phase {
        GamePhase::Recovery { since } if clock.since(since) >= RECOVERY_DELAY => {
            round.started = clock.now;
            for (_, _, mut timer, _, _) in agents.iter_mut() {
                timer.entered = clock.now;
            }
            events.write(run.set_phase(GamePhase::Playing));
        }
        GamePhase::LevelComplete { since } if run.pending_level.is_none() && clock.since(since) >= LEVEL_COMPLETE_PAUSE => {
            run.pending_level = Some(run.level + 1);
        }
        _ => {}
    }

    for transition in transitions.read() {
        // The first outcome of a tick wins; anything after it is stale.
        if run.phase != GamePhase::Playing {
            continue;
        }

        if power.active {
            power.end();
            events.write(GameEvent::PowerModeExited);
        }

        match *transition {
            StageTransition::PlayerCaught { agent } => {
                run.lives = run.lives.saturating_sub(1);
                info!(?agent, lives = run.lives, "Player caught");
                events.write(GameEvent::LifeLost { remaining: run.lives });
                events.write(GameEvent::LivesChanged { lives: run.lives });

                if run.lives == 0 {
                    events.write(run.set_phase(GamePhase::GameOver));
                    let summary = run.game_over_summary();
                    info!(score = summary.final_score, level = summary.level, "Game over");
                    events.write(GameEvent::GameOver(summary));
                    continue;
                }

                for (mut position, mut velocity, mut buffered) in players.iter_mut() {
                    *position = Position::Stopped {
                        cell: map.player_spawn(),
                    };
                    velocity.direction = None;
                    *buffered = BufferedDirection::None;
                }
                for (mut agent, mut state, mut timer, mut position, mut velocity) in agents.iter_mut() {
                    agent.released = false;
                    *state = AgentState::Patrol;
                    timer.entered = clock.now;
                    *position = Position::Stopped { cell: agent.home };
                    velocity.direction = None;
                }
                events.write(run.set_phase(GamePhase::Recovery { since: clock.now }));
            }
            StageTransition::LevelCleared => {
                let summary = LevelSummary {
                    level: run.level,
                    level_bonus: config.level_bonus,
                    time_bonus: config.time_bonus(run.level_elapsed),
                    elapsed: run.level_elapsed,
                    next_level: run.level + 1,
                };
                info!(
                    level = summary.level,
                    level_bonus = summary.level_bonus,
                    time_bonus = summary.time_bonus,
                    "Level cleared"
                );
                run.award(summary.level_bonus + summary.time_bonus, &mut events);
                events.write(GameEvent::LevelCompleted(summary));
                events.write(run.set_phase(GamePhase::LevelComplete { since: clock.now }));
            }
        }
    }
}

/// Run condition for the gameplay sets.
pub fn is_playing(run: Res<RunState>) -> bool {
    run.phase == GamePhase::Playing
}
