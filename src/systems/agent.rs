use bevy_ecs::{
    query::{With, Without},
    system::{Query, Res, ResMut},
};
use rand::seq::IndexedRandom;
use tracing::{debug, trace, warn};

use crate::constants::{
    mechanics::{SEARCH_BUDGET, VULNERABLE_SPEED_FACTOR},
    timing::RESPAWN_DELAY,
};
use crate::level::LevelConfig;
use crate::map::builder::Map;
use crate::systems::{
    flee_direction, legal_directions, steer_toward, Agent, AgentState, DeltaTime, GameRng, ModeTimer, PlayerControlled,
    Position, RoundClock, SimClock, Velocity,
};

/// Lets agents into play one at a time after the round starts.
pub fn agent_release_system(
    clock: Res<SimClock>,
    round: Res<RoundClock>,
    mut agents: Query<(&mut Agent, &mut ModeTimer)>,
) {
    let elapsed = clock.since(round.started);
    for (mut agent, mut timer) in agents.iter_mut() {
        if !agent.released && elapsed >= agent.release_delay {
            agent.released = true;
            timer.entered = clock.now;
            debug!(agent = %agent.kind, after = ?elapsed, "Agent released");
        }
    }
}

/// Advances the timed agent states: patrol into chase, the chase/scatter cycle, and respawning.
///
/// Vulnerable agents are left alone; power mode expiry returns them to patrol.
pub fn agent_mode_system(
    clock: Res<SimClock>,
    config: Res<LevelConfig>,
    mut agents: Query<(&Agent, &mut AgentState, &mut ModeTimer, &mut Position, &mut Velocity)>,
) {
    for (agent, mut state, mut timer, mut position, mut velocity) in agents.iter_mut() {
        if !agent.released {
            continue;
        }

        let in_state = clock.since(timer.entered);
        let next = match *state {
            AgentState::Patrol if in_state >= config.patrol_duration => AgentState::Chase,
            AgentState::Chase if in_state >= config.chase_interval => AgentState::Scatter,
            AgentState::Scatter if in_state >= config.scatter_duration => AgentState::Chase,
            AgentState::Respawning { since } if clock.since(since) >= RESPAWN_DELAY => {
                *position = Position::Stopped { cell: agent.home };
                velocity.direction = None;
                AgentState::Patrol
            }
            _ => continue,
        };

        debug!(agent = %agent.kind, from = ?*state, to = ?next, "Agent state transition");
        *state = next;
        timer.entered = clock.now;
    }
}

/// Moves every released agent, choosing a direction whenever it comes to rest.
pub fn agent_movement_system(
    map: Res<Map>,
    delta_time: Res<DeltaTime>,
    mut rng: ResMut<GameRng>,
    players: Query<&Position, With<PlayerControlled>>,
    mut agents: Query<(&Agent, &AgentState, &mut Position, &mut Velocity), Without<PlayerControlled>>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let player_cell = player.current_cell();

    for (agent, state, mut position, mut velocity) in agents.iter_mut() {
        if !agent.released || !state.is_active() {
            continue;
        }

        let factor = if *state == AgentState::Vulnerable {
            VULNERABLE_SPEED_FACTOR
        } else {
            1.0
        };
        let mut distance = velocity.speed * factor * delta_time.seconds;

        loop {
            match *position {
                Position::Stopped { cell } => {
                    let legal = legal_directions(&map, cell, velocity.direction);
                    let choice = match *state {
                        AgentState::Patrol => legal.choose(&mut rng.0).copied(),
                        AgentState::Chase => steer_toward(&map, cell, player_cell, &legal, SEARCH_BUDGET),
                        AgentState::Scatter => steer_toward(&map, cell, agent.corner, &legal, SEARCH_BUDGET),
                        AgentState::Vulnerable => flee_direction(&map, cell, player_cell, &legal),
                        AgentState::Respawning { .. } => None,
                    };

                    let Some(direction) = choice else {
                        warn!(agent = %agent.kind, %cell, "Agent has no legal move; holding position");
                        break;
                    };
                    trace!(agent = %agent.kind, %cell, ?direction, state = ?*state, "Agent chose direction");
                    velocity.direction = Some(direction);
                    *position = Position::depart(&map, cell, direction);
                }
                Position::Moving { .. } => match position.tick(distance) {
                    Some(overflow) => distance = overflow,
                    None => break,
                },
            }
        }
    }
}
