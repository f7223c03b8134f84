use bevy_ecs::{
    event::EventWriter,
    query::{With, Without},
    system::{Query, Res, ResMut},
};
use tracing::{info, trace};

use crate::constants::{
    mechanics::{CAPTURE_TIERS, COLLISION_FRACTION},
    CELL_SIZE,
};
use crate::events::{GameEvent, StageTransition};
use crate::map::{builder::Map, dots::DotOverlay};
use crate::systems::{wrapped_distance, Agent, AgentState, PlayerControlled, Position, PowerMode, RunState, SimClock};

/// Reward tier for the next capture, saturating at the last tier.
pub fn capture_tier(tags: u32) -> usize {
    (tags as usize).min(CAPTURE_TIERS.len() - 1)
}

/// Resolves contact between the player and every active agent.
///
/// Vulnerable agents are captured. A non-vulnerable agent touched while power mode is
/// still running is passed through harmlessly. Anything else costs the player a life,
/// and nothing further is checked that tick.
#[allow(clippy::too_many_arguments)]
pub fn collision_system(
    map: Res<Map>,
    clock: Res<SimClock>,
    overlay: Res<DotOverlay>,
    mut run: ResMut<RunState>,
    mut power: ResMut<PowerMode>,
    players: Query<&Position, With<PlayerControlled>>,
    mut agents: Query<(&Agent, &mut AgentState, &Position), Without<PlayerControlled>>,
    mut events: EventWriter<GameEvent>,
    mut transitions: EventWriter<StageTransition>,
) {
    // A cleared board ends the round before anyone can be caught.
    if overlay.is_exhausted() {
        return;
    }
    let Ok(player) = players.single() else {
        return;
    };

    let player_pixel = player.pixel_position(&map);
    let threshold = COLLISION_FRACTION * CELL_SIZE as f32;

    for (agent, mut state, position) in agents.iter_mut() {
        if !agent.released || !state.is_active() {
            continue;
        }
        if wrapped_distance(player_pixel, position.pixel_position(&map), map.pixel_size()) >= threshold {
            continue;
        }

        match *state {
            AgentState::Vulnerable => {
                let tier = capture_tier(power.tags);
                let points = CAPTURE_TIERS[tier];
                power.tags += 1;
                *state = AgentState::Respawning { since: clock.now };

                info!(agent = %agent.kind, tier, points, "Agent captured");
                events.write(GameEvent::AgentCaptured {
                    agent: agent.kind,
                    tier,
                    points,
                });
                run.award(points, &mut events);
            }
            _ if power.active => {
                trace!(agent = %agent.kind, state = ?*state, "Contact during power mode with a recovered agent; ignoring");
            }
            _ => {
                transitions.write(StageTransition::PlayerCaught { agent: agent.kind });
                return;
            }
        }
    }
}
