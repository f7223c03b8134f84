use bevy_ecs::{
    event::{EventReader, EventWriter},
    query::{With, Without},
    system::{Query, Res, ResMut},
};
use tracing::{debug, trace};

use crate::constants::{
    mechanics::{DOT_SCORE, POWER_PELLET_SCORE},
    MapTile,
};
use crate::events::{CellArrival, GameEvent, StageTransition};
use crate::level::LevelConfig;
use crate::map::dots::DotOverlay;
use crate::systems::{
    make_vulnerable, Agent, AgentState, PlayerControlled, Position, PowerMode, RunState, SimClock, Velocity,
};

/// Picks up whatever collectible the player just arrived on.
#[allow(clippy::too_many_arguments)]
pub fn item_system(
    clock: Res<SimClock>,
    config: Res<LevelConfig>,
    mut arrivals: EventReader<CellArrival>,
    mut overlay: ResMut<DotOverlay>,
    mut run: ResMut<RunState>,
    mut power: ResMut<PowerMode>,
    mut agents: Query<(&mut AgentState, &mut Position, &mut Velocity), (With<Agent>, Without<PlayerControlled>)>,
    mut events: EventWriter<GameEvent>,
    mut transitions: EventWriter<StageTransition>,
) {
    for arrival in arrivals.read() {
        let Some(tile) = overlay.consume(arrival.cell) else {
            continue;
        };

        run.dots_collected += 1;
        run.dots_remaining = overlay.remaining();

        match tile {
            MapTile::Dot => {
                trace!(cell = %arrival.cell, remaining = overlay.remaining(), "Dot collected");
                run.award(DOT_SCORE, &mut events);
            }
            MapTile::PowerPellet => {
                run.award(POWER_PELLET_SCORE, &mut events);

                power.activate(clock.now, config.power_duration);
                let mut affected = 0;
                for (mut state, mut position, mut velocity) in agents.iter_mut() {
                    if make_vulnerable(&mut state, &mut position, &mut velocity) {
                        affected += 1;
                    }
                }
                debug!(cell = %arrival.cell, affected, duration = ?config.power_duration, "Power mode activated");
                events.write(GameEvent::PowerModeEntered {
                    duration: config.power_duration,
                });
            }
            MapTile::Empty | MapTile::Wall => {}
        }

        if overlay.is_exhausted() {
            transitions.write(StageTransition::LevelCleared);
            break;
        }
    }
}
