use bevy_ecs::bundle::Bundle;

use crate::level::LevelConfig;
use crate::map::builder::Map;
use crate::systems::{Agent, AgentKind, AgentState, BufferedDirection, ModeTimer, PlayerControlled, Position, Velocity};

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: PlayerControlled,
    pub position: Position,
    pub velocity: Velocity,
    pub buffered_direction: BufferedDirection,
}

impl PlayerBundle {
    pub fn new(map: &Map, config: &LevelConfig) -> Self {
        Self {
            player: PlayerControlled,
            position: Position::Stopped {
                cell: map.player_spawn(),
            },
            velocity: Velocity {
                speed: config.player_speed,
                direction: None,
            },
            buffered_direction: BufferedDirection::None,
        }
    }
}

#[derive(Bundle)]
pub struct AgentBundle {
    pub agent: Agent,
    pub state: AgentState,
    pub timer: ModeTimer,
    pub position: Position,
    pub velocity: Velocity,
}

impl AgentBundle {
    /// One bundle per agent spawn, in spawn order.
    pub fn for_map(map: &Map, config: &LevelConfig) -> Vec<Self> {
        map.agent_spawns()
            .iter()
            .enumerate()
            .map(|(index, &home)| {
                let kind = AgentKind::from_index(index);
                AgentBundle {
                    agent: Agent {
                        kind,
                        index,
                        home,
                        corner: map.corner(index),
                        release_delay: config.release_stagger * index as u32,
                        released: false,
                    },
                    state: AgentState::Patrol,
                    timer: ModeTimer::default(),
                    position: Position::Stopped { cell: home },
                    velocity: Velocity {
                        speed: config.agent_speed,
                        direction: None,
                    },
                }
            })
            .collect()
    }
}
