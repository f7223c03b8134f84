#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bevy_ecs::{entity::Entity, event::Events, world::World};
use maze_chase::{
    events::{CellArrival, GameEvent, StageTransition},
    level::{LevelConfig, LevelDefinition},
    map::{builder::Map, dots::DotOverlay, Cell},
    systems::{
        Agent, AgentKind, AgentState, BufferedDirection, DeltaTime, GamePhase, GameRng, ModeTimer, PlayerControlled,
        PlayerInput, Position, PowerMode, RoundClock, RunState, SimClock, Velocity,
    },
};
use parking_lot::Mutex;

/// A small loop with one power pellet at (1, 3) and ten collectibles in total.
pub const TEST_BOARD: [&str; 5] = [
    "#######", //
    "#X.o..#", //
    "#.###.#", //
    "#..G..#", //
    "#######",
];

/// A single corridor whose ends wrap into each other.
pub const TUNNEL_BOARD: [&str; 3] = [
    "#####", //
    "X.G..", //
    "#####",
];

/// Entity speed used by the spawn helpers; with [`TEST_DELTA`] every step moves exactly one cell.
pub const TEST_SPEED: f32 = 4.0;
pub const TEST_DELTA: f32 = 0.25;

pub fn create_test_world() -> World {
    create_world_with_board(&TEST_BOARD)
}

pub fn create_world_with_board(board: &[&str]) -> World {
    let mut world = World::new();

    world.insert_resource(Events::<GameEvent>::default());
    world.insert_resource(Events::<CellArrival>::default());
    world.insert_resource(Events::<StageTransition>::default());

    let map = Map::new(board).expect("Failed to create test map");
    world.insert_resource(DotOverlay::from_map(&map));
    world.insert_resource(map);
    world.insert_resource(LevelConfig::default());
    world.insert_resource(RunState {
        phase: GamePhase::Playing,
        level: 1,
        ..Default::default()
    });
    world.insert_resource(SimClock::default());
    world.insert_resource(DeltaTime { seconds: TEST_DELTA });
    world.insert_resource(RoundClock::default());
    world.insert_resource(PlayerInput::default());
    world.insert_resource(PowerMode::default());
    world.insert_resource(GameRng::seeded(7));

    world
}

/// Spawns a stationary player with no heading.
pub fn spawn_test_player(world: &mut World, cell: Cell) -> Entity {
    world
        .spawn((
            PlayerControlled,
            Position::Stopped { cell },
            Velocity {
                speed: TEST_SPEED,
                direction: None,
            },
            BufferedDirection::None,
        ))
        .id()
}

/// Spawns an already released agent whose home and corner are `cell`.
pub fn spawn_test_agent(world: &mut World, index: usize, cell: Cell, state: AgentState) -> Entity {
    world
        .spawn((
            Agent {
                kind: AgentKind::from_index(index),
                index,
                home: cell,
                corner: cell,
                release_delay: Duration::ZERO,
                released: true,
            },
            state,
            ModeTimer::default(),
            Position::Stopped { cell },
            Velocity {
                speed: TEST_SPEED,
                direction: None,
            },
        ))
        .id()
}

pub fn send_arrival(world: &mut World, entity: Entity, cell: Cell) {
    world.resource_mut::<Events<CellArrival>>().send(CellArrival { entity, cell });
}

pub fn drain_game_events(world: &mut World) -> Vec<GameEvent> {
    world.resource_mut::<Events<GameEvent>>().drain().collect()
}

pub fn drain_transitions(world: &mut World) -> Vec<StageTransition> {
    world.resource_mut::<Events<StageTransition>>().drain().collect()
}

pub fn set_clock(world: &mut World, now: Duration) {
    world.resource_mut::<SimClock>().now = now;
}

pub type Recorded = Arc<Mutex<Vec<GameEvent>>>;

/// A sink that keeps every notification for later inspection.
pub fn recording_sink() -> (Recorded, impl FnMut(&GameEvent) + 'static) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let recorded = recorded.clone();
        move |event: &GameEvent| recorded.lock().push(event.clone())
    };
    (recorded, sink)
}

/// A level source that serves `board` with default tuning for every level.
pub fn fixed_levels(board: &'static [&'static str]) -> impl Fn(u32) -> LevelDefinition + 'static {
    move |_number: u32| LevelDefinition {
        board: board.iter().map(|row| row.to_string()).collect(),
        config: LevelConfig::default(),
    }
}
