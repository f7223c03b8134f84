//! This module contains the main game loop and the host-facing API.

use std::time::Duration;

use bevy_ecs::{
    entity::Entity,
    event::{EventRegistry, Events},
    query::{Or, With},
    schedule::{ExecutorKind, IntoScheduleConfigs, Schedule},
    world::World,
};
use glam::Vec2;
use tracing::{error, info};

use crate::error::{GameError, GameResult};
use crate::events::{CellArrival, EventSink, GameCommand, GameEvent, StageTransition};
use crate::level::{BuiltinLevels, LevelConfig, LevelSource};
use crate::map::{builder::Map, direction::Direction, dots::DotOverlay, Cell};
use crate::systems::{
    agent_mode_system, agent_movement_system, agent_release_system, collision_system, elapsed_time_system, is_playing,
    item_system, player_movement_system, power_mode_system, stage_system, Agent, AgentBundle, AgentKind, AgentState,
    DeltaTime, GamePhase, GameRng, GameplaySet, PlayerBundle, PlayerControlled, PlayerInput, Position, PowerMode,
    RoundClock, RunState, SimClock, Velocity,
};
use crate::timing::FixedTimestep;

/// Read-only snapshot of the player for renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub cell: Cell,
    pub target: Cell,
    pub progress: f32,
    pub direction: Option<Direction>,
    pub pixel: Vec2,
}

/// Read-only snapshot of one agent for renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub kind: AgentKind,
    pub state: AgentState,
    pub released: bool,
    pub cell: Cell,
    pub target: Cell,
    pub direction: Option<Direction>,
    pub pixel: Vec2,
}

/// The simulation: an ECS world, the schedule that steps it, and the fixed-timestep
/// accumulator that decides how many steps each host callback runs.
pub struct Game {
    pub world: World,
    schedule: Schedule,
    timestep: FixedTimestep,
    levels: Box<dyn LevelSource>,
    sink: Box<dyn EventSink>,
    seed: u64,
}

impl Game {
    /// Creates an idle game. Nothing is loaded until [`start`](Self::start).
    ///
    /// `seed` fixes every random choice, so equal seeds and inputs give equal runs.
    pub fn new(levels: impl LevelSource + 'static, sink: impl EventSink + 'static, seed: u64) -> Game {
        let mut world = World::default();
        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);

        Self::setup_ecs(&mut world);
        Self::insert_resources(&mut world, seed);
        Self::configure_schedule(&mut schedule);

        Game {
            world,
            schedule,
            timestep: FixedTimestep::default(),
            levels: Box::new(levels),
            sink: Box::new(sink),
            seed,
        }
    }

    pub fn with_builtin_levels(sink: impl EventSink + 'static, seed: u64) -> Game {
        Self::new(BuiltinLevels, sink, seed)
    }

    fn setup_ecs(world: &mut World) {
        EventRegistry::register_event::<GameEvent>(world);
        EventRegistry::register_event::<CellArrival>(world);
        EventRegistry::register_event::<StageTransition>(world);
    }

    fn insert_resources(world: &mut World, seed: u64) {
        world.insert_resource(RunState::default());
        world.insert_resource(SimClock::default());
        world.insert_resource(DeltaTime::default());
        world.insert_resource(RoundClock::default());
        world.insert_resource(PlayerInput::default());
        world.insert_resource(PowerMode::default());
        world.insert_resource(GameRng::seeded(seed));
    }

    fn configure_schedule(schedule: &mut Schedule) {
        schedule
            .add_systems((
                (elapsed_time_system, agent_release_system, power_mode_system, agent_mode_system)
                    .chain()
                    .in_set(GameplaySet::Timers),
                (player_movement_system, agent_movement_system)
                    .chain()
                    .in_set(GameplaySet::Movement),
                (item_system, collision_system).chain().in_set(GameplaySet::Resolve),
                stage_system.in_set(GameplaySet::Stage),
            ))
            .configure_sets((
                GameplaySet::Timers.run_if(is_playing),
                GameplaySet::Movement.after(GameplaySet::Timers).run_if(is_playing),
                GameplaySet::Resolve.after(GameplaySet::Movement).run_if(is_playing),
                GameplaySet::Stage.after(GameplaySet::Resolve),
            ));
    }

    /// Loads level 1 and begins play.
    ///
    /// # Errors
    ///
    /// Fails if the game is not idle, or if the level data is invalid; the game then stays idle.
    pub fn start(&mut self) -> GameResult<()> {
        let phase = self.phase();
        if phase != GamePhase::Idle {
            return Err(GameError::InvalidState(format!("cannot start while {phase:?}")));
        }
        self.load_level(1)
    }

    /// Host render callback. Runs every fixed step that `timestamp` makes due and
    /// returns how many were run.
    ///
    /// `timestamp` must come from a monotonic clock; only differences between calls matter.
    pub fn frame(&mut self, timestamp: Duration) -> GameResult<u32> {
        if !self.phase().is_ticking() {
            self.timestep.reset();
            return Ok(0);
        }

        let due = self.timestep.advance(timestamp);
        let mut taken = 0;
        for _ in 0..due {
            if !self.phase().is_ticking() {
                break;
            }
            self.step()?;
            taken += 1;
        }
        Ok(taken)
    }

    /// Advances the simulation by exactly one fixed step, ignoring wall-clock time.
    ///
    /// Does nothing while idle, paused, or after game over.
    pub fn step(&mut self) -> GameResult<()> {
        if !self.phase().is_ticking() {
            return Ok(());
        }

        let step = self.timestep.step();
        self.world.resource_mut::<SimClock>().advance(step);
        self.schedule.run(&mut self.world);
        self.flush_events();

        let pending = self.world.resource_mut::<RunState>().pending_level.take();
        if let Some(next) = pending {
            if let Err(err) = self.load_level(next) {
                error!(level = next, error = %err, "Next level could not be loaded; ending the run");
                self.set_phase(GamePhase::GameOver);
                let summary = self.run_state().game_over_summary();
                self.sink.notify(&GameEvent::GameOver(summary));
                return Err(err);
            }
        }
        Ok(())
    }

    /// Stops stepping. Returns whether the game was running.
    pub fn pause(&mut self) -> bool {
        let phase = self.phase();
        if !phase.is_ticking() {
            return false;
        }
        self.world.resource_mut::<RunState>().paused_from = Some(phase);
        self.set_phase(GamePhase::Paused);
        self.timestep.reset();
        true
    }

    /// Continues from where [`pause`](Self::pause) left off. Returns whether the game was paused.
    pub fn resume(&mut self) -> bool {
        if self.phase() != GamePhase::Paused {
            return false;
        }
        let resume_to = self
            .world
            .resource_mut::<RunState>()
            .paused_from
            .take()
            .unwrap_or(GamePhase::Playing);
        self.set_phase(resume_to);
        self.timestep.reset();
        true
    }

    /// Discards the run and every entity, returning to idle.
    pub fn reset(&mut self) {
        let from = self.phase();
        self.despawn_entities();
        Self::insert_resources(&mut self.world, self.seed);
        self.world.remove_resource::<Map>();
        self.world.remove_resource::<DotOverlay>();
        self.world.remove_resource::<LevelConfig>();
        self.world.resource_mut::<Events<GameEvent>>().clear();
        self.world.resource_mut::<Events<CellArrival>>().clear();
        self.world.resource_mut::<Events<StageTransition>>().clear();
        self.timestep.reset();

        info!(?from, "Game reset");
        if from != GamePhase::Idle {
            self.sink.notify(&GameEvent::PhaseChanged {
                from,
                to: GamePhase::Idle,
            });
        }
    }

    pub fn handle_command(&mut self, command: GameCommand) -> GameResult<()> {
        match command {
            GameCommand::Start => self.start()?,
            GameCommand::Pause => {
                self.pause();
            }
            GameCommand::Resume => {
                self.resume();
            }
            GameCommand::TogglePause => {
                if !self.resume() {
                    self.pause();
                }
            }
            GameCommand::Reset => self.reset(),
        }
        Ok(())
    }

    /// Sets the pending direction request; `None` withdraws it.
    pub fn request_direction(&mut self, direction: Option<Direction>) {
        self.world.resource_mut::<PlayerInput>().requested = direction;
    }

    pub fn set_boost(&mut self, boost: bool) {
        self.world.resource_mut::<PlayerInput>().boost = boost;
    }

    pub fn run_state(&self) -> &RunState {
        self.world.resource::<RunState>()
    }

    pub fn phase(&self) -> GamePhase {
        self.run_state().phase
    }

    pub fn power_mode(&self) -> &PowerMode {
        self.world.resource::<PowerMode>()
    }

    /// The current maze, once a level has been loaded.
    pub fn map(&self) -> Option<&Map> {
        self.world.get_resource::<Map>()
    }

    pub fn dot_overlay(&self) -> Option<&DotOverlay> {
        self.world.get_resource::<DotOverlay>()
    }

    /// Simulation steps taken since the last reset.
    pub fn tick_count(&self) -> u64 {
        self.world.resource::<SimClock>().ticks
    }

    pub fn player_view(&mut self) -> Option<PlayerView> {
        let mut query = self
            .world
            .query_filtered::<(&Position, &Velocity), With<PlayerControlled>>();
        let map = self.world.get_resource::<Map>()?;
        let (position, velocity) = query.single(&self.world).ok()?;

        Some(PlayerView {
            cell: position.current_cell(),
            target: position.target_cell(),
            progress: position.progress(),
            direction: velocity.direction,
            pixel: position.pixel_position(map),
        })
    }

    /// Agents in spawn order.
    pub fn agent_views(&mut self) -> Vec<AgentView> {
        let mut query = self.world.query::<(&Agent, &AgentState, &Position, &Velocity)>();
        let Some(map) = self.world.get_resource::<Map>() else {
            return Vec::new();
        };

        let mut agents: Vec<(usize, AgentView)> = query
            .iter(&self.world)
            .map(|(agent, state, position, velocity)| {
                (
                    agent.index,
                    AgentView {
                        kind: agent.kind,
                        state: *state,
                        released: agent.released,
                        cell: position.current_cell(),
                        target: position.target_cell(),
                        direction: velocity.direction,
                        pixel: position.pixel_position(map),
                    },
                )
            })
            .collect();
        agents.sort_by_key(|(index, _)| *index);
        agents.into_iter().map(|(_, view)| view).collect()
    }

    fn load_level(&mut self, number: u32) -> GameResult<()> {
        let definition = self.levels.level(number);
        let map = Map::new(&definition.board)?;
        let overlay = DotOverlay::from_map(&map);

        self.despawn_entities();
        self.world.spawn(PlayerBundle::new(&map, &definition.config));
        for bundle in AgentBundle::for_map(&map, &definition.config) {
            self.world.spawn(bundle);
        }

        let now = self.world.resource::<SimClock>().now;
        {
            let mut run = self.world.resource_mut::<RunState>();
            run.level = number;
            run.level_elapsed = Duration::ZERO;
            run.dots_remaining = overlay.remaining();
            run.pending_level = None;
        }
        self.world.resource_mut::<PlayerInput>().requested = None;

        info!(
            level = number,
            dots = overlay.remaining(),
            agents = map.agent_spawns().len(),
            "Level loaded"
        );

        self.world.insert_resource(RoundClock { started: now });
        self.world.insert_resource(PowerMode::default());
        self.world.insert_resource(definition.config);
        self.world.insert_resource(overlay);
        self.world.insert_resource(map);

        self.set_phase(GamePhase::Playing);
        Ok(())
    }

    fn despawn_entities(&mut self) {
        let entities: Vec<Entity> = self
            .world
            .query_filtered::<Entity, Or<(With<PlayerControlled>, With<Agent>)>>()
            .iter(&self.world)
            .collect();
        for entity in entities {
            self.world.despawn(entity);
        }
    }

    fn set_phase(&mut self, to: GamePhase) {
        let event = self.world.resource_mut::<RunState>().set_phase(to);
        self.sink.notify(&event);
    }

    /// Hands this step's notifications to the sink and retires internal events.
    fn flush_events(&mut self) {
        let events: Vec<GameEvent> = self.world.resource_mut::<Events<GameEvent>>().drain().collect();
        for event in &events {
            self.sink.notify(event);
        }
        self.world.resource_mut::<Events<CellArrival>>().update();
        self.world.resource_mut::<Events<StageTransition>>().update();
    }
}
