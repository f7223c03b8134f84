use std::env;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use maze_chase::constants::LOOP_TIME;
use maze_chase::events::GameEvent;
use maze_chase::formatter::{self, SimFormatter};
use maze_chase::game::Game;
use maze_chase::map::direction::Direction;
use maze_chase::systems::GamePhase;
use rand::{rngs::SmallRng, seq::IndexedRandom, Rng, SeedableRng};
use thousands::Separable;
use tracing::{debug, info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line options for the headless runner.
struct Options {
    seed: u64,
    seconds: u64,
    /// Skip real-time pacing and run as fast as possible.
    fast: bool,
}

impl Options {
    fn parse() -> Result<Self> {
        let mut options = Options {
            seed: 0,
            seconds: 60,
            fast: false,
        };

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" | "-s" => {
                    let value = args.next().context("--seed needs a value")?;
                    options.seed = value.parse().with_context(|| format!("invalid seed: {value}"))?;
                }
                "--seconds" | "-t" => {
                    let value = args.next().context("--seconds needs a value")?;
                    options.seconds = value.parse().with_context(|| format!("invalid duration: {value}"))?;
                }
                "--fast" | "-f" => options.fast = true,
                other => bail!("unknown argument: {other}"),
            }
        }
        Ok(options)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().event_format(SimFormatter))
        .with(ErrorLayer::default())
        .init();
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::PowerModeProgress { .. } => {}
        GameEvent::ScoreChanged { score, delta } => {
            debug!(score = %score.separate_with_commas(), delta, "Score changed");
        }
        GameEvent::LevelCompleted(summary) => {
            info!(
                level = summary.level,
                bonus = %(summary.level_bonus + summary.time_bonus).separate_with_commas(),
                elapsed = ?summary.elapsed,
                "Level completed"
            );
        }
        GameEvent::GameOver(summary) => {
            info!(
                score = %summary.final_score.separate_with_commas(),
                level = summary.level,
                dots = summary.dots_collected,
                "Run finished"
            );
        }
        other => debug!(?other, "Game event"),
    }
}

/// Random steering, re-rolled every half second of simulation time.
struct Autopilot {
    rng: SmallRng,
    next_turn: u64,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed ^ 0x5eed),
            next_turn: 0,
        }
    }

    fn steer(&mut self, game: &mut Game) {
        let tick = game.tick_count();
        if tick < self.next_turn {
            return;
        }
        self.next_turn = tick + self.rng.random_range(15..45);
        let direction = Direction::DIRECTIONS.choose(&mut self.rng).copied();
        game.request_direction(direction);
    }
}

/// Runs the simulation headless, driving it with random input and logging every event.
pub fn main() -> Result<()> {
    init_logging();
    let options = Options::parse()?;

    let mut game = Game::with_builtin_levels(log_event, options.seed);
    let mut autopilot = Autopilot::new(options.seed);
    game.start().context("failed to start the first level")?;

    info!(
        seed = options.seed,
        seconds = options.seconds,
        fast = options.fast,
        "Starting headless run ({:.3}ms step)",
        LOOP_TIME.as_secs_f32() * 1000.0
    );

    let limit = Duration::from_secs(options.seconds);
    let started = Instant::now();
    let mut simulated = Duration::ZERO;

    game.frame(simulated)?;
    while simulated < limit {
        let frame_start = Instant::now();

        autopilot.steer(&mut game);
        simulated += LOOP_TIME;
        game.frame(simulated)?;
        formatter::set_tick(game.tick_count());

        if game.phase() == GamePhase::GameOver {
            break;
        }

        if !options.fast {
            let elapsed = frame_start.elapsed();
            if elapsed < LOOP_TIME {
                spin_sleep::sleep(LOOP_TIME - elapsed);
            } else {
                warn!(behind = ?(elapsed - LOOP_TIME), "Step loop behind schedule");
            }
        }
    }

    let run = game.run_state();
    info!(
        ticks = %game.tick_count().separate_with_commas(),
        score = %run.score.separate_with_commas(),
        level = run.level,
        lives = run.lives,
        wall = ?started.elapsed(),
        "Headless run ended"
    );
    Ok(())
}
