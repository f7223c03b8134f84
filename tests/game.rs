use std::time::Duration;

use maze_chase::error::{GameError, MapError};
use maze_chase::events::{GameCommand, GameEvent};
use maze_chase::game::Game;
use maze_chase::level::{LevelConfig, LevelDefinition};
use maze_chase::map::{direction::Direction, Cell};
use maze_chase::systems::{AgentKind, GamePhase};
use pretty_assertions::assert_eq;
use rand::{rngs::SmallRng, seq::IndexedRandom, Rng, SeedableRng};
use speculoos::prelude::*;

mod common;

/// One dot beside the spawn; the only agent is walled in.
const SINGLE_DOT_BOARD: [&str; 3] = [
    "#######", //
    "#X.#G##", //
    "#######",
];

/// The agent starts four cells away down a straight corridor.
const CORRIDOR_BOARD: [&str; 3] = [
    "#######", //
    "#X...G#", //
    "#######",
];

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Steps with scripted random input, calling `inspect` after every step.
fn drive(game: &mut Game, seed: u64, steps: usize, mut inspect: impl FnMut(&mut Game)) {
    let mut rng = SmallRng::seed_from_u64(seed);
    for _ in 0..steps {
        if rng.random_ratio(1, 20) {
            game.request_direction(Direction::DIRECTIONS.choose(&mut rng).copied());
        }
        game.step().expect("step should succeed");
        inspect(game);
    }
}

#[test]
fn test_start_requires_idle() {
    let mut game = Game::with_builtin_levels((), 1);
    assert_that(&game.phase()).is_equal_to(GamePhase::Idle);
    assert_that(&game.start().is_ok()).is_true();
    assert_that(&game.phase()).is_equal_to(GamePhase::Playing);
    assert!(matches!(game.start(), Err(GameError::InvalidState(_))));
}

#[test]
fn test_idle_game_does_not_step() {
    let mut game = Game::with_builtin_levels((), 1);
    game.frame(ms(0)).unwrap();
    assert_that(&game.frame(ms(1_000)).unwrap()).is_equal_to(0);
    game.step().unwrap();
    assert_that(&game.tick_count()).is_equal_to(0);
}

#[test]
fn test_long_gap_is_clamped() {
    let mut game = Game::with_builtin_levels((), 1);
    game.start().unwrap();

    assert_that(&game.frame(ms(5_000)).unwrap()).is_equal_to(0);
    let steps = game.frame(ms(5_250)).unwrap();
    assert_that(&steps).is_less_than_or_equal_to(6);
    assert_that(&steps).is_greater_than_or_equal_to(5);
}

#[test]
fn test_steady_callbacks_give_sixty_steps_per_second() {
    let mut game = Game::with_builtin_levels((), 1);
    game.start().unwrap();

    let mut total = game.frame(ms(0)).unwrap();
    for frame in 1..=100 {
        total += game.frame(ms(frame * 10)).unwrap();
    }
    assert_that(&total).is_equal_to(60);
    assert_that(&game.tick_count()).is_equal_to(60);
}

#[test]
fn test_pause_stops_time() {
    let (recorded, sink) = common::recording_sink();
    let mut game = Game::with_builtin_levels(sink, 1);
    game.start().unwrap();
    game.frame(ms(0)).unwrap();
    game.frame(ms(100)).unwrap();
    let before = game.tick_count();

    assert_that(&game.pause()).is_true();
    assert_that(&game.pause()).is_false();
    assert_that(&game.frame(ms(200)).unwrap()).is_equal_to(0);
    assert_that(&game.frame(ms(10_000)).unwrap()).is_equal_to(0);
    assert_that(&game.tick_count()).is_equal_to(before);

    game.handle_command(GameCommand::TogglePause).unwrap();
    assert_that(&game.phase()).is_equal_to(GamePhase::Playing);
    // The first callback after resuming only re-anchors the clock.
    assert_that(&game.frame(ms(10_050)).unwrap()).is_equal_to(0);
    assert_that(&game.frame(ms(10_100)).unwrap()).is_greater_than(0);

    let phases: Vec<(GamePhase, GamePhase)> = recorded
        .lock()
        .iter()
        .filter_map(|event| match event {
            GameEvent::PhaseChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (GamePhase::Idle, GamePhase::Playing),
            (GamePhase::Playing, GamePhase::Paused),
            (GamePhase::Paused, GamePhase::Playing),
        ]
    );
}

#[test]
fn test_player_stays_on_open_cells() {
    let mut game = Game::with_builtin_levels((), 3);
    game.start().unwrap();

    drive(&mut game, 11, 3_000, |game| {
        let Some(view) = game.player_view() else {
            return;
        };
        let agents = game.agent_views();
        let map = game.map().unwrap();
        assert_that(&map.is_wall(view.cell)).is_false();
        assert_that(&map.is_wall(view.target)).is_false();
        for agent in agents {
            assert_that(&map.is_wall(agent.cell)).is_false();
            assert_that(&map.is_wall(agent.target)).is_false();
        }
    });
}

#[test]
fn test_score_and_dots_are_monotonic() {
    let mut game = Game::with_builtin_levels((), 5);
    game.start().unwrap();
    let total = game.dot_overlay().unwrap().total();

    let mut last_score = 0;
    let mut last_remaining = total;
    drive(&mut game, 5, 3_000, |game| {
        let run = game.run_state();
        assert_that(&run.score).is_greater_than_or_equal_to(last_score);
        if run.level == 1 {
            assert_that(&run.dots_remaining).is_less_than_or_equal_to(last_remaining);
            assert_that(&(run.dots_remaining + game.dot_overlay().unwrap().collected())).is_equal_to(total);
            last_remaining = run.dots_remaining;
        }
        last_score = run.score;
    });
}

#[test]
fn test_equal_seeds_give_equal_runs() {
    let run = |seed: u64| {
        let (recorded, sink) = common::recording_sink();
        let mut game = Game::with_builtin_levels(sink, seed);
        game.start().unwrap();
        drive(&mut game, 99, 2_400, |_| {});
        let views = game.agent_views();
        let player = game.player_view();
        let state = game.run_state().clone();
        let events = recorded.lock().clone();
        (views, player, state, events)
    };

    let first = run(42);
    let second = run(42);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(first.2, second.2);
    assert_eq!(first.3, second.3);
}

#[test]
fn test_clearing_a_level_advances_to_the_next() {
    let (recorded, sink) = common::recording_sink();
    let mut game = Game::new(common::fixed_levels(&SINGLE_DOT_BOARD), sink, 1);
    game.start().unwrap();
    game.request_direction(Some(Direction::Right));

    for _ in 0..400 {
        game.step().unwrap();
        if game.run_state().level == 2 {
            break;
        }
    }

    let run = game.run_state();
    assert_that(&run.level).is_equal_to(2);
    assert_that(&run.phase).is_equal_to(GamePhase::Playing);
    assert_that(&run.dots_remaining).is_equal_to(1);
    // 10 for the dot, 1000 for the level and the full 2000 time bonus.
    assert_that(&run.score).is_equal_to(3_010);

    let summary = recorded.lock().iter().find_map(|event| match event {
        GameEvent::LevelCompleted(summary) => Some(*summary),
        _ => None,
    });
    assert_that(&summary.map(|s| (s.level, s.next_level))).is_equal_to(Some((1, 2)));
    assert_that(&game.player_view().map(|view| view.cell)).is_equal_to(Some(Cell::new(1, 1)));
}

#[test]
fn test_failed_level_load_ends_the_run() {
    let levels = |number: u32| LevelDefinition {
        board: if number == 1 {
            SINGLE_DOT_BOARD.iter().map(|row| row.to_string()).collect()
        } else {
            vec!["#?#".to_string()]
        },
        config: LevelConfig::default(),
    };
    let (recorded, sink) = common::recording_sink();
    let mut game = Game::new(levels, sink, 1);
    game.start().unwrap();
    game.request_direction(Some(Direction::Right));

    let mut failure = None;
    for _ in 0..400 {
        if let Err(err) = game.step() {
            failure = Some(err);
            break;
        }
    }

    assert!(matches!(failure, Some(GameError::MapParse(_))));
    assert_that(&game.phase()).is_equal_to(GamePhase::GameOver);
    assert_that(&recorded.lock().iter().any(|event| matches!(event, GameEvent::GameOver(_)))).is_true();
}

#[test]
fn test_level_without_collectibles_never_starts() {
    const BARE_BOARD: [&str; 3] = [
        "#######", //
        "#X   G#", //
        "#######",
    ];
    let (recorded, sink) = common::recording_sink();
    let mut game = Game::new(common::fixed_levels(&BARE_BOARD), sink, 1);

    let result = game.start();
    assert!(matches!(result, Err(GameError::Map(MapError::NoCollectibles))));
    assert_that(&game.phase()).is_equal_to(GamePhase::Idle);

    assert_that(&game.frame(ms(0)).unwrap()).is_equal_to(0);
    assert_that(&game.frame(ms(1_000)).unwrap()).is_equal_to(0);
    assert_that(&game.tick_count()).is_equal_to(0);
    assert_that(&recorded.lock().is_empty()).is_true();
}

#[test]
fn test_lives_run_out_and_the_run_ends() {
    let (recorded, sink) = common::recording_sink();
    let mut game = Game::new(common::fixed_levels(&CORRIDOR_BOARD), sink, 1);
    game.start().unwrap();
    game.request_direction(Some(Direction::Right));

    for _ in 0..2_000 {
        game.step().unwrap();
        if game.phase() == GamePhase::GameOver {
            break;
        }
    }
    assert_that(&game.phase()).is_equal_to(GamePhase::GameOver);
    assert_that(&game.run_state().lives).is_equal_to(0);

    let events = recorded.lock().clone();
    let lost: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            GameEvent::LifeLost { remaining } => Some(*remaining),
            _ => None,
        })
        .collect();
    assert_eq!(lost, vec![2, 1, 0]);

    let recovered = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                GameEvent::PhaseChanged {
                    from: GamePhase::Recovery { .. },
                    to: GamePhase::Playing
                }
            )
        })
        .count();
    assert_that(&recovered).is_equal_to(2);
    assert_that(&events.iter().filter(|event| matches!(event, GameEvent::GameOver(_))).count()).is_equal_to(1);

    // Terminal until reset.
    let ticks = game.tick_count();
    game.frame(ms(0)).unwrap();
    assert_that(&game.frame(ms(1_000)).unwrap()).is_equal_to(0);
    assert_that(&game.tick_count()).is_equal_to(ticks);
}

#[test]
fn test_reset_returns_to_idle() {
    let mut game = Game::with_builtin_levels((), 1);
    game.start().unwrap();
    drive(&mut game, 1, 120, |_| {});

    game.handle_command(GameCommand::Reset).unwrap();
    assert_that(&game.phase()).is_equal_to(GamePhase::Idle);
    assert_that(&game.tick_count()).is_equal_to(0);
    assert_that(&game.map().is_none()).is_true();
    assert_that(&game.player_view().is_none()).is_true();
    assert_that(&game.agent_views().is_empty()).is_true();

    game.handle_command(GameCommand::Start).unwrap();
    assert_that(&game.run_state().level).is_equal_to(1);
    assert_that(&game.dot_overlay().unwrap().remaining()).is_equal_to(game.dot_overlay().unwrap().total());
}

#[test]
fn test_views_follow_spawn_order() {
    let mut game = Game::with_builtin_levels((), 1);
    game.start().unwrap();
    let views = game.agent_views();
    let player = game.player_view().unwrap();
    let map = game.map().unwrap();

    assert_that(&views.len()).is_equal_to(4);
    for (index, (view, home)) in views.iter().zip(map.agent_spawns()).enumerate() {
        assert_that(&view.cell).is_equal_to(*home);
        assert_that(&view.kind).is_equal_to(AgentKind::from_index(index));
        assert_that(&view.released).is_false();
    }
    assert_that(&player.cell).is_equal_to(map.player_spawn());
    assert_that(&player.pixel).is_equal_to(map.cell_center(map.player_spawn()));
}
