//! Level data: the board layout plus the tunables that vary per level.

use std::time::Duration;

use bevy_ecs::resource::Resource;

use crate::constants::{RAW_BOARD, RAW_BOARD_ALT};

/// Per-level tunables.
///
/// Speeds are in cells per second.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LevelConfig {
    pub player_speed: f32,
    pub agent_speed: f32,
    /// How long agents chase before scattering.
    pub chase_interval: Duration,
    pub scatter_duration: Duration,
    /// How long a freshly released or recovered agent wanders before it starts chasing.
    pub patrol_duration: Duration,
    pub power_duration: Duration,
    /// Agent `i` is released `i * release_stagger` after the round starts.
    pub release_stagger: Duration,
    pub level_bonus: u32,
    /// Points deducted from the time bonus per elapsed second.
    pub time_bonus_rate: u32,
    pub time_bonus_cap: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            player_speed: 7.5,
            agent_speed: 6.5,
            chase_interval: Duration::from_secs(20),
            scatter_duration: Duration::from_secs(7),
            patrol_duration: Duration::from_secs(5),
            power_duration: Duration::from_secs(8),
            release_stagger: Duration::from_secs(3),
            level_bonus: 1000,
            time_bonus_rate: 10,
            time_bonus_cap: 2000,
        }
    }
}

impl LevelConfig {
    /// Bonus for clearing a level after `elapsed`, never negative and never above the cap.
    pub fn time_bonus(&self, elapsed: Duration) -> u32 {
        let penalty = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX).saturating_mul(self.time_bonus_rate);
        self.time_bonus_cap.saturating_sub(penalty)
    }
}

/// Everything needed to start a level.
#[derive(Debug, Clone)]
pub struct LevelDefinition {
    pub board: Vec<String>,
    pub config: LevelConfig,
}

/// Supplies level data by 1-based level number.
pub trait LevelSource {
    fn level(&self, number: u32) -> LevelDefinition;
}

impl<F> LevelSource for F
where
    F: Fn(u32) -> LevelDefinition,
{
    fn level(&self, number: u32) -> LevelDefinition {
        self(number)
    }
}

/// The two built-in boards, alternating, with difficulty rising each level.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLevels;

impl BuiltinLevels {
    pub fn config_for(number: u32) -> LevelConfig {
        let base = LevelConfig::default();
        let step = number.saturating_sub(1).min(8);

        LevelConfig {
            agent_speed: base.agent_speed + 0.1 * step as f32,
            power_duration: base.power_duration.saturating_sub(Duration::from_millis(750) * step),
            release_stagger: base.release_stagger.saturating_sub(Duration::from_millis(250) * step),
            level_bonus: base.level_bonus * number.max(1),
            ..base
        }
    }
}

impl LevelSource for BuiltinLevels {
    fn level(&self, number: u32) -> LevelDefinition {
        let raw: &[&str] = if number % 2 == 1 { &RAW_BOARD } else { &RAW_BOARD_ALT };
        LevelDefinition {
            board: raw.iter().map(|row| row.to_string()).collect(),
            config: Self::config_for(number),
        }
    }
}
