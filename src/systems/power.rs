use std::time::Duration;

use bevy_ecs::{
    event::EventWriter,
    resource::Resource,
    system::{Query, Res, ResMut},
};
use tracing::debug;

use crate::events::GameEvent;
use crate::systems::{AgentState, ModeTimer, Position, SimClock, Velocity};

/// Time-limited mode in which agents can be captured.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerMode {
    pub active: bool,
    pub since: Duration,
    pub duration: Duration,
    /// Captures made during this activation; indexes the reward tiers.
    pub tags: u32,
}

impl PowerMode {
    /// Starts (or restarts) the mode at `now`, clearing the capture count.
    pub fn activate(&mut self, now: Duration, duration: Duration) {
        *self = PowerMode {
            active: true,
            since: now,
            duration,
            tags: 0,
        };
    }

    pub fn end(&mut self) {
        self.active = false;
        self.tags = 0;
    }

    pub fn remaining(&self, now: Duration) -> Duration {
        if !self.active {
            return Duration::ZERO;
        }
        self.duration.saturating_sub(now.saturating_sub(self.since))
    }

    /// Remaining time as a fraction of the full duration, in `[0, 1]`.
    pub fn remaining_fraction(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        self.remaining(now).as_secs_f32() / self.duration.as_secs_f32()
    }

    pub fn is_expired(&self, now: Duration) -> bool {
        self.active && now.saturating_sub(self.since) >= self.duration
    }
}

/// Makes an agent capturable, turning it around on the spot.
///
/// Respawning and already-vulnerable agents are unaffected. Returns whether the agent changed.
pub fn make_vulnerable(state: &mut AgentState, position: &mut Position, velocity: &mut Velocity) -> bool {
    if !state.is_active() || *state == AgentState::Vulnerable {
        return false;
    }
    *state = AgentState::Vulnerable;
    position.reverse();
    velocity.direction = velocity.direction.map(|d| d.opposite());
    true
}

/// Ends power mode once its duration has passed; otherwise reports the time left.
pub fn power_mode_system(
    clock: Res<SimClock>,
    mut power: ResMut<PowerMode>,
    mut agents: Query<(&mut AgentState, &mut ModeTimer)>,
    mut events: EventWriter<GameEvent>,
) {
    if !power.active {
        return;
    }

    if power.is_expired(clock.now) {
        debug!(captures = power.tags, "Power mode expired");
        power.end();
        for (mut state, mut timer) in agents.iter_mut() {
            if *state == AgentState::Vulnerable {
                *state = AgentState::Patrol;
                timer.entered = clock.now;
            }
        }
        events.write(GameEvent::PowerModeExited);
    } else {
        events.write(GameEvent::PowerModeProgress {
            remaining_fraction: power.remaining_fraction(clock.now),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{direction::Direction, Cell};

    #[test]
    fn test_remaining_fraction() {
        let mut power = PowerMode::default();
        power.activate(Duration::from_secs(10), Duration::from_secs(4));
        assert_eq!(power.remaining_fraction(Duration::from_secs(10)), 1.0);
        assert_eq!(power.remaining_fraction(Duration::from_secs(11)), 0.75);
        assert!(!power.is_expired(Duration::from_secs(13)));
        assert!(power.is_expired(Duration::from_secs(14)));
    }

    #[test]
    fn test_activation_clears_tags() {
        let mut power = PowerMode::default();
        power.activate(Duration::ZERO, Duration::from_secs(4));
        power.tags = 3;
        power.activate(Duration::from_secs(1), Duration::from_secs(4));
        assert_eq!(power.tags, 0);
        assert_eq!(power.since, Duration::from_secs(1));
    }

    #[test]
    fn test_respawning_agents_stay_put() {
        let mut state = AgentState::Respawning { since: Duration::ZERO };
        let mut position = Position::Stopped { cell: Cell::new(1, 1) };
        let mut velocity = Velocity {
            speed: 1.0,
            direction: Some(Direction::Left),
        };
        assert!(!make_vulnerable(&mut state, &mut position, &mut velocity));
        assert_eq!(velocity.direction, Some(Direction::Left));
    }
}
