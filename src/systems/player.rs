use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::With,
    system::{Query, Res, ResMut},
};
use tracing::trace;

use crate::constants::mechanics::BOOST_MULTIPLIER;
use crate::events::CellArrival;
use crate::map::builder::Map;
use crate::systems::{BufferedDirection, DeltaTime, PlayerControlled, PlayerInput, Position, Velocity};

/// Moves the player cell to cell.
///
/// A requested direction is buffered and tried first whenever the player is at rest;
/// if it is blocked the player keeps its previous heading, and stops when that is
/// blocked too. Every completed move raises a [`CellArrival`].
pub fn player_movement_system(
    map: Res<Map>,
    delta_time: Res<DeltaTime>,
    mut input: ResMut<PlayerInput>,
    mut players: Query<(Entity, &mut Position, &mut Velocity, &mut BufferedDirection), With<PlayerControlled>>,
    mut arrivals: EventWriter<CellArrival>,
) {
    let Ok((entity, mut position, mut velocity, mut buffered)) = players.single_mut() else {
        return;
    };

    if let Some(direction) = input.requested.take() {
        *buffered = BufferedDirection::Some(direction);
    }

    let multiplier = if input.boost { BOOST_MULTIPLIER } else { 1.0 };
    let mut distance = velocity.speed * multiplier * delta_time.seconds;

    loop {
        match *position {
            Position::Stopped { cell } => {
                let pending = *buffered;
                let next = match pending {
                    BufferedDirection::Some(direction) if map.can_move(cell, direction) => {
                        *buffered = BufferedDirection::None;
                        Some(direction)
                    }
                    _ => velocity.direction.filter(|direction| map.can_move(cell, *direction)),
                };

                let Some(direction) = next else {
                    break;
                };
                if velocity.direction != Some(direction) {
                    trace!(%cell, ?direction, "Player turned");
                }
                velocity.direction = Some(direction);
                *position = Position::depart(&map, cell, direction);
            }
            Position::Moving { .. } => match position.tick(distance) {
                Some(overflow) => {
                    arrivals.write(CellArrival {
                        entity,
                        cell: position.current_cell(),
                    });
                    distance = overflow;
                }
                None => break,
            },
        }
    }
}
