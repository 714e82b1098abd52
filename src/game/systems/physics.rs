use rayon::prelude::*;

use crate::config::GameConfig;
use crate::game::command::{CommandProcessor, Key};
use crate::game::constants::render::TRAIL_LENGTH;
use crate::game::map::GameMap;
use crate::game::state::{GameState, Player, PlayerId, Tick};
use crate::util::vec2::Vec2;

/// What happened to one player during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub jumped: bool,
    pub double_jumped: bool,
    pub landed: bool,
    pub finished: bool,
    pub eliminated: bool,
}

impl StepOutcome {
    pub fn is_quiet(&self) -> bool {
        *self == StepOutcome::default()
    }
}

/// Advance one living player by one tick.
///
/// Order: gravity, lateral input, friction, clamp, jump, integrate,
/// platform/floor resolution, world bounds, goal check.
pub fn step_player(player: &mut Player, map: &GameMap, config: &GameConfig, now: Tick) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    if !player.alive {
        return outcome;
    }

    let physics = &config.physics;
    let world = &config.world;
    let radius = physics.player_radius;

    // Gravity (Down held in the air falls faster)
    player.velocity.y += physics.gravity;
    if !player.grounded && player.is_held(Key::Down, now) {
        player.velocity.y += physics.fast_fall_accel;
    }
    player.velocity.y = player.velocity.y.min(physics.max_fall_speed);

    // Lateral input never slows down a faster impulse in the same direction
    let left = player.is_held(Key::Left, now);
    let right = player.is_held(Key::Right, now);
    if left && !right {
        if player.velocity.x > -physics.move_speed {
            player.velocity.x = (player.velocity.x - physics.move_accel).max(-physics.move_speed);
        }
    } else if right && !left {
        if player.velocity.x < physics.move_speed {
            player.velocity.x = (player.velocity.x + physics.move_accel).min(physics.move_speed);
        }
    } else {
        player.velocity.x *= physics.friction;
        if player.velocity.x.abs() < 0.01 {
            player.velocity.x = 0.0;
        }
    }
    player.velocity = player.velocity.with_clamped_x(physics.max_horizontal_speed);

    // Jump: grounded with Up held or a buffered charge, else the airborne jump
    if player.grounded {
        let buffered = player.consume_jump_charge();
        if buffered || player.is_held(Key::Up, now) {
            player.velocity.y = -physics.jump_force;
            player.grounded = false;
            outcome.jumped = true;
        }
    } else if !player.double_jump_used && player.jump_buffer > 0 {
        player.consume_jump_charge();
        player.velocity.y = -physics.jump_force * physics.double_jump_multiplier;
        player.double_jump_used = true;
        outcome.double_jumped = true;
    }

    // Integrate
    let previous = player.position;
    player.position += player.velocity;

    // One-way platforms: only landings from above are resolved
    let was_grounded = player.grounded;
    player.grounded = false;
    if player.velocity.y >= 0.0 {
        let previous_bottom = previous.y + radius;
        let bottom = player.position.y + radius;
        let landing = map
            .platforms
            .iter()
            .filter(|p| p.overlaps_x(player.position.x, radius))
            .filter(|p| previous_bottom <= p.y && bottom >= p.y)
            .map(|p| p.y)
            .min_by(|a, b| a.total_cmp(b));

        if let Some(top) = landing {
            land(player, top - radius);
        } else if map.has_floor && bottom >= world.floor_y() {
            land(player, world.floor_y() - radius);
        }
    }
    if player.grounded && !was_grounded {
        outcome.landed = true;
    }

    // World bounds
    let max_x = (world.width - radius).max(radius);
    if player.position.x < radius || player.position.x > max_x {
        player.position.x = player.position.x.clamp(radius, max_x);
        player.velocity.x = 0.0;
    }
    if player.position.y < radius {
        player.position.y = radius;
        player.velocity.y = player.velocity.y.max(0.0);
    }
    if player.position.y > world.height + radius {
        player.position.y = world.height - radius;
        player.eliminate();
        outcome.eliminated = true;
        return outcome;
    }

    if player.finished_at.is_none()
        && player.position.x >= world.goal_x
        && player.position.y <= world.goal_band_y
    {
        player.finished_at = Some(now);
        outcome.finished = true;
    }

    outcome
}

fn land(player: &mut Player, resting_y: f32) {
    player.position.y = resting_y;
    player.velocity.y = 0.0;
    player.grounded = true;
    player.double_jump_used = false;
}

/// Advance every living player by one tick.
///
/// Per player: due chord steps, key expiry, the physics step, then trail
/// recording. Players are independent, so this runs on rayon.
pub fn update(
    state: &mut GameState,
    map: &GameMap,
    processor: &CommandProcessor,
    now: Tick,
) -> Vec<(PlayerId, StepOutcome)> {
    let config = processor.config();

    let mut outcomes: Vec<(PlayerId, StepOutcome)> = state
        .players
        .par_values_mut()
        .filter(|player| player.alive)
        .map(|player| {
            processor.drain_pending(player, now);
            player.expire_keys(now);
            let outcome = step_player(player, map, config, now);
            player.record_trail(TRAIL_LENGTH);
            (player.id, outcome)
        })
        .filter(|(_, outcome)| !outcome.is_quiet())
        .collect();

    // Stable order for consumers regardless of thread scheduling
    outcomes.sort_by_key(|(id, _)| state.players.get(id).map(|p| p.join_order));
    outcomes
}

/// Spawn position for the `slot`-th player, resting on the floor
pub fn spawn_position(config: &GameConfig, slot: usize) -> Vec2 {
    let world = &config.world;
    let radius = config.physics.player_radius;
    let usable = (world.goal_x - world.spawn_x).max(world.spawn_spacing);
    let columns = (usable / world.spawn_spacing).max(1.0) as usize;
    let x = world.spawn_x + (slot % columns) as f32 * world.spawn_spacing;
    Vec2::new(x, world.floor_y() - radius)
}
