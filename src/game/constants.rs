//! Default tuning table
//!
//! All physics values are in per-tick units (pixels per tick, pixels per tick²)
//! at `physics::TICK_RATE`. Runtime code reads them through `GameConfig`, which
//! is built from these defaults and then optionally overridden.

/// Physics constants
pub mod physics {
    /// Simulation tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Downward acceleration applied every tick
    pub const GRAVITY: f32 = 0.5;
    /// Terminal fall speed
    pub const MAX_FALL_SPEED: f32 = 16.0;
    /// Extra downward acceleration while Down is held in the air
    pub const FAST_FALL_ACCEL: f32 = 0.6;
    /// Horizontal acceleration while a lateral key is held
    pub const MOVE_ACCEL: f32 = 0.8;
    /// Top speed reachable by holding a lateral key
    pub const MOVE_SPEED: f32 = 5.0;
    /// Horizontal velocity multiplier per tick when no lateral key is held
    pub const FRICTION: f32 = 0.85;
    /// Hard cap on |vx| (impulses included)
    pub const MAX_HORIZONTAL_SPEED: f32 = 9.0;
    /// Upward speed of a grounded jump
    pub const JUMP_FORCE: f32 = 11.0;
    /// Fraction of JUMP_FORCE granted by the airborne jump
    pub const DOUBLE_JUMP_MULTIPLIER: f32 = 0.85;
    /// Diagonal command base horizontal impulse
    pub const BASE_IMPULSE: f32 = 4.0;
    /// Diagonal command impulse multiplier
    pub const IMPULSE_MULTIPLIER: f32 = 1.5;
    /// Player body radius
    pub const PLAYER_RADIUS: f32 = 14.0;
    /// Jump buffer cap (one grounded jump plus one buffered extra)
    pub const MAX_JUMP_BUFFER: u8 = 2;
}

/// Chat command constants
pub mod input {
    /// Every game command starts with this character
    pub const COMMAND_PREFIX: char = '!';
    /// How long a key stays held after a command
    pub const KEY_TIMEOUT_MS: u64 = 400;
    /// Delay between consecutive steps of a chorded sequence
    pub const SEQUENCE_DELAY_MS: u64 = 250;
    /// Shortest chord (shorter strings are single commands)
    pub const MIN_CHORD_LEN: usize = 2;
    /// Longest chord
    pub const MAX_CHORD_LEN: usize = 5;
}

/// Round constants
pub mod game {
    /// Round length
    pub const ROUND_DURATION_MS: u64 = 180_000;
    /// Players required before a round can start
    pub const MIN_PLAYERS: usize = 1;
    /// Roster capacity
    pub const MAX_PLAYERS: usize = 20;
}

/// World geometry
pub mod world {
    pub const WIDTH: f32 = 800.0;
    pub const HEIGHT: f32 = 600.0;
    /// Thickness of the floor strip at the bottom of the world
    pub const FLOOR_THICKNESS: f32 = 20.0;
    /// A player whose x reaches this line inside the goal band finishes
    pub const GOAL_X: f32 = 640.0;
    /// The goal band is everything above this y
    pub const GOAL_BAND_Y: f32 = 140.0;
    /// x of the first spawn slot
    pub const SPAWN_X: f32 = 40.0;
    /// Horizontal gap between spawn slots
    pub const SPAWN_SPACING: f32 = 22.0;
}

/// Fallback ladder geometry
pub mod map {
    /// Vertical distance between ladder rungs
    pub const LADDER_STEP_Y: f32 = 80.0;
    /// No rung is placed above this y
    pub const LADDER_TOP_MARGIN: f32 = 100.0;
    pub const PLATFORM_WIDTH: f32 = 150.0;
    pub const PLATFORM_HEIGHT: f32 = 14.0;
    /// Rung x positions, listed from the summit downward
    pub const LADDER_COLUMNS: [f32; 4] = [440.0, 240.0, 40.0, 240.0];
    /// The topmost rung sits under the goal line
    pub const SUMMIT_X: f32 = 600.0;
    pub const SUMMIT_WIDTH: f32 = 200.0;
}

/// Render geometry and styling
pub mod render {
    use crate::util::color::Color;

    pub const SKY_COLOR: Color = Color::rgb(0x87, 0xce, 0xeb);
    pub const SKY_HORIZON_COLOR: Color = Color::rgb(0xe0, 0xf6, 0xff);
    /// Number of horizontal bands used to fake the sky gradient
    pub const SKY_BANDS: usize = 6;
    /// Extra height on each sky band so neighbours overlap without seams
    pub const SKY_BAND_OVERLAP: f32 = 1.0;
    pub const FLOOR_COLOR: Color = Color::rgb(0x4c, 0x8c, 0x2b);
    pub const PLATFORM_COLOR: Color = Color::rgb(0x8b, 0x5a, 0x2b);
    pub const PLATFORM_EDGE_COLOR: Color = Color::rgb(0x5c, 0x3a, 0x1a);
    pub const PLATFORM_EDGE_WIDTH: f32 = 2.0;
    pub const GOAL_COLOR: Color = Color::rgb(0xff, 0xd7, 0x00);
    pub const GOAL_LINE_WIDTH: f32 = 4.0;

    /// Trail points kept per player
    pub const TRAIL_LENGTH: usize = 12;
    /// Alpha gained per trail index (index 0 is the oldest point)
    pub const TRAIL_ALPHA_STEP: f32 = 0.05;
    /// Trail dot radius as a fraction of the body radius
    pub const TRAIL_RADIUS_SCALE: f32 = 0.6;

    pub const BODY_OUTLINE_COLOR: Color = Color::rgb(0x22, 0x22, 0x22);
    pub const BODY_OUTLINE_WIDTH: f32 = 2.0;
    pub const EYE_OFFSET_X: f32 = 5.0;
    pub const EYE_OFFSET_Y: f32 = -4.0;
    pub const EYE_RADIUS: f32 = 3.5;
    pub const PUPIL_RADIUS: f32 = 1.6;
    /// Pupils shift this far toward the direction of travel
    pub const PUPIL_LOOK_SHIFT: f32 = 1.5;

    pub const LABEL_FONT: &str = "bold 12px sans-serif";
    pub const LABEL_TEXT_COLOR: Color = Color::WHITE;
    pub const LABEL_PLATE_COLOR: Color = Color::BLACK;
    pub const LABEL_PLATE_ALPHA: f32 = 0.55;
    pub const LABEL_PADDING: f32 = 4.0;
    pub const LABEL_HEIGHT: f32 = 16.0;
    /// Gap between the top of the body and the bottom of the label plate
    pub const LABEL_GAP: f32 = 6.0;

    pub const COUNTDOWN_FONT: &str = "bold 28px sans-serif";
    pub const COUNTDOWN_COLOR: Color = Color::rgb(0x1a, 0x1a, 0x2e);
    pub const COUNTDOWN_MARGIN: f32 = 16.0;
    pub const COUNTDOWN_Y: f32 = 36.0;

    /// Player colors, assigned by join order
    pub const PALETTE: [Color; 10] = [
        Color::rgb(0xe6, 0x39, 0x46),
        Color::rgb(0x2a, 0x9d, 0x8f),
        Color::rgb(0xf4, 0xa2, 0x61),
        Color::rgb(0x45, 0x7b, 0x9d),
        Color::rgb(0x9b, 0x5d, 0xe5),
        Color::rgb(0xf1, 0x5b, 0xb5),
        Color::rgb(0x00, 0xbb, 0xf9),
        Color::rgb(0x00, 0xf5, 0xd4),
        Color::rgb(0xfe, 0xe4, 0x40),
        Color::rgb(0x6a, 0x99, 0x4e),
    ];
}

/// Particle effect constants
pub mod particles {
    /// Hard cap on live particles
    pub const MAX_COUNT: usize = 512;
    pub const LIFETIME_TICKS: u32 = 30;
    pub const GRAVITY: f32 = 0.15;
    pub const SPEED: f32 = 3.0;
    pub const RADIUS: f32 = 3.0;
    pub const JUMP_BURST: usize = 6;
    pub const LAND_BURST: usize = 4;
    pub const FINISH_BURST: usize = 30;
    pub const ELIMINATION_BURST: usize = 16;
}

/// Convert a millisecond delay to whole ticks, rounding up so a timer never fires early
#[inline]
pub fn ms_to_ticks(ms: u64, tick_rate: u32) -> u64 {
    ms.saturating_mul(tick_rate as u64).div_ceil(1000)
}

/// Convert a tick count to elapsed milliseconds
#[inline]
pub fn ticks_to_ms(ticks: u64, tick_rate: u32) -> u64 {
    ticks * 1000 / tick_rate.max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_ticks_rounds_up() {
        // 400ms at 60Hz = 24 ticks exactly
        assert_eq!(ms_to_ticks(400, 60), 24);
        // 250ms at 60Hz = 15 ticks exactly
        assert_eq!(ms_to_ticks(250, 60), 15);
        // 10ms at 60Hz = 0.6 ticks -> 1
        assert_eq!(ms_to_ticks(10, 60), 1);
        assert_eq!(ms_to_ticks(0, 60), 0);
    }

    #[test]
    fn test_ms_to_ticks_saturates_on_huge_delays() {
        let ticks = ms_to_ticks(u64::MAX, 60);
        assert_eq!(ticks, u64::MAX.div_ceil(1000));
        assert!(ms_to_ticks(u64::MAX / 2, 240) >= ms_to_ticks(u64::MAX / 4, 240));
    }

    #[test]
    fn test_ticks_never_shorter_than_ms() {
        for ms in [1, 17, 99, 250, 333, 400, 1001] {
            for rate in [20, 30, 60, 144] {
                let ticks = ms_to_ticks(ms, rate);
                assert!(
                    ticks * 1000 >= ms * rate as u64,
                    "{}ms at {}Hz became {} ticks",
                    ms,
                    rate,
                    ticks
                );
            }
        }
    }

    #[test]
    fn test_ticks_to_ms() {
        assert_eq!(ticks_to_ms(60, 60), 1000);
        assert_eq!(ticks_to_ms(90, 60), 1500);
    }

    #[test]
    fn test_key_timeout_exceeds_one_tick() {
        let tick_ms = 1000 / physics::TICK_RATE as u64;
        assert!(input::KEY_TIMEOUT_MS > tick_ms);
    }

    #[test]
    fn test_jump_reaches_next_rung() {
        // Apex height of a grounded jump: v² / 2g
        let apex = physics::JUMP_FORCE * physics::JUMP_FORCE / (2.0 * physics::GRAVITY);
        assert!(apex > map::LADDER_STEP_Y + physics::PLAYER_RADIUS);
    }

    #[test]
    fn test_impulse_within_cap() {
        let impulse = physics::BASE_IMPULSE * physics::IMPULSE_MULTIPLIER;
        assert!(impulse <= physics::MAX_HORIZONTAL_SPEED);
        assert!(physics::MOVE_SPEED < physics::MAX_HORIZONTAL_SPEED);
    }

    #[test]
    fn test_goal_is_inside_world() {
        assert!(world::GOAL_X < world::WIDTH);
        assert!(world::GOAL_BAND_Y > 0.0 && world::GOAL_BAND_Y < world::HEIGHT);
        assert!(map::SUMMIT_X + map::SUMMIT_WIDTH <= world::WIDTH);
    }

    #[test]
    fn test_chord_bounds() {
        assert!(input::MIN_CHORD_LEN >= 2);
        assert!(input::MIN_CHORD_LEN <= input::MAX_CHORD_LEN);
    }
}
