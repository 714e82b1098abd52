use crate::game::constants::{game, input, physics, world};

/// Physics tuning (per-tick units)
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    /// Simulation tick rate in Hz
    pub tick_rate: u32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub fast_fall_accel: f32,
    pub move_accel: f32,
    pub move_speed: f32,
    /// Horizontal velocity multiplier applied when no lateral key is held
    pub friction: f32,
    pub max_horizontal_speed: f32,
    pub jump_force: f32,
    pub double_jump_multiplier: f32,
    pub base_impulse: f32,
    pub impulse_multiplier: f32,
    pub player_radius: f32,
    pub max_jump_buffer: u8,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_rate: physics::TICK_RATE,
            gravity: physics::GRAVITY,
            max_fall_speed: physics::MAX_FALL_SPEED,
            fast_fall_accel: physics::FAST_FALL_ACCEL,
            move_accel: physics::MOVE_ACCEL,
            move_speed: physics::MOVE_SPEED,
            friction: physics::FRICTION,
            max_horizontal_speed: physics::MAX_HORIZONTAL_SPEED,
            jump_force: physics::JUMP_FORCE,
            double_jump_multiplier: physics::DOUBLE_JUMP_MULTIPLIER,
            base_impulse: physics::BASE_IMPULSE,
            impulse_multiplier: physics::IMPULSE_MULTIPLIER,
            player_radius: physics::PLAYER_RADIUS,
            max_jump_buffer: physics::MAX_JUMP_BUFFER,
        }
    }
}

impl PhysicsConfig {
    /// Low-gravity preset, handy for side-by-side tuning comparisons
    pub fn low_gravity() -> Self {
        Self {
            gravity: physics::GRAVITY * 0.5,
            max_fall_speed: physics::MAX_FALL_SPEED * 0.6,
            ..Self::default()
        }
    }

    /// Horizontal impulse applied by a diagonal command
    #[inline]
    pub fn diagonal_impulse(&self) -> f32 {
        self.base_impulse * self.impulse_multiplier
    }
}

/// Chat command tuning
#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    pub command_prefix: char,
    pub key_timeout_ms: u64,
    pub sequence_delay_ms: u64,
    pub min_chord_len: usize,
    pub max_chord_len: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            command_prefix: input::COMMAND_PREFIX,
            key_timeout_ms: input::KEY_TIMEOUT_MS,
            sequence_delay_ms: input::SEQUENCE_DELAY_MS,
            min_chord_len: input::MIN_CHORD_LEN,
            max_chord_len: input::MAX_CHORD_LEN,
        }
    }
}

/// What happens to the roster when an ended round is reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterPolicy {
    /// Players stay joined for the next round
    Keep,
    /// Everyone has to join again
    Clear,
}

/// Round tuning
#[derive(Debug, Clone, PartialEq)]
pub struct RoundConfig {
    pub duration_ms: u64,
    pub min_players: usize,
    pub max_players: usize,
    pub roster_policy: RosterPolicy,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration_ms: game::ROUND_DURATION_MS,
            min_players: game::MIN_PLAYERS,
            max_players: game::MAX_PLAYERS,
            roster_policy: RosterPolicy::Keep,
        }
    }
}

/// World geometry
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub floor_thickness: f32,
    pub goal_x: f32,
    pub goal_band_y: f32,
    pub spawn_x: f32,
    pub spawn_spacing: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: world::WIDTH,
            height: world::HEIGHT,
            floor_thickness: world::FLOOR_THICKNESS,
            goal_x: world::GOAL_X,
            goal_band_y: world::GOAL_BAND_Y,
            spawn_x: world::SPAWN_X,
            spawn_spacing: world::SPAWN_SPACING,
        }
    }
}

impl WorldConfig {
    /// y of the top surface of the floor strip
    #[inline]
    pub fn floor_y(&self) -> f32 {
        self.height - self.floor_thickness
    }
}

/// Complete game configuration, injected into every component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub input: InputConfig,
    pub round: RoundConfig,
    pub world: WorldConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick_rate must be at least 1")]
    ZeroTickRate,
    #[error("round duration must be at least 1ms")]
    ZeroDuration,
    #[error("min_players must be at least 1")]
    ZeroMinPlayers,
    #[error("min_players ({min}) cannot exceed max_players ({max})")]
    PlayerBounds { min: usize, max: usize },
    #[error("world size must be positive and finite, got {width}x{height}")]
    WorldSize { width: f32, height: f32 },
    #[error("physics value '{0}' must be positive and finite")]
    NonPositive(&'static str),
    #[error("'{0}' must be a finite number")]
    NotFinite(&'static str),
    #[error("friction must be in (0, 1], got {0}")]
    Friction(f32),
    #[error("key timeout ({timeout_ms}ms) must exceed one tick ({tick_ms}ms)")]
    KeyTimeoutTooShort { timeout_ms: u64, tick_ms: u64 },
}

impl GameConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load config from any key lookup, falling back to defaults per key
    pub fn load_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(rate) = parse_key::<u32, _>(&lookup, "TICK_RATE") {
            if (1..=240).contains(&rate) {
                config.physics.tick_rate = rate;
            } else {
                tracing::warn!("TICK_RATE must be 1-240, using default");
            }
        }

        if let Some(duration) = parse_key::<u64, _>(&lookup, "ROUND_DURATION_MS") {
            if duration > 0 {
                config.round.duration_ms = duration;
            } else {
                tracing::warn!("ROUND_DURATION_MS must be > 0, using default");
            }
        }

        if let Some(min) = parse_key::<usize, _>(&lookup, "MIN_PLAYERS") {
            config.round.min_players = min;
        }

        if let Some(max) = parse_key::<usize, _>(&lookup, "MAX_PLAYERS") {
            if max > 0 && max <= 1000 {
                config.round.max_players = max;
            } else {
                tracing::warn!("MAX_PLAYERS must be 1-1000, using default");
            }
        }

        if let Some(timeout) = parse_key::<u64, _>(&lookup, "KEY_TIMEOUT_MS") {
            config.input.key_timeout_ms = timeout;
        }

        if let Some(delay) = parse_key::<u64, _>(&lookup, "SEQUENCE_DELAY_MS") {
            config.input.sequence_delay_ms = delay;
        }

        if let Some(prefix) = lookup("COMMAND_PREFIX") {
            let mut chars = prefix.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_whitespace() => config.input.command_prefix = c,
                _ => tracing::warn!("Invalid COMMAND_PREFIX '{}', using default", prefix),
            }
        }

        if let Some(width) = parse_key::<f32, _>(&lookup, "WORLD_WIDTH") {
            if is_positive(width) {
                config.world.width = width;
            } else {
                tracing::warn!("WORLD_WIDTH must be a positive number, using default");
            }
        }

        if let Some(height) = parse_key::<f32, _>(&lookup, "WORLD_HEIGHT") {
            if is_positive(height) {
                config.world.height = height;
            } else {
                tracing::warn!("WORLD_HEIGHT must be a positive number, using default");
            }
        }

        if let Some(policy) = lookup("ROSTER_POLICY") {
            match policy.to_ascii_lowercase().as_str() {
                "keep" => config.round.roster_policy = RosterPolicy::Keep,
                "clear" => config.round.roster_policy = RosterPolicy::Clear,
                _ => tracing::warn!("Invalid ROSTER_POLICY '{}', using default", policy),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if physics.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.round.duration_ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.round.min_players == 0 {
            return Err(ConfigError::ZeroMinPlayers);
        }
        if self.round.min_players > self.round.max_players {
            return Err(ConfigError::PlayerBounds {
                min: self.round.min_players,
                max: self.round.max_players,
            });
        }
        if !is_positive(self.world.width) || !is_positive(self.world.height) {
            return Err(ConfigError::WorldSize {
                width: self.world.width,
                height: self.world.height,
            });
        }

        let positives = [
            ("gravity", physics.gravity),
            ("max_fall_speed", physics.max_fall_speed),
            ("move_speed", physics.move_speed),
            ("max_horizontal_speed", physics.max_horizontal_speed),
            ("jump_force", physics.jump_force),
            ("player_radius", physics.player_radius),
        ];
        for (name, value) in positives {
            if !is_positive(value) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        if !(physics.friction > 0.0 && physics.friction <= 1.0) {
            return Err(ConfigError::Friction(physics.friction));
        }

        let finites = [
            ("fast_fall_accel", physics.fast_fall_accel),
            ("move_accel", physics.move_accel),
            ("double_jump_multiplier", physics.double_jump_multiplier),
            ("base_impulse", physics.base_impulse),
            ("impulse_multiplier", physics.impulse_multiplier),
            ("floor_thickness", self.world.floor_thickness),
            ("goal_x", self.world.goal_x),
            ("goal_band_y", self.world.goal_band_y),
            ("spawn_x", self.world.spawn_x),
            ("spawn_spacing", self.world.spawn_spacing),
        ];
        for (name, value) in finites {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
        }

        let tick_ms = 1000 / physics.tick_rate as u64;
        if self.input.key_timeout_ms <= tick_ms {
            return Err(ConfigError::KeyTimeoutTooShort {
                timeout_ms: self.input.key_timeout_ms,
                tick_ms,
            });
        }
        Ok(())
    }
}

/// Rejects NaN and infinities along with zero and negatives
#[inline]
fn is_positive(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}

fn parse_key<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.round.duration_ms, 180_000);
        assert_eq!(config.input.command_prefix, '!');
        assert_eq!(config.physics.max_jump_buffer, 2);
        assert_eq!(config.round.roster_policy, RosterPolicy::Keep);
        assert!(config.validate().is_ok());
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    /// Log writer that keeps everything in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn load_capturing_logs(pairs: &[(&str, &str)]) -> (GameConfig, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let config = tracing::subscriber::with_default(subscriber, || {
            GameConfig::load_from(lookup_from(pairs))
        });
        (config, logs.text())
    }

    #[test]
    fn test_load_or_default_reads_environment() {
        // Only test in the crate that touches the process environment
        std::env::set_var("TICK_RATE", "30");
        std::env::set_var("ROSTER_POLICY", "Clear");
        std::env::set_var("COMMAND_PREFIX", "#");
        let config = GameConfig::load_or_default();
        std::env::remove_var("TICK_RATE");
        std::env::remove_var("ROSTER_POLICY");
        std::env::remove_var("COMMAND_PREFIX");

        assert_eq!(config.physics.tick_rate, 30);
        assert_eq!(config.round.roster_policy, RosterPolicy::Clear);
        assert_eq!(config.input.command_prefix, '#');

        let config = GameConfig::load_or_default();
        assert_eq!(config.physics.tick_rate, physics::TICK_RATE);
        assert_eq!(config.round.roster_policy, RosterPolicy::Keep);
        assert_eq!(config.input.command_prefix, input::COMMAND_PREFIX);
    }

    #[test]
    fn test_load_from_applies_overrides() {
        let config = GameConfig::load_from(lookup_from(&[
            ("TICK_RATE", "120"),
            ("ROUND_DURATION_MS", "60000"),
            ("KEY_TIMEOUT_MS", "500"),
            ("ROSTER_POLICY", "keep"),
            ("COMMAND_PREFIX", "?"),
            ("WORLD_WIDTH", "1024"),
        ]));
        assert_eq!(config.physics.tick_rate, 120);
        assert_eq!(config.round.duration_ms, 60_000);
        assert_eq!(config.input.key_timeout_ms, 500);
        assert_eq!(config.round.roster_policy, RosterPolicy::Keep);
        assert_eq!(config.input.command_prefix, '?');
        assert_eq!(config.world.width, 1024.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_empty_lookup_is_default() {
        let config = GameConfig::load_from(|_: &str| None);
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_invalid_values_keep_defaults_and_warn() {
        let (config, logs) = load_capturing_logs(&[
            ("TICK_RATE", "0"),
            ("ROSTER_POLICY", "sometimes"),
            ("COMMAND_PREFIX", "!!"),
            ("ROUND_DURATION_MS", "soon"),
        ]);
        assert_eq!(config, GameConfig::default());
        assert!(logs.contains("TICK_RATE must be 1-240"));
        assert!(logs.contains("Invalid ROSTER_POLICY 'sometimes'"));
        assert!(logs.contains("Invalid COMMAND_PREFIX '!!'"));
        assert!(logs.contains("Invalid ROUND_DURATION_MS 'soon'"));
        assert!(logs.contains("WARN"));
    }

    #[test]
    fn test_whitespace_prefix_rejected() {
        let (config, logs) = load_capturing_logs(&[("COMMAND_PREFIX", " ")]);
        assert_eq!(config.input.command_prefix, input::COMMAND_PREFIX);
        assert!(logs.contains("Invalid COMMAND_PREFIX"));
    }

    #[test]
    fn test_non_finite_world_size_from_env_keeps_default() {
        let (config, logs) = load_capturing_logs(&[("WORLD_WIDTH", "NaN"), ("WORLD_HEIGHT", "inf")]);
        assert_eq!(config.world, WorldConfig::default());
        assert!(logs.contains("WORLD_WIDTH must be a positive number"));
        assert!(logs.contains("WORLD_HEIGHT must be a positive number"));
    }

    #[test]
    fn test_validate_rejects_non_finite_world() {
        let sizes = [
            (f32::NAN, 600.0),
            (800.0, f32::NAN),
            (f32::INFINITY, 600.0),
            (800.0, f32::NEG_INFINITY),
        ];
        for (width, height) in sizes {
            let mut config = GameConfig::default();
            config.world.width = width;
            config.world.height = height;
            assert!(
                matches!(config.validate(), Err(ConfigError::WorldSize { .. })),
                "{}x{} passed validation",
                width,
                height
            );
        }
    }

    #[test]
    fn test_validate_rejects_non_finite_physics() {
        let mut config = GameConfig::default();
        config.physics.max_horizontal_speed = f32::NAN;
        assert_eq!(config.validate(), Err(ConfigError::NonPositive("max_horizontal_speed")));

        let mut config = GameConfig::default();
        config.physics.gravity = f32::INFINITY;
        assert_eq!(config.validate(), Err(ConfigError::NonPositive("gravity")));

        let mut config = GameConfig::default();
        config.physics.friction = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Friction(_))));

        let mut config = GameConfig::default();
        config.physics.base_impulse = f32::NAN;
        assert_eq!(config.validate(), Err(ConfigError::NotFinite("base_impulse")));

        let mut config = GameConfig::default();
        config.world.goal_band_y = f32::NEG_INFINITY;
        assert_eq!(config.validate(), Err(ConfigError::NotFinite("goal_band_y")));
    }

    #[test]
    fn test_validate_player_bounds() {
        let mut config = GameConfig::default();
        config.round.min_players = 5;
        config.round.max_players = 2;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PlayerBounds { min: 5, max: 2 })
        );
    }

    #[test]
    fn test_validate_zero_min_players() {
        let mut config = GameConfig::default();
        config.round.min_players = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMinPlayers));
    }

    #[test]
    fn test_validate_key_timeout_must_exceed_tick() {
        let mut config = GameConfig::default();
        config.input.key_timeout_ms = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::KeyTimeoutTooShort { .. })
        ));
    }

    #[test]
    fn test_validate_friction_range() {
        let mut config = GameConfig::default();
        config.physics.friction = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::Friction(1.5)));
    }

    #[test]
    fn test_validate_non_positive_gravity() {
        let mut config = GameConfig::default();
        config.physics.gravity = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositive("gravity")));
    }

    #[test]
    fn test_low_gravity_preset() {
        let preset = PhysicsConfig::low_gravity();
        assert!(preset.gravity < PhysicsConfig::default().gravity);
        assert_eq!(preset.jump_force, PhysicsConfig::default().jump_force);
    }

    #[test]
    fn test_diagonal_impulse() {
        let physics = PhysicsConfig::default();
        assert!((physics.diagonal_impulse() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_floor_y() {
        let world = WorldConfig::default();
        assert_eq!(world.floor_y(), 580.0);
    }
}
