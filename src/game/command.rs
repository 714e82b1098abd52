//! Chat command processing
//!
//! Turns `!`-prefixed chat strings into held-key and velocity changes on a
//! player. Nothing here touches position; the simulation step samples the
//! held keys on its own tick, so chat delivery jitter never reaches physics.
//!
//! Timing is expressed in ticks: a key is held until an explicit expiry tick
//! and chord steps sit in the player's pending queue until their fire tick.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::config::GameConfig;
use crate::game::constants::ms_to_ticks;
use crate::game::state::{PendingAction, Player, Tick};

/// Semantic movement key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    DiagonalLeft,
    DiagonalRight,
}

impl Key {
    pub const COUNT: usize = 6;

    pub const ALL: [Key; Key::COUNT] = [
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::DiagonalLeft,
        Key::DiagonalRight,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Key::Left => 0,
            Key::Right => 1,
            Key::Up => 2,
            Key::Down => 3,
            Key::DiagonalLeft => 4,
            Key::DiagonalRight => 5,
        }
    }

    /// Exact, case-sensitive alias lookup (Turkish and ASCII spellings)
    pub fn from_alias(alias: &str) -> Option<Key> {
        match alias {
            "a" | "sol" => Some(Key::Left),
            "d" | "sag" | "sağ" => Some(Key::Right),
            "w" | "yukarı" | "yukari" => Some(Key::Up),
            "asagi" | "aşağı" => Some(Key::Down),
            "q" => Some(Key::DiagonalLeft),
            "e" => Some(Key::DiagonalRight),
            _ => None,
        }
    }

    /// Single-character alphabet usable inside a chord
    pub fn from_chord_char(c: char) -> Option<Key> {
        match c {
            'a' => Some(Key::Left),
            'd' => Some(Key::Right),
            'w' => Some(Key::Up),
            'q' => Some(Key::DiagonalLeft),
            'e' => Some(Key::DiagonalRight),
            _ => None,
        }
    }
}

/// Chord keys, inline up to the longest allowed chord
pub type ChordKeys = SmallVec<[Key; 5]>;

/// Parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One key, applied immediately
    Single(Key),
    /// Chorded keys, one every `sequence_delay_ms`
    Sequence(ChordKeys),
    /// Prefixed but not a known alias
    Unknown,
}

/// Parse a chat string. Returns `None` when `text` does not start with `prefix`.
pub fn parse_command(text: &str, prefix: char, min_chord: usize, max_chord: usize) -> Option<Command> {
    let body = text.strip_prefix(prefix)?.trim_end();

    let len = body.chars().count();
    if (min_chord..=max_chord).contains(&len) {
        let chord: Option<ChordKeys> = body.chars().map(Key::from_chord_char).collect();
        if let Some(keys) = chord {
            return Some(Command::Sequence(keys));
        }
    }

    Some(match Key::from_alias(body) {
        Some(key) => Command::Single(key),
        None => Command::Unknown,
    })
}

/// Stateless command processor; all state lives on the player it is handed
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    config: Arc<GameConfig>,
    key_timeout_ticks: Tick,
    sequence_delay_ticks: Tick,
}

impl CommandProcessor {
    pub fn new(config: Arc<GameConfig>) -> Self {
        let rate = config.physics.tick_rate;
        let key_timeout_ticks = ms_to_ticks(config.input.key_timeout_ms, rate);
        let sequence_delay_ticks = ms_to_ticks(config.input.sequence_delay_ms, rate);
        Self {
            config,
            key_timeout_ticks,
            sequence_delay_ticks,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn key_timeout_ticks(&self) -> Tick {
        self.key_timeout_ticks
    }

    pub fn sequence_delay_ticks(&self) -> Tick {
        self.sequence_delay_ticks
    }

    pub fn parse(&self, text: &str) -> Option<Command> {
        let input = &self.config.input;
        parse_command(text, input.command_prefix, input.min_chord_len, input.max_chord_len)
    }

    /// Handle one chat string for `player` at tick `now`.
    ///
    /// Returns true iff the string carries the command prefix. Unknown aliases
    /// and commands for dead players are accepted and dropped.
    pub fn handle(&self, player: &mut Player, text: &str, now: Tick) -> bool {
        let Some(command) = self.parse(text) else {
            return false;
        };

        if !player.alive {
            return true;
        }

        match command {
            Command::Single(key) => self.apply_key(player, key, now),
            Command::Sequence(keys) => {
                // Chord steps are scheduled but not deduplicated against an
                // earlier chord still in flight for the same player.
                let mut fire_at = now;
                for key in keys {
                    player.queue_action(PendingAction { key, fire_at_tick: fire_at });
                    fire_at = fire_at.saturating_add(self.sequence_delay_ticks);
                }
                self.drain_pending(player, now);
            }
            Command::Unknown => {
                trace!("Ignoring unknown command '{}' from {}", text, player.username);
            }
        }
        true
    }

    /// Apply every queued chord step due at `now`
    pub fn drain_pending(&self, player: &mut Player, now: Tick) {
        if !player.alive {
            player.cancel_pending();
            return;
        }
        for action in player.take_due(now) {
            self.apply_key(player, action.key, now);
        }
    }

    /// Key dispatch table
    pub fn apply_key(&self, player: &mut Player, key: Key, now: Tick) {
        if !player.alive {
            return;
        }
        let physics = &self.config.physics;
        let until = now.saturating_add(self.key_timeout_ticks);

        match key {
            Key::Left | Key::Right | Key::Down => player.hold(key, until),
            Key::Up => {
                player.add_jump_charge(physics.max_jump_buffer);
                player.hold(Key::Up, until);
            }
            Key::DiagonalLeft | Key::DiagonalRight => {
                let (lateral, sign) = if key == Key::DiagonalLeft {
                    (Key::Left, -1.0)
                } else {
                    (Key::Right, 1.0)
                };
                player.hold(key, until);
                player.hold(lateral, until);
                player.hold(Key::Up, until);

                player.velocity.x += sign * physics.diagonal_impulse();
                player.velocity = player.velocity.with_clamped_x(physics.max_horizontal_speed);
            }
        }
    }
}
