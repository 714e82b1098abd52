//! Game state definitions and structures
//!
//! Players, their held-key state and pending chord steps, and the roster.

use std::collections::VecDeque;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::game::command::Key;
use crate::game::constants::render::PALETTE;
use crate::util::color::Color;
use crate::util::vec2::Vec2;

/// Unique player identifier
pub type PlayerId = Uuid;

/// Simulation tick counter
pub type Tick = u64;

/// A chord step waiting for its tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub key: Key,
    pub fire_at_tick: Tick,
}

/// Boolean view of the held keys at one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFlags {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub diagonal_left: bool,
    pub diagonal_right: bool,
}

/// Player state
///
/// Hot fields (read every tick by the simulation step) come first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    // === HOT FIELDS ===
    pub position: Vec2,
    pub velocity: Vec2,
    pub alive: bool,
    /// Resting on a platform or the floor after the last step
    pub grounded: bool,
    /// Buffered jump charges, capped by `PhysicsConfig::max_jump_buffer`
    pub jump_buffer: u8,
    /// Set once the airborne jump has been spent; cleared on landing
    pub double_jump_used: bool,
    /// Expiry tick per key (index = `Key::index`); a key is held while `now < expiry`
    held: [Option<Tick>; Key::COUNT],
    /// Chord steps in receipt order
    pending: SmallVec<[PendingAction; 8]>,

    // === WARM FIELDS ===
    /// Tick at which the player crossed the goal
    pub finished_at: Option<Tick>,
    /// Recent positions, oldest first
    pub trail: VecDeque<Vec2>,
    pub color_index: u8,
    /// Position in the join sequence (stable tie-breaker)
    pub join_order: u32,

    // === COLD FIELDS ===
    pub id: PlayerId,
    pub username: String,
}

impl Player {
    pub fn new(id: PlayerId, username: String, color_index: u8, join_order: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            alive: true,
            grounded: false,
            jump_buffer: 0,
            double_jump_used: false,
            held: [None; Key::COUNT],
            pending: SmallVec::new(),
            finished_at: None,
            trail: VecDeque::new(),
            color_index,
            join_order,
            id,
            username,
        }
    }

    pub fn color(&self) -> Color {
        PALETTE[self.color_index as usize % PALETTE.len()]
    }

    pub fn has_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Hold `key` until `until` (exclusive); a later expiry is never shortened
    pub fn hold(&mut self, key: Key, until: Tick) {
        let slot = &mut self.held[key.index()];
        *slot = Some(slot.map_or(until, |current| current.max(until)));
    }

    pub fn is_held(&self, key: Key, now: Tick) -> bool {
        self.held[key.index()].is_some_and(|expiry| now < expiry)
    }

    /// Release every key whose expiry has passed
    pub fn expire_keys(&mut self, now: Tick) {
        for slot in self.held.iter_mut() {
            if slot.is_some_and(|expiry| expiry <= now) {
                *slot = None;
            }
        }
    }

    /// Expiry tick of a held key
    pub fn key_expiry(&self, key: Key) -> Option<Tick> {
        self.held[key.index()]
    }

    pub fn flags(&self, now: Tick) -> InputFlags {
        InputFlags {
            left: self.is_held(Key::Left, now),
            right: self.is_held(Key::Right, now),
            up: self.is_held(Key::Up, now),
            down: self.is_held(Key::Down, now),
            diagonal_left: self.is_held(Key::DiagonalLeft, now),
            diagonal_right: self.is_held(Key::DiagonalRight, now),
        }
    }

    pub fn add_jump_charge(&mut self, cap: u8) {
        self.jump_buffer = (self.jump_buffer + 1).min(cap);
    }

    pub fn consume_jump_charge(&mut self) -> bool {
        if self.jump_buffer > 0 {
            self.jump_buffer -= 1;
            true
        } else {
            false
        }
    }

    pub fn queue_action(&mut self, action: PendingAction) {
        self.pending.push(action);
    }

    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    /// Remove and return the steps due at `now`, earliest tick first, receipt order within a tick
    pub fn take_due(&mut self, now: Tick) -> SmallVec<[PendingAction; 8]> {
        let mut due: SmallVec<[PendingAction; 8]> = SmallVec::new();
        self.pending.retain(|action| {
            if action.fire_at_tick <= now {
                due.push(*action);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|action| action.fire_at_tick);
        due
    }

    pub fn cancel_pending(&mut self) {
        self.pending.clear();
    }

    /// Remove from play: stops motion, drops held keys and queued chord steps
    pub fn eliminate(&mut self) {
        self.alive = false;
        self.velocity = Vec2::ZERO;
        self.held = [None; Key::COUNT];
        self.pending.clear();
    }

    /// Reset for a new round at `position`
    pub fn respawn(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.alive = true;
        self.grounded = false;
        self.jump_buffer = 0;
        self.double_jump_used = false;
        self.held = [None; Key::COUNT];
        self.pending.clear();
        self.finished_at = None;
        self.trail.clear();
    }

    pub fn record_trail(&mut self, max_len: usize) {
        self.trail.push_back(self.position);
        while self.trail.len() > max_len {
            self.trail.pop_front();
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Uuid::new_v4(), "Player".to_string(), 0, 0)
    }
}

/// Player roster
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub players: HashMap<PlayerId, Player>,
    /// Lowercased username -> id
    by_name: HashMap<String, PlayerId>,
    next_join_order: u32,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next join-order slot
    pub fn next_join_order(&mut self) -> u32 {
        let order = self.next_join_order;
        self.next_join_order += 1;
        order
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Case-insensitive username lookup
    pub fn find_by_username(&self, username: &str) -> Option<PlayerId> {
        self.by_name.get(&username.to_lowercase()).copied()
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Players sorted by join order
    pub fn players_in_join_order(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.join_order);
        players
    }

    pub fn add_player(&mut self, player: Player) {
        self.by_name.insert(player.username.to_lowercase(), player.id);
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id)?;
        self.by_name.remove(&removed.username.to_lowercase());
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.by_name.clear();
        self.next_join_order = 0;
    }
}
