//! Game session controller
//!
//! Owns the roster, the map, the shared tick clock and the round state
//! machine (`Idle -> Running -> Ended`). Chat lines arrive through the chat
//! buffer and are applied at the start of the tick that drains them.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{GameConfig, RosterPolicy};
use crate::game::chat_buffer::{ChatBuffer, ChatSender};
use crate::game::command::CommandProcessor;
use crate::game::constants::render::PALETTE;
use crate::game::constants::ticks_to_ms;
use crate::game::map::GameMap;
use crate::game::round_result::{check_round_end, determine_result, RoundResult};
use crate::game::state::{GameState, Player, PlayerId, Tick};
use crate::game::systems::particles::ParticleSystem;
use crate::game::systems::physics::{self, spawn_position};
use crate::render::FrameSnapshot;

/// Chat words that join the game (after the command prefix)
const JOIN_TOKENS: [&str; 3] = ["join", "katil", "katıl"];
/// Chat words that start the round
const START_TOKENS: [&str; 3] = ["start", "basla", "başla"];

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundPhase {
    Idle,
    Running,
    Ended,
}

/// Session errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("username is empty")]
    EmptyName,
    #[error("'{0}' has already joined")]
    DuplicateName(String),
    #[error("session is full ({max} players)")]
    Full { max: usize },
    #[error("cannot do that while the round is {0:?}")]
    WrongPhase(RoundPhase),
    #[error("need {need} players to start, have {have}")]
    NotEnoughPlayers { have: usize, need: usize },
    #[error("world size must be positive, got {width}x{height}")]
    InvalidWorldSize { width: f32, height: f32 },
}

/// Things that happened during a tick, for logging and UI
#[derive(Debug, Clone, Serialize)]
pub enum SessionEvent {
    PlayerJoined { id: PlayerId, username: String },
    PlayerLeft { id: PlayerId, username: String },
    RoundStarted { tick: Tick, players: usize },
    PlayerFinished { id: PlayerId, tick: Tick },
    PlayerEliminated { id: PlayerId },
    RoundEnded(RoundResult),
}

/// One game session
pub struct GameSession {
    config: Arc<GameConfig>,
    processor: CommandProcessor,
    state: GameState,
    map: GameMap,
    particles: ParticleSystem,
    chat: ChatBuffer,
    phase: RoundPhase,
    /// Shared clock, advanced once per `tick`
    tick: Tick,
    game_start_tick: Option<Tick>,
    game_end_tick: Option<Tick>,
    last_result: Option<RoundResult>,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Session with a fixed particle seed
    pub fn with_seed(config: Arc<GameConfig>, seed: u64) -> Self {
        let map = GameMap::fallback(config.world.height);
        info!(
            "Session ready: {}x{} world, {} platforms, {}ms rounds at {} Hz",
            config.world.width,
            config.world.height,
            map.platforms.len(),
            config.round.duration_ms,
            config.physics.tick_rate
        );

        Self {
            processor: CommandProcessor::new(config.clone()),
            config,
            state: GameState::new(),
            map,
            particles: ParticleSystem::new(seed),
            chat: ChatBuffer::default(),
            phase: RoundPhase::Idle,
            tick: 0,
            game_start_tick: None,
            game_end_tick: None,
            last_result: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn game_start_tick(&self) -> Option<Tick> {
        self.game_start_tick
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn player_count(&self) -> usize {
        self.state.len()
    }

    pub fn last_result(&self) -> Option<&RoundResult> {
        self.last_result.as_ref()
    }

    /// Sender handle for chat readers
    pub fn chat_sender(&self) -> ChatSender {
        self.chat.sender()
    }

    /// Add a player; allowed while Idle or Running
    pub fn join(&mut self, username: &str) -> Result<PlayerId, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if self.phase == RoundPhase::Ended {
            return Err(SessionError::WrongPhase(self.phase));
        }
        if self.state.find_by_username(username).is_some() {
            return Err(SessionError::DuplicateName(username.to_string()));
        }
        let max = self.config.round.max_players;
        if self.state.len() >= max {
            return Err(SessionError::Full { max });
        }

        let join_order = self.state.next_join_order();
        let color_index = (join_order as usize % PALETTE.len()) as u8;
        let id = Uuid::new_v4();
        let mut player = Player::new(id, username.to_string(), color_index, join_order);
        player.respawn(spawn_position(&self.config, self.state.len()));
        self.state.add_player(player);

        info!("Player {} ({}) joined, {} in session", username, id, self.state.len());
        self.events.push(SessionEvent::PlayerJoined {
            id,
            username: username.to_string(),
        });
        Ok(id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.state.remove_player(id)?;
        info!("Player {} ({}) left", removed.username, id);
        self.events.push(SessionEvent::PlayerLeft {
            id,
            username: removed.username.clone(),
        });
        Some(removed)
    }

    /// Change a player's palette slot
    pub fn set_player_color(&mut self, username: &str, index: usize) -> bool {
        if index >= PALETTE.len() {
            warn!("Color index {} out of range for {}", index, username);
            return false;
        }
        let Some(id) = self.state.find_by_username(username) else {
            warn!("Cannot set color for unknown player {}", username);
            return false;
        };
        match self.state.get_player_mut(id) {
            Some(player) => {
                player.color_index = index as u8;
                true
            }
            None => false,
        }
    }

    /// Idle -> Running
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != RoundPhase::Idle {
            return Err(SessionError::WrongPhase(self.phase));
        }
        let need = self.config.round.min_players;
        let have = self.state.len();
        if have < need {
            return Err(SessionError::NotEnoughPlayers { have, need });
        }

        self.respawn_all();
        self.particles.clear();
        self.game_start_tick = Some(self.tick);
        self.game_end_tick = None;
        self.last_result = None;
        self.phase = RoundPhase::Running;

        info!("Round started at tick {} with {} players", self.tick, have);
        self.events.push(SessionEvent::RoundStarted {
            tick: self.tick,
            players: have,
        });
        Ok(())
    }

    /// Ended -> Idle, keeping or clearing the roster per `RosterPolicy`
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.phase != RoundPhase::Ended {
            return Err(SessionError::WrongPhase(self.phase));
        }

        match self.config.round.roster_policy {
            RosterPolicy::Keep => self.respawn_all(),
            RosterPolicy::Clear => self.state.clear(),
        }
        self.particles.clear();
        self.game_start_tick = None;
        self.game_end_tick = None;
        self.phase = RoundPhase::Idle;

        info!(
            "Session reset ({:?}), {} players kept",
            self.config.round.roster_policy,
            self.state.len()
        );
        Ok(())
    }

    fn respawn_all(&mut self) {
        let mut ids: Vec<(u32, PlayerId)> = self
            .state
            .players
            .values()
            .map(|p| (p.join_order, p.id))
            .collect();
        ids.sort_unstable();

        for (slot, (_, id)) in ids.into_iter().enumerate() {
            let position = spawn_position(&self.config, slot);
            if let Some(player) = self.state.get_player_mut(id) {
                player.respawn(position);
            }
        }
    }

    /// Handle one chat line at the current tick.
    ///
    /// Returns true iff the line carries the command prefix. Join and start
    /// words are handled here; everything else goes to the command processor
    /// for the sender's player while a round is running.
    pub fn handle_message(&mut self, username: &str, text: &str) -> bool {
        let Some(body) = text.strip_prefix(self.config.input.command_prefix) else {
            return false;
        };
        let word = body.trim().to_lowercase();

        if JOIN_TOKENS.contains(&word.as_str()) {
            if let Err(e) = self.join(username) {
                debug!("Join from {} rejected: {}", username, e);
            }
            return true;
        }
        if START_TOKENS.contains(&word.as_str()) {
            if let Err(e) = self.start() {
                debug!("Start from {} rejected: {}", username, e);
            }
            return true;
        }

        if self.phase != RoundPhase::Running {
            return true;
        }
        let Some(id) = self.state.find_by_username(username) else {
            return true;
        };
        match self.state.get_player_mut(id) {
            Some(player) => self.processor.handle(player, text, self.tick),
            None => true,
        }
    }

    /// Advance the shared clock by one tick
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        self.tick += 1;
        let now = self.tick;

        for message in self.chat.drain() {
            self.handle_message(&message.username, &message.text);
        }

        if self.phase == RoundPhase::Running {
            self.step_round(now);
        }

        std::mem::take(&mut self.events)
    }

    fn step_round(&mut self, now: Tick) {
        let outcomes = physics::update(&mut self.state, &self.map, &self.processor, now);

        let radius = self.config.physics.player_radius;
        for (id, outcome) in &outcomes {
            let Some(player) = self.state.get_player(*id) else {
                continue;
            };
            self.particles.on_step(player, outcome, radius);
            if outcome.finished {
                info!("{} reached the goal at tick {}", player.username, now);
                self.events.push(SessionEvent::PlayerFinished { id: *id, tick: now });
            }
            if outcome.eliminated {
                info!("{} fell out of the world", player.username);
                self.events.push(SessionEvent::PlayerEliminated { id: *id });
            }
        }
        self.particles.update();

        let elapsed_ms = self.elapsed_ms();
        if let Some(reason) = check_round_end(&self.state, elapsed_ms, self.config.round.duration_ms) {
            let result = determine_result(&self.state, reason, &self.config.world, elapsed_ms);
            match &result.winner_name {
                Some(name) => info!("Round over: {} wins after {}ms", name, elapsed_ms),
                None => info!("Round over: time expired, no winner"),
            }
            self.phase = RoundPhase::Ended;
            self.game_end_tick = Some(now);
            self.last_result = Some(result.clone());
            self.events.push(SessionEvent::RoundEnded(result));
        }
    }

    /// Milliseconds since the round started; frozen once it ends
    pub fn elapsed_ms(&self) -> u64 {
        let Some(start) = self.game_start_tick else {
            return 0;
        };
        let end = self.game_end_tick.unwrap_or(self.tick);
        ticks_to_ms(end.saturating_sub(start), self.config.physics.tick_rate)
    }

    pub fn time_remaining_ms(&self) -> u64 {
        self.config.round.duration_ms.saturating_sub(self.elapsed_ms())
    }

    /// Read-only view for the renderer
    pub fn snapshot(&self) -> FrameSnapshot<'_> {
        let rate = self.config.physics.tick_rate;
        let now_ms = ticks_to_ms(self.game_end_tick.unwrap_or(self.tick), rate);
        FrameSnapshot {
            players: self.state.players_in_join_order(),
            particles: self.particles.particles(),
            map: &self.map,
            world: &self.config.world,
            player_radius: self.config.physics.player_radius,
            running: self.phase == RoundPhase::Running,
            duration_ms: self.config.round.duration_ms,
            start_ms: self.game_start_tick.map(|t| ticks_to_ms(t, rate)),
            now_ms,
        }
    }

    /// Replace the map for the next ticks
    pub fn load_map(&mut self, map: GameMap) {
        info!(
            "Loaded {} map with {} platforms (floor: {})",
            if map.authored { "authored" } else { "fallback" },
            map.platforms.len(),
            map.has_floor
        );
        self.map = map;
    }

    /// Change the world size; the fallback ladder is rebuilt for the new height
    pub fn resize_world(&mut self, width: f32, height: f32) -> Result<(), SessionError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(SessionError::InvalidWorldSize { width, height });
        }

        let mut config = (*self.config).clone();
        config.world.width = width;
        config.world.height = height;
        self.config = Arc::new(config);
        self.processor = CommandProcessor::new(self.config.clone());
        self.map.resize(height);

        debug!("World resized to {}x{}", width, height);
        Ok(())
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(Arc::new(GameConfig::default()))
    }
}
