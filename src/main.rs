use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use chat_climb_core::config::GameConfig;
use chat_climb_core::game::chat_buffer::{ChatBufferError, ChatMessage};
use chat_climb_core::game::map::GameMap;
use chat_climb_core::game::session::{GameSession, RoundPhase, SessionEvent};
use chat_climb_core::render::{render, FramePacer, RecordingSurface};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Chat Climb v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = GameConfig::load_or_default();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: {} Hz, {}ms rounds, {}-{} players",
        config.physics.tick_rate,
        config.round.duration_ms,
        config.round.min_players,
        config.round.max_players
    );

    let tick_rate = config.physics.tick_rate;
    let world_height = config.world.height;
    let mut session = GameSession::new(Arc::new(config));

    if let Ok(path) = std::env::var("MAP_PATH") {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading map {}", path))?;
        let map = GameMap::from_json_str(&raw, world_height).with_context(|| format!("parsing map {}", path))?;
        session.load_map(map);
    }

    let auto_restart = std::env::var("AUTO_RESTART")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let frame_dump_path = std::env::var("FRAME_DUMP_PATH").ok();

    // Chat reader: `username: message` lines on stdin
    let sender = session.chat_sender();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(message) = ChatMessage::parse_line(&line) else {
                        debug!("Ignoring chat line without a username: {:?}", line);
                        continue;
                    };
                    match sender.try_send(message) {
                        Ok(()) => {}
                        Err(ChatBufferError::Full) => warn!("Chat buffer full, dropping message"),
                        Err(ChatBufferError::Disconnected) => break,
                    }
                }
                Ok(None) => {
                    info!("Chat input closed");
                    break;
                }
                Err(e) => {
                    error!("Chat input error: {}", e);
                    break;
                }
            }
        }
    });

    let mut ticker = interval(Duration::from_secs_f64(1.0 / tick_rate as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut pacer = FramePacer::new(tick_rate);
    let mut surface = RecordingSurface::new();
    let mut restart = AutoRestart::new(auto_restart);
    let status_every = tick_rate as u64 * 30;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Session loop started at {} Hz", tick_rate);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if restart.take_due() {
                    if let Err(e) = session.reset() {
                        warn!("Auto restart failed: {}", e);
                    }
                }

                for event in session.tick() {
                    log_event(&event);
                }

                let rendered = pacer.should_render();
                if rendered {
                    pacer.frame_start();
                    surface.clear();
                    render(&mut surface, &session.snapshot());
                    pacer.frame_end();
                }
                restart.after_frame(session.phase(), rendered);

                if session.current_tick() % status_every == 0 {
                    info!(
                        "Tick {}: {:?}, {}/{} players alive, {}ms left | Render: {}",
                        session.current_tick(),
                        session.phase(),
                        session.state().alive_count(),
                        session.player_count(),
                        session.time_remaining_ms(),
                        pacer.status_message()
                    );
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!(
        "Rendered {} frames, skipped {}",
        pacer.rendered_frames(),
        pacer.skipped_frames()
    );

    if let Some(path) = frame_dump_path {
        let json = surface.to_json().context("serializing last frame")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing frame dump {}", path))?;
        info!("Last frame written to {}", path);
    }

    info!("Session stopped");
    Ok(())
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::RoundEnded(result) => {
            for ranking in &result.rankings {
                info!(
                    "  #{} {} (finished: {:?}, {:.0}px from goal)",
                    ranking.rank, ranking.name, ranking.finished_at, ranking.distance_to_goal
                );
            }
        }
        other => debug!("{:?}", other),
    }
}

/// Resets an ended round only once its final frame has been drawn
struct AutoRestart {
    enabled: bool,
    due: bool,
}

impl AutoRestart {
    fn new(enabled: bool) -> Self {
        Self { enabled, due: false }
    }

    fn after_frame(&mut self, phase: RoundPhase, rendered: bool) {
        if self.enabled && rendered && phase == RoundPhase::Ended {
            self.due = true;
        }
    }

    fn take_due(&mut self) -> bool {
        std::mem::take(&mut self.due)
    }
}
