//! Round result and ranking system
//!
//! Decides when a round is over and computes the final standings.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::WorldConfig;
use crate::game::state::{GameState, Player, PlayerId, Tick};
use crate::util::vec2::Vec2;

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundEndReason {
    /// A player crossed the goal threshold
    GoalReached(PlayerId),
    /// The clock ran out with nobody at the goal
    TimeExpired,
}

/// Final standing of one player
#[derive(Debug, Clone, Serialize)]
pub struct PlayerRanking {
    pub player_id: PlayerId,
    pub name: String,
    pub rank: u32,
    pub finished_at: Option<Tick>,
    pub distance_to_goal: f32,
    pub survived: bool,
}

/// Round result information
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub reason: RoundEndReason,
    pub winner_id: Option<PlayerId>,
    pub winner_name: Option<String>,
    pub rankings: Vec<PlayerRanking>,
    pub elapsed_ms: u64,
}

impl RoundResult {
    pub fn is_timeout(&self) -> bool {
        self.reason == RoundEndReason::TimeExpired
    }
}

/// Straight-line distance from a player to the goal corner; zero inside the goal zone
pub fn distance_to_goal(player: &Player, world: &WorldConfig) -> f32 {
    let dx = (world.goal_x - player.position.x).max(0.0);
    let dy = (player.position.y - world.goal_band_y).max(0.0);
    Vec2::new(dx, dy).length()
}

/// Earliest finisher; join order breaks ties within a tick
pub fn first_finisher(state: &GameState) -> Option<&Player> {
    state
        .players
        .values()
        .filter_map(|p| p.finished_at.map(|tick| (tick, p)))
        .min_by_key(|(tick, p)| (*tick, p.join_order))
        .map(|(_, p)| p)
}

/// Check whether a running round should end. The goal takes precedence over
/// the clock when both happen on the same tick.
pub fn check_round_end(state: &GameState, elapsed_ms: u64, duration_ms: u64) -> Option<RoundEndReason> {
    if let Some(winner) = first_finisher(state) {
        return Some(RoundEndReason::GoalReached(winner.id));
    }
    if elapsed_ms >= duration_ms {
        return Some(RoundEndReason::TimeExpired);
    }
    None
}

/// Rank every player: finishers by finish tick, then the living by distance
/// to the goal, then the eliminated.
pub fn determine_result(
    state: &GameState,
    reason: RoundEndReason,
    world: &WorldConfig,
    elapsed_ms: u64,
) -> RoundResult {
    let mut players: Vec<&Player> = state.players.values().collect();
    players.sort_by(|a, b| compare_standing(a, b, world));

    let rankings: Vec<PlayerRanking> = players
        .iter()
        .enumerate()
        .map(|(i, p)| PlayerRanking {
            player_id: p.id,
            name: p.username.clone(),
            rank: (i + 1) as u32,
            finished_at: p.finished_at,
            distance_to_goal: distance_to_goal(p, world),
            survived: p.alive,
        })
        .collect();

    let (winner_id, winner_name) = match reason {
        RoundEndReason::GoalReached(id) => (
            Some(id),
            state.get_player(id).map(|p| p.username.clone()),
        ),
        RoundEndReason::TimeExpired => (None, None),
    };

    RoundResult {
        reason,
        winner_id,
        winner_name,
        rankings,
        elapsed_ms,
    }
}

fn standing_class(player: &Player) -> u8 {
    if player.has_finished() {
        0
    } else if player.alive {
        1
    } else {
        2
    }
}

fn compare_standing(a: &Player, b: &Player, world: &WorldConfig) -> Ordering {
    standing_class(a)
        .cmp(&standing_class(b))
        .then_with(|| a.finished_at.cmp(&b.finished_at))
        .then_with(|| {
            if a.alive && b.alive && !a.has_finished() {
                distance_to_goal(a, world).total_cmp(&distance_to_goal(b, world))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.join_order.cmp(&b.join_order))
}
