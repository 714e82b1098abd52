//! Platform maps
//!
//! A map is an ordered list of axis-aligned platforms plus an optional floor.
//! Authored maps come in as JSON (`{"platforms": [{"x":..,"y":..,"w":..,"h":..}]}`);
//! anything without a usable `platforms` array gets the built-in ladder.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::game::constants::{map, world};

/// Axis-aligned platform rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Platform {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Whether a body centred at `x` with `radius` overlaps the platform horizontally
    #[inline]
    pub fn overlaps_x(&self, x: f32, radius: f32) -> bool {
        x + radius > self.x && x - radius < self.right()
    }

    fn is_valid(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite()) && self.w > 0.0 && self.h > 0.0
    }
}

/// Map loading errors
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Platform layout for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    pub platforms: Vec<Platform>,
    /// Solid floor along the bottom of the world; floorless maps eliminate fallers
    pub has_floor: bool,
    /// False when the platforms came from the fallback builder
    pub authored: bool,
}

impl GameMap {
    /// The built-in ladder for a world of `world_height`
    pub fn fallback(world_height: f32) -> Self {
        Self {
            platforms: fallback_platforms(world_height),
            has_floor: true,
            authored: false,
        }
    }

    /// Build from a parsed map object.
    ///
    /// Uses `platforms` when it is an array; entries that are not valid
    /// `{x, y, w, h}` rectangles are skipped. A missing or non-array field
    /// falls back to the built-in ladder. `has_floor` defaults to true.
    pub fn from_json(value: &Value, world_height: f32) -> Self {
        let has_floor = value.get("has_floor").and_then(Value::as_bool).unwrap_or(true);

        let Some(entries) = value.get("platforms").and_then(Value::as_array) else {
            debug!("Map has no platform list, using fallback ladder");
            return Self::fallback(world_height);
        };

        let mut platforms = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match serde_json::from_value::<Platform>(entry.clone()) {
                Ok(platform) if platform.is_valid() => platforms.push(platform),
                Ok(_) => warn!("Skipping degenerate platform #{}", index),
                Err(e) => warn!("Skipping malformed platform #{}: {}", index, e),
            }
        }

        Self {
            platforms,
            has_floor,
            authored: true,
        }
    }

    pub fn from_json_str(raw: &str, world_height: f32) -> Result<Self, MapError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_json(&value, world_height))
    }

    /// Recompute the fallback ladder after the world height changed (authored maps are kept)
    pub fn resize(&mut self, world_height: f32) {
        if !self.authored {
            self.platforms = fallback_platforms(world_height);
        }
    }
}

/// Deterministic fallback ladder.
///
/// Rungs are spaced `LADDER_STEP_Y` apart starting one step above the floor,
/// stopping at `LADDER_TOP_MARGIN`. The topmost rung is the summit under the
/// goal line; the others zigzag through `LADDER_COLUMNS` counted from the top.
pub fn fallback_platforms(world_height: f32) -> Vec<Platform> {
    let floor_y = world_height - world::FLOOR_THICKNESS;

    let mut rung_ys = Vec::new();
    let mut y = floor_y - map::LADDER_STEP_Y;
    while y >= map::LADDER_TOP_MARGIN {
        rung_ys.push(y);
        y -= map::LADDER_STEP_Y;
    }

    let Some((&summit_y, below)) = rung_ys.split_last() else {
        return Vec::new();
    };

    let mut platforms: Vec<Platform> = below
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let from_top = below.len() - 1 - i;
            let x = map::LADDER_COLUMNS[from_top % map::LADDER_COLUMNS.len()];
            Platform::new(x, y, map::PLATFORM_WIDTH, map::PLATFORM_HEIGHT)
        })
        .collect();
    platforms.push(Platform::new(
        map::SUMMIT_X,
        summit_y,
        map::SUMMIT_WIDTH,
        map::PLATFORM_HEIGHT,
    ));
    platforms
}
