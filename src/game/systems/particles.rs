//! Cosmetic particle bursts
//! Spawned on jumps, landings, finishes and eliminations; never feed back into physics.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::constants::particles::{
    ELIMINATION_BURST, FINISH_BURST, GRAVITY, JUMP_BURST, LAND_BURST, LIFETIME_TICKS, MAX_COUNT,
    RADIUS, SPEED,
};
use crate::game::constants::render::GOAL_COLOR;
use crate::game::state::Player;
use crate::game::systems::physics::StepOutcome;
use crate::util::color::Color;
use crate::util::vec2::Vec2;

/// Extra upward kick for finish confetti
const FINISH_LIFT: f32 = 1.5;

/// A single particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
    pub radius: f32,
    pub age: u32,
    pub lifetime: u32,
}

impl Particle {
    /// Linear fade from 1 at birth to 0 at end of life
    #[inline]
    pub fn alpha(&self) -> f32 {
        if self.lifetime == 0 {
            return 0.0;
        }
        1.0 - (self.age as f32 / self.lifetime as f32).min(1.0)
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Kind of burst, selects count and spread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    Jump,
    Land,
    Finish,
    Elimination,
}

impl BurstKind {
    fn count(self) -> usize {
        match self {
            BurstKind::Jump => JUMP_BURST,
            BurstKind::Land => LAND_BURST,
            BurstKind::Finish => FINISH_BURST,
            BurstKind::Elimination => ELIMINATION_BURST,
        }
    }
}

/// Particle pool with a seeded RNG so replays look the same
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
    capacity: usize,
}

impl ParticleSystem {
    pub fn new(seed: u64) -> Self {
        Self::with_capacity(seed, MAX_COUNT)
    }

    pub fn with_capacity(seed: u64, capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity.min(MAX_COUNT)),
            rng: StdRng::seed_from_u64(seed),
            capacity,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Spawn a burst at `origin`; silently truncated at capacity
    pub fn burst(&mut self, origin: Vec2, color: Color, kind: BurstKind) {
        let room = self.capacity.saturating_sub(self.particles.len());
        let count = kind.count().min(room);

        for _ in 0..count {
            let angle = match kind {
                // Jumps spray downward from the feet, landings splash sideways
                BurstKind::Jump => self.rng.gen_range(0.25..0.75) * std::f32::consts::PI,
                BurstKind::Land => {
                    if self.rng.gen_bool(0.5) {
                        self.rng.gen_range(-0.15..0.15) * std::f32::consts::PI
                    } else {
                        self.rng.gen_range(0.85..1.15) * std::f32::consts::PI
                    }
                }
                BurstKind::Finish | BurstKind::Elimination => {
                    self.rng.gen_range(0.0..std::f32::consts::TAU)
                }
            };
            let speed = self.rng.gen_range(0.4..1.0) * SPEED;
            let mut velocity = Vec2::new(angle.cos() * speed, angle.sin() * speed);
            if kind == BurstKind::Finish {
                velocity.y -= FINISH_LIFT;
            }

            self.particles.push(Particle {
                position: origin,
                velocity,
                color,
                radius: RADIUS * self.rng.gen_range(0.6..1.2),
                age: 0,
                lifetime: LIFETIME_TICKS,
            });
        }
    }

    /// Spawn whatever bursts a step outcome calls for
    pub fn on_step(&mut self, player: &Player, outcome: &StepOutcome, radius: f32) {
        let color = player.color();
        let feet = player.position + Vec2::new(0.0, radius);

        if outcome.jumped || outcome.double_jumped {
            self.burst(feet, color, BurstKind::Jump);
        }
        if outcome.landed {
            self.burst(feet, color, BurstKind::Land);
        }
        if outcome.finished {
            self.burst(player.position, GOAL_COLOR, BurstKind::Finish);
        }
        if outcome.eliminated {
            self.burst(player.position, color, BurstKind::Elimination);
        }
    }

    /// Integrate one tick and drop expired particles
    pub fn update(&mut self) {
        for particle in self.particles.iter_mut() {
            particle.velocity.y += GRAVITY;
            particle.position += particle.velocity;
            particle.age += 1;
        }
        self.particles.retain(|p| !p.is_expired());
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(0)
    }
}
