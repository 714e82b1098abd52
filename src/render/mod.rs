//! Frame renderer
//!
//! `render` paints one `FrameSnapshot` onto any `DrawContext`. It only reads
//! the snapshot, so it can run at its own rate or skip frames entirely.

pub mod pacing;
pub mod surface;

use std::f32::consts::TAU;

use crate::config::WorldConfig;
use crate::game::constants::render::*;
use crate::game::map::GameMap;
use crate::game::state::Player;
use crate::game::systems::particles::Particle;
use crate::util::color::Color;
use crate::util::vec2::Vec2;

pub use pacing::{FramePacer, PacerStatus};
pub use surface::{DrawContext, DrawOp, RecordingSurface, TextAlign};

/// Read-only view of everything a frame needs
#[derive(Debug, Clone)]
pub struct FrameSnapshot<'a> {
    /// Roster in join order (dead players included, the renderer skips them)
    pub players: Vec<&'a Player>,
    pub particles: &'a [Particle],
    pub map: &'a GameMap,
    pub world: &'a WorldConfig,
    pub player_radius: f32,
    pub running: bool,
    pub duration_ms: u64,
    /// Clock reading when the round started
    pub start_ms: Option<u64>,
    /// Clock reading for this frame
    pub now_ms: u64,
}

impl FrameSnapshot<'_> {
    pub fn elapsed_ms(&self) -> u64 {
        self.start_ms.map_or(0, |start| self.now_ms.saturating_sub(start))
    }
}

/// Whole seconds left on the clock, rounded up
pub fn countdown_seconds(duration_ms: u64, elapsed_ms: u64) -> u64 {
    duration_ms.saturating_sub(elapsed_ms).div_ceil(1000)
}

/// Alpha of the trail point at `index` (0 = oldest)
#[inline]
pub fn trail_alpha(index: usize) -> f32 {
    (index as f32 * TRAIL_ALPHA_STEP).min(1.0)
}

/// Draw one frame
pub fn render<C: DrawContext + ?Sized>(ctx: &mut C, frame: &FrameSnapshot<'_>) {
    let world = frame.world;
    ctx.set_global_alpha(1.0);
    ctx.clear_rect(0.0, 0.0, world.width, world.height);

    draw_sky(ctx, world);
    draw_map(ctx, frame.map, world);
    draw_goal(ctx, world);

    let living = || frame.players.iter().copied().filter(|p| p.alive);
    for player in living() {
        draw_trail(ctx, player, frame.player_radius);
    }
    for player in living() {
        draw_player(ctx, player, frame.player_radius);
    }

    draw_particles(ctx, frame.particles);

    if frame.running {
        draw_countdown(ctx, world, countdown_seconds(frame.duration_ms, frame.elapsed_ms()));
    }
}

fn fill_circle<C: DrawContext + ?Sized>(ctx: &mut C, center: Vec2, radius: f32) {
    ctx.begin_path();
    ctx.arc(center.x, center.y, radius, 0.0, TAU);
    ctx.fill();
}

fn draw_sky<C: DrawContext + ?Sized>(ctx: &mut C, world: &WorldConfig) {
    let band_height = world.height / SKY_BANDS as f32;
    for band in 0..SKY_BANDS {
        let t = band as f32 / (SKY_BANDS - 1).max(1) as f32;
        ctx.set_fill_style(SKY_COLOR.mix(SKY_HORIZON_COLOR, t));
        ctx.fill_rect(0.0, band as f32 * band_height, world.width, band_height + SKY_BAND_OVERLAP);
    }
}

fn draw_map<C: DrawContext + ?Sized>(ctx: &mut C, map: &GameMap, world: &WorldConfig) {
    if map.has_floor {
        ctx.set_fill_style(FLOOR_COLOR);
        ctx.fill_rect(0.0, world.floor_y(), world.width, world.floor_thickness);
    }

    ctx.set_line_width(PLATFORM_EDGE_WIDTH);
    for platform in &map.platforms {
        ctx.set_fill_style(PLATFORM_COLOR);
        ctx.fill_rect(platform.x, platform.y, platform.w, platform.h);
        ctx.set_stroke_style(PLATFORM_EDGE_COLOR);
        ctx.stroke_rect(platform.x, platform.y, platform.w, platform.h);
    }
}

fn draw_goal<C: DrawContext + ?Sized>(ctx: &mut C, world: &WorldConfig) {
    ctx.set_stroke_style(GOAL_COLOR);
    ctx.set_line_width(GOAL_LINE_WIDTH);
    ctx.begin_path();
    ctx.move_to(world.goal_x, 0.0);
    ctx.line_to(world.goal_x, world.goal_band_y);
    ctx.line_to(world.width, world.goal_band_y);
    ctx.stroke();
}

fn draw_trail<C: DrawContext + ?Sized>(ctx: &mut C, player: &Player, radius: f32) {
    ctx.set_fill_style(player.color());
    for (index, point) in player.trail.iter().enumerate() {
        ctx.set_global_alpha(trail_alpha(index));
        fill_circle(ctx, *point, radius * TRAIL_RADIUS_SCALE);
    }
    ctx.set_global_alpha(1.0);
}

fn draw_player<C: DrawContext + ?Sized>(ctx: &mut C, player: &Player, radius: f32) {
    let center = player.position;

    // Body
    ctx.set_fill_style(player.color());
    fill_circle(ctx, center, radius);
    ctx.set_stroke_style(BODY_OUTLINE_COLOR);
    ctx.set_line_width(BODY_OUTLINE_WIDTH);
    ctx.stroke();

    // Eyes look toward the direction of travel
    let look = if player.velocity.x > 0.0 {
        PUPIL_LOOK_SHIFT
    } else if player.velocity.x < 0.0 {
        -PUPIL_LOOK_SHIFT
    } else {
        0.0
    };
    for side in [-1.0, 1.0] {
        let eye = center + Vec2::new(side * EYE_OFFSET_X, EYE_OFFSET_Y);
        ctx.set_fill_style(Color::WHITE);
        fill_circle(ctx, eye, EYE_RADIUS);
        ctx.set_fill_style(Color::BLACK);
        fill_circle(ctx, eye + Vec2::new(look, 0.0), PUPIL_RADIUS);
    }

    draw_label(ctx, &player.username, center, radius);
}

fn draw_label<C: DrawContext + ?Sized>(ctx: &mut C, name: &str, center: Vec2, radius: f32) {
    ctx.set_font(LABEL_FONT);
    let plate_width = ctx.measure_text(name) + LABEL_PADDING * 2.0;
    let plate_x = center.x - plate_width / 2.0;
    let plate_y = center.y - radius - LABEL_GAP - LABEL_HEIGHT;

    ctx.set_global_alpha(LABEL_PLATE_ALPHA);
    ctx.set_fill_style(LABEL_PLATE_COLOR);
    ctx.fill_rect(plate_x, plate_y, plate_width, LABEL_HEIGHT);
    ctx.set_global_alpha(1.0);

    ctx.set_fill_style(LABEL_TEXT_COLOR);
    ctx.set_text_align(TextAlign::Center);
    ctx.fill_text(name, center.x, plate_y + LABEL_HEIGHT - LABEL_PADDING);
}

fn draw_particles<C: DrawContext + ?Sized>(ctx: &mut C, particles: &[Particle]) {
    for particle in particles {
        ctx.set_global_alpha(particle.alpha());
        ctx.set_fill_style(particle.color);
        fill_circle(ctx, particle.position, particle.radius);
    }
    ctx.set_global_alpha(1.0);
}

fn draw_countdown<C: DrawContext + ?Sized>(ctx: &mut C, world: &WorldConfig, seconds: u64) {
    ctx.set_font(COUNTDOWN_FONT);
    ctx.set_fill_style(COUNTDOWN_COLOR);
    ctx.set_text_align(TextAlign::Right);
    ctx.fill_text(&seconds.to_string(), world.width - COUNTDOWN_MARGIN, COUNTDOWN_Y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::Platform;
    use crate::game::systems::particles::{BurstKind, ParticleSystem};
    use uuid::Uuid;

    struct Fixture {
        players: Vec<Player>,
        particles: ParticleSystem,
        map: GameMap,
        world: WorldConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let mut alive = Player::new(Uuid::new_v4(), "ayse".into(), 0, 0);
            alive.position = Vec2::new(100.0, 500.0);
            let mut dead = Player::new(Uuid::new_v4(), "ghost".into(), 1, 1);
            dead.position = Vec2::new(300.0, 500.0);
            dead.record_trail(4);
            dead.eliminate();

            Self {
                players: vec![alive, dead],
                particles: ParticleSystem::new(1),
                map: GameMap {
                    platforms: vec![Platform::new(200.0, 400.0, 150.0, 14.0)],
                    has_floor: true,
                    authored: true,
                },
                world: WorldConfig::default(),
            }
        }

        fn snapshot(&self, running: bool, now_ms: u64) -> FrameSnapshot<'_> {
            FrameSnapshot {
                players: self.players.iter().collect(),
                particles: self.particles.particles(),
                map: &self.map,
                world: &self.world,
                player_radius: 14.0,
                running,
                duration_ms: 180_000,
                start_ms: Some(0),
                now_ms,
            }
        }
    }

    fn draw(fixture: &Fixture, running: bool, now_ms: u64) -> RecordingSurface {
        let mut surface = RecordingSurface::new();
        render(&mut surface, &fixture.snapshot(running, now_ms));
        surface
    }

    #[test]
    fn test_countdown_seconds() {
        assert_eq!(countdown_seconds(180_000, 178_500), 2);
        assert_eq!(countdown_seconds(180_000, 0), 180);
        assert_eq!(countdown_seconds(180_000, 179_001), 1);
        assert_eq!(countdown_seconds(180_000, 180_000), 0);
        assert_eq!(countdown_seconds(180_000, 250_000), 0);
    }

    #[test]
    fn test_countdown_drawn_only_while_running() {
        let fixture = Fixture::new();
        let running = draw(&fixture, true, 178_500);
        assert!(running.texts().contains(&"2"));

        let stopped = draw(&fixture, false, 178_500);
        assert!(!stopped.texts().contains(&"2"));
    }

    #[test]
    fn test_dead_players_skipped() {
        let fixture = Fixture::new();
        let surface = draw(&fixture, false, 0);

        let texts = surface.texts();
        assert!(texts.contains(&"ayse"));
        assert!(!texts.contains(&"ghost"));

        // Nothing is drawn at the dead player's position
        let touches_dead = surface.ops().iter().any(|op| {
            matches!(op, DrawOp::Arc { x, y, .. } if (*x - 300.0).abs() < 20.0 && (*y - 500.0).abs() < 20.0)
        });
        assert!(!touches_dead);
    }

    #[test]
    fn test_label_plate_uses_measured_width() {
        let fixture = Fixture::new();
        let surface = draw(&fixture, false, 0);

        let expected = surface.measure_text("ayse") + LABEL_PADDING * 2.0;
        let plate = surface.ops().iter().find_map(|op| match op {
            DrawOp::FillRect { w, h, .. } if *h == LABEL_HEIGHT => Some(*w),
            _ => None,
        });
        assert_eq!(plate, Some(expected));
    }

    #[test]
    fn test_map_styling_comes_from_constants() {
        let fixture = Fixture::new();
        let surface = draw(&fixture, false, 0);
        let ops = surface.ops();

        let first_band = ops.iter().find_map(|op| match op {
            DrawOp::FillRect { h, .. } => Some(*h),
            _ => None,
        });
        let band_height = fixture.world.height / SKY_BANDS as f32;
        assert_eq!(first_band, Some(band_height + SKY_BAND_OVERLAP));

        let edge = ops
            .iter()
            .position(|op| matches!(op, DrawOp::StrokeRect { x, .. } if *x == 200.0))
            .unwrap();
        let width = ops[..edge].iter().rev().find_map(|op| match op {
            DrawOp::LineWidth { width } => Some(*width),
            _ => None,
        });
        assert_eq!(width, Some(PLATFORM_EDGE_WIDTH));
    }

    #[test]
    fn test_trail_alpha_oldest_faintest() {
        let mut fixture = Fixture::new();
        for i in 0..5 {
            fixture.players[0].position = Vec2::new(100.0 + i as f32, 500.0);
            fixture.players[0].record_trail(TRAIL_LENGTH);
        }
        let surface = draw(&fixture, false, 0);

        let alphas: Vec<f32> = surface
            .ops()
            .windows(3)
            .filter_map(|w| match (&w[0], &w[2]) {
                (DrawOp::GlobalAlpha { alpha }, DrawOp::Arc { radius, .. })
                    if (*radius - 14.0 * TRAIL_RADIUS_SCALE).abs() < 1e-5 =>
                {
                    Some(*alpha)
                }
                _ => None,
            })
            .collect();

        assert_eq!(alphas.len(), 5);
        for (index, alpha) in alphas.iter().enumerate() {
            assert!((alpha - index as f32 * TRAIL_ALPHA_STEP).abs() < 1e-6);
        }
        assert!(alphas.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(trail_alpha(0), 0.0);
    }

    #[test]
    fn test_draw_order() {
        let mut fixture = Fixture::new();
        fixture
            .particles
            .burst(Vec2::new(50.0, 50.0), Color::WHITE, BurstKind::Land);
        let surface = draw(&fixture, true, 1_000);
        let ops = surface.ops();

        let position = |pred: fn(&DrawOp) -> bool| ops.iter().position(pred);
        let clear = position(|op| matches!(op, DrawOp::ClearRect { .. })).unwrap();
        let platform = position(|op| matches!(op, DrawOp::StrokeRect { .. })).unwrap();
        let label = position(|op| matches!(op, DrawOp::FillText { text, .. } if text == "ayse")).unwrap();
        let particle =
            position(|op| matches!(op, DrawOp::Arc { x, y, .. } if *x == 50.0 && *y == 50.0)).unwrap();
        let countdown = position(|op| matches!(op, DrawOp::FillText { text, .. } if text == "179")).unwrap();

        assert!(clear < platform);
        assert!(platform < label);
        assert!(label < particle);
        assert!(particle < countdown);
    }

    #[test]
    fn test_render_does_not_mutate_snapshot() {
        let fixture = Fixture::new();
        let before = serde_json::to_string(&fixture.players).unwrap();
        let map_before = fixture.map.clone();

        let snapshot = fixture.snapshot(true, 10_000);
        let mut surface = RecordingSurface::new();
        render(&mut surface, &snapshot);
        render(&mut surface, &snapshot);

        assert_eq!(serde_json::to_string(&fixture.players).unwrap(), before);
        assert_eq!(fixture.map, map_before);
    }

    #[test]
    fn test_render_is_repeatable() {
        let fixture = Fixture::new();
        let a = draw(&fixture, true, 42_000);
        let b = draw(&fixture, true, 42_000);
        assert_eq!(a.ops(), b.ops());
    }

    #[test]
    fn test_floorless_map_draws_no_floor() {
        let mut fixture = Fixture::new();
        fixture.map.has_floor = false;
        let surface = draw(&fixture, false, 0);
        let floor_y = fixture.world.floor_y();
        assert!(!surface.ops().iter().any(|op| matches!(
            op,
            DrawOp::FillRect { y, h, .. } if *y == floor_y && *h == fixture.world.floor_thickness
        )));
    }
}
