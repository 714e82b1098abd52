//! Render pacing
//!
//! Tracks how long frames take to draw and thins out rendering when it
//! falls behind, so a slow surface never holds up the simulation tick.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples needed before the pacer starts judging
const MIN_SAMPLES: usize = 10;

/// Pacing status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerStatus {
    /// Frames fit the budget, render every frame
    Smooth,
    /// Frames are close to or slightly over budget, render every other frame
    Strained,
    /// Frames are far over budget, render one frame in four
    Overloaded,
}

impl PacerStatus {
    /// Render one frame out of this many
    pub fn render_interval(&self) -> u32 {
        match self {
            PacerStatus::Smooth => 1,
            PacerStatus::Strained => 2,
            PacerStatus::Overloaded => 4,
        }
    }
}

/// Rolling-window frame pacer
pub struct FramePacer {
    /// Rolling window of render durations
    frame_durations: VecDeque<Duration>,
    max_samples: usize,
    /// Time one frame may take
    frame_budget: Duration,
    /// Above this fraction of budget frames start being skipped
    strained_threshold: f32,
    /// Above this fraction of budget only one frame in four is drawn
    overloaded_threshold: f32,
    status: PacerStatus,
    frame_start: Option<Instant>,
    frames_since_render: u32,
    rendered: u64,
    skipped: u64,
}

impl FramePacer {
    pub fn new(target_fps: u32) -> Self {
        let frame_budget = Duration::from_secs_f32(1.0 / target_fps.max(1) as f32);

        Self {
            frame_durations: VecDeque::with_capacity(120),
            max_samples: 120,
            frame_budget,
            strained_threshold: 0.8,
            overloaded_threshold: 1.5,
            status: PacerStatus::Smooth,
            frame_start: None,
            frames_since_render: 0,
            rendered: 0,
            skipped: 0,
        }
    }

    /// Whether this frame should be drawn. Call once per frame opportunity.
    pub fn should_render(&mut self) -> bool {
        self.frames_since_render += 1;
        if self.frames_since_render >= self.status.render_interval() {
            self.frames_since_render = 0;
            self.rendered += 1;
            true
        } else {
            self.skipped += 1;
            false
        }
    }

    /// Start timing a frame
    pub fn frame_start(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// End timing a frame and record the duration
    pub fn frame_end(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.record_frame(start.elapsed());
        }
    }

    fn record_frame(&mut self, duration: Duration) {
        self.frame_durations.push_back(duration);
        while self.frame_durations.len() > self.max_samples {
            self.frame_durations.pop_front();
        }
        self.update_status();
    }

    fn update_status(&mut self) {
        if self.frame_durations.len() < MIN_SAMPLES {
            return;
        }

        let ratio = self.average_frame_duration().as_secs_f32() / self.frame_budget.as_secs_f32();
        self.status = if ratio < self.strained_threshold {
            PacerStatus::Smooth
        } else if ratio < self.overloaded_threshold {
            PacerStatus::Strained
        } else {
            PacerStatus::Overloaded
        };
    }

    pub fn average_frame_duration(&self) -> Duration {
        if self.frame_durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.frame_durations.iter().sum();
        sum / self.frame_durations.len() as u32
    }

    /// 95th percentile frame duration
    pub fn p95_frame_duration(&self) -> Duration {
        if self.frame_durations.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.frame_durations.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted.get(idx.min(sorted.len() - 1)).copied().unwrap_or(Duration::ZERO)
    }

    pub fn status(&self) -> PacerStatus {
        self.status
    }

    /// Budget usage as percentage (0-100+)
    pub fn budget_usage_percent(&self) -> f32 {
        (self.average_frame_duration().as_secs_f32() / self.frame_budget.as_secs_f32()) * 100.0
    }

    pub fn rendered_frames(&self) -> u64 {
        self.rendered
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped
    }

    pub fn status_message(&self) -> String {
        format!(
            "{:?} - {:.1}% budget, {} rendered, {} skipped",
            self.status,
            self.budget_usage_percent(),
            self.rendered,
            self.skipped
        )
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(60)
    }
}
