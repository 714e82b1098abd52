//! Drawing surface abstraction
//!
//! `DrawContext` is the capability set the renderer needs from a 2D canvas:
//! fill/stroke state, rectangles, paths, arcs and text. `RecordingSurface`
//! implements it by recording every call as a serializable `DrawOp`.

use serde::{Deserialize, Serialize};

use crate::util::color::Color;

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// 2D drawing context
pub trait DrawContext {
    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
    fn set_global_alpha(&mut self, alpha: f32);
    fn set_line_width(&mut self, width: f32);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    /// Rendered width of `text` in the current font
    fn measure_text(&self, text: &str) -> f32;
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    FillStyle { color: Color },
    StrokeStyle { color: Color },
    GlobalAlpha { alpha: f32 },
    LineWidth { width: f32 },
    Font { font: String },
    TextAlign { align: TextAlign },
    ClearRect { x: f32, y: f32, w: f32, h: f32 },
    FillRect { x: f32, y: f32, w: f32, h: f32 },
    StrokeRect { x: f32, y: f32, w: f32, h: f32 },
    BeginPath,
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    Arc { x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32 },
    ClosePath,
    Fill,
    Stroke,
    FillText { text: String, x: f32, y: f32 },
}

/// Default advance per character for `RecordingSurface::measure_text`
pub const DEFAULT_GLYPH_WIDTH: f32 = 7.0;

/// Headless surface that records draw calls
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
    glyph_width: f32,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::with_glyph_width(DEFAULT_GLYPH_WIDTH)
    }

    pub fn with_glyph_width(glyph_width: f32) -> Self {
        Self {
            ops: Vec::new(),
            glyph_width,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Take the recorded frame, leaving the surface empty
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// All text drawn this frame, in order
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.ops)
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawContext for RecordingSurface {
    fn set_fill_style(&mut self, color: Color) {
        self.ops.push(DrawOp::FillStyle { color });
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.ops.push(DrawOp::StrokeStyle { color });
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.ops.push(DrawOp::GlobalAlpha { alpha });
    }

    fn set_line_width(&mut self, width: f32) {
        self.ops.push(DrawOp::LineWidth { width });
    }

    fn set_font(&mut self, font: &str) {
        self.ops.push(DrawOp::Font { font: font.to_string() });
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.ops.push(DrawOp::TextAlign { align });
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(DrawOp::ClearRect { x, y, w, h });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(DrawOp::FillRect { x, y, w, h });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(DrawOp::StrokeRect { x, y, w, h });
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.ops.push(DrawOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.ops.push(DrawOp::LineTo { x, y });
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32) {
        self.ops.push(DrawOp::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn measure_text(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.glyph_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_call_order() {
        let mut surface = RecordingSurface::new();
        surface.begin_path();
        surface.arc(1.0, 2.0, 3.0, 0.0, std::f32::consts::TAU);
        surface.fill();

        assert_eq!(surface.len(), 3);
        assert_eq!(surface.ops()[0], DrawOp::BeginPath);
        assert!(matches!(surface.ops()[1], DrawOp::Arc { radius, .. } if radius == 3.0));
        assert_eq!(surface.ops()[2], DrawOp::Fill);
    }

    #[test]
    fn test_measure_text_counts_chars() {
        let surface = RecordingSurface::with_glyph_width(5.0);
        assert_eq!(surface.measure_text("abc"), 15.0);
        // Multi-byte characters count once
        assert_eq!(surface.measure_text("ağ"), 10.0);
        assert_eq!(surface.measure_text(""), 0.0);
    }

    #[test]
    fn test_take_ops_empties() {
        let mut surface = RecordingSurface::new();
        surface.fill_text("hi", 0.0, 0.0);
        let ops = surface.take_ops();
        assert_eq!(ops.len(), 1);
        assert!(surface.is_empty());
    }

    #[test]
    fn test_json_dump_is_tagged() {
        let mut surface = RecordingSurface::new();
        surface.fill_rect(0.0, 0.0, 10.0, 5.0);
        let json = surface.to_json().unwrap();
        assert!(json.contains("\"op\":\"fill_rect\""));

        let decoded: Vec<DrawOp> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, surface.ops());
    }
}
