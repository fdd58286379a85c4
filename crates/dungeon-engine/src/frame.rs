//! Backend-neutral draw list.
//!
//! Scenes describe a frame as a list of [`DrawCommand`]s in viewport pixels
//! (origin top-left, y down). Commands are painted in order, later ones on
//! top.

use dungeon_physics::color::Rgba;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Filled axis-aligned rectangle; `(x, y)` is the top-left corner.
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        color: Rgba,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
        color: Rgba,
    },
    /// Bitmap text; `(x, y)` is the top-left of the first glyph.
    Text {
        text: String,
        x: f32,
        y: f32,
        scale: f32,
        color: Rgba,
    },
}

#[derive(Debug, Clone)]
pub struct Frame {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.commands.push(DrawCommand::Rect { x, y, w, h, color });
    }

    /// Rectangle outline drawn inside the given bounds.
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, thickness: f32, color: Rgba) {
        let t = thickness.min(w / 2.0).min(h / 2.0);
        self.fill_rect(x, y, w, t, color);
        self.fill_rect(x, y + h - t, w, t, color);
        self.fill_rect(x, y + t, t, h - 2.0 * t, color);
        self.fill_rect(x + w - t, y + t, t, h - 2.0 * t, color);
    }

    pub fn circle(&mut self, x: f32, y: f32, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            x,
            y,
            radius,
            color,
        });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            thickness,
            color,
        });
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, scale: f32, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            text: text.into(),
            x,
            y,
            scale,
            color,
        });
    }

    /// Drop all commands and resize for the next frame.
    pub fn clear(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_keep_submission_order() {
        let mut frame = Frame::new(100.0, 50.0);
        frame.fill_rect(0.0, 0.0, 10.0, 10.0, Rgba::BLACK);
        frame.circle(5.0, 5.0, 2.0, Rgba::WHITE);
        frame.text("HI", 1.0, 1.0, 2.0, Rgba::YELLOW);
        assert_eq!(frame.len(), 3);
        assert!(matches!(frame.commands()[0], DrawCommand::Rect { .. }));
        assert!(matches!(frame.commands()[1], DrawCommand::Circle { .. }));
        assert!(matches!(&frame.commands()[2], DrawCommand::Text { text, .. } if text == "HI"));
    }

    #[test]
    fn stroke_rect_emits_four_edges_inside_bounds() {
        let mut frame = Frame::new(100.0, 100.0);
        frame.stroke_rect(10.0, 10.0, 40.0, 20.0, 2.0, Rgba::WHITE);
        assert_eq!(frame.len(), 4);
        for cmd in frame.commands() {
            let DrawCommand::Rect { x, y, w, h, .. } = *cmd else {
                panic!("expected rect, got {cmd:?}");
            };
            assert!(x >= 10.0 && y >= 10.0);
            assert!(x + w <= 50.0 && y + h <= 30.0);
        }
    }

    #[test]
    fn clear_resets_and_resizes() {
        let mut frame = Frame::new(10.0, 10.0);
        frame.line(0.0, 0.0, 1.0, 1.0, 1.0, Rgba::WHITE);
        frame.clear(20.0, 30.0);
        assert!(frame.is_empty());
        assert_eq!((frame.width(), frame.height()), (20.0, 30.0));
    }
}
