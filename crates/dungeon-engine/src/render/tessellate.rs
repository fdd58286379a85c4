//! Draw list to triangle list.
//!
//! Every [`DrawCommand`](crate::frame::DrawCommand) becomes plain coloured
//! triangles: rects and lines as two-triangle quads, circles as triangle
//! fans, text as one quad per lit glyph pixel. Positions stay in viewport
//! pixels; [`ScreenCamera`] maps them to clip space on the GPU.

use std::f32::consts::TAU;

use dungeon_physics::color::Rgba;

use super::text::TextRenderer;
use crate::frame::{DrawCommand, Frame};

// ---------------------------------------------------------------------------
// Vertex
// ---------------------------------------------------------------------------

/// A single vertex with 2D position and RGBA colour, sent to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "renderer",
    derive(bytemuck_derive::Pod, bytemuck_derive::Zeroable)
)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

pub const VERTICES_PER_QUAD: usize = 6;

const MIN_CIRCLE_SEGMENTS: usize = 12;
const MAX_CIRCLE_SEGMENTS: usize = 64;

// ---------------------------------------------------------------------------
// ScreenCamera
// ---------------------------------------------------------------------------

/// Orthographic projection for a top-left-origin, y-down viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenCamera {
    pub width: f32,
    pub height: f32,
}

impl ScreenCamera {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Column-major 4x4 matrix mapping `[0, w] x [0, h]` to clip space,
    /// with viewport y = 0 at the top of the screen.
    pub fn orthographic_matrix(&self) -> [f32; 16] {
        let sx = 2.0 / self.width;
        let sy = -2.0 / self.height;
        [
            sx, 0.0, 0.0, 0.0, // column 0
            0.0, sy, 0.0, 0.0, // column 1
            0.0, 0.0, 1.0, 0.0, // column 2
            -1.0, 1.0, 0.0, 1.0, // column 3
        ]
    }

    /// Apply the projection on the CPU.
    pub fn to_clip(&self, x: f32, y: f32) -> [f32; 2] {
        let m = self.orthographic_matrix();
        [m[0] * x + m[12], m[5] * y + m[13]]
    }
}

// ---------------------------------------------------------------------------
// Tessellator
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Tessellator {
    text: TextRenderer,
    vertices: Vec<Vertex>,
}

impl Tessellator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the vertex list for `frame`. The returned slice is valid
    /// until the next call.
    pub fn tessellate(&mut self, frame: &Frame) -> &[Vertex] {
        self.vertices.clear();
        for command in frame.commands() {
            match command {
                DrawCommand::Rect { x, y, w, h, color } => {
                    self.quad(*x, *y, *w, *h, *color);
                }
                DrawCommand::Circle {
                    x,
                    y,
                    radius,
                    color,
                } => self.circle(*x, *y, *radius, *color),
                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    thickness,
                    color,
                } => self.line(*x1, *y1, *x2, *y2, *thickness, *color),
                DrawCommand::Text {
                    text,
                    x,
                    y,
                    scale,
                    color,
                } => {
                    for p in self.text.layout(text, *x, *y, *scale) {
                        push_quad(&mut self.vertices, p.x, p.y, p.size, p.size, *color);
                    }
                }
            }
        }
        &self.vertices
    }

    fn quad(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        if w > 0.0 && h > 0.0 {
            push_quad(&mut self.vertices, x, y, w, h, color);
        }
    }

    fn circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let segments = circle_segments(radius);
        let c = color.to_f32_array();
        let point = |i: usize| {
            let angle = TAU * i as f32 / segments as f32;
            [cx + radius * angle.cos(), cy + radius * angle.sin()]
        };
        for i in 0..segments {
            self.vertices.push(Vertex {
                position: [cx, cy],
                color: c,
            });
            self.vertices.push(Vertex {
                position: point(i),
                color: c,
            });
            self.vertices.push(Vertex {
                position: point(i + 1),
                color: c,
            });
        }
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, color: Rgba) {
        let (dx, dy) = (x2 - x1, y2 - y1);
        let len = dx.hypot(dy);
        if len == 0.0 || thickness <= 0.0 {
            return;
        }
        // Perpendicular offset of half the thickness.
        let (nx, ny) = (-dy / len * thickness / 2.0, dx / len * thickness / 2.0);
        let c = color.to_f32_array();
        let corners = [
            [x1 + nx, y1 + ny],
            [x2 + nx, y2 + ny],
            [x2 - nx, y2 - ny],
            [x1 - nx, y1 - ny],
        ];
        for i in [0, 1, 2, 0, 2, 3] {
            self.vertices.push(Vertex {
                position: corners[i],
                color: c,
            });
        }
    }
}

/// Segment count for a circle fan: more for larger circles, within bounds.
pub fn circle_segments(radius: f32) -> usize {
    ((radius * 0.75) as usize).clamp(MIN_CIRCLE_SEGMENTS, MAX_CIRCLE_SEGMENTS)
}

fn push_quad(vertices: &mut Vec<Vertex>, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
    let c = color.to_f32_array();
    let (l, t, r, b) = (x, y, x + w, y + h);
    for position in [[l, t], [r, t], [r, b], [l, t], [r, b], [l, b]] {
        vertices.push(Vertex { position, color: c });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_maps_corners_to_clip_space() {
        let cam = ScreenCamera::new(800.0, 600.0);
        let close = |a: [f32; 2], b: [f32; 2]| (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5;
        assert!(close(cam.to_clip(0.0, 0.0), [-1.0, 1.0]));
        assert!(close(cam.to_clip(800.0, 600.0), [1.0, -1.0]));
        assert!(close(cam.to_clip(400.0, 300.0), [0.0, 0.0]));
    }

    #[test]
    fn rect_is_one_quad_covering_its_bounds() {
        let mut frame = Frame::new(100.0, 100.0);
        frame.fill_rect(10.0, 20.0, 30.0, 40.0, Rgba::WHITE);
        let mut tess = Tessellator::new();
        let verts = tess.tessellate(&frame);
        assert_eq!(verts.len(), VERTICES_PER_QUAD);
        for v in verts {
            assert!(v.position[0] == 10.0 || v.position[0] == 40.0);
            assert!(v.position[1] == 20.0 || v.position[1] == 60.0);
            assert_eq!(v.color, [1.0; 4]);
        }
    }

    #[test]
    fn degenerate_shapes_emit_nothing() {
        let mut frame = Frame::new(100.0, 100.0);
        frame.fill_rect(0.0, 0.0, 0.0, 10.0, Rgba::WHITE);
        frame.circle(5.0, 5.0, 0.0, Rgba::WHITE);
        frame.line(1.0, 1.0, 1.0, 1.0, 2.0, Rgba::WHITE);
        let mut tess = Tessellator::new();
        assert!(tess.tessellate(&frame).is_empty());
    }

    #[test]
    fn circle_fan_stays_on_its_disc() {
        let mut frame = Frame::new(200.0, 200.0);
        frame.circle(100.0, 100.0, 50.0, Rgba::BLACK);
        let mut tess = Tessellator::new();
        let verts = tess.tessellate(&frame);
        assert_eq!(verts.len(), circle_segments(50.0) * 3);
        for v in verts {
            let d = (v.position[0] - 100.0).hypot(v.position[1] - 100.0);
            assert!(d <= 50.0 + 1e-3);
        }
    }

    #[test]
    fn circle_segments_are_bounded() {
        assert_eq!(circle_segments(1.0), MIN_CIRCLE_SEGMENTS);
        assert_eq!(circle_segments(10_000.0), MAX_CIRCLE_SEGMENTS);
        assert!(circle_segments(40.0) > MIN_CIRCLE_SEGMENTS);
    }

    #[test]
    fn line_quad_has_requested_thickness() {
        let mut frame = Frame::new(100.0, 100.0);
        frame.line(0.0, 50.0, 100.0, 50.0, 4.0, Rgba::WHITE);
        let mut tess = Tessellator::new();
        let verts = tess.tessellate(&frame);
        assert_eq!(verts.len(), VERTICES_PER_QUAD);
        for v in verts {
            assert!(v.position[1] == 48.0 || v.position[1] == 52.0);
        }
    }

    #[test]
    fn text_becomes_pixel_quads() {
        let mut frame = Frame::new(100.0, 100.0);
        frame.text("I", 0.0, 0.0, 2.0, Rgba::WHITE);
        let mut tess = Tessellator::new();
        assert_eq!(tess.tessellate(&frame).len(), 11 * VERTICES_PER_QUAD);
    }

    #[test]
    fn tessellate_reuses_buffer_between_frames() {
        let mut frame = Frame::new(100.0, 100.0);
        frame.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::WHITE);
        let mut tess = Tessellator::new();
        assert_eq!(tess.tessellate(&frame).len(), 6);
        frame.clear(100.0, 100.0);
        assert!(tess.tessellate(&frame).is_empty());
    }
}
