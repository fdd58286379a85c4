//! N-body gravity sandbox with merging bodies, trails and a movable camera.
//!
//! Controls: left click spawns a random body, right click a resting one,
//! holding right removes bodies under the cursor, `C` fires a comet, the
//! wheel zooms (with Shift it scales G), middle drag pans, `Q` returns to
//! the title menu.

use std::sync::Arc;

use dungeon_physics::color::Rgba;
use dungeon_physics::gravity::{GravityBody, GravityWorld, MAX_MASS, MIN_MASS};
use rand::Rng;
use rand_pcg::Pcg64;

use super::{draw_fps, scene_rng};
use crate::frame::Frame;
use crate::input::{InputState, Key, MouseButton};
use crate::scene::{Deps, Scene, SceneId};

pub const NUM_STARS: usize = 300;
/// The starfield spans this many viewports in each direction.
const STARFIELD_SPAN: f64 = 10.0;
/// Extra reach of the right-button eraser beyond a body's radius.
pub const ERASE_MARGIN: f64 = 24.0;
pub const COMET_MASS: f64 = 20.0;
pub const RESTING_BODY_MASS: f64 = 100.0;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;
const RNG_STREAM: u64 = 2;

const COMET_TRAIL_COLOR: Rgba = Rgba::rgba(255, 255, 255, 180);

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Zoom about the viewport centre plus a pan offset in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityCamera {
    pub zoom: f64,
    pub offset: (f64, f64),
    pub center: (f64, f64),
}

impl GravityCamera {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            zoom: 1.0,
            offset: (0.0, 0.0),
            center: (width / 2.0, height / 2.0),
        }
    }

    pub fn world_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        let (cx, cy) = self.center;
        (
            (x + self.offset.0 - cx) * self.zoom + cx,
            (y + self.offset.1 - cy) * self.zoom + cy,
        )
    }

    pub fn screen_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        let (cx, cy) = self.center;
        (
            (x - cx) / self.zoom + cx - self.offset.0,
            (y - cy) / self.zoom + cy - self.offset.1,
        )
    }

    /// Multiply the zoom by `factor` if the result stays inside `(0.1, 10)`.
    pub fn zoom_by(&mut self, factor: f64) -> bool {
        let next = self.zoom * factor;
        if next > MIN_ZOOM && next < MAX_ZOOM {
            self.zoom = next;
            true
        } else {
            false
        }
    }

    /// Pan by a screen-space cursor movement.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset.0 += dx / self.zoom;
        self.offset.1 += dy / self.zoom;
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

pub struct GravityScene {
    deps: Arc<Deps>,
    loaded: bool,
    world: GravityWorld,
    camera: GravityCamera,
    rng: Pcg64,
    stars: Vec<(f64, f64)>,
    /// Cursor position at the previous frame of a middle drag.
    drag_anchor: Option<(f64, f64)>,
    cursor: (f64, f64),
    erasing: bool,
    frame_index: u64,
    fps: f64,
}

impl GravityScene {
    pub fn new(deps: Arc<Deps>) -> Self {
        let (width, height) = deps.config.viewport();
        let rng = scene_rng(&deps, RNG_STREAM);
        Self {
            deps,
            loaded: false,
            world: GravityWorld::default(),
            camera: GravityCamera::new(width, height),
            rng,
            stars: Vec::new(),
            drag_anchor: None,
            cursor: (0.0, 0.0),
            erasing: false,
            frame_index: 0,
            fps: 0.0,
        }
    }

    pub fn world(&self) -> &GravityWorld {
        &self.world
    }

    pub fn camera(&self) -> &GravityCamera {
        &self.camera
    }

    fn cursor_world(&self) -> (f64, f64) {
        self.camera.screen_to_world(self.cursor.0, self.cursor.1)
    }

    fn handle_scroll(&mut self, input: &InputState) {
        let dy = input.wheel();
        if dy == 0.0 {
            return;
        }
        if input.is_key_down(Key::Shift) {
            if self.world.scale_gravity(1.0 + 0.2 * dy) {
                tracing::debug!(g = self.world.g(), "gravity changed");
            }
        } else {
            self.camera.zoom_by(1.0 + 0.1 * dy);
        }
    }

    fn handle_drag(&mut self, input: &InputState) {
        if !input.is_button_down(MouseButton::Middle) {
            self.drag_anchor = None;
            return;
        }
        let (mx, my) = self.cursor;
        if let Some((lx, ly)) = self.drag_anchor {
            self.camera.pan(mx - lx, my - ly);
        }
        self.drag_anchor = Some((mx, my));
    }

    fn handle_spawns(&mut self, input: &InputState) {
        let (x, y) = self.cursor_world();

        if input.is_key_just_pressed(Key::C) {
            let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
            let speed = self.rng.gen_range(16.0..24.0);
            self.world.spawn(GravityBody::comet(
                x,
                y,
                angle.cos() * speed,
                angle.sin() * speed,
                COMET_MASS,
            ));
            tracing::debug!(x, y, speed, "spawned comet");
        }

        if input.is_button_just_released(MouseButton::Left) {
            let mass = self.rng.gen_range(MIN_MASS..MAX_MASS);
            let vx = self.rng.gen_range(-2.0..2.0);
            let vy = self.rng.gen_range(-2.0..2.0);
            self.world.spawn(GravityBody::new(x, y, vx, vy, mass));
            tracing::debug!(x, y, mass, "spawned body");
        }

        if input.is_button_just_released(MouseButton::Right) && !self.world.body_at(x, y) {
            self.world
                .spawn(GravityBody::new(x, y, 0.0, 0.0, RESTING_BODY_MASS));
        }

        self.erasing = input.is_button_down(MouseButton::Right);
        if self.erasing {
            let removed = self.world.remove_within(x, y, ERASE_MARGIN);
            if removed > 0 {
                tracing::debug!(removed, "erased bodies");
            }
        }
    }

    fn draw_stars(&self, frame: &mut Frame) {
        let (w, h) = (frame.width() as f64, frame.height() as f64);
        let size = self.camera.zoom.clamp(1.0, 4.0) as f32;
        for (i, &(sx, sy)) in self.stars.iter().enumerate() {
            let (x, y) = self.camera.world_to_screen(sx, sy);
            if x < -50.0 || x > w + 50.0 || y < -50.0 || y > h + 50.0 {
                continue;
            }
            let twinkle = twinkle(i as u64, self.frame_index);
            let brightness = 120 + (twinkle % 100) as u8;
            let alpha = 50 + ((twinkle >> 8) % 100) as u8;
            let color = Rgba::rgba(
                brightness,
                brightness,
                brightness.saturating_add(40),
                alpha,
            );
            frame.fill_rect(
                x as f32 - size / 2.0,
                y as f32 - size / 2.0,
                size,
                size,
                color,
            );
        }
    }

    fn draw_trails(&self, frame: &mut Frame) {
        let thickness = (self.camera.zoom * 0.5).clamp(1.0, 3.0) as f32;
        for body in self.world.bodies() {
            let base = if body.is_comet {
                COMET_TRAIL_COLOR
            } else {
                body.color
            };
            let len = body.trail.len();
            for i in 1..len {
                let alpha = (255 * i / len) as u8;
                let (a, b) = (body.trail[i - 1], body.trail[i]);
                let (x1, y1) = self.camera.world_to_screen(a.x, a.y);
                let (x2, y2) = self.camera.world_to_screen(b.x, b.y);
                frame.line(
                    x1 as f32,
                    y1 as f32,
                    x2 as f32,
                    y2 as f32,
                    thickness,
                    base.with_alpha(alpha),
                );
            }
        }
    }

    fn draw_bodies(&self, frame: &mut Frame) {
        for body in self.world.bodies() {
            let (x, y) = self.camera.world_to_screen(body.x, body.y);
            let color = if body.flash > 0 {
                Rgba::YELLOW
            } else {
                body.color
            };
            let radius = body.radius() * self.camera.zoom;
            frame.circle(x as f32, y as f32, radius as f32, color);
            frame.text(
                format!("{:.0}", body.mass),
                x as f32 - 8.0,
                y as f32 - 8.0,
                1.5,
                Rgba::WHITE,
            );
        }
    }
}

/// Cheap integer hash so stars flicker without mutating state in `draw`.
fn twinkle(star: u64, frame: u64) -> u64 {
    let mut h = star
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(frame.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    h ^= h >> 31;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 29)
}

impl Scene for GravityScene {
    fn name(&self) -> &'static str {
        "Gravity Demo"
    }

    fn first_load(&mut self) {
        let (width, height) = self.deps.config.viewport();
        let rng = &mut self.rng;
        self.stars = (0..NUM_STARS)
            .map(|_| {
                (
                    rng.gen_range(0.0..width * STARFIELD_SPAN),
                    rng.gen_range(0.0..height * STARFIELD_SPAN),
                )
            })
            .collect();
        self.loaded = true;
        tracing::debug!(stars = self.stars.len(), "starfield generated");
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn on_enter(&mut self) {
        tracing::info!(bodies = self.world.len(), g = self.world.g(), "entered gravity demo");
    }

    fn on_exit(&mut self) {
        self.drag_anchor = None;
        self.erasing = false;
    }

    fn update(&mut self, input: &InputState) -> SceneId {
        if input.is_key_down(Key::Q) {
            return SceneId::Title;
        }
        self.cursor = input.cursor();
        self.fps = input.fps();
        self.frame_index += 1;

        self.handle_scroll(input);
        self.handle_drag(input);
        self.handle_spawns(input);

        let merges = self.world.step();
        if merges > 0 {
            tracing::debug!(merges, bodies = self.world.len(), "bodies merged");
        }
        SceneId::Gravity
    }

    fn draw(&self, frame: &mut Frame) {
        self.draw_stars(frame);
        self.draw_trails(frame);
        self.draw_bodies(frame);

        if self.erasing {
            let (x, y) = self.cursor;
            frame.circle(
                x as f32,
                y as f32,
                (ERASE_MARGIN * self.camera.zoom) as f32,
                Rgba::BLACK,
            );
        }

        frame.text(
            format!(
                "Gravity Demo (Q: menu, LMB: random, RMB: float, Hold RMB: remove, \
                 Scroll: zoom, Shift+Scroll: G, MMB: drag, C: comet) G={:.2}",
                self.world.g()
            ),
            40.0,
            40.0,
            1.5,
            Rgba::WHITE,
        );
        draw_fps(frame, self.fps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::frame::DrawCommand;

    fn scene() -> GravityScene {
        let mut config = Config::default();
        config.simulation.seed = Some(5);
        let mut s = GravityScene::new(Arc::new(Deps::new(config)));
        s.first_load();
        s
    }

    fn at(x: f64, y: f64) -> InputState {
        let mut input = InputState::new();
        input.cursor_moved(x, y);
        input
    }

    fn click(s: &mut GravityScene, button: MouseButton, x: f64, y: f64) {
        let mut input = at(x, y);
        input.button_event(button, true);
        s.update(&input);
        input.end_frame();
        input.button_event(button, false);
        s.update(&input);
    }

    #[test]
    fn camera_round_trips() {
        let mut cam = GravityCamera::new(800.0, 600.0);
        cam.zoom_by(2.0);
        cam.pan(30.0, -10.0);
        let (sx, sy) = cam.world_to_screen(123.0, 456.0);
        let (wx, wy) = cam.screen_to_world(sx, sy);
        assert!((wx - 123.0).abs() < 1e-9 && (wy - 456.0).abs() < 1e-9);
        // The centre is a fixed point of zoom without pan.
        let cam = GravityCamera::new(800.0, 600.0);
        assert_eq!(cam.world_to_screen(400.0, 300.0), (400.0, 300.0));
    }

    #[test]
    fn zoom_is_bounded() {
        let mut cam = GravityCamera::new(800.0, 600.0);
        assert!(!cam.zoom_by(0.05));
        assert!(!cam.zoom_by(20.0));
        assert_eq!(cam.zoom, 1.0);
        assert!(cam.zoom_by(1.1));
    }

    #[test]
    fn pan_is_scaled_by_zoom() {
        let mut cam = GravityCamera::new(800.0, 600.0);
        cam.zoom_by(2.0);
        cam.pan(10.0, 20.0);
        assert_eq!(cam.offset, (5.0, 10.0));
    }

    #[test]
    fn left_click_spawns_random_body() {
        let mut s = scene();
        click(&mut s, MouseButton::Left, 400.0, 300.0);
        assert_eq!(s.world().len(), 1);
        let body = &s.world().bodies()[0];
        assert!(body.mass >= MIN_MASS && body.mass < MAX_MASS);
        assert!(body.vx.abs() <= 2.0 + 1e-9 && body.vy.abs() <= 2.0 + 1e-9);
        assert!(!body.is_comet);
    }

    #[test]
    fn right_click_spawns_resting_body_unless_occupied() {
        let mut s = scene();
        click(&mut s, MouseButton::Right, 400.0, 300.0);
        assert_eq!(s.world().len(), 1);
        assert_eq!(s.world().bodies()[0].mass, RESTING_BODY_MASS);
        assert_eq!((s.world().bodies()[0].vx, s.world().bodies()[0].vy), (0.0, 0.0));
    }

    #[test]
    fn holding_right_erases_bodies() {
        let mut s = scene();
        click(&mut s, MouseButton::Left, 100.0, 100.0);
        click(&mut s, MouseButton::Left, 1000.0, 600.0);
        assert_eq!(s.world().len(), 2);

        let (bx, by) = {
            let b = &s.world().bodies()[0];
            s.camera().world_to_screen(b.x, b.y)
        };
        let mut input = at(bx, by);
        input.button_event(MouseButton::Right, true);
        s.update(&input);
        assert_eq!(s.world().len(), 1);
        assert!(s.erasing);
    }

    #[test]
    fn comet_key_spawns_fast_white_body() {
        let mut s = scene();
        let mut input = at(640.0, 360.0);
        input.key_event(Key::C, true);
        s.update(&input);
        assert_eq!(s.world().len(), 1);
        let comet = &s.world().bodies()[0];
        assert!(comet.is_comet);
        assert_eq!(comet.color, Rgba::WHITE);
        let speed = comet.vx.hypot(comet.vy);
        assert!((16.0..24.0).contains(&speed), "speed {speed}");
    }

    #[test]
    fn scroll_zooms_and_shift_scroll_scales_gravity() {
        let mut s = scene();
        let mut input = InputState::new();
        input.scroll(1.0);
        s.update(&input);
        assert!((s.camera().zoom - 1.1).abs() < 1e-12);

        input.end_frame();
        input.key_event(Key::Shift, true);
        input.scroll(1.0);
        s.update(&input);
        assert!((s.world().g() - 1.2).abs() < 1e-12);
        assert!((s.camera().zoom - 1.1).abs() < 1e-12);
    }

    #[test]
    fn middle_drag_pans() {
        let mut s = scene();
        let mut input = at(100.0, 100.0);
        input.button_event(MouseButton::Middle, true);
        s.update(&input);
        input.end_frame();
        input.cursor_moved(130.0, 80.0);
        s.update(&input);
        assert_eq!(s.camera().offset, (30.0, -20.0));
    }

    #[test]
    fn q_returns_to_title() {
        let mut s = scene();
        let mut input = InputState::new();
        input.key_event(Key::Q, true);
        assert_eq!(s.update(&input), SceneId::Title);
    }

    #[test]
    fn starfield_and_hud_are_drawn() {
        let s = scene();
        assert_eq!(s.stars.len(), NUM_STARS);
        let mut frame = Frame::new(1280.0, 720.0);
        s.draw(&mut frame);
        assert!(frame.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Text { text, .. } if text.contains("G=1.00")
        )));
    }

    #[test]
    fn twinkle_varies_by_star_and_frame() {
        assert_ne!(twinkle(1, 1), twinkle(2, 1));
        assert_ne!(twinkle(1, 1), twinkle(1, 2));
        assert_eq!(twinkle(7, 9), twinkle(7, 9));
    }
}
