//! Bouncing balls with elastic collisions on a uniform grid.
//!
//! Left mouse: hold to grow a ball, release to launch it. Right mouse: hold
//! to spray random balls. `Q` returns to the title menu.

use std::sync::Arc;

use dungeon_physics::collision::{Ball, CollisionWorld};
use dungeon_physics::color::Rgba;
use rand::Rng;
use rand_pcg::Pcg64;

use super::{draw_fps, scene_rng};
use crate::frame::Frame;
use crate::input::{InputState, Key, MouseButton};
use crate::scene::{Deps, Scene, SceneId};

/// Frames between spawns while the right button is held.
pub const SPAWN_INTERVAL: u32 = 5;
pub const MIN_BALL_RADIUS: f64 = 5.0;
pub const MAX_PREVIEW_RADIUS: f64 = 200.0;

const PREVIEW_COLOR: Rgba = Rgba::rgba(128, 128, 128, 128);
const RNG_STREAM: u64 = 1;

/// Radius of a ball grown by holding the left button for `ticks` frames.
pub fn preview_radius(ticks: u32) -> f64 {
    (MIN_BALL_RADIUS + f64::from(ticks / 2)).min(MAX_PREVIEW_RADIUS)
}

/// A ball at `(x, y)` moving at 1.5..4 px/frame with a random colour.
fn random_ball(rng: &mut Pcg64, x: f64, y: f64, radius: f64) -> Ball {
    let speed = rng.gen_range(1.5..4.0);
    let mut vx = speed * rng.gen_range(-1.0..1.0);
    let mut vy = speed * rng.gen_range(-1.0..1.0);
    if vx == 0.0 && vy == 0.0 {
        (vx, vy) = (2.0, 2.0);
    }
    let color = Rgba::rgb(rng.gen(), rng.gen(), rng.gen());
    Ball::new(x, y, vx, vy, radius, color)
}

pub struct BallsScene {
    deps: Arc<Deps>,
    loaded: bool,
    world: CollisionWorld,
    rng: Pcg64,
    /// Frames the left button has been held, `None` when released.
    grow_ticks: Option<u32>,
    /// Frames the right button has been held.
    spray_ticks: u32,
    cursor: (f64, f64),
    fps: f64,
}

impl BallsScene {
    pub fn new(deps: Arc<Deps>) -> Self {
        let (width, height) = deps.config.viewport();
        let rng = scene_rng(&deps, RNG_STREAM);
        Self {
            deps,
            loaded: false,
            world: CollisionWorld::new(width, height),
            rng,
            grow_ticks: None,
            spray_ticks: 0,
            cursor: (0.0, 0.0),
            fps: 0.0,
        }
    }

    pub fn world(&self) -> &CollisionWorld {
        &self.world
    }

    /// Largest radius that still fits between the walls on both axes.
    pub fn max_radius(&self) -> f64 {
        self.world.width().min(self.world.height()) / 2.0
    }

    fn spawn_at_cursor(&mut self, radius: f64) {
        let (x, y) = self.cursor;
        let radius = radius.min(self.max_radius());
        let ball = random_ball(&mut self.rng, x, y, radius);
        let index = self.world.spawn(ball);
        tracing::debug!(index, x, y, radius, "spawned ball");
    }
}

impl Scene for BallsScene {
    fn name(&self) -> &'static str {
        "Balls Physics Demo"
    }

    fn first_load(&mut self) {
        let (width, height) = self.deps.config.viewport();
        self.world.set_bounds(width, height);
        self.loaded = true;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn on_enter(&mut self) {
        tracing::info!(balls = self.world.len(), "entered balls demo");
    }

    fn on_exit(&mut self) {
        self.grow_ticks = None;
        self.spray_ticks = 0;
    }

    fn update(&mut self, input: &InputState) -> SceneId {
        if input.is_key_down(Key::Q) {
            return SceneId::Title;
        }
        self.cursor = input.cursor();
        self.fps = input.fps();

        self.world.step();

        if input.is_button_down(MouseButton::Left) {
            *self.grow_ticks.get_or_insert(0) += 1;
        } else if let Some(ticks) = self.grow_ticks.take() {
            self.spawn_at_cursor(preview_radius(ticks));
        }

        if input.is_button_down(MouseButton::Right) {
            self.spray_ticks += 1;
            if self.spray_ticks % SPAWN_INTERVAL == 0 {
                let radius = MIN_BALL_RADIUS + f64::from(self.rng.gen_range(0..100u32));
                self.spawn_at_cursor(radius);
            }
        } else {
            self.spray_ticks = 0;
        }

        SceneId::Balls
    }

    fn draw(&self, frame: &mut Frame) {
        frame.text(
            "Balls Physics Demo (press Q to return)",
            40.0,
            40.0,
            2.0,
            Rgba::WHITE,
        );
        for ball in self.world.balls() {
            frame.circle(ball.x as f32, ball.y as f32, ball.radius as f32, ball.color);
        }
        if let Some(ticks) = self.grow_ticks {
            let (x, y) = self.cursor;
            let radius = preview_radius(ticks).min(self.max_radius());
            frame.circle(x as f32, y as f32, radius as f32, PREVIEW_COLOR);
        }
        draw_fps(frame, self.fps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::frame::DrawCommand;

    fn scene() -> BallsScene {
        let mut config = Config::default();
        config.simulation.seed = Some(1);
        let mut s = BallsScene::new(Arc::new(Deps::new(config)));
        s.first_load();
        s
    }

    fn at(x: f64, y: f64) -> InputState {
        let mut input = InputState::new();
        input.cursor_moved(x, y);
        input
    }

    #[test]
    fn preview_radius_grows_and_caps() {
        assert_eq!(preview_radius(0), 5.0);
        assert_eq!(preview_radius(1), 5.0);
        assert_eq!(preview_radius(10), 10.0);
        assert_eq!(preview_radius(10_000), MAX_PREVIEW_RADIUS);
    }

    #[test]
    fn hold_and_release_spawns_one_ball() {
        let mut s = scene();
        let mut input = at(300.0, 300.0);
        input.button_event(MouseButton::Left, true);
        for _ in 0..20 {
            assert_eq!(s.update(&input), SceneId::Balls);
            input.end_frame();
        }
        assert!(s.world().is_empty());

        input.button_event(MouseButton::Left, false);
        s.update(&input);
        assert_eq!(s.world().len(), 1);
        let ball = &s.world().balls()[0];
        assert_eq!(ball.radius, preview_radius(20));
        assert_eq!((ball.x, ball.y), (300.0, 300.0));
        assert_eq!(ball.color.a, 255);
        let speed = ball.vx.hypot(ball.vy);
        assert!(speed > 0.0 && speed < 4.0 * 2f64.sqrt());
    }

    #[test]
    fn right_hold_sprays_every_interval() {
        let mut s = scene();
        let mut input = at(200.0, 200.0);
        input.button_event(MouseButton::Right, true);
        for _ in 0..(SPAWN_INTERVAL * 3) {
            s.update(&input);
            input.end_frame();
        }
        assert_eq!(s.world().len(), 3);
        for ball in s.world().balls() {
            assert!(ball.radius >= MIN_BALL_RADIUS && ball.radius < MIN_BALL_RADIUS + 100.0);
        }
    }

    #[test]
    fn spawn_radius_fits_small_viewport() {
        let mut config = Config::default();
        config.simulation.seed = Some(1);
        config.render.window.width = 300;
        config.render.window.height = 120;
        let mut s = BallsScene::new(Arc::new(Deps::new(config)));
        s.first_load();
        assert_eq!(s.max_radius(), 60.0);

        let mut input = at(150.0, 60.0);
        input.button_event(MouseButton::Left, true);
        for _ in 0..1_000 {
            s.update(&input);
            input.end_frame();
        }
        input.button_event(MouseButton::Left, false);
        s.update(&input);
        assert_eq!(s.world().balls()[0].radius, 60.0);

        for _ in 0..200 {
            s.update(&InputState::new());
            let b = &s.world().balls()[0];
            assert!(b.x >= b.radius && b.x <= 300.0 - b.radius, "x = {}", b.x);
            assert!(b.y >= b.radius && b.y <= 120.0 - b.radius, "y = {}", b.y);
        }
    }

    #[test]
    fn q_returns_to_title_without_stepping() {
        let mut s = scene();
        let mut input = InputState::new();
        input.key_event(Key::Q, true);
        assert_eq!(s.update(&input), SceneId::Title);
    }

    #[test]
    fn draw_shows_preview_while_holding() {
        let mut s = scene();
        let mut input = at(100.0, 100.0);
        input.button_event(MouseButton::Left, true);
        s.update(&input);

        let mut frame = Frame::new(1280.0, 720.0);
        s.draw(&mut frame);
        assert!(frame.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Circle { color, .. } if *color == PREVIEW_COLOR
        )));
    }

    #[test]
    fn exit_clears_pending_spawn() {
        let mut s = scene();
        let mut input = at(100.0, 100.0);
        input.button_event(MouseButton::Left, true);
        s.update(&input);
        s.on_exit();

        // Coming back with the button up must not launch the old ball.
        s.update(&at(100.0, 100.0));
        assert!(s.world().is_empty());
    }
}
