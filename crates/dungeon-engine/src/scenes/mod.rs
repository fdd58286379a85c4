//! The application's scenes and the registry that wires them together.

mod balls;
mod game_over;
mod gravity;
mod imagegen;
mod title;

use std::sync::Arc;

use dungeon_physics::color::Rgba;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::frame::Frame;
use crate::scene::{Deps, SceneId, SceneRegistry};

pub use balls::BallsScene;
pub use game_over::GameOverScene;
pub use gravity::{GravityCamera, GravityScene};
pub use imagegen::ImageGenScene;
pub use title::{MenuOption, TitleScene, MENU};

/// Register every scene of the application.
pub fn default_registry(deps: Arc<Deps>) -> SceneRegistry {
    let mut registry = SceneRegistry::new();
    registry
        .register(SceneId::Title, TitleScene::new(Arc::clone(&deps)))
        .register(SceneId::Balls, BallsScene::new(Arc::clone(&deps)))
        .register(SceneId::Gravity, GravityScene::new(Arc::clone(&deps)))
        .register(SceneId::ImageGen, ImageGenScene::new(Arc::clone(&deps)))
        .register(SceneId::GameOver, GameOverScene::new(deps));
    registry
}

/// Random source for a scene. A configured seed makes runs reproducible;
/// each scene mixes in its own stream id so they do not mirror each other.
pub(crate) fn scene_rng(deps: &Deps, stream: u64) -> Pcg64 {
    match deps.config.simulation.seed {
        Some(seed) => Pcg64::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => Pcg64::from_entropy(),
    }
}

/// FPS counter in the top-left corner.
pub(crate) fn draw_fps(frame: &mut Frame, fps: f64) {
    frame.text(format!("FPS: {fps:.0}"), 10.0, 10.0, 2.0, Rgba::WHITE);
}

/// Full-width horizontal bands blending `top` into `bottom`.
pub(crate) fn vertical_gradient(frame: &mut Frame, top: Rgba, bottom: Rgba, steps: usize) {
    let (width, height) = (frame.width(), frame.height());
    let band = height / steps as f32;
    for i in 0..steps {
        let t = if steps > 1 {
            i as f64 / (steps - 1) as f64
        } else {
            0.0
        };
        frame.fill_rect(0.0, i as f32 * band, width, band, top.lerp(bottom, t));
    }
}
