//! Terminal screen. Escape quits, Enter goes back to the title menu.

use std::sync::Arc;

use dungeon_physics::color::Rgba;

use crate::frame::Frame;
use crate::input::{InputState, Key};
use crate::render::text::{text_height, text_width};
use crate::scene::{Deps, Scene, SceneId};

const HEADLINE: &str = "Game Over";
const HINT: &str = "Press ENTER for the menu or ESC to quit";
const HEADLINE_SCALE: f32 = 6.0;

pub struct GameOverScene {
    deps: Arc<Deps>,
    loaded: bool,
}

impl GameOverScene {
    pub fn new(deps: Arc<Deps>) -> Self {
        Self {
            deps,
            loaded: false,
        }
    }
}

impl Scene for GameOverScene {
    fn name(&self) -> &'static str {
        "Game Over"
    }

    fn first_load(&mut self) {
        self.loaded = true;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn on_enter(&mut self) {
        tracing::info!("game over");
    }

    fn on_exit(&mut self) {}

    fn update(&mut self, input: &InputState) -> SceneId {
        if input.is_key_just_pressed(Key::Escape) {
            return SceneId::Exit;
        }
        if input.is_key_just_pressed(Key::Enter) {
            return SceneId::Title;
        }
        SceneId::GameOver
    }

    fn draw(&self, frame: &mut Frame) {
        let (width, height) = self.deps.config.viewport();
        let (width, height) = (width as f32, height as f32);
        frame.fill_rect(0.0, 0.0, width, height, Rgba::rgb(20, 0, 0));

        let y = height / 2.0 - text_height(HEADLINE_SCALE);
        let x = (width - text_width(HEADLINE, HEADLINE_SCALE)) / 2.0;
        frame.text(HEADLINE, x + 4.0, y + 4.0, HEADLINE_SCALE, Rgba::BLACK);
        frame.text(HEADLINE, x, y, HEADLINE_SCALE, Rgba::rgb(220, 30, 30));

        let hint_x = (width - text_width(HINT, 2.0)) / 2.0;
        frame.text(HINT, hint_x, height / 2.0 + 40.0, 2.0, Rgba::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::frame::DrawCommand;

    fn press(key: Key) -> InputState {
        let mut input = InputState::new();
        input.key_event(key, true);
        input
    }

    fn scene() -> GameOverScene {
        GameOverScene::new(Arc::new(Deps::new(Config::default())))
    }

    #[test]
    fn keys_choose_destination() {
        let mut s = scene();
        assert_eq!(s.update(&InputState::new()), SceneId::GameOver);
        assert_eq!(s.update(&press(Key::Escape)), SceneId::Exit);
        assert_eq!(s.update(&press(Key::Enter)), SceneId::Title);
    }

    #[test]
    fn draws_headline() {
        let s = scene();
        let mut frame = Frame::new(1280.0, 720.0);
        s.draw(&mut frame);
        assert!(frame.commands().iter().any(
            |c| matches!(c, DrawCommand::Text { text, .. } if text == HEADLINE)
        ));
    }
}
