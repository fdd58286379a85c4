//! Title menu: pick a demo with the arrow keys, start it with Enter.

use std::sync::Arc;

use dungeon_physics::color::Rgba;

use super::vertical_gradient;
use crate::frame::Frame;
use crate::input::{InputState, Key};
use crate::render::text::{text_height, text_width};
use crate::scene::{Deps, Scene, SceneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOption {
    pub id: SceneId,
    pub label: &'static str,
}

/// Menu entries, top to bottom.
pub const MENU: [MenuOption; 4] = [
    MenuOption {
        id: SceneId::Balls,
        label: "Balls Physics Demo",
    },
    MenuOption {
        id: SceneId::Gravity,
        label: "Gravity Demo",
    },
    MenuOption {
        id: SceneId::ImageGen,
        label: "Image Generation Demo",
    },
    MenuOption {
        id: SceneId::GameOver,
        label: "Game Over",
    },
];

const TITLE: &str = "Infinite Dungeon";
const INSTRUCTIONS: &str = "Use UP/DOWN to select, ENTER to start";

const GRADIENT_TOP: Rgba = Rgba::rgb(203, 0, 5);
const GRADIENT_BOTTOM: Rgba = Rgba::rgb(80, 20, 10);
const GRADIENT_STEPS: usize = 50;

const TITLE_SCALE: f32 = 5.0;
const ITEM_SCALE: f32 = 3.0;
const ITEM_SPACING: f32 = 48.0;
const BOX_PADDING: f32 = 16.0;

pub struct TitleScene {
    deps: Arc<Deps>,
    loaded: bool,
    selected: usize,
}

impl TitleScene {
    pub fn new(deps: Arc<Deps>) -> Self {
        Self {
            deps,
            loaded: false,
            selected: 0,
        }
    }

    /// Index into [`MENU`] of the highlighted entry.
    pub fn selected(&self) -> usize {
        self.selected
    }

    fn move_selection(&mut self, up: bool) {
        let previous = self.selected;
        self.selected = if up {
            (self.selected + MENU.len() - 1) % MENU.len()
        } else {
            (self.selected + 1) % MENU.len()
        };
        tracing::debug!(
            previous,
            selected = self.selected,
            label = MENU[self.selected].label,
            "menu selection changed"
        );
    }

    fn draw_centered(frame: &mut Frame, text: &str, cx: f32, y: f32, scale: f32, color: Rgba) {
        frame.text(text, cx - text_width(text, scale) / 2.0, y, scale, color);
    }
}

impl Scene for TitleScene {
    fn name(&self) -> &'static str {
        "Main Menu"
    }

    fn first_load(&mut self) {
        tracing::info!(options = MENU.len(), "title menu loaded");
        self.loaded = true;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn on_enter(&mut self) {
        tracing::info!(selected = MENU[self.selected].label, "entered title menu");
    }

    fn on_exit(&mut self) {
        tracing::debug!("leaving title menu");
    }

    fn update(&mut self, input: &InputState) -> SceneId {
        if input.is_key_just_pressed(Key::ArrowUp) {
            self.move_selection(true);
        }
        if input.is_key_just_pressed(Key::ArrowDown) {
            self.move_selection(false);
        }
        if input.is_key_just_pressed(Key::Enter) {
            let option = MENU[self.selected];
            tracing::info!(scene = %option.id, label = option.label, "menu entry chosen");
            return option.id;
        }
        SceneId::Title
    }

    fn draw(&self, frame: &mut Frame) {
        let (width, height) = self.deps.config.viewport();
        let (width, height) = (width as f32, height as f32);
        let cx = width / 2.0;

        vertical_gradient(frame, GRADIENT_TOP, GRADIENT_BOTTOM, GRADIENT_STEPS);

        // Title in a translucent box with a drop shadow.
        let title_y = height * 0.18;
        let title_w = text_width(TITLE, TITLE_SCALE);
        frame.fill_rect(
            cx - title_w / 2.0 - BOX_PADDING,
            title_y - BOX_PADDING,
            title_w + BOX_PADDING * 2.0,
            text_height(TITLE_SCALE) + BOX_PADDING * 2.0,
            Rgba::rgba(0, 0, 0, 180),
        );
        Self::draw_centered(frame, TITLE, cx + 3.0, title_y + 3.0, TITLE_SCALE, Rgba::rgba(0, 0, 0, 200));
        Self::draw_centered(frame, TITLE, cx, title_y, TITLE_SCALE, Rgba::WHITE);

        // Menu.
        let menu_y = height * 0.4;
        let box_w = width * 0.6;
        frame.fill_rect(
            cx - box_w / 2.0,
            menu_y - 24.0,
            box_w,
            MENU.len() as f32 * ITEM_SPACING + 32.0,
            Rgba::rgba(0, 0, 0, 160),
        );
        for (i, option) in MENU.iter().enumerate() {
            let y = menu_y + i as f32 * ITEM_SPACING;
            let selected = i == self.selected;
            let color = if selected {
                Rgba::YELLOW
            } else {
                Rgba::WHITE
            };
            Self::draw_centered(frame, option.label, cx, y, ITEM_SCALE, color);
            if selected {
                let half = text_width(option.label, ITEM_SCALE) / 2.0;
                let arrow = text_width(">", ITEM_SCALE);
                frame.text(">", cx - half - 24.0 - arrow, y, ITEM_SCALE, color);
                frame.text("<", cx + half + 24.0, y, ITEM_SCALE, color);
            }
        }

        // Instructions.
        let instr_y = height * 0.8;
        let instr_w = text_width(INSTRUCTIONS, 2.0);
        frame.fill_rect(
            cx - instr_w / 2.0 - BOX_PADDING,
            instr_y - 8.0,
            instr_w + BOX_PADDING * 2.0,
            text_height(2.0) + 16.0,
            Rgba::rgba(0, 0, 0, 160),
        );
        Self::draw_centered(frame, INSTRUCTIONS, cx, instr_y, 2.0, Rgba::WHITE);
    }
}
