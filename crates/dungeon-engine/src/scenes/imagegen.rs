//! Prompt-driven image generation through the shared [`ImageService`].
//!
//! Enter toggles the prompt box; pressing Enter again with a non-empty
//! prompt submits a request. The request runs in the background and the
//! scene polls its handle once per frame, so drawing never blocks. Escape
//! quits the application.

use std::sync::Arc;

use dungeon_imagegen::handle::ImageHandle;
use dungeon_imagegen::request::{GeneratedImage, ImageRatio, ImageRequest};
use dungeon_imagegen::service::ImageService;
use dungeon_physics::color::Rgba;

use crate::frame::Frame;
use crate::input::{InputState, Key};
use crate::render::text::text_width;
use crate::scene::{Deps, Scene, SceneId};

pub const PLACEHOLDER: &str = "Enter your prompt here...";
/// Seconds between cursor visibility toggles.
const CURSOR_BLINK: f64 = 0.5;
/// Animation clock advance per update.
const ANIMATION_STEP: f64 = 1.0 / 60.0;
/// Mosaic columns used to draw a received image.
const MOSAIC_COLUMNS: u32 = 64;
const NUM_PARTICLES: usize = 50;

const REQUEST_SEED: u64 = 42;
const REQUEST_STEPS: u32 = 20;
const REQUEST_SIZE: u32 = 512;

/// A received image reduced to a grid of average colours.
#[derive(Debug, Clone, PartialEq)]
struct Mosaic {
    cols: u32,
    rows: u32,
    cells: Vec<Rgba>,
    /// Source size, for aspect-correct placement.
    width: u32,
    height: u32,
}

impl Mosaic {
    fn from_image(image: &GeneratedImage) -> Self {
        let (width, height) = (image.width().max(1), image.height().max(1));
        let cols = MOSAIC_COLUMNS.min(width);
        let rows = ((u64::from(cols) * u64::from(height) / u64::from(width)) as u32).max(1);
        let mut cells = Vec::with_capacity((cols * rows) as usize);
        for cy in 0..rows {
            for cx in 0..cols {
                let [r, g, b, a] = image.block_average(cx, cy, cols, rows);
                cells.push(Rgba::rgba(r, g, b, a));
            }
        }
        Self {
            cols,
            rows,
            cells,
            width,
            height,
        }
    }
}

pub struct ImageGenScene {
    deps: Arc<Deps>,
    loaded: bool,
    text: String,
    input_active: bool,
    cursor_visible: bool,
    blink_elapsed: f64,
    animation_time: f64,
    pending: Option<ImageHandle>,
    image: Option<Mosaic>,
    current_prompt: String,
    last_error: Option<String>,
}

impl ImageGenScene {
    pub fn new(deps: Arc<Deps>) -> Self {
        if deps.image_service.is_none() {
            tracing::warn!("image generation scene created without an image service");
        }
        Self {
            deps,
            loaded: false,
            text: PLACEHOLDER.to_owned(),
            input_active: false,
            cursor_visible: true,
            blink_elapsed: 0.0,
            animation_time: 0.0,
            pending: None,
            image: None,
            current_prompt: String::new(),
            last_error: None,
        }
    }

    /// Current contents of the prompt box.
    pub fn prompt_text(&self) -> &str {
        &self.text
    }

    pub fn is_input_active(&self) -> bool {
        self.input_active
    }

    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Poll the in-flight request once.
    fn poll_result(&mut self) {
        let Some(handle) = self.pending.as_mut() else {
            return;
        };
        let Some(result) = handle.poll() else {
            return;
        };
        self.pending = None;
        match result {
            Ok(image) => {
                tracing::info!(
                    width = image.width(),
                    height = image.height(),
                    prompt = %self.current_prompt,
                    "image generation completed"
                );
                self.image = Some(Mosaic::from_image(&image));
                self.last_error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, prompt = %self.current_prompt, "image generation failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn toggle_input(&mut self) {
        if !self.input_active {
            self.input_active = true;
            if self.text == PLACEHOLDER {
                self.text.clear();
            }
            return;
        }

        self.input_active = false;
        let prompt = self.text.trim().to_owned();
        if prompt.is_empty() {
            self.text = PLACEHOLDER.to_owned();
        } else if prompt != PLACEHOLDER {
            self.start_generation(prompt);
        }
    }

    fn start_generation(&mut self, prompt: String) {
        let Some(service) = self.deps.image_service.clone() else {
            tracing::warn!("no image service configured, ignoring prompt");
            self.last_error = Some("image service unavailable".to_owned());
            return;
        };
        if let Err(e) = ensure_running(service.as_ref()) {
            tracing::error!(error = %e, "failed to start image service");
            self.last_error = Some(e.to_string());
            return;
        }

        let request = ImageRequest {
            workflow_name: self.deps.config.comfyui.workflow_name.clone(),
            prompt: prompt.clone(),
            seed: REQUEST_SEED,
            steps: REQUEST_STEPS,
            size: REQUEST_SIZE,
            ratio: ImageRatio::Landscape,
        };
        tracing::info!(prompt = %prompt, workflow = %request.workflow_name, "starting image generation");
        self.pending = Some(service.submit(request));
        self.current_prompt = prompt;
        self.last_error = None;
    }

    fn handle_typing(&mut self, input: &InputState) {
        self.text.extend(
            input
                .typed_chars()
                .chars()
                .filter(|c| (' '..='~').contains(c)),
        );
        if input.is_key_just_pressed(Key::Backspace) {
            self.text.pop();
        }

        self.blink_elapsed += input.delta();
        if self.blink_elapsed > CURSOR_BLINK {
            self.cursor_visible = !self.cursor_visible;
            self.blink_elapsed = 0.0;
        }
    }

    // -- drawing --

    fn draw_background(&self, frame: &mut Frame) {
        let t = self.animation_time;
        let wave = |base: f64, amp: f64, speed: f64, phase: f64| {
            (base + amp * (t * speed + phase).sin()) as u8
        };
        let top = Rgba::rgb(wave(20.0, 15.0, 0.3, 0.0), wave(25.0, 20.0, 0.4, 1.0), wave(40.0, 25.0, 0.2, 2.0));
        let bottom = Rgba::rgb(wave(40.0, 20.0, 0.25, 3.0), wave(20.0, 15.0, 0.35, 4.0), wave(60.0, 30.0, 0.3, 5.0));
        super::vertical_gradient(frame, top, bottom, 50);

        let (w, h) = (f64::from(frame.width()), f64::from(frame.height()));
        for i in 0..NUM_PARTICLES {
            let seed_x = (i * 123 % 1000) as f64 / 1000.0;
            let seed_y = (i * 456 % 1000) as f64 / 1000.0;
            let speed_x = (i * 789 % 100) as f64 / 1000.0;
            let speed_y = (i * 321 % 100) as f64 / 1000.0;
            let x = (seed_x * w + t * speed_x * 50.0) % w;
            let y = (seed_y * h + t * speed_y * 30.0) % h;
            let size = 1.0 + 2.0 * (t * 2.0 + i as f64 * 0.1).sin();
            let alpha = (100.0 + 100.0 * (t * 1.5 + i as f64 * 0.2).sin()) as u8;
            frame.circle(x as f32, y as f32, size as f32, Rgba::WHITE.with_alpha(alpha));
        }
    }

    /// Image area: 16:9 box scaled to at most 80% of the viewport width.
    fn image_rect(frame: &Frame) -> (f32, f32, f32, f32) {
        let (base_w, base_h) = (512.0_f32, 288.0_f32);
        let scale = (frame.width() * 0.8 / base_w).min(1.0);
        let (w, h) = (base_w * scale, base_h * scale);
        let x = frame.width() / 2.0 - w / 2.0;
        let y = frame.height() / 2.0 - h / 2.0 - frame.height() * 0.1;
        (x, y, w, h)
    }

    fn draw_image_area(&self, frame: &mut Frame) {
        let (x, y, w, h) = Self::image_rect(frame);
        let shadow = 8.0 * (w / 512.0);
        frame.fill_rect(x + shadow, y + shadow, w, h, Rgba::rgba(0, 0, 0, 100));

        if let Some(mosaic) = &self.image {
            draw_mosaic(frame, mosaic, x, y, w, h);
        } else {
            frame.fill_rect(x, y, w, h, Rgba::rgba(60, 60, 80, 220));
            frame.stroke_rect(x, y, w, h, 2.0, Rgba::rgb(100, 100, 120));
            if self.is_generating() {
                self.draw_spinner(frame, x + w / 2.0, y + h / 2.0);
            } else {
                self.draw_placeholder(frame, x, y, w, h);
            }
        }

        let info = if self.is_generating() {
            "Generating image... Please wait".to_owned()
        } else if self.image.is_some() {
            let mut prompt: String = self.current_prompt.chars().take(45).collect();
            if prompt.len() < self.current_prompt.len() {
                prompt.push_str("...");
            }
            format!("Generated: \"{prompt}\"")
        } else {
            "Generated Image Preview (Landscape 16:9)".to_owned()
        };
        let info_y = y + h + 20.0;
        frame.fill_rect(x, info_y - 5.0, w, 25.0, Rgba::rgba(0, 0, 0, 150));
        frame.text(
            info.as_str(),
            x + (w - text_width(&info, 2.0)) / 2.0,
            info_y,
            2.0,
            Rgba::WHITE,
        );
    }

    fn draw_spinner(&self, frame: &mut Frame, cx: f32, cy: f32) {
        let t = self.animation_time;
        let dots = 8;
        for i in 0..dots {
            let angle = i as f64 * std::f64::consts::TAU / dots as f64 + t * 3.0;
            let alpha = (100.0 + 100.0 * (t * 2.0 + i as f64 * 0.5).sin()) as u8;
            frame.circle(
                cx + 40.0 * angle.cos() as f32,
                cy + 40.0 * angle.sin() as f32,
                6.0,
                Rgba::rgba(150, 200, 255, alpha),
            );
        }
        let progress = format!("Generating{}", ".".repeat((t * 2.0) as usize % 4));
        frame.text(
            progress.as_str(),
            cx - text_width(&progress, 2.0) / 2.0,
            cy + 60.0,
            2.0,
            Rgba::WHITE,
        );
    }

    fn draw_placeholder(&self, frame: &mut Frame, x: f32, y: f32, w: f32, h: f32) {
        let grid = 32.0;
        let grid_color = Rgba::rgba(80, 100, 140, 150);
        let mut i = grid;
        while i < w {
            frame.line(x + i, y, x + i, y + h, 1.0, grid_color);
            i += grid;
        }
        let mut i = grid;
        while i < h {
            frame.line(x, y + i, x + w, y + i, 1.0, grid_color);
            i += grid;
        }

        let radius = 20.0 + 10.0 * (self.animation_time * 2.0).sin() as f32;
        frame.circle(x + w / 2.0, y + h / 2.0, radius, Rgba::rgba(120, 160, 200, 180));

        let corner = 20.0;
        let corner_color = Rgba::rgba(100, 140, 180, 120);
        for (cx, cy) in [
            (x + 5.0, y + 5.0),
            (x + w - corner - 5.0, y + 5.0),
            (x + 5.0, y + h - corner - 5.0),
            (x + w - corner - 5.0, y + h - corner - 5.0),
        ] {
            frame.fill_rect(cx, cy, corner, corner, corner_color);
        }
    }

    fn draw_prompt_box(&self, frame: &mut Frame) {
        let box_h = 40.0;
        let box_y = frame.height() - box_h - 20.0;
        let box_w = frame.width() - 40.0;
        let (bg, border) = if self.input_active {
            (Rgba::rgba(50, 50, 70, 220), Rgba::rgb(100, 150, 200))
        } else {
            (Rgba::rgba(40, 40, 50, 200), Rgba::rgb(80, 80, 100))
        };
        frame.fill_rect(20.0, box_y, box_w, box_h, bg);
        frame.stroke_rect(20.0, box_y, box_w, box_h, 2.0, border);

        let mut shown = self.text.clone();
        if self.input_active && self.cursor_visible {
            shown.push('|');
        }
        frame.text(shown, 30.0, box_y + 12.0, 2.0, Rgba::WHITE);

        let status = if self.is_generating() {
            "Generating image... Please wait".to_owned()
        } else if let Some(error) = &self.last_error {
            format!("Generation failed: {error}")
        } else if self.input_active {
            "Type your prompt, press Enter to generate image".to_owned()
        } else {
            "Press Enter to activate text input and generate images".to_owned()
        };
        frame.text(status, 20.0, box_y - 40.0, 2.0, Rgba::WHITE);
    }
}

fn ensure_running(service: &dyn ImageService) -> Result<(), dungeon_imagegen::ImageGenError> {
    if !service.is_running() {
        service.start()?;
    }
    Ok(())
}

/// Paint `mosaic` aspect-fit and centred inside the given box.
fn draw_mosaic(frame: &mut Frame, mosaic: &Mosaic, x: f32, y: f32, w: f32, h: f32) {
    let scale = (w / mosaic.width as f32).min(h / mosaic.height as f32);
    let (draw_w, draw_h) = (mosaic.width as f32 * scale, mosaic.height as f32 * scale);
    let (ox, oy) = (x + (w - draw_w) / 2.0, y + (h - draw_h) / 2.0);
    let (cell_w, cell_h) = (draw_w / mosaic.cols as f32, draw_h / mosaic.rows as f32);
    for (i, color) in mosaic.cells.iter().enumerate() {
        let col = (i as u32 % mosaic.cols) as f32;
        let row = (i as u32 / mosaic.cols) as f32;
        frame.fill_rect(ox + col * cell_w, oy + row * cell_h, cell_w, cell_h, *color);
    }
}

impl Scene for ImageGenScene {
    fn name(&self) -> &'static str {
        "Image Generation Demo"
    }

    fn first_load(&mut self) {
        self.loaded = true;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn on_enter(&mut self) {
        self.input_active = false;
        self.cursor_visible = true;
        self.blink_elapsed = 0.0;
        self.animation_time = 0.0;
        tracing::info!(
            service = self.deps.image_service.is_some(),
            "entered image generation demo"
        );
    }

    fn on_exit(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("abandoning in-flight image request");
        }
        self.image = None;
        self.current_prompt.clear();
        self.last_error = None;
    }

    fn update(&mut self, input: &InputState) -> SceneId {
        self.animation_time += ANIMATION_STEP;
        self.poll_result();

        if input.is_key_just_pressed(Key::Escape) {
            return SceneId::Exit;
        }
        if input.is_key_just_pressed(Key::Enter) {
            self.toggle_input();
        }
        if self.input_active {
            self.handle_typing(input);
        }
        SceneId::ImageGen
    }

    fn draw(&self, frame: &mut Frame) {
        self.draw_background(frame);
        self.draw_image_area(frame);
        frame.text("ComfyUI Image Generation", 20.0, 20.0, 3.0, Rgba::WHITE);
        self.draw_prompt_box(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::frame::DrawCommand;
    use dungeon_imagegen::ImageGenError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every request immediately, recording what it was asked.
    #[derive(Default)]
    struct InstantService {
        running: AtomicBool,
        starts: AtomicUsize,
        fail: bool,
        requests: Mutex<Vec<ImageRequest>>,
    }

    impl ImageService for InstantService {
        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn start(&self) -> Result<(), ImageGenError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) {
            self.running.store(false, Ordering::SeqCst);
        }

        fn submit(&self, request: ImageRequest) -> ImageHandle {
            self.requests.lock().unwrap().push(request);
            if self.fail {
                ImageHandle::ready(Err(ImageGenError::InvalidWorkflow("boom".to_owned())))
            } else {
                ImageHandle::ready(Ok(GeneratedImage::blank(128, 72)))
            }
        }
    }

    fn scene_with(service: Arc<InstantService>) -> ImageGenScene {
        let deps = Deps::with_image_service(Config::default(), service);
        let mut s = ImageGenScene::new(Arc::new(deps));
        s.first_load();
        s.on_enter();
        s
    }

    fn key(k: Key) -> InputState {
        let mut input = InputState::new();
        input.key_event(k, true);
        input
    }

    fn typed(text: &str) -> InputState {
        let mut input = InputState::new();
        input.text_typed(text);
        input
    }

    fn submit(s: &mut ImageGenScene, prompt: &str) {
        s.update(&key(Key::Enter));
        s.update(&typed(prompt));
        s.update(&key(Key::Enter));
    }

    #[test]
    fn enter_clears_placeholder_and_restores_it_when_empty() {
        let mut s = scene_with(Arc::default());
        assert_eq!(s.prompt_text(), PLACEHOLDER);
        s.update(&key(Key::Enter));
        assert!(s.is_input_active());
        assert_eq!(s.prompt_text(), "");

        s.update(&typed("   "));
        s.update(&key(Key::Enter));
        assert!(!s.is_input_active());
        assert_eq!(s.prompt_text(), PLACEHOLDER);
        assert!(!s.is_generating());
    }

    #[test]
    fn typing_filters_non_printable_and_backspace_deletes() {
        let mut s = scene_with(Arc::default());
        s.update(&key(Key::Enter));
        s.update(&typed("ab\u{8}c\r\u{e9}d"));
        assert_eq!(s.prompt_text(), "abcd");
        s.update(&key(Key::Backspace));
        assert_eq!(s.prompt_text(), "abc");
    }

    #[test]
    fn typing_is_ignored_while_inactive() {
        let mut s = scene_with(Arc::default());
        s.update(&typed("xyz"));
        assert_eq!(s.prompt_text(), PLACEHOLDER);
    }

    #[test]
    fn submit_starts_service_and_sends_request() {
        let service = Arc::new(InstantService::default());
        let mut s = scene_with(Arc::clone(&service));
        submit(&mut s, "  a castle ");

        assert!(s.is_generating());
        assert_eq!(service.starts.load(Ordering::SeqCst), 1);
        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let r = &requests[0];
        assert_eq!(r.prompt, "a castle");
        assert_eq!(r.workflow_name, "default_api.json");
        assert_eq!((r.seed, r.steps, r.size), (42, 20, 512));
        assert_eq!(r.ratio, ImageRatio::Landscape);
    }

    #[test]
    fn result_arrives_on_next_poll() {
        let mut s = scene_with(Arc::default());
        submit(&mut s, "a castle");
        assert!(!s.has_image());

        s.update(&InputState::new());
        assert!(!s.is_generating());
        assert!(s.has_image());
        let mosaic = s.image.as_ref().unwrap();
        assert_eq!((mosaic.cols, mosaic.rows), (64, 36));
        assert!(mosaic.cells.iter().all(|c| *c == Rgba::WHITE));
    }

    #[test]
    fn failure_keeps_previous_state_and_reports() {
        let service = Arc::new(InstantService {
            fail: true,
            ..InstantService::default()
        });
        let mut s = scene_with(service);
        submit(&mut s, "a castle");
        s.update(&InputState::new());
        assert!(!s.is_generating());
        assert!(!s.has_image());
        assert!(s.last_error.as_deref().unwrap().contains("boom"));
    }

    #[test]
    fn missing_service_does_not_generate() {
        let mut s = ImageGenScene::new(Arc::new(Deps::new(Config::default())));
        s.first_load();
        submit(&mut s, "a castle");
        assert!(!s.is_generating());
        assert!(s.last_error.is_some());
    }

    #[test]
    fn escape_exits_application() {
        let mut s = scene_with(Arc::default());
        assert_eq!(s.update(&key(Key::Escape)), SceneId::Exit);
    }

    #[test]
    fn exit_releases_image_and_request() {
        let mut s = scene_with(Arc::default());
        submit(&mut s, "first");
        s.update(&InputState::new());
        assert!(s.has_image());
        submit(&mut s, "second");
        assert!(s.is_generating());

        s.on_exit();
        assert!(!s.has_image());
        assert!(!s.is_generating());
        assert!(s.is_loaded());
    }

    #[test]
    fn cursor_blinks_on_accumulated_time() {
        let mut s = scene_with(Arc::default());
        s.update(&key(Key::Enter));
        let mut input = InputState::new();
        input.set_timing(60.0, 0.3);
        s.update(&input);
        assert!(s.cursor_visible);
        s.update(&input);
        assert!(!s.cursor_visible);
    }

    #[test]
    fn draw_shows_spinner_then_mosaic() {
        let mut s = scene_with(Arc::default());
        submit(&mut s, "a castle");
        let mut frame = Frame::new(1280.0, 720.0);
        s.draw(&mut frame);
        assert!(frame.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Text { text, .. } if text.starts_with("Generating")
        )));

        s.update(&InputState::new());
        frame.clear(1280.0, 720.0);
        s.draw(&mut frame);
        assert!(frame.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Text { text, .. } if text == "Generated: \"a castle\""
        )));
    }

    #[test]
    fn long_prompt_is_truncated_in_caption() {
        let mut s = scene_with(Arc::default());
        let prompt = "x".repeat(60);
        submit(&mut s, &prompt);
        s.update(&InputState::new());
        let mut frame = Frame::new(1280.0, 720.0);
        s.draw(&mut frame);
        let expected = format!("Generated: \"{}...\"", "x".repeat(45));
        assert!(frame.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Text { text, .. } if *text == expected
        )));
    }
}
