//! Scene identifiers, the [`Scene`] trait and the registry the machine owns.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dungeon_imagegen::service::ImageService;

use crate::config::Config;
use crate::frame::Frame;
use crate::input::InputState;

// ---------------------------------------------------------------------------
// SceneId
// ---------------------------------------------------------------------------

/// Every scene the application knows about, plus the reserved [`SceneId::Exit`]
/// target that ends the run. `Exit` can never be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneId {
    Title,
    Balls,
    Gravity,
    ImageGen,
    GameOver,
    Exit,
}

impl SceneId {
    pub fn name(self) -> &'static str {
        match self {
            SceneId::Title => "title",
            SceneId::Balls => "balls",
            SceneId::Gravity => "gravity",
            SceneId::ImageGen => "imagegen",
            SceneId::GameOver => "game_over",
            SceneId::Exit => "exit",
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A screen of the application.
///
/// The machine drives the lifecycle: `first_load` once before the first
/// `on_enter`, `on_enter` / `on_exit` around every activation, and one
/// `update` plus one `draw` per frame while active. `update` returns the id
/// that should be active next; returning the scene's own id keeps it active.
pub trait Scene {
    fn name(&self) -> &'static str;

    /// One-time resource setup.
    fn first_load(&mut self);

    fn is_loaded(&self) -> bool;

    fn on_enter(&mut self);

    fn on_exit(&mut self);

    fn update(&mut self, input: &InputState) -> SceneId;

    fn draw(&self, frame: &mut Frame);
}

// ---------------------------------------------------------------------------
// Deps
// ---------------------------------------------------------------------------

/// Shared, read-only context handed to every scene.
pub struct Deps {
    pub config: Config,
    pub image_service: Option<Arc<dyn ImageService>>,
}

impl Deps {
    /// Context without an image service; the image scene then reports that
    /// generation is unavailable.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            image_service: None,
        }
    }

    pub fn with_image_service(config: Config, service: Arc<dyn ImageService>) -> Self {
        Self {
            config,
            image_service: Some(service),
        }
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deps")
            .field("config", &self.config)
            .field("image_service", &self.image_service.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SceneRegistry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct SceneRegistry {
    scenes: BTreeMap<SceneId, Box<dyn Scene>>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `scene` under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is [`SceneId::Exit`] or already registered.
    pub fn register<S: Scene + 'static>(&mut self, id: SceneId, scene: S) -> &mut Self {
        assert!(id != SceneId::Exit, "SceneId::Exit is reserved and cannot be registered");
        assert!(
            !self.scenes.contains_key(&id),
            "scene '{id}' is already registered"
        );
        tracing::debug!(scene = %id, name = scene.name(), "registered scene");
        self.scenes.insert(id, Box::new(scene));
        self
    }

    pub fn contains(&self, id: SceneId) -> bool {
        self.scenes.contains_key(&id)
    }

    pub fn get_mut(&mut self, id: SceneId) -> Option<&mut (dyn Scene + 'static)> {
        self.scenes.get_mut(&id).map(|s| s.as_mut())
    }

    pub fn get(&self, id: SceneId) -> Option<&(dyn Scene + 'static)> {
        self.scenes.get(&id).map(|s| s.as_ref())
    }

    /// Registered ids in order.
    pub fn ids(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.scenes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.scenes.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    impl Scene for Dummy {
        fn name(&self) -> &'static str {
            "dummy"
        }
        fn first_load(&mut self) {}
        fn is_loaded(&self) -> bool {
            true
        }
        fn on_enter(&mut self) {}
        fn on_exit(&mut self) {}
        fn update(&mut self, _input: &InputState) -> SceneId {
            SceneId::Title
        }
        fn draw(&self, _frame: &mut Frame) {}
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = SceneRegistry::new();
        registry.register(SceneId::Title, Dummy).register(SceneId::Balls, Dummy);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(SceneId::Balls));
        assert!(!registry.contains(SceneId::Gravity));
        assert_eq!(registry.get(SceneId::Title).map(|s| s.name()), Some("dummy"));
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec![SceneId::Title, SceneId::Balls]
        );
    }

    #[test]
    #[should_panic(expected = "reserved")]
    fn registering_exit_panics() {
        SceneRegistry::new().register(SceneId::Exit, Dummy);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut registry = SceneRegistry::new();
        registry.register(SceneId::Title, Dummy);
        registry.register(SceneId::Title, Dummy);
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(SceneId::GameOver.to_string(), "game_over");
        assert_eq!(format!("{}", SceneId::Exit), "exit");
    }

    #[test]
    fn deps_debug_hides_service() {
        let deps = Deps::new(Config::default());
        assert!(format!("{deps:?}").contains("image_service: false"));
    }
}
