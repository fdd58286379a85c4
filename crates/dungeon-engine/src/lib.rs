//! Dungeon Engine -- scene state machine, scenes and host plumbing.
//!
//! The engine is a single-threaded, frame-driven loop. Each frame the host
//! fills an [`InputState`](input::InputState), calls
//! [`SceneMachine::update`](machine::SceneMachine::update) and then
//! [`SceneMachine::draw`](machine::SceneMachine::draw) into a
//! [`Frame`](frame::Frame), which a renderer turns into pixels.
//!
//! Scenes implement the [`Scene`](scene::Scene) trait and return the
//! [`SceneId`](scene::SceneId) they want to be active next. The machine owns
//! every scene, runs the lifecycle hooks in a fixed order on transitions and
//! shuts down on the reserved `SceneId::Exit`.
//!
//! The windowed host (winit + wgpu) lives in [`render`] behind the `renderer`
//! feature; everything else runs headless.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use dungeon_engine::prelude::*;
//!
//! let deps = Arc::new(Deps::new(Config::default()));
//! let registry = default_registry(deps);
//! let mut machine = SceneMachine::new(registry, SceneId::Title, ShutdownFlag::new()).unwrap();
//!
//! // The title menu starts on its first entry; Enter selects it.
//! let mut input = InputState::default();
//! input.key_event(Key::Enter, true);
//! assert_eq!(machine.update(&input), Flow::Continue);
//! assert_eq!(machine.active_scene(), SceneId::Balls);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod frame;
pub mod input;
pub mod logging;
pub mod machine;
pub mod render;
pub mod scene;
pub mod scenes;
pub mod shutdown;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the physics crate for convenience.
pub use dungeon_physics;

/// Re-export the image generation crate for convenience.
pub use dungeon_imagegen;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A scene id was used that has no registered scene.
    #[error("scene '{0}' is not registered")]
    UnknownScene(scene::SceneId),

    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// A global tracing subscriber was already installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// The interrupt handler could not be installed.
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use crate::config::{
        ComfyUiConfig, Config, ConfigError, LogConfig, RenderConfig, SimulationConfig,
        WindowConfig,
    };
    pub use crate::frame::{DrawCommand, Frame};
    pub use crate::input::{InputState, Key, MouseButton};
    pub use crate::machine::{Flow, SceneMachine};
    pub use crate::scene::{Deps, Scene, SceneId, SceneRegistry};
    pub use crate::scenes::{
        default_registry, BallsScene, GameOverScene, GravityScene, ImageGenScene, TitleScene,
    };
    pub use crate::shutdown::ShutdownFlag;
    pub use crate::EngineError;

    pub use dungeon_physics::color::Rgba;
}
