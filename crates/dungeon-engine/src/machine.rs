//! The scene state machine.
//!
//! Owns every registered scene and the id of the active one. Each frame the
//! host calls [`SceneMachine::update`], which runs the active scene and
//! performs any transition it asks for, then [`SceneMachine::draw`].
//!
//! Transition order is fixed: the outgoing scene's `on_exit`, then the
//! incoming scene's `first_load` (only if it is not loaded yet), then its
//! `on_enter`. Termination runs `on_exit` on the active scene exactly once.

use crate::frame::Frame;
use crate::input::InputState;
use crate::scene::{SceneId, SceneRegistry};
use crate::shutdown::ShutdownFlag;
use crate::EngineError;

/// What the host should do after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

#[derive(Debug)]
pub struct SceneMachine {
    registry: SceneRegistry,
    active: SceneId,
    shutdown: ShutdownFlag,
    terminated: bool,
    frame_count: u64,
    transition_count: u64,
}

impl SceneMachine {
    /// Take ownership of `registry` and enter `initial`, loading it first.
    pub fn new(
        mut registry: SceneRegistry,
        initial: SceneId,
        shutdown: ShutdownFlag,
    ) -> Result<Self, EngineError> {
        let scene = registry
            .get_mut(initial)
            .ok_or(EngineError::UnknownScene(initial))?;
        if !scene.is_loaded() {
            scene.first_load();
        }
        scene.on_enter();
        tracing::info!(scene = %initial, scenes = registry.len(), "scene machine started");

        Ok(Self {
            registry,
            active: initial,
            shutdown,
            terminated: false,
            frame_count: 0,
            transition_count: 0,
        })
    }

    /// Run one frame of the active scene and apply its requested transition.
    pub fn update(&mut self, input: &InputState) -> Flow {
        if self.terminated {
            return Flow::Terminate;
        }
        if self.shutdown.is_requested() {
            tracing::info!(scene = %self.active, "shutdown requested");
            return self.terminate();
        }
        if input.quit_requested() {
            tracing::info!(scene = %self.active, "quit requested by host");
            return self.terminate();
        }

        self.frame_count += 1;
        let Some(scene) = self.registry.get_mut(self.active) else {
            tracing::error!(scene = %self.active, "active scene vanished from registry");
            self.terminated = true;
            return Flow::Terminate;
        };
        let next = scene.update(input);

        if next == self.active {
            return Flow::Continue;
        }
        if next == SceneId::Exit {
            tracing::info!(from = %self.active, "scene requested exit");
            return self.terminate();
        }
        if !self.registry.contains(next) {
            tracing::error!(from = %self.active, to = %next, "transition to unregistered scene");
            return self.terminate();
        }

        self.transition(next);
        Flow::Continue
    }

    fn transition(&mut self, next: SceneId) {
        if let Some(outgoing) = self.registry.get_mut(self.active) {
            outgoing.on_exit();
        }
        let from = std::mem::replace(&mut self.active, next);
        if let Some(incoming) = self.registry.get_mut(next) {
            if !incoming.is_loaded() {
                tracing::debug!(scene = %next, "loading scene");
                incoming.first_load();
            }
            incoming.on_enter();
        }
        self.transition_count += 1;
        tracing::info!(%from, to = %next, "scene transition");
    }

    /// Paint the active scene.
    pub fn draw(&self, frame: &mut Frame) {
        if let Some(scene) = self.registry.get(self.active) {
            scene.draw(frame);
        }
    }

    /// Leave the active scene and stop processing updates. Idempotent: only
    /// the first call runs `on_exit`.
    pub fn terminate(&mut self) -> Flow {
        if !self.terminated {
            self.terminated = true;
            if let Some(scene) = self.registry.get_mut(self.active) {
                scene.on_exit();
            }
            tracing::info!(
                scene = %self.active,
                frames = self.frame_count,
                transitions = self.transition_count,
                "scene machine terminated"
            );
        }
        Flow::Terminate
    }

    pub fn active_scene(&self) -> SceneId {
        self.active
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Updates delivered to scenes so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }
}
