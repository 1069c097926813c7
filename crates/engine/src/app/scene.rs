use tracing::{info, warn};

use super::dispatcher::{InputDispatcher, InputError};
use super::input::ActionStates;
use super::rendering::Canvas;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// A screen driven by the fixed-step loop.
///
/// `load` is where a scene subscribes to the dispatcher; edge events arrive
/// through that subscription between ticks, while `held` is the level state
/// sampled at the start of each tick.
pub trait Scene {
    fn load(&mut self, input: &mut InputDispatcher) -> Result<(), InputError>;
    fn update(&mut self, fixed_dt_seconds: f32, held: &ActionStates) -> SceneCommand;
    fn render(&self, canvas: &mut Canvas<'_>);
    fn unload(&mut self, input: &mut InputDispatcher);
    fn debug_title(&self) -> Option<String> {
        None
    }
}

/// Tracks whether the hosted scene is loaded so load/unload stay paired.
pub(crate) struct SceneHost {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl SceneHost {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            is_loaded: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub(crate) fn load(&mut self, input: &mut InputDispatcher) -> Result<(), InputError> {
        if self.is_loaded {
            return Ok(());
        }
        self.scene.load(input)?;
        self.is_loaded = true;
        info!(subscribers = input.subscriber_count(), "scene_loaded");
        Ok(())
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, held: &ActionStates) -> SceneCommand {
        if !self.is_loaded {
            warn!("scene_update_before_load");
            return SceneCommand::None;
        }
        self.scene.update(fixed_dt_seconds, held)
    }

    pub(crate) fn render(&self, canvas: &mut Canvas<'_>) {
        if self.is_loaded {
            self.scene.render(canvas);
        }
    }

    pub(crate) fn unload(&mut self, input: &mut InputDispatcher) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(input);
        self.is_loaded = false;
        info!("scene_unloaded");
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title()
    }
}
