mod dispatcher;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use dispatcher::{
    ActionQueue, InputConfig, InputDispatcher, InputError, InputHandler, InputSource,
    SubscriptionId,
};
pub use input::{action_for_key, ActionEdge, ActionStates, InputAction, KeyEdge};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{text_height, text_width, wrap_text, Canvas, Renderer, Rgba};
pub use scene::{Scene, SceneCommand};
