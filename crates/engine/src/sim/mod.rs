//! Deterministic overworld simulation. Everything here advances in whole ticks
//! and never touches the window, the clock, or the filesystem.

mod camera;
mod config;
mod dialog;
mod encounter;
mod encounter_flow;
mod ids;
mod movement;
mod overworld;
mod pause;
mod tilemap;
mod timers;
mod world;

pub use camera::{CameraController, Vec2, Viewport};
pub use config::{SimConfig, DEFAULT_PLAYER_NAME};
pub use dialog::{
    strip_pause_tokens, DialogConfig, DialogSession, DialogState, DialogStep, PLAYER_NAME_TOKEN,
};
pub use encounter::{
    EncounterConfig, EncounterEngine, EncounterEntity, EncounterError, EncounterTable, GrassZone,
    Rarity, RarityWeights,
};
pub use encounter_flow::{
    CatchAnimation, EncounterContext, EncounterCue, EncounterOutcome, EncounterPhase,
    EncounterSession, CATCH_MENU, MAIN_MENU,
};
pub use ids::{IdSet, MemoryIdSet};
pub use movement::{
    ActorState, BlockerKind, Blockers, Direction, Motion, MoveOutcome, MovementEngine, TileArrival,
};
pub use overworld::{
    Focus, OverworldSession, ProgressStores, SessionEvent, AUDIO_ENCOUNTER, AUDIO_OVERWORLD,
    SCREEN_COLLECTION, SCREEN_TITLE,
};
pub use pause::{PauseAction, PauseItem, PauseMenu};
pub use tilemap::*;
pub use timers::{millis_to_ticks, Liveness, LivenessToken, TimerId, TimerQueue};
pub use world::{DoorDef, NpcDef, SignDef, WorldDefs};
