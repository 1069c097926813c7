use std::env;
use std::sync::Arc;

use overworld_engine::sim::{
    EncounterError, OverworldSession, ProgressStores, SimConfig, DEFAULT_PLAYER_NAME,
};
use overworld_engine::{
    compile_world_file, resolve_app_paths, LoopConfig, Scene, StartupError, WorldCompileError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::OverworldScene;
use super::persistence::{JsonIdStore, CAUGHT_KEY, SAVE_FILE, SEEN_KEY};

const RNG_SEED_ENV_VAR: &str = "OVERWORLD_RNG_SEED";
const PLAYER_NAME_ENV_VAR: &str = "OVERWORLD_PLAYER_NAME";
const MAX_PLAYER_NAME_CHARS: usize = 10;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    World(#[from] WorldCompileError),
    #[error("invalid encounter config: {0}")]
    Encounter(#[from] EncounterError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    info!("=== Overworld Startup ===");

    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        save_dir = %app_paths.save_dir.display(),
        "startup"
    );
    let world = Arc::new(compile_world_file(&app_paths.world_file())?);

    let sim_config = SimConfig {
        player_name: player_name_from(read_env(PLAYER_NAME_ENV_VAR)),
        ..SimConfig::default()
    };
    let rng = match rng_seed_from(read_env(RNG_SEED_ENV_VAR)) {
        Some(seed) => {
            info!(seed, "rng_seeded");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let stores = ProgressStores {
        seen: Box::new(JsonIdStore::open(&app_paths.save_dir, SEEN_KEY)),
        caught: Box::new(JsonIdStore::open(&app_paths.save_dir, CAUGHT_KEY)),
    };

    let config = LoopConfig {
        window_title: world.name.clone(),
        ..LoopConfig::default()
    };
    let session = OverworldSession::new(sim_config, world, stores, rng)?;
    let scene = OverworldScene::new(session, app_paths.save_dir.join(SAVE_FILE));

    Ok(AppWiring {
        config,
        scene: Box::new(scene),
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_env(var: &'static str) -> Option<String> {
    match env::var(var) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(error) => {
            warn!(var, error = %error, "env_var_unreadable");
            None
        }
    }
}

fn player_name_from(raw: Option<String>) -> String {
    let Some(raw) = raw else {
        return DEFAULT_PLAYER_NAME.to_string();
    };
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_PLAYER_NAME_CHARS {
        warn!(
            value = %raw,
            max_chars = MAX_PLAYER_NAME_CHARS,
            fallback = DEFAULT_PLAYER_NAME,
            "player_name_rejected"
        );
        return DEFAULT_PLAYER_NAME.to_string();
    }
    name.to_string()
}

fn rng_seed_from(raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(error) => {
            warn!(value = %raw, error = %error, "rng_seed_rejected");
            None
        }
    }
}
