use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod sim;

pub use app::{
    action_for_key, run_app, text_height, text_width, wrap_text, ActionEdge,
    ActionQueue, ActionStates, AppError, Canvas, InputAction, InputConfig, InputDispatcher,
    InputError, InputSource, KeyEdge, LoopConfig, Renderer,
    Rgba, Scene, SceneCommand, SubscriptionId,
};
pub use content::{
    compile_world_file, compile_world_str, write_bytes_atomic, write_text_atomic, SourceLocation,
    WorldCompileError, WorldErrorCode,
};

pub const ROOT_ENV_VAR: &str = "OVERWORLD_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub save_dir: PathBuf,
}

impl AppPaths {
    pub fn world_file(&self) -> PathBuf {
        self.assets_dir.join("base").join("world.xml")
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("OVERWORLD_ROOT={path} is not a project root (needs Cargo.toml and assets/)")]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no project root above {start_dir}; looked for Cargo.toml next to assets/. \
Set OVERWORLD_ROOT to the checkout directory."
    )]
    RootNotFound { start_dir: PathBuf },
}

/// Locates the checkout root and makes sure the save directory exists.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env_root()? {
        Some(root) => root,
        None => search_upward_from_exe()?,
    };
    app_paths_for_root(root)
}

fn app_paths_for_root(root: PathBuf) -> Result<AppPaths, StartupError> {
    let save_dir = root.join("save");
    if let Err(source) = fs::create_dir_all(&save_dir) {
        return Err(StartupError::CreateSaveDir {
            path: save_dir,
            source,
        });
    }
    Ok(AppPaths {
        assets_dir: root.join("assets"),
        save_dir,
        root,
    })
}

fn env_root() -> Result<Option<PathBuf>, StartupError> {
    let raw = match env::var(ROOT_ENV_VAR) {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    let path = canonical_or_raw(Path::new(&raw));
    if looks_like_root(&path) {
        Ok(Some(path))
    } else {
        Err(StartupError::InvalidEnvRoot { path })
    }
}

fn search_upward_from_exe() -> Result<PathBuf, StartupError> {
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let Some(start) = exe.parent() else {
        return Err(StartupError::ExeHasNoParent(exe));
    };
    match start.ancestors().find(|dir| looks_like_root(dir)) {
        Some(root) => Ok(canonical_or_raw(root)),
        None => Err(StartupError::RootNotFound {
            start_dir: canonical_or_raw(start),
        }),
    }
}

fn looks_like_root(dir: &Path) -> bool {
    dir.join("Cargo.toml").is_file() && dir.join("assets").is_dir()
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
