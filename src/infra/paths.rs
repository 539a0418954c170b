// src/infra/paths.rs — Path management
//
// All paths respect the WAYFARER_HOME environment variable for isolation.
// When WAYFARER_HOME is set, config and data live under that directory.
// When unset, config uses ~/.wayfarer/ and data uses XDG_DATA_HOME/wayfarer.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<ProjectDirs> = OnceLock::new();

fn project_dirs() -> &'static ProjectDirs {
    PROJECT_DIRS.get_or_init(|| {
        ProjectDirs::from("", "", "wayfarer").expect("Could not determine home directory")
    })
}

fn wayfarer_home() -> Option<PathBuf> {
    std::env::var_os("WAYFARER_HOME").map(PathBuf::from)
}

/// Configuration directory: $WAYFARER_HOME/ or ~/.wayfarer/
pub fn config_dir() -> PathBuf {
    if let Some(home) = wayfarer_home() {
        return home;
    }
    dirs_home().join(".wayfarer")
}

/// Data directory: $WAYFARER_HOME/data/ or XDG_DATA_HOME/wayfarer
pub fn data_dir() -> PathBuf {
    if let Some(home) = wayfarer_home() {
        return home.join("data");
    }
    project_dirs().data_local_dir().to_path_buf()
}

/// Home directory
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .expect("Could not determine home directory")
        .home_dir()
        .to_path_buf()
}

/// Ledger database path
pub fn db_path() -> PathBuf {
    data_dir().join("wayfarer.db")
}

/// Local session cache (client-side mirror of sessions + messages)
pub fn cache_path() -> PathBuf {
    data_dir().join("session-cache.json")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure all required directories exist
pub async fn ensure_dirs() -> anyhow::Result<()> {
    for dir in [config_dir(), data_dir()] {
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}
