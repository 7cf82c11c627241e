//! Persistent state storage, following XDG Base Directory standards.
//!
//! Published slot state lives in XDG_STATE_HOME, keeping configuration and
//! state properly separated. Each configuration directory gets its own state
//! namespace so a `--config` run never clobbers the default profile's state.

pub mod snapshot;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::get_custom_config_dir;
use self::snapshot::PublishedState;

/// Get the state directory for a given configuration directory.
///
/// State is stored in XDG_STATE_HOME/timeslot/{namespace} where namespace is:
/// - "default" for the default config directory
/// - "custom_<hash>" for custom config directories (via --config)
pub fn get_state_dir(config_dir: Option<&Path>) -> Result<PathBuf> {
    let state_home = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local/state")
        });

    let state_base = state_home.join("timeslot");

    let namespace = match config_dir {
        None => "default".to_string(),
        Some(path) => {
            let default_config = dirs::config_dir()
                .context("Could not determine config directory")?
                .join("timeslot");
            if path == default_config {
                "default".to_string()
            } else {
                get_state_namespace(path)
            }
        }
    };

    Ok(state_base.join(namespace))
}

/// Generate a stable namespace for a custom config directory.
fn get_state_namespace(config_path: &Path) -> String {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());

    // SHA256 truncated to 16 chars for stability and uniqueness
    let hash = sha256::digest(canonical.to_string_lossy().as_bytes());
    format!("custom_{}", &hash[..16])
}

/// Path of the published-state file for the active config directory.
pub fn state_file_path() -> Result<PathBuf> {
    let config_dir = get_custom_config_dir();
    let state_dir = get_state_dir(config_dir.as_deref())?;
    Ok(state_dir.join("state.json"))
}

/// Load the previously published records for the active config directory.
///
/// A missing state file is a normal first run and yields an empty map.
pub fn load_snapshots() -> Result<BTreeMap<String, PublishedState>> {
    let path = state_file_path()?;
    snapshot::load_records(&path)
}
