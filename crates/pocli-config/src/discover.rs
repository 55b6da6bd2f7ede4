//! Config file search.

use std::path::{Path, PathBuf};

use crate::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAMES};

/// Outcome of the config file search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFile {
    /// Named on the command line; failing to load it is fatal.
    Explicit(PathBuf),
    /// Found by searching the standard locations.
    Discovered(PathBuf),
    /// Nothing to load; defaults and the other sources apply.
    Absent,
}

/// Ordered search list: the working directory first, then the per-user
/// configuration directory.
#[must_use]
pub fn candidate_paths(working_dir: Option<&Path>, user_config_dir: Option<&Path>) -> Vec<PathBuf> {
    let user_dir = user_config_dir.map(|dir| dir.join(CONFIG_DIR_NAME));
    working_dir
        .map(Path::to_path_buf)
        .into_iter()
        .chain(user_dir)
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .collect()
}

/// Pick the config file for this invocation. An explicit path always wins,
/// whether or not it exists; otherwise the first existing candidate is used.
#[must_use]
pub fn discover_config_file(
    explicit: Option<&Path>,
    working_dir: Option<&Path>,
    user_config_dir: Option<&Path>,
) -> ConfigFile {
    if let Some(path) = explicit {
        return ConfigFile::Explicit(path.to_path_buf());
    }

    candidate_paths(working_dir, user_config_dir)
        .into_iter()
        .find(|path| path.is_file())
        .map_or(ConfigFile::Absent, ConfigFile::Discovered)
}
