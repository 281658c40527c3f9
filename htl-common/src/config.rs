//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Database file name under the root folder
const DATABASE_FILE: &str = "htl.db";

/// Resolves the HTL root folder following the priority order:
/// 1. Command-line argument (highest priority)
/// 2. `HTL_ROOT` environment variable
/// 3. `root_folder` key in the platform config.toml
/// 4. OS-dependent compiled default (fallback)
pub struct RootFolderResolver {
    module_name: &'static str,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    /// Create a resolver for the named module
    pub fn new(module_name: &'static str) -> Self {
        Self {
            module_name,
            cli_arg: None,
        }
    }

    /// Supply the command-line override, if the user passed one
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Resolve the root folder
    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var("HTL_ROOT") {
            info!("{}: root folder from HTL_ROOT: {}", self.module_name, path);
            return PathBuf::from(path);
        }

        // Priority 3: TOML config file
        if let Ok(config_path) = config_file_path() {
            if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
                if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                    if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                        info!(
                            "{}: root folder from {}: {}",
                            self.module_name,
                            config_path.display(),
                            root_folder
                        );
                        return PathBuf::from(root_folder);
                    }
                }
            }
        }

        // Priority 4: OS-dependent compiled default
        let default = default_root_folder();
        info!("{}: root folder default: {}", self.module_name, default.display());
        default
    }
}

/// Prepares a resolved root folder for use
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if it does not exist yet
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    /// Path of the SQLite database under the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}

/// Get the configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/htl/config.toml first, then /etc/htl/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("htl").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/htl/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("htl").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/htl (or /var/lib/htl for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("htl"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/htl"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/htl
        dirs::data_dir()
            .map(|d| d.join("htl"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/htl"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\htl
        dirs::data_local_dir()
            .map(|d| d.join("htl"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\htl"))
    } else {
        PathBuf::from("./htl_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let resolver = RootFolderResolver::new("test")
            .with_cli_arg(Some(PathBuf::from("/tmp/htl-cli-root")));
        assert_eq!(resolver.resolve(), PathBuf::from("/tmp/htl-cli-root"));
    }

    #[test]
    fn initializer_database_path() {
        let init = RootFolderInitializer::new(PathBuf::from("/tmp/htl-root"));
        assert_eq!(init.database_path(), PathBuf::from("/tmp/htl-root/htl.db"));
    }
}
