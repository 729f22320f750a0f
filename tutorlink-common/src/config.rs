//! Configuration loading and root folder resolution

use crate::Result;
use std::path::{Path, PathBuf};

/// Name of the SQLite database file under the root folder
pub const DATABASE_FILE: &str = "tutorlink.db";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Locate the configuration file for the platform, if one exists
fn find_config_file() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/tutorlink/config.toml first, then /etc/tutorlink/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("tutorlink").join("config.toml")) {
            if path.exists() {
                return Some(path);
            }
        }
        let system_config = PathBuf::from("/etc/tutorlink/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
        None
    } else {
        dirs::config_dir()
            .map(|d| d.join("tutorlink").join("config.toml"))
            .filter(|p| p.exists())
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/tutorlink (or /var/lib/tutorlink for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("tutorlink"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/tutorlink"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("tutorlink"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/tutorlink"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("tutorlink"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\tutorlink"))
    } else {
        PathBuf::from("./tutorlink_data")
    }
}

/// Ensure the root folder exists, creating it if needed
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

/// Path of the SQLite database file under the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join(DATABASE_FILE)
}
