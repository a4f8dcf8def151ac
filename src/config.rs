use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LabelError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "IMAGE_LABELLER_DATA_DIR";
/// Directory created under the platform data directory.
pub const APP_DIR_NAME: &str = "image-labeller";
/// Name of the JSON key-value store inside the data directory.
pub const STORE_FILE_NAME: &str = "config.json";
/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// AppConfig describes where the application keeps its state.
///
/// The structure is:
/// - `{data_dir}/config.json` - images path, label vocabulary and per-folder labels
///
/// The desktop shell builds it from Tauri's app data directory; headless use
/// and tests go through [`AppConfig::new`] or [`AppConfig::new_with_base`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base data directory for the application
    pub data_dir: PathBuf,
    /// Path to the key-value store file (config.json)
    pub store_file: PathBuf,
    /// Filter handed to env_logger when `RUST_LOG` is absent
    pub log_filter: String,
}

impl AppConfig {
    /// Creates a config rooted at the platform-appropriate data directory.
    ///
    /// On Linux: ~/.local/share/image-labeller/
    /// On macOS: ~/Library/Application Support/image-labeller/
    /// On Windows: C:\Users\{user}\AppData\Roaming\image-labeller\
    ///
    /// `IMAGE_LABELLER_DATA_DIR` takes precedence when set.
    pub fn new() -> Result<Self, LabelError> {
        let data_dir = resolve_data_dir(std::env::var_os(DATA_DIR_ENV), dirs::data_dir())?;
        Ok(Self::new_with_base(&data_dir))
    }

    /// Creates a config with a custom base directory.
    /// Useful for testing.
    pub fn new_with_base(base_dir: &Path) -> Self {
        let data_dir = base_dir.to_path_buf();
        let store_file = data_dir.join(STORE_FILE_NAME);

        Self {
            data_dir,
            store_file,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Ensures the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), LabelError> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Installs env_logger. Safe to call more than once.
    pub fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_filter.as_str());
        if env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .try_init()
            .is_err()
        {
            log::debug!("Logger already initialised");
        }
    }
}

/// Picks the data directory: an explicit override wins, then the platform
/// data directory joined with [`APP_DIR_NAME`].
pub fn resolve_data_dir(
    override_dir: Option<OsString>,
    platform_dir: Option<PathBuf>,
) -> Result<PathBuf, LabelError> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    platform_dir
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| LabelError::InvalidPath("Could not determine data directory".to_string()))
}
