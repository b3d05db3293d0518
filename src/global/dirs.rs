use std::path::PathBuf;
use anyhow::{anyhow, Result};
use directories::ProjectDirs;

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "layman.toml";

/// Per-user locations layman falls back to when the config file is silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaymanDirs {
    pub config: PathBuf,
    pub cache: PathBuf,
    pub data: PathBuf,
}

impl LaymanDirs {
    /// Resolves the platform directories (`~/.config/layman`, `~/.cache/layman`, ...).
    pub fn discover() -> Result<LaymanDirs> {
        let proj_dirs = ProjectDirs::from("org", "layman", "layman")
            .ok_or_else(|| anyhow!("Could not get project directories"))?;
        Ok(LaymanDirs {
            config: proj_dirs.config_dir().to_path_buf(),
            cache: proj_dirs.cache_dir().to_path_buf(),
            data: proj_dirs.data_dir().to_path_buf(),
        })
    }

    /// Places all three directories below a single root.
    pub fn rooted<P: Into<PathBuf>>(root: P) -> LaymanDirs {
        let root = root.into();
        LaymanDirs {
            config: root.join("config"),
            cache: root.join("cache"),
            data: root.join("data"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config.join(CONFIG_FILE_NAME)
    }

    /// Default directory holding the overlay working copies.
    pub fn storage(&self) -> PathBuf {
        self.data.join("overlays")
    }

    /// Default prefix for cached remote manifests.
    pub fn cache_prefix(&self) -> PathBuf {
        self.cache.join("remote")
    }
}
