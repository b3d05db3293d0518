//! Finalized layman configuration.
//!
//! Values come from three layers, lowest precedence first: built-in
//! defaults, the TOML config file, and command-line flags. The binary merges
//! the flags in; everything below the CLI only ever sees a [`Config`].

use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use crate::action::ActionKind;
use crate::db::DbFormat;
use crate::global::dirs::LaymanDirs;
use crate::overlay::OverlayKind;
use crate::util::terminal_width;

/// Program names (or paths) of the external tools used to mirror overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCommands {
    pub git: String,
    pub svn: String,
    pub rsync: String,
    pub mercurial: String,
    pub bzr: String,
    pub cvs: String,
    pub darcs: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            svn: "svn".to_string(),
            rsync: "rsync".to_string(),
            mercurial: "hg".to_string(),
            bzr: "bzr".to_string(),
            cvs: "cvs".to_string(),
            darcs: "darcs".to_string(),
        }
    }
}

impl ToolCommands {
    /// Returns the program used for `kind`, or `None` if it is handled in-process.
    pub fn program(&self, kind: OverlayKind) -> Option<&str> {
        match kind {
            OverlayKind::Git => Some(&self.git),
            OverlayKind::Svn => Some(&self.svn),
            OverlayKind::Rsync => Some(&self.rsync),
            OverlayKind::Mercurial => Some(&self.mercurial),
            OverlayKind::Bzr => Some(&self.bzr),
            OverlayKind::Cvs => Some(&self.cvs),
            OverlayKind::Darcs => Some(&self.darcs),
            OverlayKind::Tar => None,
        }
    }
}

/// The actions requested for this run.
///
/// A selection-valued action is requested when its list is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRequests {
    pub fetch: bool,
    pub nofetch: bool,
    pub add: Vec<String>,
    pub sync: Vec<String>,
    pub info: Vec<String>,
    pub sync_all: bool,
    pub delete: Vec<String>,
    pub list: bool,
    pub list_local: bool,
}

impl ActionRequests {
    pub fn contains(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Fetch => self.fetch,
            ActionKind::Add => !self.add.is_empty(),
            ActionKind::Sync => !self.sync.is_empty(),
            ActionKind::Info => !self.info.is_empty(),
            ActionKind::SyncAll => self.sync_all,
            ActionKind::Delete => !self.delete.is_empty(),
            ActionKind::List => self.list,
            ActionKind::ListLocal => self.list_local,
        }
    }
}

/// Contents of `layman.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    storage: Option<PathBuf>,
    cache: Option<PathBuf>,
    local_list: Option<PathBuf>,
    overlays: Vec<String>,
    proxy: Option<String>,
    umask: Option<String>,
    nocheck: Option<bool>,
    width: Option<usize>,
    quietness: Option<u8>,
    db_type: Option<DbFormat>,
    priority: Option<u32>,
    commands: ToolCommands,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding one working copy per installed overlay.
    pub storage: PathBuf,
    /// Prefix of the cached remote manifests.
    pub cache: PathBuf,
    /// File holding the installed catalog.
    pub local_list: PathBuf,
    /// Remote manifest URLs, in merge order.
    pub overlays: Vec<String>,
    pub proxy: Option<String>,
    /// File-creation mask applied while actions run, as an octal string.
    pub umask: String,
    pub nocheck: bool,
    pub verbose: bool,
    /// Output level from 0 (silent) to 4 (everything).
    pub quietness: u8,
    /// Display width for compact listings; 0 means detect.
    pub width: usize,
    pub db_format: DbFormat,
    /// Priority forced onto overlays added in this run.
    pub priority: Option<u32>,
    pub commands: ToolCommands,
    pub actions: ActionRequests,
}

impl Config {
    /// Loads the configuration file and fills in defaults.
    ///
    /// Without an explicit `path`, the per-user `layman.toml` is used if it
    /// exists. An explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let dirs = LaymanDirs::discover()?;
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                ConfigFile::load(path)?
            }
            None => {
                let default = dirs.config_file();
                if default.exists() {
                    ConfigFile::load(&default)?
                } else {
                    ConfigFile::default()
                }
            }
        };
        Ok(Config::from_file(file, &dirs))
    }

    /// Default configuration with all paths below `root`.
    pub fn rooted<P: Into<PathBuf>>(root: P) -> Config {
        Config::from_file(ConfigFile::default(), &LaymanDirs::rooted(root))
    }

    fn from_file(file: ConfigFile, dirs: &LaymanDirs) -> Config {
        let db_format = file.db_type.unwrap_or_default();
        let storage = file.storage.unwrap_or_else(|| dirs.storage());
        let local_list = file
            .local_list
            .unwrap_or_else(|| storage.join(format!("installed.{}", db_format.extension())));
        Config {
            cache: file.cache.unwrap_or_else(|| dirs.cache_prefix()),
            local_list,
            storage,
            overlays: file.overlays,
            proxy: file.proxy,
            umask: file.umask.unwrap_or_else(|| "0022".to_string()),
            nocheck: file.nocheck.unwrap_or(false),
            verbose: false,
            quietness: file.quietness.unwrap_or(4).min(4),
            width: file.width.unwrap_or(0),
            db_format,
            priority: file.priority,
            commands: file.commands,
            actions: ActionRequests::default(),
        }
    }

    /// External tools run without progress output below quietness 3.
    pub fn quiet(&self) -> bool {
        self.quietness < 3
    }

    /// The configured width, or the terminal width when it is 0.
    pub fn display_width(&self) -> usize {
        match self.width {
            0 => terminal_width(),
            width => width,
        }
    }
}
