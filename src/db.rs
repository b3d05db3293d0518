//! Overlay catalogs.
//!
//! Two catalogs exist during a run: the installed overlays ([`LocalDb`]) and
//! the overlays advertised by the remote manifests ([`RemoteDb`]). Actions
//! only see them through the [`Catalog`], [`LocalStore`] and [`RemoteStore`]
//! traits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::config::{Config, ToolCommands};
use crate::error::{CatalogError, CatalogResult};
use crate::fetch::retrieve;
use crate::global::cache::{cache_manifest, cache_path, read_cached};
use crate::overlay::Overlay;
use crate::util::{delete_empty_directory, ensure_dir};
use crate::vcs::Vcs;

/// On-disk format of catalog documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbFormat {
    #[default]
    Json,
    Toml,
}

/// A catalog document: `overlay = [...]` in either format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    overlay: Vec<Overlay>,
}

impl DbFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DbFormat::Json => "json",
            DbFormat::Toml => "toml",
        }
    }

    /// Parses and validates a catalog document.
    ///
    /// `origin` names the document in error messages.
    pub fn parse(self, text: &str, origin: &str) -> CatalogResult<BTreeMap<String, Overlay>> {
        let document: Document = match self {
            DbFormat::Json => serde_json::from_str(text).map_err(|e| parse_error(origin, e))?,
            DbFormat::Toml => toml::from_str(text).map_err(|e| parse_error(origin, e))?,
        };
        index(document.overlay, origin)
    }

    pub fn render<'a, I>(self, overlays: I) -> CatalogResult<String>
    where
        I: IntoIterator<Item = &'a Overlay>,
    {
        let document = Document {
            overlay: overlays.into_iter().cloned().collect(),
        };
        match self {
            DbFormat::Json => serde_json::to_string_pretty(&document)
                .map_err(|e| parse_error("<installed>", e)),
            DbFormat::Toml => toml::to_string_pretty(&document)
                .map_err(|e| parse_error("<installed>", e)),
        }
    }
}

fn parse_error(origin: &str, error: impl std::fmt::Display) -> CatalogError {
    CatalogError::Parse {
        origin: origin.to_string(),
        message: error.to_string(),
    }
}

/// Keys overlays by name, enforcing unique names and at least one source.
fn index(overlays: Vec<Overlay>, origin: &str) -> CatalogResult<BTreeMap<String, Overlay>> {
    let mut map = BTreeMap::new();
    for overlay in overlays {
        if !is_safe_name(&overlay.name) {
            return Err(CatalogError::Invalid {
                origin: origin.to_string(),
                message: format!("overlay name \"{}\" is not a plain directory name", overlay.name),
            });
        }
        if overlay.sources.is_empty() {
            return Err(CatalogError::Invalid {
                origin: origin.to_string(),
                message: format!("overlay \"{}\" has no source", overlay.name),
            });
        }
        if map.contains_key(&overlay.name) {
            return Err(CatalogError::Invalid {
                origin: origin.to_string(),
                message: format!("overlay \"{}\" is defined twice", overlay.name),
            });
        }
        map.insert(overlay.name.clone(), overlay);
    }
    Ok(map)
}

/// Names become directories below storage, so they must stay a single
/// path component.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute()
}

/// One line of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Full record in verbose mode, compact line otherwise.
    pub text: String,
    pub supported: bool,
    pub official: bool,
}

/// Read access shared by both catalogs.
pub trait Catalog {
    /// All records, keyed and ordered by name.
    fn overlays(&self) -> &BTreeMap<String, Overlay>;

    /// Whether the tools needed for `overlay` are available on this host.
    fn is_supported(&self, overlay: &Overlay) -> bool;

    fn select(&self, name: &str) -> CatalogResult<&Overlay> {
        self.overlays()
            .get(name)
            .ok_or_else(|| CatalogError::UnknownOverlay(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        self.overlays().keys().cloned().collect()
    }

    /// Lazily renders every record, ordered by name.
    fn list(&self, verbose: bool, width: usize) -> Box<dyn Iterator<Item = ListEntry> + '_> {
        Box::new(self.overlays().values().map(move |overlay| ListEntry {
            text: if verbose {
                overlay.to_string()
            } else {
                overlay.short_list(width)
            },
            supported: self.is_supported(overlay),
            official: overlay.is_official(),
        }))
    }
}

/// The installed catalog, which also owns the working copies.
pub trait LocalStore: Catalog {
    fn add(&mut self, overlay: &Overlay, quiet: bool) -> CatalogResult<()>;
    fn delete(&mut self, overlay: &Overlay) -> CatalogResult<()>;
    fn sync(&mut self, name: &str, quiet: bool) -> CatalogResult<()>;
    /// Directory holding the working copies.
    fn storage(&self) -> &Path;
}

/// The catalog built from the fetched remote manifests.
pub trait RemoteStore: Catalog {
    /// Downloads every manifest, refreshes the cache files and reloads.
    fn cache(&mut self) -> CatalogResult<()>;
}

/// Installed overlays, persisted in `local_list`.
#[derive(Debug)]
pub struct LocalDb {
    path: PathBuf,
    format: DbFormat,
    priority: Option<u32>,
    commands: ToolCommands,
    vcs: Vcs,
    overlays: BTreeMap<String, Overlay>,
}

impl LocalDb {
    /// Reads the installed list. A missing file is an empty catalog.
    pub fn open(config: &Config) -> CatalogResult<LocalDb> {
        let path = config.local_list.clone();
        let overlays = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|e| CatalogError::io(&path, e))?;
            config.db_format.parse(&text, &path.display().to_string())?
        } else {
            BTreeMap::new()
        };
        log::debug!("Loaded {} installed overlays from {}", overlays.len(), path.display());
        Ok(LocalDb {
            path,
            format: config.db_format,
            priority: config.priority,
            commands: config.commands.clone(),
            vcs: Vcs::new(config),
            overlays,
        })
    }

    fn write(&self) -> CatalogResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let content = self.format.render(self.overlays.values())?;
        std::fs::write(&self.path, content).map_err(|e| CatalogError::io(&self.path, e))
    }
}

impl Catalog for LocalDb {
    fn overlays(&self) -> &BTreeMap<String, Overlay> {
        &self.overlays
    }

    fn is_supported(&self, overlay: &Overlay) -> bool {
        overlay.is_supported(&self.commands)
    }
}

impl LocalStore for LocalDb {
    fn add(&mut self, overlay: &Overlay, quiet: bool) -> CatalogResult<()> {
        if self.overlays.contains_key(&overlay.name) {
            return Err(CatalogError::AlreadyInstalled(overlay.name.clone()));
        }
        let mut overlay = overlay.clone();
        if let Some(priority) = self.priority {
            overlay.priority = priority;
        }
        ensure_dir(self.vcs.storage())?;
        if let Err(e) = self.vcs.add(&overlay, quiet) {
            delete_empty_directory(self.vcs.target(&overlay.name));
            return Err(e);
        }
        self.overlays.insert(overlay.name.clone(), overlay);
        self.write()
    }

    fn delete(&mut self, overlay: &Overlay) -> CatalogResult<()> {
        if !self.overlays.contains_key(&overlay.name) {
            return Err(CatalogError::UnknownOverlay(overlay.name.clone()));
        }
        self.vcs.remove(overlay)?;
        self.overlays.remove(&overlay.name);
        self.write()
    }

    fn sync(&mut self, name: &str, quiet: bool) -> CatalogResult<()> {
        let overlay = self.select(name)?.clone();
        self.vcs.sync(&overlay, quiet)
    }

    fn storage(&self) -> &Path {
        self.vcs.storage()
    }
}

/// Overlays advertised by the configured remote manifests.
#[derive(Debug)]
pub struct RemoteDb {
    urls: Vec<String>,
    cache: PathBuf,
    format: DbFormat,
    proxy: Option<String>,
    commands: ToolCommands,
    overlays: BTreeMap<String, Overlay>,
}

impl RemoteDb {
    /// Builds the catalog from the cached manifests of the last fetch.
    pub fn open(config: &Config) -> CatalogResult<RemoteDb> {
        let mut db = RemoteDb {
            urls: config.overlays.clone(),
            cache: config.cache.clone(),
            format: config.db_format,
            proxy: config.proxy.clone(),
            commands: config.commands.clone(),
            overlays: BTreeMap::new(),
        };
        db.reload()?;
        Ok(db)
    }

    /// Cache file of the manifest fetched from `url`.
    pub fn path(&self, url: &str) -> PathBuf {
        cache_path(&self.cache, url, self.format)
    }

    /// Merges all cached manifests. Later URLs override earlier names.
    fn reload(&mut self) -> CatalogResult<()> {
        let mut overlays = BTreeMap::new();
        for url in &self.urls {
            let path = self.path(url);
            match read_cached(&path)? {
                Some(text) => overlays.extend(self.format.parse(&text, url)?),
                None => log::debug!("No cached overlay list for {} at {}", url, path.display()),
            }
        }
        self.overlays = overlays;
        Ok(())
    }
}

impl Catalog for RemoteDb {
    fn overlays(&self) -> &BTreeMap<String, Overlay> {
        &self.overlays
    }

    fn is_supported(&self, overlay: &Overlay) -> bool {
        overlay.is_supported(&self.commands)
    }
}

impl RemoteStore for RemoteDb {
    fn cache(&mut self) -> CatalogResult<()> {
        for url in &self.urls {
            let body = retrieve(url, self.proxy.as_deref())?;
            let text = String::from_utf8(body).map_err(|e| parse_error(url, e))?;
            self.format.parse(&text, url)?;
            cache_manifest(&self.path(url), text.as_bytes())?;
            log::debug!("Cached overlay list from {}", url);
        }
        self.reload()
    }
}
