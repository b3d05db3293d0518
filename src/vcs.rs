use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use flate2::read::GzDecoder;
use tempfile::TempDir;
use crate::config::{Config, ToolCommands};
use crate::error::{CatalogError, CatalogResult};
use crate::fetch::retrieve;
use crate::overlay::{Overlay, OverlayKind, OverlaySource};
use crate::util::delete_empty_directory;

/// Rsync options shared by add and sync.
const RSYNC_OPTIONS: &[&str] = &[
    "-rlptDz",
    "--delete",
    "--delete-after",
    "--timeout=180",
    "--exclude=distfiles/*",
    "--exclude=local/*",
    "--exclude=packages/*",
];

/// A fully prepared external command.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
        }
    }

    fn arg<S: Into<String>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn flag_if(&mut self, enabled: bool, flag: &str) -> &mut Self {
        if enabled {
            self.args.push(flag.to_string());
        }
        self
    }

    fn path(&mut self, path: &Path) -> &mut Self {
        self.arg(path.to_string_lossy())
    }

    fn within(&mut self, dir: &Path) -> &mut Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Creates, updates and removes overlay working copies below the storage
/// directory, one subdirectory per overlay.
#[derive(Debug, Clone)]
pub struct Vcs {
    commands: ToolCommands,
    storage: PathBuf,
    proxy: Option<String>,
}

impl Vcs {
    pub fn new(config: &Config) -> Self {
        Self {
            commands: config.commands.clone(),
            storage: config.storage.clone(),
            proxy: config.proxy.clone(),
        }
    }

    pub fn storage(&self) -> &Path {
        &self.storage
    }

    /// Working copy location of the overlay `name`.
    pub fn target(&self, name: &str) -> PathBuf {
        self.storage.join(name)
    }

    /// Mirrors the overlay into its working copy.
    ///
    /// Sources are tried in order until one succeeds; the error of the last
    /// attempt is returned if none does.
    pub fn add(&self, overlay: &Overlay, quiet: bool) -> CatalogResult<()> {
        let target = self.target(&overlay.name);
        if target.exists() && !is_empty_dir(&target) {
            return Err(CatalogError::TargetExists(target));
        }
        let mut last_error = None;
        for source in &overlay.sources {
            let attempt = match self.add_command(&overlay.name, source, &target, quiet) {
                Some(invocation) => self.run(&invocation, quiet),
                None => self.add_tar(source, &target),
            };
            match attempt {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::debug!("Adding {} from {} failed: {}", overlay.name, source.src, e);
                    delete_empty_directory(&target);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| no_source(overlay)))
    }

    /// Updates the working copy from the primary source.
    pub fn sync(&self, overlay: &Overlay, quiet: bool) -> CatalogResult<()> {
        let source = overlay.primary_source().ok_or_else(|| no_source(overlay))?;
        let target = self.target(&overlay.name);
        match self.sync_command(source, &target, quiet) {
            Some(invocation) => {
                if !target.is_dir() {
                    return Err(CatalogError::io(
                        &target,
                        std::io::Error::new(std::io::ErrorKind::NotFound, "working copy is missing"),
                    ));
                }
                self.run(&invocation, quiet)
            }
            None => {
                let (_staging, tree) = self.stage_tar(source)?;
                self.remove(overlay)?;
                std::fs::rename(&tree, &target).map_err(|e| CatalogError::io(&target, e))
            }
        }
    }

    /// Deletes the working copy. A missing working copy is not an error.
    pub fn remove(&self, overlay: &Overlay) -> CatalogResult<()> {
        let target = self.target(&overlay.name);
        if target.exists() {
            std::fs::remove_dir_all(&target).map_err(|e| CatalogError::io(&target, e))?;
        }
        Ok(())
    }

    fn add_command(
        &self,
        name: &str,
        source: &OverlaySource,
        target: &Path,
        quiet: bool,
    ) -> Option<Invocation> {
        let program = self.commands.program(source.kind)?;
        let src = source.src.as_str();
        let mut cmd = Invocation::new(program);
        match source.kind {
            OverlayKind::Git => {
                cmd.arg("clone").flag_if(quiet, "--quiet");
                if let Some(branch) = &source.branch {
                    cmd.arg("--branch").arg(branch.as_str());
                }
                cmd.arg(src).path(target);
            }
            OverlayKind::Svn => {
                cmd.arg("checkout")
                    .flag_if(quiet, "-q")
                    .arg(format!("{}/", src.trim_end_matches('/')))
                    .path(target);
            }
            OverlayKind::Rsync => rsync(&mut cmd, src, target, quiet),
            OverlayKind::Mercurial => {
                cmd.arg("clone").flag_if(quiet, "-q").arg(src).path(target);
            }
            OverlayKind::Bzr => {
                cmd.arg("branch").arg(src).path(target);
            }
            OverlayKind::Cvs => {
                let module = source.subpath.as_deref().unwrap_or(name);
                cmd.flag_if(quiet, "-q")
                    .arg("-d")
                    .arg(src)
                    .arg("checkout")
                    .arg("-d")
                    .arg(name)
                    .arg(module)
                    .within(&self.storage);
            }
            OverlayKind::Darcs => {
                cmd.arg("get").arg("--partial").arg(src).path(target);
            }
            OverlayKind::Tar => return None,
        }
        Some(cmd)
    }

    fn sync_command(
        &self,
        source: &OverlaySource,
        target: &Path,
        quiet: bool,
    ) -> Option<Invocation> {
        let program = self.commands.program(source.kind)?;
        let src = source.src.as_str();
        let mut cmd = Invocation::new(program);
        match source.kind {
            OverlayKind::Git => {
                cmd.arg("-C").path(target).arg("pull").flag_if(quiet, "--quiet");
            }
            OverlayKind::Svn => {
                cmd.arg("update").flag_if(quiet, "-q").path(target);
            }
            OverlayKind::Rsync => rsync(&mut cmd, src, target, quiet),
            OverlayKind::Mercurial => {
                cmd.arg("pull").arg("-u").flag_if(quiet, "-q").within(target);
            }
            OverlayKind::Bzr => {
                cmd.arg("pull").arg("--overwrite").arg(src).within(target);
            }
            OverlayKind::Cvs => {
                cmd.flag_if(quiet, "-q").arg("update").arg("-d").within(target);
            }
            OverlayKind::Darcs => {
                cmd.arg("pull").arg("--all").arg(src).within(target);
            }
            OverlayKind::Tar => return None,
        }
        Some(cmd)
    }

    fn run(&self, invocation: &Invocation, quiet: bool) -> CatalogResult<()> {
        let label = invocation.to_string();
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        if quiet {
            cmd.stdout(Stdio::null());
        }
        log::debug!("Running `{}`", label);
        let status = cmd.status().map_err(|e| CatalogError::Tool {
            command: label.clone(),
            message: e.to_string(),
        })?;
        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit status {c}"));
            return Err(CatalogError::Tool {
                command: label,
                message: code,
            });
        }
        Ok(())
    }

    /// Downloads a tarball and unpacks it (or its `subpath`) into `target`.
    fn add_tar(&self, source: &OverlaySource, target: &Path) -> CatalogResult<()> {
        let (_staging, tree) = self.stage_tar(source)?;
        if target.exists() {
            std::fs::remove_dir(target).map_err(|e| CatalogError::io(target, e))?;
        }
        std::fs::rename(&tree, target).map_err(|e| CatalogError::io(target, e))
    }

    /// Unpacks the tarball behind `source` into a staging directory inside
    /// storage. Returns the staging guard and the overlay root within it.
    fn stage_tar(&self, source: &OverlaySource) -> CatalogResult<(TempDir, PathBuf)> {
        let archive = retrieve(&source.src, self.proxy.as_deref())?;
        let staging = tempfile::Builder::new()
            .prefix(".layman-")
            .tempdir_in(&self.storage)
            .map_err(|e| CatalogError::io(&self.storage, e))?;
        let tree = staging.path().join("tree");
        std::fs::create_dir(&tree).map_err(|e| CatalogError::io(&tree, e))?;

        let reader: Box<dyn Read> = if is_gzip(&source.src) {
            Box::new(GzDecoder::new(Cursor::new(archive)))
        } else {
            Box::new(Cursor::new(archive))
        };
        tar::Archive::new(reader)
            .unpack(&tree)
            .map_err(|e| CatalogError::io(&tree, e))?;

        let root = match &source.subpath {
            Some(subpath) => tree.join(subpath),
            None => tree,
        };
        if !root.is_dir() {
            return Err(CatalogError::Invalid {
                origin: source.src.clone(),
                message: format!(
                    "archive has no directory \"{}\"",
                    source.subpath.as_deref().unwrap_or_default()
                ),
            });
        }
        Ok((staging, root))
    }
}

fn rsync(cmd: &mut Invocation, src: &str, target: &Path, quiet: bool) {
    for option in RSYNC_OPTIONS {
        cmd.arg(*option);
    }
    cmd.flag_if(!quiet, "-v")
        .flag_if(!quiet, "--progress")
        .arg(format!("{}/", src.trim_end_matches('/')))
        .path(target);
}

fn is_gzip(src: &str) -> bool {
    src.ends_with(".gz") || src.ends_with(".tgz")
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn no_source(overlay: &Overlay) -> CatalogError {
    CatalogError::Invalid {
        origin: overlay.name.clone(),
        message: "overlay has no source".to_string(),
    }
}
