//! The operations layman can perform.
//!
//! Each [`Action`] runs against a [`Context`] holding the configuration, both
//! catalogs and the output sink, and returns a result code: 0 for success,
//! non-zero if some requested overlay could not be handled. Per-overlay
//! failures never escape `run`; only [`Fatal`] conditions do.

use std::fmt;
use crate::config::{ActionRequests, Config};
use crate::db::{Catalog, ListEntry, LocalStore, RemoteStore};
use crate::error::Fatal;
use crate::output::Output;
use crate::util::delete_empty_directory;

/// Selection sentinel standing for every overlay of the relevant catalog.
pub const ALL: &str = "ALL";

const UNOFFICIAL: &str = "*** This is no official overlay ***\n";
const UNSUPPORTED: &str = "*** You are lacking the necessary tools to install this overlay ***\n";

/// Everything an action may read or mutate.
pub struct Context<'a> {
    pub config: &'a Config,
    pub local: &'a mut dyn LocalStore,
    pub remote: &'a mut dyn RemoteStore,
    pub out: &'a Output,
}

pub trait Action {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal>;
}

/// Names of the actions, as used by the dispatcher's precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Fetch,
    Add,
    Sync,
    Info,
    SyncAll,
    Delete,
    List,
    ListLocal,
}

impl ActionKind {
    /// Builds the action from the selections in `requests`.
    pub fn build(self, requests: &ActionRequests) -> Box<dyn Action> {
        match self {
            ActionKind::Fetch => Box::new(Fetch),
            ActionKind::Add => Box::new(Add::new(requests.add.clone())),
            ActionKind::Sync if requests.sync_all => Box::new(Sync::all()),
            ActionKind::Sync => Box::new(Sync::new(requests.sync.clone())),
            ActionKind::Info => Box::new(Info::new(requests.info.clone())),
            ActionKind::SyncAll => Box::new(Sync::all()),
            ActionKind::Delete => Box::new(Delete::new(requests.delete.clone())),
            ActionKind::List => Box::new(List),
            ActionKind::ListLocal => Box::new(ListLocal),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Fetch => "fetch",
            ActionKind::Add => "add",
            ActionKind::Sync => "sync",
            ActionKind::Info => "info",
            ActionKind::SyncAll => "sync_all",
            ActionKind::Delete => "delete",
            ActionKind::List => "list",
            ActionKind::ListLocal => "list_local",
        };
        f.write_str(name)
    }
}

/// Resolves the `ALL` sentinel against the keys `catalog` has right now.
fn expand<C: Catalog + ?Sized>(selection: &[String], catalog: &C) -> Vec<String> {
    if selection.iter().any(|name| name == ALL) {
        catalog.names()
    } else {
        selection.to_vec()
    }
}

/// Messages of a batch, reported grouped by severity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub successes: Vec<String>,
    pub warnings: Vec<String>,
    pub fatals: Vec<String>,
}

impl Outcome {
    /// Prints successes, then warnings, then fatals. Returns 1 if any fatal
    /// was recorded.
    pub fn report(&self, out: &Output) -> u32 {
        if !self.successes.is_empty() {
            out.info("\nSuccess:\n------\n", 3);
            for message in &self.successes {
                out.info(message, 3);
            }
        }
        if !self.warnings.is_empty() {
            out.warn("\nWarnings:\n------\n", 2);
            for message in &self.warnings {
                out.warn(&format!("{message}\n"), 2);
            }
        }
        if !self.fatals.is_empty() {
            out.error("\nErrors:\n------\n");
            for message in &self.fatals {
                out.error(&format!("{message}\n"));
            }
            return 1;
        }
        0
    }
}

/// Refreshes the cached remote manifests.
pub struct Fetch;

impl Action for Fetch {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal> {
        log::debug!("Fetching remote overlay lists");
        ctx.remote.cache().map_err(Fatal::Fetch)?;
        Ok(0)
    }
}

/// Updates installed overlays and reconciles them with the remote lists.
pub struct Sync {
    selection: Vec<String>,
    all: bool,
}

impl Sync {
    pub fn new(selection: Vec<String>) -> Self {
        Self {
            selection,
            all: false,
        }
    }

    /// Syncs every installed overlay.
    pub fn all() -> Self {
        Self {
            selection: Vec::new(),
            all: true,
        }
    }
}

impl Action for Sync {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal> {
        log::debug!("Updating selected overlays");
        let quiet = ctx.config.quiet();
        let selection = if self.all {
            ctx.local.names()
        } else {
            expand(&self.selection, &*ctx.local)
        };

        let mut outcome = Outcome::default();
        for name in &selection {
            let current = match ctx.local.select(name) {
                Ok(overlay) => overlay.primary_source().map(|source| source.src.clone()),
                Err(e) => {
                    outcome.fatals.push(e.to_string());
                    continue;
                }
            };

            match ctx.remote.select(name) {
                Ok(remote) => {
                    let advertised: Vec<&str> =
                        remote.sources.iter().map(|source| source.src.as_str()).collect();
                    if let Some(warning) = current
                        .as_deref()
                        .and_then(|current| source_changed(name, current, &advertised))
                    {
                        outcome.warnings.push(warning);
                    }
                }
                Err(_) => outcome.warnings.push(format!(
                    "Overlay \"{name}\" could not be found in the remote lists.\n\
                     Please check if it has been renamed and re-add if necessary."
                )),
            }

            match ctx.local.sync(name, quiet) {
                Ok(()) => outcome
                    .successes
                    .push(format!("Successfully synchronized overlay \"{name}\".")),
                Err(e) => outcome
                    .fatals
                    .push(format!("Failed to sync overlay \"{name}\".\nError was: {e}")),
            }
        }

        Ok(outcome.report(ctx.out))
    }
}

/// Warns when `current` is not among the `advertised` sources of an overlay.
///
/// Each distinct advertised source is listed once, numbered when there is
/// more than one.
fn source_changed(name: &str, current: &str, advertised: &[&str]) -> Option<String> {
    let mut candidates: Vec<&str> = Vec::new();
    for src in advertised {
        if !candidates.contains(src) {
            candidates.push(*src);
        }
    }
    if candidates.is_empty() || candidates.contains(&current) {
        return None;
    }

    let (listing, plural) = match candidates.as_slice() {
        [only] => (format!("  {only}"), ""),
        many => (
            many.iter()
                .enumerate()
                .map(|(i, src)| format!("  {}. {}", i + 1, src))
                .collect::<Vec<_>>()
                .join("\n"),
            "s",
        ),
    };

    Some(format!(
        "The source of the overlay \"{name}\" seems to have changed.\n\
         You currently sync from\n\
         \n  {current}\n\
         \n\
         while the remote lists report\n\
         \n\
         {listing}\n\
         \n\
         as correct location{plural}.\n\
         Please consider removing and re-adding the overlay."
    ))
}

/// Installs overlays from the remote lists.
pub struct Add {
    selection: Vec<String>,
}

impl Add {
    pub fn new(selection: Vec<String>) -> Self {
        Self { selection }
    }
}

impl Action for Add {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal> {
        log::debug!("Adding selected overlays");
        let quiet = ctx.config.quiet();
        let mut result = 0;
        for name in expand(&self.selection, &*ctx.remote) {
            let overlay = match ctx.remote.select(&name) {
                Ok(overlay) => overlay.clone(),
                Err(e) => {
                    ctx.out.warn(&e.to_string(), 2);
                    result = 1;
                    continue;
                }
            };
            match ctx.local.add(&overlay, quiet) {
                Ok(()) => ctx
                    .out
                    .info(&format!("Successfully added overlay \"{name}\"."), 2),
                Err(e) => {
                    ctx.out.warn(
                        &format!("Failed to add overlay \"{name}\".\nError was: {e}"),
                        2,
                    );
                    result = 1;
                }
            }
        }
        Ok(result)
    }
}

/// Removes installed overlays.
pub struct Delete {
    selection: Vec<String>,
}

impl Delete {
    pub fn new(selection: Vec<String>) -> Self {
        Self { selection }
    }
}

impl Action for Delete {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal> {
        log::debug!("Deleting selected overlays");
        let mut result = 0;
        for name in expand(&self.selection, &*ctx.local) {
            let overlay = match ctx.local.select(&name) {
                Ok(overlay) => overlay.clone(),
                Err(e) => {
                    ctx.out.warn(&e.to_string(), 2);
                    delete_empty_directory(ctx.local.storage().join(&name));
                    result = 1;
                    continue;
                }
            };
            match ctx.local.delete(&overlay) {
                Ok(()) => ctx
                    .out
                    .info(&format!("Successfully deleted overlay \"{name}\"."), 2),
                Err(e) => {
                    ctx.out.warn(
                        &format!("Failed to delete overlay \"{name}\".\nError was: {e}"),
                        2,
                    );
                    result = 1;
                }
            }
        }
        Ok(result)
    }
}

/// Describes overlays from the remote lists.
pub struct Info {
    selection: Vec<String>,
}

impl Info {
    pub fn new(selection: Vec<String>) -> Self {
        Self { selection }
    }
}

impl Action for Info {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal> {
        let mut result = 0;
        for name in expand(&self.selection, &*ctx.remote) {
            match ctx.remote.select(&name) {
                Ok(overlay) => {
                    ctx.out.info(&overlay.to_string(), 1);
                    if !overlay.is_official() {
                        ctx.out.warn(UNOFFICIAL, 1);
                    }
                    if !ctx.remote.is_supported(overlay) {
                        ctx.out.error(UNSUPPORTED);
                    }
                }
                Err(e) => {
                    ctx.out.warn(&e.to_string(), 2);
                    result = 1;
                }
            }
        }
        Ok(result)
    }
}

/// Prints one listing entry according to its supported/official flags.
///
/// Flagged entries are only printed when `show_flagged` is set; in verbose
/// mode they are preceded by a banner naming the problem.
fn show_entry(out: &Output, entry: &ListEntry, verbose: bool, show_flagged: bool) {
    if entry.supported {
        if entry.official {
            out.info(&entry.text, 1);
        } else if show_flagged {
            if verbose {
                out.warn(UNOFFICIAL, 1);
            }
            out.warn(&entry.text, 1);
        }
    } else if show_flagged {
        if verbose {
            out.error(UNSUPPORTED);
        }
        out.error(&entry.text);
    }
}

/// Lists the overlays of the remote lists.
pub struct List;

impl Action for List {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal> {
        let config = ctx.config;
        let show_flagged = config.nocheck || config.verbose;
        for entry in ctx.remote.list(config.verbose, config.display_width()) {
            show_entry(ctx.out, &entry, config.verbose, show_flagged);
        }
        Ok(0)
    }
}

/// Lists the installed overlays. Unlike [`List`], flagged entries are
/// always shown.
pub struct ListLocal;

impl Action for ListLocal {
    fn run(&self, ctx: &mut Context<'_>) -> Result<u32, Fatal> {
        let config = ctx.config;
        for entry in ctx.local.list(config.verbose, config.display_width()) {
            log::trace!("Printing local overlay");
            show_entry(ctx.out, &entry, config.verbose, true);
        }
        Ok(0)
    }
}
