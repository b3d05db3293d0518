//! # Layman Core Library
//!
//! This crate contains the core logic of `layman`, a manager for overlays: named, versioned collections of
//! package definitions that are mirrored from remote sources into a local storage directory.
//!
//! `layman` keeps two catalogs. The remote catalog merges the overlay lists advertised at the configured URLs,
//! the local catalog records what has been installed. Actions such as add, sync or delete move overlays between
//! the two and drive the version control tools that keep the working copies up to date.
//!
//! This library is built for the `layman` CLI, but the catalogs and actions can be reused on their own.
//!
//! ## Modules Overview
//! - [`action`] – The user-level operations (fetch, add, sync, info, delete, list)
//! - [`dispatch`] – Runs requested actions in precedence order under the configured umask
//! - [`config`] – Configuration file loading and defaults
//! - [`db`] – Local and remote overlay catalogs and their on-disk formats
//! - [`overlay`] – Overlay records and their textual renderings
//! - [`vcs`] – Mirroring overlays with git, svn, rsync and friends, or from tarballs
//! - [`fetch`] – Retrieving remote overlay lists
//! - [`output`] – Leveled, colored user messages
//! - [`error`] – Error types shared across the crate
//! - [`util`] – Shared filesystem and formatting helpers
//! - [`global`] – Per-user directories and the manifest cache

pub mod action;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod global;
pub mod output;
pub mod overlay;
pub mod util;
pub mod vcs;

#[cfg(test)]
mod testing;

pub use action::{Action, ActionKind, Context};
pub use config::Config;
pub use db::{Catalog, DbFormat, LocalDb, LocalStore, RemoteDb, RemoteStore};
pub use error::{CatalogError, CatalogResult, Fatal};
pub use output::Output;
pub use overlay::{Overlay, OverlayKind, OverlaySource};
