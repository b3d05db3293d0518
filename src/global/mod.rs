//! Per-user directories and the on-disk manifest cache.

pub mod cache;
pub mod dirs;
