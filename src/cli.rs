use std::path::PathBuf;
use clap::Parser;
use layman::config::{ActionRequests, Config};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Add the given overlay from the remote lists. Use `ALL` for every overlay
    #[clap(short, long, value_name = "NAME")]
    pub add: Vec<String>,

    /// Remove the given overlay. Use `ALL` for every installed overlay
    #[clap(short, long, value_name = "NAME")]
    pub delete: Vec<String>,

    /// Update the given overlay. Use `ALL` for every installed overlay
    #[clap(short, long, value_name = "NAME")]
    pub sync: Vec<String>,

    /// Display all available information about the given overlay
    #[clap(short, long, value_name = "NAME")]
    pub info: Vec<String>,

    /// Update all installed overlays
    #[clap(short = 'S', long)]
    pub sync_all: bool,

    /// List the contents of the remote lists
    #[clap(short = 'L', long)]
    pub list: bool,

    /// List the locally installed overlays
    #[clap(short = 'l', long)]
    pub list_local: bool,

    /// Fetch the remote lists of overlays
    #[clap(short, long)]
    pub fetch: bool,

    /// Do not fetch the remote lists before sync or list
    #[clap(short, long)]
    pub nofetch: bool,

    /// Priority assigned to overlays added in this run
    #[clap(short, long, value_name = "N")]
    pub priority: Option<u32>,

    /// Path to an alternative configuration file
    #[clap(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Additional remote list to use. Can be given several times
    #[clap(short, long, value_name = "URL")]
    pub overlays: Vec<String>,

    /// Increase the amount of output and describe overlays in full
    #[clap(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[clap(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[clap(short = 'N', long)]
    pub nocolor: bool,

    /// Output level from 0 (only errors) to 4 (everything)
    #[clap(short = 'Q', long, value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(0..=4))]
    pub quietness: Option<u8>,

    /// Width of compact listings. Detected from the terminal if unset
    #[clap(short = 'W', long, value_name = "N")]
    pub width: Option<usize>,

    /// Also list overlays that are unofficial or lack the necessary tools
    #[clap(short = 'k', long)]
    pub nocheck: bool,
}

impl CLI {
    /// Merges the flags into `config`, overriding file values.
    pub fn apply(&self, config: &mut Config) {
        if !self.overlays.is_empty() {
            let mut overlays = self.overlays.clone();
            overlays.append(&mut config.overlays);
            config.overlays = overlays;
        }
        if let Some(priority) = self.priority {
            config.priority = Some(priority);
        }
        if let Some(quietness) = self.quietness {
            config.quietness = quietness;
        }
        if self.quiet {
            config.quietness = 0;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        config.nocheck |= self.nocheck;
        config.verbose = self.verbose;
        config.actions = ActionRequests {
            fetch: self.fetch,
            nofetch: self.nofetch,
            add: self.add.clone(),
            sync: self.sync.clone(),
            info: self.info.clone(),
            sync_all: self.sync_all,
            delete: self.delete.clone(),
            list: self.list,
            list_local: self.list_local,
        };
    }
}
