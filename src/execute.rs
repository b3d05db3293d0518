use std::process::ExitCode;
use anyhow::Result;
use layman::action::Context;
use layman::config::Config;
use layman::db::{LocalDb, RemoteDb};
use layman::dispatch;
use layman::output::Output;
use crate::cli::CLI;

/// Builds the configuration from file and flags, opens both catalogs and
/// runs the requested actions.
pub fn execute(cli: CLI) -> Result<ExitCode> {
    if cli.nocolor {
        colored::control::set_override(false);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    log::debug!("Using storage {} and {} remote lists", config.storage.display(), config.overlays.len());

    let out = Output::new(config.quietness);
    let mut local = LocalDb::open(&config)?;
    let mut remote = RemoteDb::open(&config)?;
    let mut ctx = Context {
        config: &config,
        local: &mut local,
        remote: &mut remote,
        out: &out,
    };

    match dispatch::run(&mut ctx)? {
        0 => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}
