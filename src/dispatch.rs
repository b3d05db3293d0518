//! Runs the requested actions in precedence order.

use crate::action::{Action, ActionKind, Context, Fetch};
use crate::error::Fatal;

/// Actions in the order they run when requested together.
pub const PRECEDENCE: [ActionKind; 8] = [
    ActionKind::Fetch,
    ActionKind::Add,
    ActionKind::Sync,
    ActionKind::Info,
    ActionKind::SyncAll,
    ActionKind::Delete,
    ActionKind::List,
    ActionKind::ListLocal,
];

/// Actions that need freshly fetched remote lists.
const FETCH_FIRST: [ActionKind; 3] = [ActionKind::Sync, ActionKind::SyncAll, ActionKind::List];

/// Runs every requested action and returns the process exit status.
///
/// Unless `nofetch` is set, the remote lists are fetched once up front when
/// any of sync, sync-all or list was requested. The configured umask is in
/// force while the actions run and restored afterwards on every path.
///
/// # Errors
///
/// Returns [`Fatal`] if fetching fails or the umask is not a valid octal
/// mode. No further actions run in that case.
pub fn run(ctx: &mut Context<'_>) -> Result<i32, Fatal> {
    let config = ctx.config;
    let requests = &config.actions;

    if !requests.nofetch && FETCH_FIRST.iter().any(|kind| requests.contains(*kind)) {
        log::debug!("Fetching remote lists before running actions");
        Fetch.run(ctx)?;
    }

    let _umask = UmaskGuard::install(&config.umask)?;

    let mut result = 0;
    for kind in PRECEDENCE {
        if requests.contains(kind) {
            log::debug!("Running action {}", kind);
            result += kind.build(requests).run(ctx)?;
        }
    }
    Ok(exit_status(result))
}

/// Collapses the summed action results to 0 or 1.
pub fn exit_status(sum: u32) -> i32 {
    if sum == 0 { 0 } else { 1 }
}

/// Parses an octal file-creation mask such as `"0022"`.
pub fn parse_umask(value: &str) -> Result<u32, Fatal> {
    let invalid = |message: String| Fatal::Umask {
        umask: value.to_string(),
        message,
    };
    let mask = u32::from_str_radix(value.trim(), 8).map_err(|e| invalid(e.to_string()))?;
    if mask > 0o777 {
        return Err(invalid("mask exceeds 0777".to_string()));
    }
    Ok(mask)
}

/// Process umask override, restored when dropped.
#[derive(Debug)]
pub struct UmaskGuard {
    #[cfg(unix)]
    previous: libc::mode_t,
}

impl UmaskGuard {
    pub fn install(value: &str) -> Result<UmaskGuard, Fatal> {
        let mask = parse_umask(value)?;
        log::debug!("Setting umask to {:o}", mask);
        #[cfg(unix)]
        {
            // SAFETY: umask only swaps the process mask and cannot fail.
            let previous = unsafe { libc::umask(mask as libc::mode_t) };
            Ok(UmaskGuard { previous })
        }
        #[cfg(not(unix))]
        {
            let _ = mask;
            Ok(UmaskGuard {})
        }
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        // SAFETY: see `install`.
        unsafe {
            libc::umask(self.previous);
        }
    }
}
