//! Best-effort crash diagnostics

use std::io::Write;
use std::sync::Once;
use tracing::error;

const TERMINATE_LOG: &str = "yarascanner_terminate.log";

static INSTALL: Once = Once::new();

/// Install a panic hook that appends a diagnostic line to
/// `yarascanner_terminate.log` in the process working directory before the
/// default hook runs. Installed once per process; safe to call repeatedly.
pub fn install_terminate_log_hook() {
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = append_terminate_log(info);
            error!(panic = %info, "fatal condition");
            previous(info);
        }));
    });
}

fn append_terminate_log(info: &std::panic::PanicHookInfo<'_>) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(TERMINATE_LOG)?;
    writeln!(
        file,
        "---- terminate at {} ----\n{}",
        crate::engine::current_datetime(),
        info
    )
}
