//! Ctrl-C handling.
//!
//! A background thread drives a single-threaded tokio runtime that waits for
//! the signal and raises a shared flag. The simulation loop polls the flag
//! between days.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// Installs the handler and returns the flag it raises.
pub fn install_interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);

    let spawned = thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_io()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!(error = %e, "cannot start signal runtime, Ctrl-C will not flush");
                    return;
                }
            };
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("interrupt received, stopping after the current day");
                        raised.store(true, Ordering::SeqCst);
                    }
                    Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
                }
            });
        });
    if let Err(e) = spawned {
        warn!(error = %e, "cannot spawn signal thread, Ctrl-C will not flush");
    }
    flag
}
