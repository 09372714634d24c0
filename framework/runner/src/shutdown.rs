use std::time::Duration;

use tokio::signal;
use tsp_bench_core::prelude::ShutdownHandle;

/// Trigger `handle` on Ctrl-C and, if given, once `timeout` has elapsed.
pub(crate) fn start_shutdown_listener(
    runtime: &tokio::runtime::Runtime,
    handle: &ShutdownHandle,
    timeout: Option<Duration>,
) {
    let listener_handle = handle.clone();
    runtime.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("Received shutdown signal, finishing the report...");
                listener_handle.shutdown();
            }
            Err(e) => log::error!("Failed to listen for Ctrl-C, interrupting will not write a report: {e}"),
        }
    });

    if let Some(timeout) = timeout {
        let timeout_handle = handle.clone();
        runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            log::warn!("Benchmark timed out after {}s", timeout.as_secs());
            timeout_handle.shutdown();
        });
    }
}
