use std::future::Future;

use tsp_bench_core::prelude::{ShutdownHandle, ShutdownSignalError};

#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub fn new(runtime: tokio::runtime::Runtime, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runtime,
            shutdown_handle,
        }
    }

    /// Create an executor on a fresh multi-threaded runtime.
    pub fn with_new_runtime(shutdown_handle: ShutdownHandle) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(Self::new(runtime, shutdown_handle))
    }

    pub fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown_handle
    }

    pub fn runtime(&self) -> &tokio::runtime::Runtime {
        &self.runtime
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// The future is dropped, and any subprocess it owns killed, as soon as the shutdown signal
    /// is received. In that case the error is a [ShutdownSignalError].
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        if shutdown_listener.should_shutdown() {
            return Err(anyhow::anyhow!(ShutdownSignalError::default()));
        }

        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn completed_future_returns_its_value() {
        let executor = Executor::with_new_runtime(ShutdownHandle::new()).unwrap();
        let value = executor.execute_in_place(async { Ok(42) }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn shutdown_cancels_work_in_progress() {
        let handle = ShutdownHandle::new();
        let executor = Executor::with_new_runtime(handle.clone()).unwrap();

        let trigger = handle.clone();
        executor.runtime().spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.shutdown();
        });

        let result = executor.execute_in_place(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        assert!(result.unwrap_err().is::<ShutdownSignalError>());
    }

    #[test]
    fn no_new_work_after_shutdown() {
        let handle = ShutdownHandle::new();
        let executor = Executor::with_new_runtime(handle.clone()).unwrap();
        handle.shutdown();

        let result = executor.execute_in_place(async { Ok(()) });
        assert!(result.unwrap_err().is::<ShutdownSignalError>());
    }
}
