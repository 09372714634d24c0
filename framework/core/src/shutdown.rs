use tokio::sync::watch::{Receiver, Sender};

/// Signals every listener that the benchmark should stop.
///
/// The signal is sticky: a listener created after [ShutdownHandle::shutdown] has been called
/// still observes the shutdown. Instances are processed one after another, so listeners are
/// created late and must not miss a Ctrl-C that arrived between two instances.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<bool>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::watch::channel(false).0,
        }
    }

    pub fn shutdown(&self) {
        // `send_replace` never fails, even when nobody is subscribed yet.
        let was_shutdown = self.sender.send_replace(true);
        if was_shutdown {
            log::debug!("Shutdown already requested");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn new_listener(&self) -> DelegatedShutdownListener {
        DelegatedShutdownListener::new(self.sender.subscribe())
    }
}

#[derive(Clone, Debug)]
pub struct DelegatedShutdownListener {
    receiver: Receiver<bool>,
}

impl DelegatedShutdownListener {
    pub(crate) fn new(receiver: Receiver<bool>) -> Self {
        Self { receiver }
    }

    /// Point in time check if the shutdown signal has been received. If this returns true then
    /// no new work should be started.
    pub fn should_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait for the shutdown signal to be received. It is safe to race this with another future
    /// so that the shutdown signal can be used to cancel work in progress.
    ///
    /// If every [ShutdownHandle] has been dropped then no signal can arrive any more and this
    /// future never completes.
    pub async fn wait_for_shutdown(&mut self) {
        if self.receiver.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Execution cancelled by shutdown signal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_created_after_shutdown_sees_it() {
        let handle = ShutdownHandle::new();
        assert!(!handle.new_listener().should_shutdown());

        handle.shutdown();

        assert!(handle.is_shutdown());
        assert!(handle.new_listener().should_shutdown());
    }

    #[test]
    fn repeated_shutdown_is_harmless() {
        let handle = ShutdownHandle::default();
        let listener = handle.new_listener();
        handle.shutdown();
        handle.shutdown();
        assert!(listener.should_shutdown());
    }

    #[tokio::test]
    async fn wait_for_shutdown_completes_once_signalled() {
        let handle = ShutdownHandle::new();
        let mut listener = handle.new_listener();

        let waiter = tokio::spawn(async move {
            listener.wait_for_shutdown().await;
        });
        handle.shutdown();

        tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .expect("listener was not woken")
            .unwrap();
    }

    #[test]
    fn shutdown_error_message() {
        assert_eq!(
            ShutdownSignalError::default().to_string(),
            "Execution cancelled by shutdown signal"
        );
    }
}
