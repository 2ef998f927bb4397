//! Signal handling for the one-shot run

use tokio_util::sync::CancellationToken;

/// Cancellation requested by the user with Ctrl-C or SIGTERM
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token cancelled when a shutdown signal arrives
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until a shutdown signal arrives
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Install the signal listeners
    #[cfg(unix)]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => tracing::debug!("received SIGINT"),
                _ = sigterm.recv() => tracing::debug!("received SIGTERM"),
            }
            token.cancel();
        });
        Ok(())
    }

    /// Install the signal listeners
    #[cfg(not(unix))]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        let token = self.token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
