use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;
use tracing::warn;

pub struct Shutdown {
    sender: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Shutdown { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Broadcasts once on ctrl-c or SIGTERM, whichever comes first.
    pub fn listen(self) {
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("received shutdown signal");
            if self.sender.send(()).is_err() {
                warn!("no subscriber is listening to shutdown signal");
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(err) => {
            warn!("failed to listen SIGTERM, error={err}");
            let _: Result<(), _> = signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = terminate.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("failed to listen ctrl-c, error={err}");
    }
}
