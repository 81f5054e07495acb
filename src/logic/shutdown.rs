//! Cooperative shutdown
//!
//! A shared flag checked by the pipeline between frames. Termination
//! signals are awaited on a helper thread running its own current-thread
//! tokio runtime, so the detection loop itself stays synchronous.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Flip the flag on SIGINT, SIGTERM or SIGQUIT (Ctrl-C elsewhere).
    ///
    /// Later signals are only logged; the pipeline still gets to flush.
    pub fn install_signal_handlers(&self) -> std::io::Result<JoinHandle<()>> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let shutdown = self.clone();

        std::thread::Builder::new()
            .name("signal-listener".into())
            .spawn(move || {
                rt.block_on(async {
                    let mut signals = match Signals::new() {
                        Ok(s) => s,
                        Err(e) => {
                            log::error!("Signal listener failed: {}", e);
                            return;
                        }
                    };

                    loop {
                        match signals.next().await {
                            Ok(name) if shutdown.is_requested() => {
                                log::warn!("{} received, shutdown already in progress", name);
                            }
                            Ok(name) => {
                                log::info!("{} received, stopping after the current frame", name);
                                shutdown.request();
                            }
                            Err(e) => {
                                log::error!("Signal listener failed: {}", e);
                                return;
                            }
                        }
                    }
                });
            })
    }
}

#[cfg(unix)]
struct Signals {
    term: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            term: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn next(&mut self) -> std::io::Result<&'static str> {
        tokio::select! {
            r = tokio::signal::ctrl_c() => r.map(|_| "SIGINT"),
            _ = self.term.recv() => Ok("SIGTERM"),
            _ = self.quit.recv() => Ok("SIGQUIT"),
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> std::io::Result<&'static str> {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl-C")
    }
}
