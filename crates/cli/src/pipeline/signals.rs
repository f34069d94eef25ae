//! SIGINT / SIGTERM / SIGHUP handling

use dispatcher::ShutdownFlag;
use tokio::task::JoinHandle;
use tracing::warn;

/// Trigger `shutdown` on the first termination signal
///
/// Handlers are installed before this returns, so a signal arriving right
/// after startup is not lost.
#[cfg(unix)]
pub fn spawn_signal_listener(shutdown: ShutdownFlag) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = hangup.recv() => "SIGHUP",
        };
        warn!(signal = name, "Received signal, shutting down");
        shutdown.trigger();
    }))
}

#[cfg(not(unix))]
pub fn spawn_signal_listener(shutdown: ShutdownFlag) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(signal = "ctrl-c", "Received signal, shutting down");
            shutdown.trigger();
        }
    }))
}
