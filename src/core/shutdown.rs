//! # OS termination signals.
//!
//! [`wait_for_shutdown_signal`] backs [`EngineService::run_until_signal`](crate::EngineService::run_until_signal):
//! the host parks on it and the service stops the worker once a signal arrives.
//!
//! | Platform | Signals                                   |
//! |----------|-------------------------------------------|
//! | Unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`, Ctrl-C    |
//! | other    | Ctrl-C via [`tokio::signal::ctrl_c`]      |

/// Completes on the first termination signal.
///
/// Listeners are registered per call. Fails only if registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::info!(signal = name, "termination signal received");
    Ok(())
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl-c", "termination signal received");
    Ok(())
}
