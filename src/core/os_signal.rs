use crate::core::shutdown_manager::get_shutdown_manager;
use crate::logging::syslog::{error, info};
#[cfg(windows)]
use tokio::signal;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

#[cfg(unix)]
async fn handle_unix_signals() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info("SIGTERM received, starting shutdown process"),
        _ = sigint.recv() => info("SIGINT received, starting shutdown process"),
    };

    get_shutdown_manager().initiate_shutdown();
    Ok(())
}

#[cfg(windows)]
async fn handle_windows_signals() -> Result<(), Box<dyn std::error::Error>> {
    signal::ctrl_c().await?;
    info("Shutdown signal received, starting shutdown process");
    get_shutdown_manager().initiate_shutdown();
    Ok(())
}

pub fn start_os_signal_handling() {
    #[cfg(unix)]
    tokio::spawn(async {
        if let Err(e) = handle_unix_signals().await {
            error(format!("Error handling Unix signals: {}", e));
        }
    });

    #[cfg(windows)]
    tokio::spawn(async {
        if let Err(e) = handle_windows_signals().await {
            error(format!("Error handling Windows signals: {}", e));
        }
    });
}
