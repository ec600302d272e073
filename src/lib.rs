mod utils;

pub mod context;
pub mod coordinator;
pub mod events;
pub mod scheduler;
pub mod settings;

pub use context::{
    ActiveWindow, Bounds, ContextChanged, ContextMonitor, ContextProbe, ContextSample,
    SuppressReason, SystemProbe,
};
pub use coordinator::Coordinator;
pub use events::{EventBus, SubscriptionId};
pub use scheduler::{
    BreakEvent, BreakGate, BreakKind, GatedAction, Phase, ScheduleState, ScheduleStatus,
    Scheduler,
};
pub use settings::{
    AppSettings, BreakPolicy, FullScreenBehavior, MemorySettings, PolicyError, SettingsProvider,
    SettingsStore, SkipPolicy,
};

use anyhow::Context;
use std::{path::PathBuf, sync::Arc};

const CONFIG_ENV: &str = "LOOKAWAY_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "lookaway-settings.json";

fn settings_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Log sink standing in for on-screen notifications.
fn announce(event: &BreakEvent) {
    match event {
        BreakEvent::CountdownStart { seconds } => {
            log::info!("Break coming up in {seconds}s");
        }
        BreakEvent::BreakStart {
            duration_seconds,
            kind,
        } => {
            log::info!("{kind:?} break: look away for {duration_seconds}s");
        }
        BreakEvent::BreakEnd { kind } => log::info!("{kind:?} break over"),
        other => log::debug!("lifecycle event: {}", other.name()),
    }
}

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var, defaults to info)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("LookAway starting up...");

    let path = settings_path();
    let store = Arc::new(SettingsStore::new(path.clone())?);
    log::info!("Using settings at {}", path.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let settings: Arc<dyn SettingsProvider> = store.clone();
        let mut coordinator = Coordinator::new(settings, Arc::new(SystemProbe::new()));
        coordinator.scheduler().subscribe(announce);
        coordinator.monitor().subscribe(|change| {
            if change.should_suppress {
                log::info!("Holding breaks: {:?}", change.reason);
            } else {
                log::info!("Breaks active");
            }
        });

        coordinator.start().await;
        wait_for_shutdown(&coordinator, &store).await?;

        log::info!("Shutting down...");
        coordinator.shutdown().await
    })
}

/// Blocks until Ctrl-C. On Unix, SIGHUP reloads the settings file and hands
/// the result to the running components.
#[cfg(unix)]
async fn wait_for_shutdown(coordinator: &Coordinator, store: &SettingsStore) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("failed to listen for SIGHUP")?;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                return result.context("failed to listen for Ctrl-C");
            }
            _ = hangup.recv() => match store.reload() {
                Ok(()) => {
                    log::info!("Settings reloaded");
                    coordinator.refresh_settings().await;
                }
                Err(err) => log::warn!("Settings reload failed: {err:#}"),
            },
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_coordinator: &Coordinator, _store: &SettingsStore) -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")
}
