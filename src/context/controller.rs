use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::events::{EventBus, SubscriptionId};
use crate::settings::SettingsProvider;

use super::loop_worker::{context_loop, ContextChanged, PollWorker, POLL_TIMEOUT};
use super::probe::ContextProbe;
use super::sample::{ContextSample, SuppressionRules};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[context]";

use crate::log_info;

pub const POLL_INTERVAL: Duration = Duration::from_millis(750);

/// Polls a [`ContextProbe`] on a fixed cadence and reports when breaks
/// should be held back. It never touches the scheduler itself.
pub struct ContextMonitor {
    probe: Arc<dyn ContextProbe>,
    settings: Arc<dyn SettingsProvider>,
    rules_tx: watch::Sender<SuppressionRules>,
    events: EventBus<ContextChanged>,
    latest: Arc<Mutex<Option<ContextSample>>>,
    poll_interval: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl ContextMonitor {
    pub fn new(settings: Arc<dyn SettingsProvider>, probe: Arc<dyn ContextProbe>) -> Self {
        let rules = SuppressionRules::from_settings(&settings.app_settings());
        let (rules_tx, _) = watch::channel(rules);

        Self {
            probe,
            settings,
            rules_tx,
            events: EventBus::new(),
            latest: Arc::new(Mutex::new(None)),
            poll_interval: POLL_INTERVAL,
            handle: None,
            cancel_token: None,
        }
    }

    /// Only affects loops started after the call.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ContextChanged) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self) {
        if self.handle.is_some() {
            log_info!("context monitor already running");
            return;
        }

        let cancel_token = CancellationToken::new();
        let worker = PollWorker {
            probe: Arc::clone(&self.probe),
            rules: self.rules_tx.subscribe(),
            events: self.events.clone(),
            latest: Arc::clone(&self.latest),
            poll_interval: self.poll_interval,
            poll_timeout: POLL_TIMEOUT,
        };

        let handle = tokio::spawn(context_loop(worker, cancel_token.clone()));
        log_info!("context monitor started ({:?} cadence)", self.poll_interval);

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            *self
                .latest
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
            handle
                .await
                .context("context loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }

    /// Re-reads focus apps, meeting keywords and full-screen behaviour.
    /// The running loop picks them up on its next poll.
    pub fn update_settings(&self) {
        let rules = SuppressionRules::from_settings(&self.settings.app_settings());
        self.rules_tx.send_replace(rules);
        log_info!("context rules refreshed");
    }

    pub fn last_sample(&self) -> Option<ContextSample> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Drop for ContextMonitor {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}
