use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::events::EventBus;

use super::probe::ContextProbe;
use super::sample::{ContextSample, SuppressReason, SuppressionRules};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[context]";

use crate::{log_debug, log_error, log_info, log_warn};

pub(super) const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Emitted whenever `should_suppress` flips, and once for the first poll.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextChanged {
    pub should_suppress: bool,
    pub reason: Option<SuppressReason>,
}

pub(super) struct PollWorker {
    pub probe: Arc<dyn ContextProbe>,
    pub rules: watch::Receiver<SuppressionRules>,
    pub events: EventBus<ContextChanged>,
    pub latest: Arc<Mutex<Option<ContextSample>>>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

type ProbeTask = JoinHandle<Result<ContextSample>>;

/// Edge detector over the suppression flag.
#[derive(Debug, Default)]
pub(super) struct SuppressionEdge {
    last: Option<bool>,
}

impl SuppressionEdge {
    /// True on the first observation and on every change after it.
    pub fn observe(&mut self, should_suppress: bool) -> bool {
        let changed = self.last != Some(should_suppress);
        self.last = Some(should_suppress);
        changed
    }
}

pub(super) async fn context_loop(worker: PollWorker, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(worker.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut edge = SuppressionEdge::default();
    // A probe that outlived its timeout; blocking work cannot be aborted,
    // so no new probe starts until it returns.
    let mut straggler: Option<ProbeTask> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if straggler.as_ref().is_some_and(|task| !task.is_finished()) {
                    log_debug!("previous context poll still running, skipping tick");
                } else {
                    straggler = None;
                    poll_once(&worker, &mut edge, &mut straggler).await;
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("context loop shutting down");
                break;
            }
        }
    }
}

async fn poll_once(worker: &PollWorker, edge: &mut SuppressionEdge, straggler: &mut Option<ProbeTask>) {
    let rules = worker.rules.borrow().clone();
    let probe = Arc::clone(&worker.probe);
    let mut task = tokio::task::spawn_blocking(move || read_context(probe.as_ref(), &rules));

    match tokio::time::timeout(worker.poll_timeout, &mut task).await {
        Ok(Ok(Ok(sample))) => publish(worker, edge, sample),
        Ok(Ok(Err(err))) => log_warn!("context poll skipped: {err:#}"),
        Ok(Err(err)) => log_error!("context probe worker join failed: {err:?}"),
        Err(_) => {
            log_warn!("context poll timeout (> {:?})", worker.poll_timeout);
            *straggler = Some(task);
        }
    }
}

fn publish(worker: &PollWorker, edge: &mut SuppressionEdge, sample: ContextSample) {
    let change = edge.observe(sample.should_suppress).then(|| ContextChanged {
        should_suppress: sample.should_suppress,
        reason: sample.reason,
    });

    *worker
        .latest
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(sample);

    if let Some(change) = change {
        log_info!(
            "suppression {} ({:?})",
            if change.should_suppress { "on" } else { "off" },
            change.reason
        );
        worker.events.emit(&change);
    }
}

/// Fails only when the idle query fails; the caller then keeps the previous
/// suppression value. Window and display failures degrade to "no window"
/// and "no displays" for this sample.
pub(super) fn read_context(
    probe: &dyn ContextProbe,
    rules: &SuppressionRules,
) -> Result<ContextSample> {
    let idle_seconds = probe.idle_seconds().context("idle query failed")?;

    let window = probe.active_window().unwrap_or_else(|err| {
        log_warn!("active window query failed: {err:#}");
        None
    });

    let displays = match &window {
        Some(_) => probe.displays().unwrap_or_else(|err| {
            log_warn!("display query failed: {err:#}");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let sample = ContextSample::evaluate(rules, idle_seconds, window.as_ref(), &displays);
    log_debug!(
        "idle={}s process={:?} suppress={}",
        idle_seconds,
        sample.active_process_name,
        sample.should_suppress
    );
    Ok(sample)
}
