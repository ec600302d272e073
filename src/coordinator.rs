use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::context::{ContextMonitor, ContextProbe};
use crate::events::SubscriptionId;
use crate::scheduler::{BreakGate, GatedAction, Scheduler};
use crate::settings::{PolicyError, SettingsProvider};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[coordinator]";

use crate::{log_debug, log_info};

struct SuppressionLink {
    subscription: SubscriptionId,
    task: JoinHandle<()>,
}

/// Owns one scheduler and one context monitor and connects them: the
/// monitor's suppression signal pauses and resumes the scheduler.
pub struct Coordinator {
    scheduler: Scheduler,
    monitor: ContextMonitor,
    link: Option<SuppressionLink>,
}

impl Coordinator {
    pub fn new(settings: Arc<dyn SettingsProvider>, probe: Arc<dyn ContextProbe>) -> Self {
        let monitor = ContextMonitor::new(Arc::clone(&settings), probe);
        Self::with_monitor(settings, monitor)
    }

    pub fn with_monitor(settings: Arc<dyn SettingsProvider>, monitor: ContextMonitor) -> Self {
        Self {
            scheduler: Scheduler::new(settings),
            monitor,
            link: None,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn monitor(&self) -> &ContextMonitor {
        &self.monitor
    }

    pub async fn start(&mut self) {
        if self.link.is_none() {
            // Monitor listeners run synchronously on the polling task, so
            // changes are handed to a separate task that awaits the scheduler.
            let (tx, mut rx) = mpsc::unbounded_channel::<bool>();
            let subscription = self.monitor.subscribe(move |change| {
                let _ = tx.send(change.should_suppress);
            });

            let scheduler = self.scheduler.clone();
            let task = tokio::spawn(async move {
                while let Some(should_suppress) = rx.recv().await {
                    if should_suppress {
                        scheduler.pause().await;
                    } else {
                        scheduler.resume().await;
                    }
                }
            });

            self.link = Some(SuppressionLink { subscription, task });
        }

        self.scheduler.start().await;
        self.monitor.start();
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.monitor.stop().await?;
        if let Some(link) = self.link.take() {
            self.monitor.unsubscribe(link.subscription);
            link.task.abort();
        }
        self.scheduler.pause().await;
        log_info!("shut down");
        Ok(())
    }

    /// Hands the latest settings to both components.
    pub async fn refresh_settings(&self) {
        self.scheduler.update_settings().await;
        self.monitor.update_settings();
    }

    /// Skips the current countdown or break if the skip policy allows it.
    /// Returns whether the skip was forwarded.
    pub async fn request_skip(&self) -> bool {
        if !self.permits(GatedAction::Skip).await {
            return false;
        }
        self.scheduler.skip().await;
        true
    }

    pub async fn request_delay(&self, minutes: u32) -> Result<bool, PolicyError> {
        if minutes == 0 {
            return Err(PolicyError::ZeroDelay);
        }
        if !self.permits(GatedAction::Delay).await {
            return Ok(false);
        }
        self.scheduler.delay(minutes).await;
        Ok(true)
    }

    async fn permits(&self, action: GatedAction) -> bool {
        let phase = self.scheduler.get_status().await.state.phase;
        let policy = self.scheduler.policy().await.skip_policy;
        let allowed = policy.permits(action, phase);
        if !allowed {
            log_debug!("{action:?} refused in {phase:?} under {policy:?}");
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ActiveWindow, Bounds};
    use crate::scheduler::Phase;
    use crate::settings::{BreakPolicy, MemorySettings, SkipPolicy};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct IdleProbe {
        idle_seconds: AtomicU64,
    }

    impl ContextProbe for IdleProbe {
        fn idle_seconds(&self) -> Result<u64> {
            Ok(self.idle_seconds.load(Ordering::SeqCst))
        }

        fn active_window(&self) -> Result<Option<ActiveWindow>> {
            Ok(None)
        }

        fn displays(&self) -> Result<Vec<Bounds>> {
            Ok(Vec::new())
        }
    }

    fn coordinator(policy: BreakPolicy, probe: Arc<IdleProbe>) -> Coordinator {
        let settings: Arc<dyn SettingsProvider> =
            Arc::new(MemorySettings::new(policy, Default::default()));
        let monitor = ContextMonitor::new(Arc::clone(&settings), probe)
            .with_poll_interval(Duration::from_millis(10));
        Coordinator::with_monitor(settings, monitor)
    }

    async fn wait_for_paused(coordinator: &Coordinator, paused: bool) {
        for _ in 0..200 {
            if coordinator.scheduler().get_status().await.state.is_paused == paused {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("scheduler never reached is_paused == {paused}");
    }

    #[tokio::test]
    async fn idle_user_pauses_and_activity_resumes() {
        let probe = Arc::new(IdleProbe::default());
        let mut coordinator = coordinator(BreakPolicy::default(), probe.clone());

        coordinator.start().await;
        wait_for_paused(&coordinator, false).await;

        probe.idle_seconds.store(301, Ordering::SeqCst);
        wait_for_paused(&coordinator, true).await;
        assert!(!coordinator.scheduler().get_status().await.is_running);

        probe.idle_seconds.store(0, Ordering::SeqCst);
        wait_for_paused(&coordinator, false).await;
        assert!(coordinator.scheduler().get_status().await.is_running);

        coordinator.shutdown().await.unwrap();
        assert!(!coordinator.scheduler().get_status().await.is_running);
    }

    #[tokio::test]
    async fn hardcore_refuses_skip_and_delay() {
        let policy = BreakPolicy {
            skip_policy: SkipPolicy::Hardcore,
            ..BreakPolicy::default()
        };
        let coordinator = coordinator(policy, Arc::new(IdleProbe::default()));

        assert!(!coordinator.request_skip().await);
        assert_eq!(coordinator.request_delay(5).await, Ok(false));
    }

    #[tokio::test]
    async fn zero_minute_delay_is_rejected() {
        let coordinator = coordinator(BreakPolicy::default(), Arc::new(IdleProbe::default()));
        assert_eq!(
            coordinator.request_delay(0).await,
            Err(PolicyError::ZeroDelay)
        );
    }

    #[tokio::test]
    async fn balanced_skips_while_idle_are_refused() {
        let coordinator = coordinator(BreakPolicy::default(), Arc::new(IdleProbe::default()));
        coordinator.scheduler().start().await;

        assert_eq!(
            coordinator.scheduler().get_status().await.state.phase,
            Phase::Idle
        );
        assert!(!coordinator.request_skip().await);
        assert_eq!(coordinator.request_delay(5).await, Ok(true));
    }
}
