use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    events::{EventBus, SubscriptionId},
    settings::{BreakPolicy, SettingsProvider},
};
use crate::{log_debug, log_info};

use super::{
    events::BreakEvent,
    state::{BreakKind, Phase, ScheduleState},
    timers::{TimerSlot, TimerSlots},
};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[scheduler]";

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Point-in-time copy of the scheduler state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatus {
    #[serde(flatten)]
    pub state: ScheduleState,
    pub is_running: bool,
    /// Time until the next countdown, measured on the scheduler's clock.
    pub next_break_in_ms: Option<u64>,
}

struct Inner {
    state: ScheduleState,
    policy: BreakPolicy,
    running: bool,
    next_break_deadline: Option<Instant>,
    /// Kind chosen when the current break started; the counter update at
    /// the end of the break uses it so both decisions always agree.
    active_break: Option<BreakKind>,
    timers: TimerSlots,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Taken before `inner` is released and held while listeners run, so
    /// concurrent transitions reach subscribers in the order they happened.
    emit_order: Mutex<()>,
    events: EventBus<BreakEvent>,
    settings: Arc<dyn SettingsProvider>,
}

/// The break engine. Cheap to clone; all clones drive the same state.
/// Calls made in a phase where they do not apply are ignored.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        let policy = settings.break_policy();
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: ScheduleState::new(),
                    policy,
                    running: false,
                    next_break_deadline: None,
                    active_break: None,
                    timers: TimerSlots::new(),
                }),
                emit_order: Mutex::new(()),
                events: EventBus::new(),
                settings,
            }),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&BreakEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    pub async fn start(&self) {
        self.begin_running("started").await;
    }

    /// Re-arms a full interval; time already waited before the pause is
    /// not credited.
    pub async fn resume(&self) {
        self.begin_running("resumed").await;
    }

    pub async fn pause(&self) {
        let mut inner = self.shared.inner.lock().await;
        if !inner.running {
            return;
        }
        inner.running = false;
        inner.state.is_paused = true;
        inner.timers.cancel_all();
        inner.next_break_deadline = None;
        log_info!("paused in {:?}", inner.state.phase);
        self.release_and_emit(inner, &[BreakEvent::Pause]).await;
    }

    pub async fn skip(&self) {
        let mut inner = self.shared.inner.lock().await;
        let mut events = Vec::new();
        match inner.state.phase {
            Phase::Break => {
                log_info!("break skipped");
                events.extend(self.end_break(&mut inner));
            }
            Phase::Countdown => {
                log_info!("countdown skipped");
                self.return_to_idle(&mut inner);
            }
            Phase::Idle | Phase::Overtime => {}
        }
        events.push(BreakEvent::Skip);
        self.release_and_emit(inner, &events).await;
    }

    /// Postpones an announced break: the next one is due a full interval
    /// plus `minutes` from now. Ignored outside an active countdown.
    pub async fn delay(&self, minutes: u32) {
        let mut inner = self.shared.inner.lock().await;
        if !inner.running || inner.state.phase != Phase::Countdown {
            return;
        }
        log_info!("break delayed by {minutes} min");
        let extra = Duration::from_secs(u64::from(minutes) * 60);
        self.schedule_next_break(&mut inner, extra);
        self.release_and_emit(inner, &[BreakEvent::Delay { minutes }])
            .await;
    }

    /// Takes a fresh policy snapshot from the settings provider. A pending
    /// idle wait restarts from now with the new interval; a countdown or
    /// break in progress finishes under the policy it started with.
    pub async fn update_settings(&self) {
        let policy = self.shared.settings.break_policy();
        let mut inner = self.shared.inner.lock().await;
        inner.policy = policy;
        if inner.running && inner.state.phase == Phase::Idle {
            self.schedule_next_break(&mut inner, Duration::ZERO);
        }
    }

    pub async fn get_status(&self) -> ScheduleStatus {
        let inner = self.shared.inner.lock().await;
        let next_break_in_ms = match (inner.running, inner.state.phase, inner.next_break_deadline) {
            (true, Phase::Idle, Some(deadline)) => Some(
                u64::try_from(deadline.saturating_duration_since(Instant::now()).as_millis())
                    .unwrap_or(u64::MAX),
            ),
            _ => None,
        };

        ScheduleStatus {
            state: inner.state.clone(),
            is_running: inner.running,
            next_break_in_ms,
        }
    }

    pub async fn policy(&self) -> BreakPolicy {
        self.shared.inner.lock().await.policy.clone()
    }

    async fn begin_running(&self, label: &str) {
        let mut inner = self.shared.inner.lock().await;
        if inner.running {
            return;
        }
        inner.running = true;
        inner.state.is_paused = false;
        log_info!("{label}");
        self.schedule_next_break(&mut inner, Duration::ZERO);
        self.release_and_emit(inner, &[BreakEvent::Resume]).await;
    }

    fn schedule_next_break(&self, inner: &mut Inner, extra: Duration) {
        inner.timers.cancel_all();
        inner.active_break = None;

        let kind = inner.state.upcoming_break_kind(&inner.policy);
        let wait = Duration::from_secs(inner.policy.interval_secs(kind.is_long())) + extra;
        let deadline = Instant::now() + wait;
        let next_break_at = chrono::Duration::from_std(wait)
            .ok()
            .and_then(|wait| Utc::now().checked_add_signed(wait));

        inner.next_break_deadline = Some(deadline);
        inner.state.enter_idle(next_break_at);

        let generation = inner.timers.next_generation();
        let handle = self.spawn_deadline(TimerSlot::NextBreak, generation, deadline);
        inner.timers.arm(TimerSlot::NextBreak, generation, handle);

        log_info!("next {:?} break in {}s", kind, wait.as_secs());
    }

    fn return_to_idle(&self, inner: &mut Inner) {
        if inner.running {
            self.schedule_next_break(inner, Duration::ZERO);
        } else {
            inner.timers.cancel_all();
            inner.next_break_deadline = None;
            inner.active_break = None;
            inner.state.enter_idle(None);
        }
    }

    fn start_countdown(&self, inner: &mut Inner) -> Vec<BreakEvent> {
        inner.timers.cancel_all();
        inner.next_break_deadline = None;

        let seconds = u64::from(inner.policy.heads_up_seconds);
        let mut events = vec![BreakEvent::CountdownStart { seconds }];
        log_info!("countdown started ({seconds}s)");

        if seconds == 0 {
            events.extend(self.start_break(inner));
        } else {
            inner.state.enter_countdown(seconds);
            self.arm_ticker(inner, TimerSlot::Countdown);
        }
        events
    }

    fn start_break(&self, inner: &mut Inner) -> Vec<BreakEvent> {
        inner.timers.cancel_all();

        let kind = inner.state.upcoming_break_kind(&inner.policy);
        let duration_seconds = inner.policy.break_duration_secs(kind.is_long());
        inner.active_break = Some(kind);
        inner.state.enter_break(duration_seconds);
        log_info!("{:?} break started ({duration_seconds}s)", kind);

        let mut events = vec![BreakEvent::BreakStart {
            duration_seconds,
            kind,
        }];
        if duration_seconds == 0 {
            events.extend(self.end_break(inner));
        } else {
            self.arm_ticker(inner, TimerSlot::Break);
        }
        events
    }

    fn end_break(&self, inner: &mut Inner) -> Vec<BreakEvent> {
        inner.timers.cancel_all();

        let kind = match inner.active_break.take() {
            Some(kind) => kind,
            None => inner.state.upcoming_break_kind(&inner.policy),
        };
        inner.state.complete_break(kind);
        log_info!(
            "{:?} break finished (cycle {}/{}, long breaks {})",
            kind,
            inner.state.short_breaks_completed_in_cycle,
            inner.policy.long_break_every_n_short_breaks,
            inner.state.long_breaks_completed
        );

        self.return_to_idle(inner);
        vec![BreakEvent::BreakEnd { kind }]
    }

    fn arm_ticker(&self, inner: &mut Inner, slot: TimerSlot) {
        let generation = inner.timers.next_generation();
        let handle = self.spawn_ticker(slot, generation);
        inner.timers.arm(slot, generation, handle);
        log_debug!("armed {:?} ({} timer active)", slot, inner.timers.armed_count());
    }

    fn spawn_deadline(&self, slot: TimerSlot, generation: u64, deadline: Instant) -> JoinHandle<()> {
        let shared = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            time::sleep_until(deadline).await;
            if let Some(scheduler) = Scheduler::upgrade(&shared) {
                scheduler.on_timer(slot, generation).await;
            }
        })
    }

    fn spawn_ticker(&self, slot: TimerSlot, generation: u64) -> JoinHandle<()> {
        let shared = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            loop {
                ticker.tick().await;
                let Some(scheduler) = Scheduler::upgrade(&shared) else {
                    break;
                };
                if !scheduler.on_timer(slot, generation).await {
                    break;
                }
            }
        })
    }

    /// Handles a timer wake-up. Returns whether a ticker should keep going.
    async fn on_timer(&self, slot: TimerSlot, generation: u64) -> bool {
        let mut inner = self.shared.inner.lock().await;
        if !inner.timers.is_current(slot, generation) {
            return false;
        }

        let events = match slot {
            TimerSlot::NextBreak => {
                inner.timers.release(slot);
                self.start_countdown(&mut inner)
            }
            TimerSlot::Countdown | TimerSlot::Break => {
                if inner.state.tick() > 0 {
                    return true;
                }
                inner.timers.release(slot);
                if slot == TimerSlot::Countdown {
                    self.start_break(&mut inner)
                } else {
                    self.end_break(&mut inner)
                }
            }
        };

        self.release_and_emit(inner, &events).await;
        false
    }

    /// Releases the state lock and emits `events`. The emit lock is taken
    /// first, so listeners never see two transitions interleaved or out of
    /// order, even on a multi-threaded runtime.
    async fn release_and_emit(&self, inner: MutexGuard<'_, Inner>, events: &[BreakEvent]) {
        let _order = self.shared.emit_order.lock().await;
        drop(inner);
        for event in events {
            log_debug!("emit {}", event.name());
            self.shared.events.emit(event);
        }
    }

    fn upgrade(shared: &Weak<Shared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AppSettings, MemorySettings};
    use std::sync::Mutex as StdMutex;

    const INTERVAL_MS: u64 = 20 * 60 * 1000;

    fn scheduler_with(policy: BreakPolicy) -> (Scheduler, Arc<MemorySettings>) {
        let settings = Arc::new(MemorySettings::new(policy, AppSettings::default()));
        (Scheduler::new(settings.clone()), settings)
    }

    fn record(scheduler: &Scheduler) -> Arc<StdMutex<Vec<BreakEvent>>> {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        scheduler.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    async fn advance_secs(secs: f64) {
        time::sleep(Duration::from_secs_f64(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);

        scheduler.start().await;
        scheduler.start().await;

        let status = scheduler.get_status().await;
        assert!(status.is_running);
        assert!(!status.state.is_paused);
        assert_eq!(status.state.phase, Phase::Idle);
        assert!(status.state.next_break_at.is_some());
        assert_eq!(status.next_break_in_ms, Some(INTERVAL_MS));
        assert_eq!(*events.lock().unwrap(), vec![BreakEvent::Resume]);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_then_break_then_idle() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;

        advance_secs(1200.5).await;
        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Countdown);
        assert_eq!(status.state.seconds_remaining, 10);
        assert!(status.state.next_break_at.is_none());

        advance_secs(4.0).await;
        assert_eq!(scheduler.get_status().await.state.seconds_remaining, 6);

        advance_secs(6.0).await;
        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Break);
        assert_eq!(status.state.seconds_remaining, 20);

        advance_secs(20.0).await;
        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Idle);
        assert_eq!(status.state.short_breaks_completed_in_cycle, 1);
        assert_eq!(status.next_break_in_ms, Some(INTERVAL_MS - 500));

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                BreakEvent::Resume,
                BreakEvent::CountdownStart { seconds: 10 },
                BreakEvent::BreakStart {
                    duration_seconds: 20,
                    kind: BreakKind::Short
                },
                BreakEvent::BreakEnd {
                    kind: BreakKind::Short
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_break_is_long_and_closes_the_cycle() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;

        // three short cycles of 1200 + 10 + 20 seconds, then 1200 + 10 + 300
        advance_secs(3.0 * 1230.0 + 1510.5).await;

        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Idle);
        assert_eq!(status.state.short_breaks_completed_in_cycle, 0);
        assert_eq!(status.state.long_breaks_completed, 1);

        let durations: Vec<u64> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                BreakEvent::BreakStart {
                    duration_seconds, ..
                } => Some(*duration_seconds),
                _ => None,
            })
            .collect();
        assert_eq!(durations, vec![20, 20, 20, 300]);
        assert_eq!(
            events.lock().unwrap().last(),
            Some(&BreakEvent::BreakEnd {
                kind: BreakKind::Long
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_resume_restarts_full_interval() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;
        advance_secs(300.0).await;

        scheduler.pause().await;
        scheduler.pause().await;
        let status = scheduler.get_status().await;
        assert!(status.state.is_paused);
        assert!(!status.is_running);
        assert_eq!(status.next_break_in_ms, None);

        scheduler.resume().await;
        scheduler.resume().await;
        let status = scheduler.get_status().await;
        assert!(!status.state.is_paused);
        assert_eq!(status.next_break_in_ms, Some(INTERVAL_MS));

        assert_eq!(
            *events.lock().unwrap(),
            vec![BreakEvent::Resume, BreakEvent::Pause, BreakEvent::Resume]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn paused_scheduler_never_fires() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;
        scheduler.pause().await;

        advance_secs(4.0 * 3600.0).await;
        assert_eq!(scheduler.get_status().await.state.phase, Phase::Idle);
        assert_eq!(
            *events.lock().unwrap(),
            vec![BreakEvent::Resume, BreakEvent::Pause]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_during_break_freezes_it() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        scheduler.start().await;
        advance_secs(1215.5).await;
        scheduler.pause().await;

        let frozen = scheduler.get_status().await;
        advance_secs(120.0).await;
        let later = scheduler.get_status().await;
        assert_eq!(later.state, frozen.state);
        assert_eq!(later.state.phase, Phase::Break);

        scheduler.resume().await;
        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Idle);
        assert_eq!(status.state.short_breaks_completed_in_cycle, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_in_countdown_returns_to_idle_without_counting() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;
        advance_secs(1200.5).await;

        scheduler.skip().await;
        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Idle);
        assert_eq!(status.state.short_breaks_completed_in_cycle, 0);
        assert_eq!(status.state.long_breaks_completed, 0);
        assert_eq!(status.next_break_in_ms, Some(INTERVAL_MS));

        advance_secs(60.0).await;
        assert_eq!(scheduler.get_status().await.state.phase, Phase::Idle);
        let events = events.lock().unwrap();
        assert_eq!(events.last(), Some(&BreakEvent::Skip));
        assert!(!events
            .iter()
            .any(|event| matches!(event, BreakEvent::BreakStart { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn skipping_the_long_break_closes_the_cycle() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;

        // three short cycles, then into the fourth (long) break
        advance_secs(3.0 * 1230.0 + 1210.5).await;
        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Break);
        assert_eq!(status.state.seconds_remaining, 300);

        scheduler.skip().await;

        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Idle);
        assert_eq!(status.state.short_breaks_completed_in_cycle, 0);
        assert_eq!(status.state.long_breaks_completed, 1);

        let events = events.lock().unwrap();
        let ends: Vec<&BreakEvent> = events
            .iter()
            .filter(|event| matches!(event, BreakEvent::BreakEnd { .. }))
            .collect();
        assert_eq!(ends.len(), 4);
        assert_eq!(
            ends.last(),
            Some(&&BreakEvent::BreakEnd {
                kind: BreakKind::Long
            })
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_pause_and_resume_emit_in_transition_order() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let scheduler = scheduler.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..100 {
                    scheduler.resume().await;
                    scheduler.pause().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // Each emitted event is a real running/paused flip, so the stream
        // must alternate starting with resume.
        let events = events.lock().unwrap();
        assert!(!events.is_empty());
        for (index, event) in events.iter().enumerate() {
            let expected = if index % 2 == 0 {
                BreakEvent::Resume
            } else {
                BreakEvent::Pause
            };
            assert_eq!(event, &expected, "event #{index} out of order");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn skip_in_break_counts_exactly_once() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;
        advance_secs(1210.5).await;
        assert_eq!(scheduler.get_status().await.state.phase, Phase::Break);

        scheduler.skip().await;
        advance_secs(30.0).await;

        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Idle);
        assert_eq!(status.state.short_breaks_completed_in_cycle, 1);

        let events = events.lock().unwrap();
        let ends = events
            .iter()
            .filter(|event| matches!(event, BreakEvent::BreakEnd { .. }))
            .count();
        assert_eq!(ends, 1);
        assert_eq!(
            &events[events.len() - 2..],
            &[
                BreakEvent::BreakEnd {
                    kind: BreakKind::Short
                },
                BreakEvent::Skip
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn skip_while_idle_only_reports_skip() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;

        scheduler.skip().await;
        let status = scheduler.get_status().await;
        assert_eq!(status.next_break_in_ms, Some(INTERVAL_MS));
        assert_eq!(
            *events.lock().unwrap(),
            vec![BreakEvent::Resume, BreakEvent::Skip]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delay_extends_next_break_by_minutes() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        let events = record(&scheduler);
        scheduler.start().await;

        scheduler.delay(5).await;
        assert_eq!(
            scheduler.get_status().await.next_break_in_ms,
            Some(INTERVAL_MS)
        );

        advance_secs(1203.5).await;
        scheduler.delay(5).await;

        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Idle);
        assert_eq!(status.next_break_in_ms, Some(INTERVAL_MS + 5 * 60 * 1000));
        assert_eq!(status.state.short_breaks_completed_in_cycle, 0);
        assert_eq!(status.state.long_breaks_completed, 0);
        assert_eq!(
            events.lock().unwrap().last(),
            Some(&BreakEvent::Delay { minutes: 5 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn update_settings_restarts_idle_wait_with_new_interval() {
        let (scheduler, settings) = scheduler_with(BreakPolicy::default());
        scheduler.start().await;
        advance_secs(600.0).await;

        settings.set_break_policy(BreakPolicy {
            short_break_interval_minutes: 30,
            ..BreakPolicy::default()
        });
        scheduler.update_settings().await;

        let status = scheduler.get_status().await;
        assert_eq!(status.next_break_in_ms, Some(30 * 60 * 1000));
        assert_eq!(scheduler.policy().await.short_break_interval_minutes, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn update_settings_lets_running_break_finish() {
        let (scheduler, settings) = scheduler_with(BreakPolicy::default());
        scheduler.start().await;
        advance_secs(1212.5).await;

        settings.set_break_policy(BreakPolicy {
            short_break_duration_seconds: 90,
            ..BreakPolicy::default()
        });
        scheduler.update_settings().await;

        let status = scheduler.get_status().await;
        assert_eq!(status.state.phase, Phase::Break);
        assert_eq!(status.state.seconds_remaining, 18);

        advance_secs(18.0).await;
        assert_eq!(scheduler.get_status().await.state.phase, Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn status_is_a_detached_copy() {
        let (scheduler, _) = scheduler_with(BreakPolicy::default());
        scheduler.start().await;

        let mut status = scheduler.get_status().await;
        status.state.phase = Phase::Break;
        status.state.long_breaks_completed = 99;

        let fresh = scheduler.get_status().await;
        assert_eq!(fresh.state.phase, Phase::Idle);
        assert_eq!(fresh.state.long_breaks_completed, 0);
    }
}
