use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSlot {
    NextBreak,
    Countdown,
    Break,
}

struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// One slot per phase timer. Arming a slot aborts whatever it held, and a
/// timer task only acts if its generation is still the armed one, so a
/// timer cancelled after it already woke up cannot fire into a later phase.
#[derive(Default)]
pub struct TimerSlots {
    next_break: Option<ArmedTimer>,
    countdown: Option<ArmedTimer>,
    break_timer: Option<ArmedTimer>,
    generation: u64,
}

impl TimerSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the generation for the next `arm` call.
    pub fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn arm(&mut self, slot: TimerSlot, generation: u64, handle: JoinHandle<()>) {
        if let Some(previous) = self.slot_mut(slot).replace(ArmedTimer { generation, handle }) {
            previous.handle.abort();
        }
    }

    pub fn is_current(&self, slot: TimerSlot, generation: u64) -> bool {
        self.slot(slot)
            .as_ref()
            .is_some_and(|armed| armed.generation == generation)
    }

    /// Forgets the slot's handle without aborting it. Used by a timer task
    /// that has fired and is about to drive the next transition itself.
    pub fn release(&mut self, slot: TimerSlot) {
        self.slot_mut(slot).take();
    }

    pub fn cancel_all(&mut self) {
        for slot in [TimerSlot::NextBreak, TimerSlot::Countdown, TimerSlot::Break] {
            if let Some(armed) = self.slot_mut(slot).take() {
                armed.handle.abort();
            }
        }
    }

    pub fn armed_count(&self) -> usize {
        [&self.next_break, &self.countdown, &self.break_timer]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    fn slot(&self, slot: TimerSlot) -> &Option<ArmedTimer> {
        match slot {
            TimerSlot::NextBreak => &self.next_break,
            TimerSlot::Countdown => &self.countdown,
            TimerSlot::Break => &self.break_timer,
        }
    }

    fn slot_mut(&mut self, slot: TimerSlot) -> &mut Option<ArmedTimer> {
        match slot {
            TimerSlot::NextBreak => &mut self.next_break,
            TimerSlot::Countdown => &mut self.countdown,
            TimerSlot::Break => &mut self.break_timer,
        }
    }
}

impl Drop for TimerSlots {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
