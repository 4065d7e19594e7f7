//! Named, cancellable timers that feed ticks into the agent's event queue.
//!
//! Every periodic activity (heartbeat, handshake retry, streaming tick,
//! recording progress) owns exactly one slot here.  Arming a slot replaces
//! whatever was armed before; cancelling aborts the task.
//!
//! A tick that was already queued when its timer was cancelled or re-armed
//! carries a stale generation and is refused by [`TimerRegistry::accept`], so
//! no callback runs after cancellation.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::debug;

use crate::application::agent::AgentEvent;

/// The timers the agent owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerName {
    Heartbeat,
    HandshakeRetry,
    StreamTick,
    RecordingProgress,
    /// Bounds how long shutdown waits for a recording that is still saving.
    ShutdownDeadline,
}

/// One firing of a named timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub name: TimerName,
    pub generation: u64,
}

struct Slot {
    generation: u64,
    repeating: bool,
    task: JoinHandle<()>,
}

/// Shortest period a repeating timer runs at.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owns every armed timer.  Dropping the registry aborts them all.
pub struct TimerRegistry {
    events: UnboundedSender<AgentEvent>,
    slots: HashMap<TimerName, Slot>,
    next_generation: u64,
}

impl TimerRegistry {
    pub fn new(events: UnboundedSender<AgentEvent>) -> Self {
        Self {
            events,
            slots: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Fires `name` every `period`, first after one full period.  A zero
    /// period is raised to [`MIN_PERIOD`].
    pub fn arm_repeating(&mut self, name: TimerName, period: Duration) {
        let period = period.max(MIN_PERIOD);
        let generation = self.bump();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tick = TimerTick { name, generation };
                if events.send(AgentEvent::Timer(tick)).is_err() {
                    break;
                }
            }
        });
        self.install(name, generation, true, task);
    }

    /// Fires `name` once after `delay`.
    pub fn arm_once(&mut self, name: TimerName, delay: Duration) {
        let generation = self.bump();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            sleep(delay).await;
            let _ = events.send(AgentEvent::Timer(TimerTick { name, generation }));
        });
        self.install(name, generation, false, task);
    }

    /// Cancels `name`.  Returns `true` if it was armed.
    pub fn cancel(&mut self, name: TimerName) -> bool {
        match self.slots.remove(&name) {
            Some(slot) => {
                slot.task.abort();
                debug!("timer {name:?} cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every armed timer.
    pub fn cancel_all(&mut self) {
        for (_, slot) in self.slots.drain() {
            slot.task.abort();
        }
    }

    pub fn is_armed(&self, name: TimerName) -> bool {
        self.slots.contains_key(&name)
    }

    /// Returns `true` if `tick` belongs to the currently armed timer.
    ///
    /// A one-shot timer is disarmed by accepting its tick.
    pub fn accept(&mut self, tick: TimerTick) -> bool {
        let Some(slot) = self.slots.get(&tick.name) else {
            return false;
        };
        if slot.generation != tick.generation {
            return false;
        }
        if !slot.repeating {
            self.slots.remove(&tick.name);
        }
        true
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn install(&mut self, name: TimerName, generation: u64, repeating: bool, task: JoinHandle<()>) {
        if let Some(old) = self.slots.insert(
            name,
            Slot {
                generation,
                repeating,
                task,
            },
        ) {
            old.task.abort();
        }
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn registry() -> (TimerRegistry, UnboundedReceiver<AgentEvent>) {
        let (tx, rx) = unbounded_channel();
        (TimerRegistry::new(tx), rx)
    }

    fn drain_ticks(rx: &mut UnboundedReceiver<AgentEvent>) -> Vec<TimerTick> {
        let mut ticks = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AgentEvent::Timer(tick) = event {
                ticks.push(tick);
            }
        }
        ticks
    }

    /// Lets spawned timer tasks observe the advanced clock.
    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_still_ticks() {
        let (mut timers, mut rx) = registry();
        timers.arm_repeating(TimerName::Heartbeat, Duration::ZERO);
        settle().await;

        tokio::time::advance(MIN_PERIOD).await;
        settle().await;
        tokio::time::advance(MIN_PERIOD).await;
        settle().await;

        let ticks = drain_ticks(&mut rx);
        assert!(!ticks.is_empty());
        assert!(ticks.iter().all(|t| timers.accept(*t)));
        assert!(timers.is_armed(TimerName::Heartbeat));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_timer_fires_each_period() {
        // Arrange
        let (mut timers, mut rx) = registry();
        timers.arm_repeating(TimerName::Heartbeat, Duration::from_secs(5));
        settle().await;

        // Act
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        // Assert
        let ticks = drain_ticks(&mut rx);
        assert_eq!(ticks.len(), 2);
        assert!(ticks.iter().all(|t| t.name == TimerName::Heartbeat));
        assert!(ticks.iter().all(|t| timers.accept(*t)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (mut timers, mut rx) = registry();
        timers.arm_repeating(TimerName::StreamTick, Duration::from_secs(1));
        settle().await;

        assert!(timers.cancel(TimerName::StreamTick));
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;

        assert!(drain_ticks(&mut rx).is_empty());
        assert!(!timers.is_armed(TimerName::StreamTick));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_queued_before_cancel_is_refused() {
        // Arrange – let one tick reach the queue
        let (mut timers, mut rx) = registry();
        timers.arm_repeating(TimerName::RecordingProgress, Duration::from_secs(2));
        settle().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;

        // Act
        timers.cancel(TimerName::RecordingProgress);

        // Assert
        let ticks = drain_ticks(&mut rx);
        assert_eq!(ticks.len(), 1);
        assert!(!timers.accept(ticks[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_invalidates_previous_generation() {
        let (mut timers, mut rx) = registry();
        timers.arm_repeating(TimerName::Heartbeat, Duration::from_secs(1));
        settle().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        let stale = drain_ticks(&mut rx);

        timers.arm_repeating(TimerName::Heartbeat, Duration::from_secs(1));

        assert_eq!(stale.len(), 1);
        assert!(!timers.accept(stale[0]));
        assert!(timers.is_armed(TimerName::Heartbeat));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_once_and_disarms() {
        let (mut timers, mut rx) = registry();
        timers.arm_once(TimerName::HandshakeRetry, Duration::from_secs(5));
        settle().await;

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;

        let ticks = drain_ticks(&mut rx);
        assert_eq!(ticks.len(), 1);
        assert!(timers.accept(ticks[0]));
        assert!(!timers.is_armed(TimerName::HandshakeRetry));
        assert!(!timers.accept(ticks[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_stops_everything() {
        let (mut timers, mut rx) = registry();
        timers.arm_repeating(TimerName::Heartbeat, Duration::from_secs(1));
        timers.arm_repeating(TimerName::StreamTick, Duration::from_secs(1));
        timers.arm_once(TimerName::HandshakeRetry, Duration::from_secs(1));
        settle().await;

        timers.cancel_all();
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert!(drain_ticks(&mut rx).is_empty());
    }
}
