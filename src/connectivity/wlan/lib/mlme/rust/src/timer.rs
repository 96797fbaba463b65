// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    log::debug,
    std::{
        cmp::Reverse,
        collections::{BinaryHeap, HashMap},
        time::Duration,
    },
    wlan_common::time::Time,
};

#[cfg(test)]
pub use test_utils::*;

#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone, PartialOrd, Ord)]
pub struct TimeoutId(u64);

/// The wake primitive provided by the driver. A single wake can be armed at a time; arming a
/// new deadline replaces the previous one. The driver reports the wake back to the MLME, which
/// then calls `TimerManager::expire_next` until it returns `None`.
pub trait Scheduler {
    fn now(&self) -> Time;
    fn schedule(&mut self, deadline: Time);
}

/// Deadline-ordered timeouts multiplexed onto one `Scheduler`.
///
/// Entries are ordered by (deadline, insertion sequence). Canceling an entry only marks it dead.
/// Dead entries stay queued and are skipped when they reach the head of the queue, either at
/// expiry or in `rearm`, so the scheduler is never programmed for a canceled deadline.
pub struct TimerManager<E> {
    scheduler: Box<dyn Scheduler>,
    queue: BinaryHeap<Reverse<(Time, TimeoutId)>>,
    live: HashMap<TimeoutId, E>,
    next_id: u64,
    armed: Option<Time>,
}

impl<E> TimerManager<E> {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self { scheduler, queue: BinaryHeap::new(), live: HashMap::new(), next_id: 0, armed: None }
    }

    pub fn now(&self) -> Time {
        self.scheduler.now()
    }

    pub fn schedule(&mut self, deadline: Time, event: E) -> TimeoutId {
        let id = TimeoutId(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse((deadline, id)));
        self.live.insert(id, event);
        if self.armed.map_or(true, |armed| deadline < armed) {
            self.arm(deadline);
        }
        id
    }

    pub fn schedule_after(&mut self, duration: Duration, event: E) -> TimeoutId {
        let deadline = self.now() + duration;
        self.schedule(deadline, event)
    }

    /// Never re-arms the scheduler.
    pub fn cancel(&mut self, id: TimeoutId) {
        self.live.remove(&id);
    }

    pub fn cancel_all(&mut self) {
        self.live.clear();
    }

    pub fn is_scheduled(&self, id: TimeoutId) -> bool {
        self.live.contains_key(&id)
    }

    /// Removes and returns the earliest live event due at `now`. Events scheduled by the caller
    /// between two calls are taken into account, so a loop over `expire_next` delivers them in
    /// the same pass if they are already due.
    pub fn expire_next(&mut self, now: Time) -> Option<(TimeoutId, E)> {
        while let Some(Reverse((deadline, id))) = self.queue.peek().copied() {
            if deadline > now {
                return None;
            }
            self.queue.pop();
            if let Some(event) = self.live.remove(&id) {
                return Some((id, event));
            }
        }
        None
    }

    /// Programs the scheduler with the next live deadline, if it differs from the armed one.
    /// Called once all due events have been handled.
    pub fn rearm(&mut self) {
        self.drop_canceled_head();
        let next = self.queue.peek().map(|Reverse((deadline, _))| *deadline);
        match next {
            Some(deadline) if self.armed != Some(deadline) => self.arm(deadline),
            Some(_) => (),
            None => self.armed = None,
        }
    }

    fn drop_canceled_head(&mut self) {
        while let Some(Reverse((_, id))) = self.queue.peek() {
            if self.live.contains_key(id) {
                break;
            }
            self.queue.pop();
        }
    }

    fn arm(&mut self, deadline: Time) {
        debug!("arming wake at {:?}", deadline);
        self.armed = Some(deadline);
        self.scheduler.schedule(deadline);
    }
}

#[cfg(test)]
mod test_utils {
    use {
        super::*,
        parking_lot::Mutex,
        std::sync::Arc,
    };

    #[derive(Debug, Default)]
    pub struct FakeSchedulerState {
        pub now: Time,
        /// Every deadline the scheduler was programmed with, in order.
        pub armed: Vec<Time>,
    }

    impl FakeSchedulerState {
        pub fn advance(&mut self, duration: Duration) -> Time {
            self.now = self.now + duration;
            self.now
        }

        pub fn last_armed(&self) -> Option<Time> {
            self.armed.last().copied()
        }
    }

    #[derive(Clone)]
    pub struct FakeScheduler {
        pub state: Arc<Mutex<FakeSchedulerState>>,
    }

    impl FakeScheduler {
        pub fn new() -> Self {
            Self { state: Arc::new(Mutex::new(FakeSchedulerState::default())) }
        }

        pub fn as_scheduler(&self) -> Box<dyn Scheduler> {
            Box::new(self.clone())
        }
    }

    impl Scheduler for FakeScheduler {
        fn now(&self) -> Time {
            self.state.lock().now
        }

        fn schedule(&mut self, deadline: Time) {
            self.state.lock().armed.push(deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(nanos: i64) -> Time {
        Time::from_nanos(nanos)
    }

    fn drain(timer: &mut TimerManager<u32>, now: Time) -> Vec<u32> {
        let mut fired = vec![];
        while let Some((_, event)) = timer.expire_next(now) {
            fired.push(event);
        }
        timer.rearm();
        fired
    }

    #[test]
    fn delivers_in_deadline_then_insertion_order() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        timer.schedule(t(30), 1);
        timer.schedule(t(10), 2);
        timer.schedule(t(30), 3);
        timer.schedule(t(20), 4);
        timer.schedule(t(50), 5);

        assert_eq!(drain(&mut timer, t(30)), vec![2, 4, 1, 3]);
        assert_eq!(drain(&mut timer, t(49)), Vec::<u32>::new());
        assert_eq!(drain(&mut timer, t(50)), vec![5]);
    }

    #[test]
    fn canceled_entries_are_never_delivered() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        let a = timer.schedule(t(10), 1);
        timer.schedule(t(10), 2);
        timer.cancel(a);
        assert!(!timer.is_scheduled(a));
        assert_eq!(drain(&mut timer, t(100)), vec![2]);

        let b = timer.schedule(t(200), 3);
        timer.cancel_all();
        assert!(!timer.is_scheduled(b));
        assert_eq!(drain(&mut timer, t(300)), Vec::<u32>::new());
    }

    #[test]
    fn earlier_deadline_rearms_later_does_not() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        timer.schedule(t(100), 1);
        assert_eq!(scheduler.state.lock().armed, vec![t(100)]);
        timer.schedule(t(200), 2);
        assert_eq!(scheduler.state.lock().armed, vec![t(100)]);
        timer.schedule(t(50), 3);
        assert_eq!(scheduler.state.lock().armed, vec![t(100), t(50)]);
    }

    #[test]
    fn cancel_never_rearms() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        let a = timer.schedule(t(10), 1);
        timer.schedule(t(20), 2);
        timer.cancel(a);
        assert_eq!(scheduler.state.lock().armed, vec![t(10)]);

        // The stale wake at 10 delivers nothing and moves the wake to 20.
        assert_eq!(drain(&mut timer, t(10)), Vec::<u32>::new());
        assert_eq!(scheduler.state.lock().armed, vec![t(10), t(20)]);
    }

    #[test]
    fn rearm_only_when_next_deadline_changes() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        timer.schedule(t(10), 1);
        timer.schedule(t(20), 2);
        timer.schedule(t(20), 3);
        assert_eq!(drain(&mut timer, t(10)), vec![1]);
        assert_eq!(scheduler.state.lock().last_armed(), Some(t(20)));
        let arm_count = scheduler.state.lock().armed.len();

        // Nothing due and the head is unchanged: no reprogramming.
        assert_eq!(drain(&mut timer, t(15)), Vec::<u32>::new());
        assert_eq!(scheduler.state.lock().armed.len(), arm_count);
    }

    #[test]
    fn rearm_skips_canceled_head() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        timer.schedule(t(10), 1);
        let b = timer.schedule(t(20), 2);
        timer.schedule(t(30), 3);
        timer.cancel(b);

        assert_eq!(drain(&mut timer, t(10)), vec![1]);
        assert_eq!(scheduler.state.lock().armed, vec![t(10), t(30)]);
        assert_eq!(drain(&mut timer, t(30)), vec![3]);
    }

    #[test]
    fn events_scheduled_while_handling_are_delivered_in_same_pass() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        timer.schedule(t(10), 1);
        timer.schedule(t(30), 2);

        let now = t(20);
        let mut fired = vec![];
        while let Some((_, event)) = timer.expire_next(now) {
            fired.push(event);
            if event == 1 {
                // Already due: handled before returning.
                timer.schedule(t(15), 10);
                // Due later: left for the next wake.
                timer.schedule(t(25), 11);
            }
        }
        timer.rearm();
        assert_eq!(fired, vec![1, 10]);
        assert_eq!(scheduler.state.lock().last_armed(), Some(t(25)));
        assert_eq!(drain(&mut timer, t(30)), vec![11, 2]);
    }

    #[test]
    fn reschedule_after_cancel_fires_once_at_new_deadline() {
        let scheduler = FakeScheduler::new();
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        let old = timer.schedule(t(100), 1);
        timer.cancel(old);
        timer.schedule(t(50), 1);
        assert_eq!(drain(&mut timer, t(50)), vec![1]);
        assert_eq!(drain(&mut timer, t(100)), Vec::<u32>::new());
    }

    #[test]
    fn schedule_after_uses_scheduler_clock() {
        let scheduler = FakeScheduler::new();
        scheduler.state.lock().advance(Duration::from_nanos(1000));
        let mut timer = TimerManager::new(scheduler.as_scheduler());
        timer.schedule_after(Duration::from_nanos(500), 7);
        assert_eq!(scheduler.state.lock().last_armed(), Some(t(1500)));
        assert_eq!(timer.now(), t(1000));
    }
}
