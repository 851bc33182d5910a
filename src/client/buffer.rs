//! Snapshot interpolation buffer
//!
//! Snapshots are queued with their server timestamp plus a fixed delay, so a
//! render loop querying at wall-clock time usually finds two samples that
//! bracket it. When it does not, the buffer blends from the last committed
//! ("resting") value toward the first pending sample, anchored at the time
//! that situation was first observed.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

/// Values the buffer can blend between
pub trait Interpolate: Clone {
    /// `pct` is in [0, 1]; 0 must return `from`, 1 must return `to`.
    /// `now` is the time being rendered.
    fn interpolate(from: &Self, to: &Self, pct: f64, now: u64) -> Self;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    pub value: T,
    /// Time (ms) at which `value` should be fully shown
    pub time: u64,
}

/// What `enqueue` did with a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// Same time as the newest pending sample, which it replaced
    Replaced,
    /// Older than what is already pending or committed; dropped
    Stale,
}

#[derive(Debug, Clone)]
pub struct InterpolationBuffer<T> {
    resting: T,
    /// Time of the committed resting value, if it came from a sample
    resting_time: Option<u64>,
    buffer: VecDeque<Sample<T>>,
    client_start_time: Option<u64>,
    delay_ms: u64,
}

impl<T: Interpolate> InterpolationBuffer<T> {
    pub fn new(initial: T, delay_ms: u64) -> Self {
        Self {
            resting: initial,
            resting_time: None,
            buffer: VecDeque::new(),
            client_start_time: None,
            delay_ms,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn resting(&self) -> &T {
        &self.resting
    }

    /// Queue `value` stamped at server time `time`. Samples are expected in
    /// time order; late arrivals are dropped and a duplicate timestamp
    /// replaces the pending sample.
    pub fn enqueue(&mut self, value: T, time: u64) -> Enqueued {
        let time = time.saturating_add(self.delay_ms);

        if self.resting_time.is_some_and(|resting| time <= resting) {
            debug!(time, "Dropping sample older than resting state");
            return Enqueued::Stale;
        }

        match self.buffer.back_mut() {
            Some(last) if time < last.time => {
                debug!(time, last = last.time, "Dropping out-of-order sample");
                Enqueued::Stale
            }
            Some(last) if time == last.time => {
                last.value = value;
                Enqueued::Replaced
            }
            _ => {
                self.buffer.push_back(Sample { value, time });
                Enqueued::Queued
            }
        }
    }

    /// Value to render at `now`
    pub fn query(&mut self, now: u64) -> T {
        let Some(last) = self.buffer.back() else {
            return self.resting.clone();
        };

        if now >= last.time {
            if let Some(last) = self.buffer.pop_back() {
                trace!(time = last.time, "Committing newest sample");
                self.resting = last.value;
                self.resting_time = Some(last.time);
            }
            self.buffer.clear();
            self.client_start_time = None;
            return self.resting.clone();
        }

        if let Some(index) = self.buffer.iter().rposition(|s| s.time <= now) {
            self.client_start_time = None;
            self.buffer.drain(..index);
            let (from, to) = (&self.buffer[0], &self.buffer[1]);
            return blend(from, to, now);
        }

        let start = *self.client_start_time.get_or_insert(now);
        let from = Sample {
            value: self.resting.clone(),
            time: start,
        };
        blend(&from, &self.buffer[0], now)
    }
}

fn blend<T: Interpolate>(from: &Sample<T>, to: &Sample<T>, now: u64) -> T {
    let pct = if to.time <= from.time {
        1.0
    } else {
        (now.saturating_sub(from.time) as f64 / (to.time - from.time) as f64).clamp(0.0, 1.0)
    };
    T::interpolate(&from.value, &to.value, pct, now)
}

/// Buffer shared between a network callback and a render loop on different
/// threads
#[derive(Debug)]
pub struct SharedInterpolationBuffer<T> {
    inner: Arc<Mutex<InterpolationBuffer<T>>>,
}

impl<T> Clone for SharedInterpolationBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Interpolate> SharedInterpolationBuffer<T> {
    pub fn new(initial: T, delay_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InterpolationBuffer::new(initial, delay_ms))),
        }
    }

    pub fn enqueue(&self, value: T, time: u64) -> Enqueued {
        self.inner.lock().enqueue(value, time)
    }

    pub fn query(&self, now: u64) -> T {
        self.inner.lock().query(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pos(f64);

    impl Interpolate for Pos {
        fn interpolate(from: &Self, to: &Self, pct: f64, _now: u64) -> Self {
            Pos(from.0 + (to.0 - from.0) * pct)
        }
    }

    fn buffer() -> InterpolationBuffer<Pos> {
        InterpolationBuffer::new(Pos(0.0), 0)
    }

    #[test]
    fn empty_buffer_returns_resting() {
        let mut buf = buffer();
        assert_eq!(buf.query(10), Pos(0.0));
        assert_eq!(buf.query(1_000), Pos(0.0));
    }

    #[test]
    fn anchor_latches_on_first_query() {
        let mut buf = buffer();
        buf.enqueue(Pos(10.0), 100);

        assert_eq!(buf.query(0), Pos(0.0));
        assert_eq!(buf.query(50), Pos(5.0));
        assert_eq!(buf.query(75), Pos(7.5));
    }

    #[test]
    fn late_first_query_starts_from_resting() {
        let mut buf = buffer();
        buf.enqueue(Pos(10.0), 100);

        assert_eq!(buf.query(50), Pos(0.0));
        assert_eq!(buf.query(75), Pos(5.0));
    }

    #[test]
    fn bracketing_samples_are_exact_at_endpoints() {
        let mut buf = buffer();
        buf.enqueue(Pos(10.0), 100);
        buf.enqueue(Pos(30.0), 200);
        buf.enqueue(Pos(60.0), 300);

        assert_eq!(buf.query(100), Pos(10.0));
        assert_eq!(buf.query(150), Pos(20.0));
        assert_eq!(buf.query(200), Pos(30.0));
        assert_eq!(buf.query(250), Pos(45.0));
        // Obsolete leading samples were dropped
        assert_eq!(buf.pending(), 2);
        assert_eq!(buf.query(300), Pos(60.0));
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn motion_is_monotonic_within_a_bracket() {
        let mut buf = buffer();
        buf.enqueue(Pos(-5.0), 1_000);
        buf.enqueue(Pos(95.0), 1_100);

        let mut previous = buf.query(1_000).0;
        for now in 1_001..1_100 {
            let current = buf.query(now).0;
            assert!(current > previous, "{current} <= {previous} at {now}");
            previous = current;
        }
    }

    #[test]
    fn committed_value_is_stable_until_next_sample() {
        let mut buf = buffer();
        buf.enqueue(Pos(10.0), 100);
        assert_eq!(buf.query(120), Pos(10.0));
        assert_eq!(buf.query(120), Pos(10.0));
        assert_eq!(buf.query(5_000), Pos(10.0));

        buf.enqueue(Pos(20.0), 6_000);
        assert_eq!(buf.query(5_000), Pos(10.0));
        assert_eq!(buf.query(5_500), Pos(15.0));
    }

    #[test]
    fn repeated_query_is_idempotent() {
        let mut buf = buffer();
        buf.enqueue(Pos(10.0), 100);
        buf.enqueue(Pos(20.0), 200);
        buf.enqueue(Pos(40.0), 400);

        let first = buf.query(300);
        assert_eq!(buf.query(300), first);
        assert_eq!(first, Pos(30.0));
    }

    #[test]
    fn delay_shifts_sample_times() {
        let mut buf = InterpolationBuffer::new(Pos(0.0), 100);
        buf.enqueue(Pos(10.0), 0);
        buf.enqueue(Pos(20.0), 100);

        assert_eq!(buf.query(100), Pos(10.0));
        assert_eq!(buf.query(150), Pos(15.0));
        assert_eq!(buf.query(200), Pos(20.0));
    }

    #[test]
    fn ordering_policy() {
        let mut buf = buffer();
        assert_eq!(buf.enqueue(Pos(10.0), 100), Enqueued::Queued);
        assert_eq!(buf.enqueue(Pos(20.0), 200), Enqueued::Queued);
        assert_eq!(buf.enqueue(Pos(15.0), 150), Enqueued::Stale);
        assert_eq!(buf.enqueue(Pos(25.0), 200), Enqueued::Replaced);
        assert_eq!(buf.pending(), 2);

        assert_eq!(buf.query(200), Pos(25.0));
        assert_eq!(buf.enqueue(Pos(99.0), 200), Enqueued::Stale);
        assert_eq!(buf.enqueue(Pos(99.0), 180), Enqueued::Stale);
        assert_eq!(buf.query(10_000), Pos(25.0));
    }

    #[test]
    fn zero_length_bracket_snaps_to_target() {
        let from = Sample {
            value: Pos(1.0),
            time: 100,
        };
        let to = Sample {
            value: Pos(2.0),
            time: 100,
        };
        assert_eq!(blend(&from, &to, 100), Pos(2.0));
    }

    #[test]
    fn shared_buffer_serialises_access() {
        let shared = SharedInterpolationBuffer::new(Pos(0.0), 0);
        let writer = shared.clone();
        let handle = std::thread::spawn(move || {
            for t in 1..=10u64 {
                writer.enqueue(Pos(t as f64), t * 10);
            }
        });
        handle.join().unwrap();

        assert_eq!(shared.query(50), Pos(5.0));
        assert_eq!(shared.query(100), Pos(10.0));
    }
}
