use std::collections::VecDeque;
use std::time::Instant;

/// Source of "now" on the playback timeline, in seconds.
pub trait OutputClock: Send + Sync {
    fn now(&self) -> f64;
}

/// Seconds elapsed since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl OutputClock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// One buffer placed on the playback timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBuffer {
    pub id: u64,
    pub start: f64,
    pub duration: f64,
}

impl ScheduledBuffer {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Lays model audio end-to-end without overlap.
///
/// Each buffer starts at `max(now, next_start)`; `next_start` then moves to
/// its end. An interruption stops everything in flight and resets the cursor.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    next_start: f64,
    in_flight: VecDeque<ScheduledBuffer>,
    next_id: u64,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: f64, duration: f64) -> ScheduledBuffer {
        let start = now.max(self.next_start);
        let duration = duration.max(0.0);
        let buffer = ScheduledBuffer {
            id: self.next_id,
            start,
            duration,
        };
        self.next_id = self.next_id.wrapping_add(1);
        self.next_start = buffer.end();
        self.in_flight.push_back(buffer);
        buffer
    }

    /// Returns the buffers that were still playing or queued.
    pub fn interrupt(&mut self) -> Vec<ScheduledBuffer> {
        self.next_start = 0.0;
        self.in_flight.drain(..).collect()
    }

    /// Forgets buffers that finished at or before `now`.
    pub fn reap(&mut self, now: f64) -> usize {
        let before = self.in_flight.len();
        self.in_flight.retain(|b| b.end() > now);
        before - self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    /// End of the earliest buffer still in flight.
    pub fn next_end(&self) -> Option<f64> {
        self.in_flight.front().map(ScheduledBuffer::end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn assert_at(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn buffers_are_laid_back_to_back() {
        let mut s = PlaybackScheduler::new();
        let a = s.schedule(1.0, 0.5);
        let b = s.schedule(1.1, 0.25);
        assert_at(a.start, 1.0);
        assert_at(b.start, 1.5);
        assert_at(s.next_start(), 1.75);
        assert_at(s.next_end().unwrap(), 1.5);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn gap_in_arrivals_starts_at_now() {
        let mut s = PlaybackScheduler::new();
        s.schedule(0.0, 0.2);
        let late = s.schedule(5.0, 0.2);
        assert_at(late.start, 5.0);
    }

    #[test]
    fn interrupt_returns_in_flight_and_resets_cursor() {
        let mut s = PlaybackScheduler::new();
        s.schedule(2.0, 1.0);
        s.schedule(2.0, 1.0);
        let stopped = s.interrupt();
        assert_eq!(stopped.len(), 2);
        assert!(s.is_idle());
        assert_at(s.next_start(), 0.0);

        let fresh = s.schedule(2.5, 0.1);
        assert_at(fresh.start, 2.5);
    }

    #[test]
    fn reap_drops_finished_buffers() {
        let mut s = PlaybackScheduler::new();
        s.schedule(0.0, 1.0);
        s.schedule(0.0, 1.0);
        assert_eq!(s.reap(1.0), 1);
        assert_eq!(s.in_flight(), 1);
        assert_at(s.next_end().unwrap(), 2.0);
        assert_eq!(s.reap(2.5), 1);
        assert!(s.is_idle());
    }

    #[test]
    fn random_arrivals_never_overlap() {
        let mut rng = rand::rng();
        let mut s = PlaybackScheduler::new();
        let mut now = 0.0f64;
        let mut last_end = 0.0f64;
        for _ in 0..500 {
            now += rng.random_range(0.0..0.3);
            let b = s.schedule(now, rng.random_range(0.01..0.4));
            assert!(b.start >= now);
            assert!(b.start >= last_end - 1e-12);
            last_end = b.end();
            s.reap(now);
        }
    }
}
