//! Fixed-rate frame clock.
//!
//! A tick is due once the deadline has passed. The next deadline is always
//! measured from the moment the tick fired, so a late frame is not caught up
//! and frames are never skipped.

use nx_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

/// Number of recent frame intervals averaged for the FPS readout
const FPS_WINDOW: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameRate {
    /// Display-link and timer driven hosts
    Hz30,
    #[default]
    Hz60,
}

impl FrameRate {
    pub fn interval(self) -> Duration {
        match self {
            FrameRate::Hz30 => Duration::from_micros(33_333),
            FrameRate::Hz60 => Duration::from_micros(16_667),
        }
    }

    pub fn hz(self) -> u32 {
        match self {
            FrameRate::Hz30 => 30,
            FrameRate::Hz60 => 60,
        }
    }
}

pub struct FrameScheduler {
    interval: Duration,
    next_deadline: Option<Instant>,
    last_tick: Option<Instant>,
    frame_times: VecDeque<Duration>,
    ticks: u64,
    running: bool,
}

impl FrameScheduler {
    pub fn new(rate: FrameRate) -> Self {
        Self::with_interval(rate.interval())
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            next_deadline: None,
            last_tick: None,
            frame_times: VecDeque::with_capacity(FPS_WINDOW),
            ticks: 0,
            running: true,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fire a tick if one is due at `now`. The first poll always fires.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        if self.next_deadline.is_some_and(|deadline| now < deadline) {
            return false;
        }

        if let Some(last) = self.last_tick {
            if self.frame_times.len() == FPS_WINDOW {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(now.saturating_duration_since(last));
        }
        self.last_tick = Some(now);
        self.next_deadline = Some(now + self.interval);
        self.ticks += 1;
        true
    }

    /// Time left until the next tick is due.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_deadline
            .map_or(Duration::ZERO, |deadline| deadline.saturating_duration_since(now))
    }

    /// Sleep until a tick is due and fire it. Returns false if the
    /// scheduler has been invalidated.
    pub fn wait_for_next_tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let remaining = self.time_until_next(Instant::now());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
        // sleep may wake marginally early
        loop {
            let now = Instant::now();
            if self.poll(now) {
                return true;
            }
            if !self.running {
                return false;
            }
            thread::sleep(self.time_until_next(now));
        }
    }

    /// Call `on_tick` once per tick until it breaks or the scheduler is
    /// invalidated.
    pub fn run<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(&mut Self) -> ControlFlow<()>,
    {
        log(LogCategory::Scheduler, LogLevel::Info, || {
            format!("Scheduler: running at {:?} per frame", self.interval)
        });
        while self.wait_for_next_tick() {
            if on_tick(self).is_break() {
                break;
            }
        }
        log(LogCategory::Scheduler, LogLevel::Info, || {
            format!("Scheduler: stopped after {} ticks", self.ticks)
        });
    }

    /// Stop the scheduler for good. Returns true only on the first call.
    pub fn invalidate(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.next_deadline = None;
        log(LogCategory::Scheduler, LogLevel::Debug, || {
            "Scheduler: invalidated".to_string()
        });
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Average tick rate over the recent frames.
    pub fn fps(&self) -> f64 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.frame_times.iter().sum();
        let avg = total.as_secs_f64() / self.frame_times.len() as f64;
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_waits_for_deadline() {
        let mut scheduler = FrameScheduler::new(FrameRate::Hz60);
        let start = Instant::now();
        assert!(scheduler.poll(start));
        assert!(!scheduler.poll(start + Duration::from_millis(10)));
        assert!(scheduler.poll(start + Duration::from_millis(17)));
        assert_eq!(scheduler.ticks(), 2);
    }

    #[test]
    fn test_late_tick_does_not_catch_up() {
        let mut scheduler = FrameScheduler::new(FrameRate::Hz30);
        let start = Instant::now();
        scheduler.poll(start);
        // Five intervals late: one tick, and the next one a full interval later
        let late = start + Duration::from_millis(170);
        assert!(scheduler.poll(late));
        assert!(!scheduler.poll(late + Duration::from_millis(1)));
        assert_eq!(scheduler.time_until_next(late), FrameRate::Hz30.interval());
    }

    #[test]
    fn test_invalidate_once() {
        let mut scheduler = FrameScheduler::new(FrameRate::Hz60);
        assert!(scheduler.invalidate());
        assert!(!scheduler.invalidate());
        assert!(!scheduler.poll(Instant::now() + Duration::from_secs(1)));
        assert!(!scheduler.wait_for_next_tick());
    }

    #[test]
    fn test_run_until_break() {
        let mut scheduler = FrameScheduler::with_interval(Duration::from_millis(1));
        let mut count = 0;
        scheduler.run(|_| {
            count += 1;
            if count == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(count, 3);
        assert_eq!(scheduler.ticks(), 3);
    }

    #[test]
    fn test_run_stops_when_invalidated() {
        let mut scheduler = FrameScheduler::with_interval(Duration::from_millis(1));
        let mut count = 0;
        scheduler.run(|s| {
            count += 1;
            s.invalidate();
            ControlFlow::Continue(())
        });
        assert_eq!(count, 1);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_fps_average() {
        let mut scheduler = FrameScheduler::new(FrameRate::Hz30);
        let start = Instant::now();
        for i in 0..4 {
            scheduler.poll(start + Duration::from_millis(50) * i);
        }
        assert!((scheduler.fps() - 20.0).abs() < 0.01);
    }
}
