//! Stage timing and frame rate logging.
//!
//! Detectors time their stages (inference, suppression, annotation) with a [`Timer`] each. The
//! control loop feeds those timers to an [`FpsCounter`], which logs a summary like
//! `control loop: 58 FPS (infer: 58x9.1ms, annotate: 58x1.3ms)` once per second.

use std::{
    cell::Cell,
    fmt,
    time::{Duration, Instant},
};

/// Smoothing factor of the moving average. Higher values favor recent measurements.
const SMOOTHING: f32 = 0.3;

/// Measures how long a recurring operation takes.
///
/// Durations are combined into an exponential moving average. Displaying the timer with `{}`
/// prints the average and the number of measurements, and starts a new reporting period.
pub struct Timer {
    name: &'static str,
    period: Cell<Period>,
}

#[derive(Clone, Copy, Default)]
struct Period {
    /// Moving average in seconds, `None` if nothing was measured yet.
    avg: Option<f32>,
    count: usize,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            period: Cell::new(Period::default()),
        }
    }

    /// Runs `op` and records how long it took.
    pub fn time<T>(&self, op: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        op()
    }

    /// Starts a measurement that ends when the returned guard is dropped.
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            start: Instant::now(),
        }
    }

    fn record(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f32();
        let mut period = self.period.get();
        period.avg = Some(match period.avg {
            Some(avg) => SMOOTHING * secs + (1.0 - SMOOTHING) * avg,
            None => secs,
        });
        period.count += 1;
        self.period.set(period);
    }

    /// Returns the number of measurements in the current reporting period.
    pub fn count(&self) -> usize {
        self.period.get().count
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Period { avg, count } = self.period.take();
        let avg_ms = avg.unwrap_or(0.0) * 1000.0;
        write!(f, "{}: {count}x{avg_ms:.01}ms", self.name)
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("count", &self.count())
            .finish()
    }
}

/// Ends a [`Timer`] measurement when dropped.
pub struct TimerGuard<'a> {
    timer: &'a Timer,
    start: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

/// Counts frames and logs the frame rate once per second.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Counts a frame. Returns the frame rate if a report was logged.
    pub fn tick(&mut self) -> Option<u32> {
        self.tick_with(&[])
    }

    /// Counts a frame, including the `stages` in the report.
    ///
    /// Reporting resets the stage timers.
    pub fn tick_with(&mut self, stages: &[Timer]) -> Option<u32> {
        self.frames += 1;
        if self.start.elapsed() < Duration::from_secs(1) {
            return None;
        }

        let fps = self.frames;
        if stages.is_empty() {
            log::debug!("{}: {fps} FPS", self.name);
        } else {
            let stages = stages
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            log::debug!("{}: {fps} FPS ({stages})", self.name);
        }

        self.frames = 0;
        self.start = Instant::now();
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn display_starts_new_period() {
        let timer = Timer::new("infer");
        timer.time(|| ());
        drop(timer.start());
        assert_eq!(timer.count(), 2);

        let shown = timer.to_string();
        assert!(shown.starts_with("infer: 2x"), "{shown}");
        assert_eq!(timer.count(), 0);
        assert_eq!(timer.to_string(), "infer: 0x0.0ms");
    }

    #[test]
    fn time_returns_result() {
        let timer = Timer::new("t");
        assert_eq!(timer.time(|| 42), 42);
    }

    #[test]
    fn fps_reported_after_one_second() {
        let timers = [Timer::new("infer")];
        let mut fps = FpsCounter::new("test");
        timers[0].time(|| ());
        assert_eq!(fps.tick_with(&timers), None);
        assert_eq!(timers[0].count(), 1);

        thread::sleep(Duration::from_millis(1010));
        assert_eq!(fps.tick_with(&timers), Some(2));
        assert_eq!(timers[0].count(), 0);
        assert_eq!(fps.tick(), None);
    }
}
