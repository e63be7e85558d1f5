//! Throttled progress logging for long search stages.
//!
//! [Progress] is shared by reference between workers. Every `granularity`
//! completed units it logs how far the stage is, the elapsed time and an
//! estimate of the total time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

const DEFAULT_GRANULARITY: usize = 1;

#[derive(Debug)]
pub struct Progress {
    msg: String,
    total: usize,
    granularity: usize,
    done: AtomicUsize,
    started: Instant,
}

fn mm_ss(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

impl Progress {
    pub fn new(msg: impl Into<String>, total: usize) -> Self {
        Self {
            msg: msg.into(),
            total,
            granularity: DEFAULT_GRANULARITY,
            done: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// Log only when the count crosses a multiple of `granularity`.
    pub fn with_granularity(mut self, granularity: usize) -> Self {
        self.granularity = granularity.max(1);
        self
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Records `n` more completed units.
    pub fn advance(&self, n: usize) {
        if n == 0 {
            return;
        }
        let before = self.done.fetch_add(n, Ordering::Relaxed);
        let after = before + n;
        if before / self.granularity != after / self.granularity || after == self.total {
            self.log(after);
        }
    }

    pub fn finish(&self) {
        self.log(self.done());
    }

    fn log(&self, done: usize) {
        let elapsed = self.started.elapsed();
        let fraction = if self.total == 0 {
            1.0
        } else {
            (done as f64 / self.total as f64).min(1.0)
        };
        let estimate = if fraction > 0.0 {
            elapsed.div_f64(fraction)
        } else {
            Duration::ZERO
        };
        info!(
            "{} {}/{} ({:.2}%) elapsed {}, estimate {}",
            self.msg,
            done,
            self.total,
            fraction * 100.0,
            mm_ss(elapsed),
            mm_ss(estimate)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_across_threads() {
        let progress = Progress::new("testing", 100).with_granularity(10);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        progress.advance(1);
                    }
                });
            }
        });
        assert_eq!(progress.done(), 100);
        assert_eq!(progress.total(), 100);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(mm_ss(Duration::from_secs(0)), "00:00");
        assert_eq!(mm_ss(Duration::from_secs(125)), "02:05");
    }

    #[test]
    fn zero_granularity_is_clamped() {
        let progress = Progress::new("x", 0).with_granularity(0);
        progress.advance(3);
        progress.finish();
        assert_eq!(progress.done(), 3);
    }
}
