//! Progress reporting and cancellation shared by the parallel stages.
//!
//! Both are plain objects handed to each stage, scoped to one run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use indicatif::ProgressBar;

use crate::output::OutputFormatter;

/// Receives progress from concurrent workers. Calls must never block.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, total: u64);
    fn increment(&self);
    fn stop(&self);
}

/// Terminal progress bar.
pub struct BarReporter {
    bar: ProgressBar,
    message: &'static str,
}

impl BarReporter {
    pub fn new(message: &'static str) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            message,
        }
    }
}

impl ProgressReporter for BarReporter {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(OutputFormatter::progress_style());
        self.bar.set_message(self.message);
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn increment(&self) {
        self.bar.inc(1);
    }

    fn stop(&self) {
        self.bar.finish_and_clear();
    }
}

/// Reporter that discards everything.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn start(&self, _total: u64) {}
    fn increment(&self) {}
    fn stop(&self) {}
}

/// Reporter that only counts, for library callers and tests.
#[derive(Debug, Default)]
pub struct CountingReporter {
    total: AtomicU64,
    done: AtomicU64,
    stopped: AtomicBool,
}

impl CountingReporter {
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for CountingReporter {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        self.stopped.store(false, Ordering::Relaxed);
    }

    fn increment(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

/// Cooperative stop signal. Once raised, stages start no new work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
