//! Stop signals.

use super::StopSignal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared stop flag, set from another thread (a key handler, a signal
/// handler, a test).
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    flag: Arc<AtomicBool>,
}

impl StopFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Every clone observes it.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl StopSignal for StopFlag {
    fn should_stop(&mut self) -> bool {
        self.is_stopped()
    }
}

/// Never asks to stop; the loop ends when the source is exhausted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// Asks to stop after it has been polled `n` times.
#[derive(Debug, Clone, Copy)]
pub struct StopAfter {
    remaining: u64,
}

impl StopAfter {
    /// Stop on the `n`-th poll.
    pub fn new(n: u64) -> Self {
        Self { remaining: n }
    }
}

impl StopSignal for StopAfter {
    fn should_stop(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_flag_shared() {
        let flag = StopFlag::new();
        let mut signal = flag.clone();
        assert!(!signal.should_stop());

        std::thread::spawn(move || flag.stop()).join().unwrap();
        assert!(signal.should_stop());
    }

    #[test]
    fn test_stop_after() {
        let mut signal = StopAfter::new(3);
        assert!(!signal.should_stop());
        assert!(!signal.should_stop());
        assert!(signal.should_stop());
        assert!(signal.should_stop());
    }

    #[test]
    fn test_never_stop() {
        let mut signal = NeverStop;
        assert!((0..100).all(|_| !signal.should_stop()));
    }
}
