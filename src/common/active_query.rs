//! Cooperative query interruption

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::common::error::{KuzuError, Result};

/// Interrupt flag and timer of the query currently running on a connection
///
/// Operators poll [`ActiveQuery::check`] between batches; the function
/// executors never look at it.
#[derive(Debug)]
pub struct ActiveQuery {
    interrupted: AtomicBool,
    started_at: Instant,
}

impl ActiveQuery {
    pub fn new() -> Self {
        Self {
            interrupted: AtomicBool::new(false),
            started_at: Instant::now(),
        }
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Reset for the next query on the same connection
    pub fn reset(&mut self) {
        self.interrupted.store(false, Ordering::Release);
        self.started_at = Instant::now();
    }

    /// Fail with `Interrupted` once interrupted or past `timeout_ms` (0 disables the timer)
    pub fn check(&self, timeout_ms: u64) -> Result<()> {
        if self.is_interrupted() {
            return Err(KuzuError::Interrupted);
        }
        if timeout_ms != 0 && self.elapsed() >= Duration::from_millis(timeout_ms) {
            self.interrupt();
            return Err(KuzuError::Interrupted);
        }
        Ok(())
    }
}

impl Default for ActiveQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_interrupt_from_other_thread() {
        let query = Arc::new(ActiveQuery::new());
        assert!(query.check(0).is_ok());

        let remote = query.clone();
        std::thread::spawn(move || remote.interrupt()).join().unwrap();

        assert!(matches!(query.check(0), Err(KuzuError::Interrupted)));
    }

    #[test]
    fn test_timeout() {
        let mut query = ActiveQuery::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(matches!(query.check(1), Err(KuzuError::Interrupted)));
        assert!(query.is_interrupted());

        query.reset();
        assert!(query.check(60_000).is_ok());
    }
}
