//! Deadlines for units of work that may hang, such as a generation call.
//!
//! Every [Deadline] carries its own clock and cancellation flag, so deadlines can be nested or used
//! from several threads at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::warn;

use crate::utils::timing::errors::DeadlineExceeded;

/// Cooperative cancellation flag shared between a supervisor and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A time limit started at construction.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct Deadline {
    #[readonly]
    pub limit: Duration,
    started: Instant,
    token: CancellationToken,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            started: Instant::now(),
            token: CancellationToken::new(),
        }
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }

    /// Expired once the limit has elapsed or the deadline was cancelled.
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || self.started.elapsed() >= self.limit
    }

    /// Check point for long loops: returns [DeadlineExceeded] once expired.
    pub fn check(&self) -> Result<(), DeadlineExceeded> {
        if self.is_expired() {
            Err(DeadlineExceeded { limit: self.limit })
        } else {
            Ok(())
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Run `work` on a supervised worker thread and wait at most `limit` for its result.
///
/// On time-out the worker's deadline is cancelled and [DeadlineExceeded] is returned. The worker is
/// not killed: it stops as soon as it next calls [Deadline::check], and its late result is dropped.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use chipprompt::utils::timing::run_with_deadline;
/// let answer = run_with_deadline(Duration::from_secs(5), |_deadline| Ok(42)).unwrap();
/// assert_eq!(answer, 42);
/// ```
pub fn run_with_deadline<T, F>(limit: Duration, work: F) -> Result<T>
    where T: Send + 'static,
          F: FnOnce(&Deadline) -> Result<T> + Send + 'static {
    let deadline = Deadline::new(limit);
    let worker_deadline = deadline.clone();
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("deadline-worker".to_string())
        .spawn(move || {
            // the receiver is gone if the supervisor already timed out
            let _ = sender.send(work(&worker_deadline));
        })?;
    match receiver.recv_timeout(deadline.remaining()) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            deadline.token().cancel();
            warn!("Unit of work did not finish within {:?}", limit);
            Err(DeadlineExceeded { limit }.into())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(anyhow::anyhow!("deadline worker panicked before returning a result"))
        }
    }
}

pub mod errors {
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;
    use std::time::Duration;

    /// Error when a unit of work does not finish within its time limit.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DeadlineExceeded {
        pub limit: Duration,
    }

    impl fmt::Display for DeadlineExceeded {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "Timed out after {:?}", self.limit)
        }
    }

    impl Error for DeadlineExceeded {}
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;
    use super::errors::DeadlineExceeded;
    use super::*;

    #[test]
    fn test_finishes_in_time() {
        let value = run_with_deadline(Duration::from_secs(5), |deadline| {
            deadline.check()?;
            Ok("done".to_string())
        }).unwrap();
        assert_eq!("done", value);
    }

    #[test]
    fn test_times_out() {
        let err = run_with_deadline(Duration::from_millis(20), |deadline| {
            while !deadline.is_expired() {
                sleep(Duration::from_millis(5));
            }
            Ok(())
        }).unwrap_err();
        let exceeded = err.downcast_ref::<DeadlineExceeded>().unwrap();
        assert_eq!(Duration::from_millis(20), exceeded.limit);
    }

    #[test]
    fn test_work_error_propagates() {
        let err = run_with_deadline(Duration::from_secs(5), |_| -> Result<()> {
            anyhow::bail!("generation failed")
        }).unwrap_err();
        assert_eq!("generation failed", err.to_string());
        assert!(err.downcast_ref::<DeadlineExceeded>().is_none());
    }

    #[test]
    fn test_nested_deadlines_are_independent() {
        let outer = run_with_deadline(Duration::from_secs(5), |_| {
            let inner = run_with_deadline(Duration::from_millis(10), |_| {
                sleep(Duration::from_millis(200));
                Ok(1)
            });
            assert!(inner.is_err());
            Ok(2)
        }).unwrap();
        assert_eq!(2, outer);
    }

    #[test]
    fn test_deadline_check() {
        let deadline = Deadline::new(Duration::from_secs(60));
        assert!(deadline.check().is_ok());
        assert!(deadline.remaining() <= Duration::from_secs(60));
        deadline.token().cancel();
        assert_eq!(Err(DeadlineExceeded { limit: Duration::from_secs(60) }), deadline.check());

        let expired = Deadline::new(Duration::ZERO);
        assert!(expired.is_expired());
        assert_eq!(Duration::ZERO, expired.remaining());
    }
}
