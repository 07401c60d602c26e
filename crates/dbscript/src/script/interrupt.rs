use super::{Flow, Unwind};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A request to stop an evaluation, shared with the thread running it.
///
/// Cancellation is cooperative: the interpreter notices it at its next
/// checkpoint. A database call already in flight runs to completion first.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    requested: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Counts evaluation steps and checks the token every `interval` steps.
#[derive(Debug)]
pub(crate) struct Interrupter {
    token: CancelToken,
    interval: u32,
    remaining: u32,
}

impl Interrupter {
    pub(crate) fn new(token: CancelToken, interval: u32) -> Self {
        let interval = interval.max(1);
        Self {
            token,
            interval,
            remaining: interval,
        }
    }

    pub(crate) fn tick(&mut self) -> Flow<()> {
        self.remaining -= 1;
        if self.remaining > 0 {
            return Ok(());
        }

        self.remaining = self.interval;
        if self.token.is_cancelled() {
            Err(Unwind::Interrupted)
        } else {
            Ok(())
        }
    }
}
