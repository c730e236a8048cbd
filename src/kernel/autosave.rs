//! 自动保存防抖
//!
//! 每次内容变化都会取消尚未触发的写入并重新计时；只有在静默期结束后
//! 才真正写入一次。

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWrite {
    deadline: Instant,
}

impl PendingWrite {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[derive(Debug)]
pub struct AutosaveDebouncer {
    quiet: Duration,
    pending: Option<PendingWrite>,
}

impl AutosaveDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }

    /// Cancel-then-install. Returns the write that was replaced, if any.
    pub fn schedule(&mut self, now: Instant) -> Option<PendingWrite> {
        let deadline = now + self.quiet;
        tracing::trace!(quiet_ms = self.quiet.as_millis() as u64, "autosave scheduled");
        self.pending.replace(PendingWrite { deadline })
    }

    /// Consume-and-clear once the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if now < pending.deadline {
            return false;
        }

        let overshoot = now.duration_since(pending.deadline);
        if overshoot.as_millis() > 5 {
            tracing::debug!(
                overshoot_ms = overshoot.as_millis() as u64,
                "autosave debounce overshoot"
            );
        }
        self.pending = None;
        true
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/autosave.rs"]
mod tests;
