//! # Receipt Clock
//!
//! Artifact names come from the server's receipt time, never from the
//! client-declared timestamp. The clock is a trait so tests can pin the
//! second an upload lands in.

use chrono::{DateTime, FixedOffset, Local};

/// Source of server receipt time.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The host's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
