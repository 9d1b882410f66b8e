//! Clock abstraction.
//!
//! Outbound messages are stamped with local wall-clock date and time. The
//! clock is injected so simulations can pin it.

use chrono::NaiveDateTime;

/// Source of local wall-clock time.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current local date and time.
    fn local_now(&self) -> NaiveDateTime;
}

/// Production environment backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn local_now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
