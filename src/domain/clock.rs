use chrono::Utc;

/// Source of wall-clock time for request timestamps.
///
/// The facility never reads the system time directly; everything goes through
/// this trait so tests can drive time explicitly.
pub trait Clock: std::fmt::Debug {
    /// Current time as seconds since the Unix epoch.
    fn now_in_s(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_in_s(&self) -> i64 {
        Utc::now().timestamp()
    }
}
