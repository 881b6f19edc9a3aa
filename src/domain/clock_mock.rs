use std::cell::Cell;
use std::rc::Rc;

use crate::domain::clock::Clock;

/// Manually driven clock. Clones share the same time, so a test can keep one
/// handle and move time forward while the facility holds another.
#[derive(Debug, Clone)]
pub struct MockClock {
    time: Rc<Cell<i64>>,
}

impl MockClock {
    pub fn new(time: i64) -> MockClock {
        MockClock { time: Rc::new(Cell::new(time)) }
    }

    pub fn set_time(&self, time: i64) {
        self.time.set(time);
    }

    pub fn advance(&self, seconds: i64) {
        self.time.set(self.time.get() + seconds);
    }
}

impl Clock for MockClock {
    fn now_in_s(&self) -> i64 {
        self.time.get()
    }
}
