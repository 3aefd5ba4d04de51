use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};

/// Time source for the recorder: a monotonic instant for elapsed-time
/// arithmetic and a wall-clock timestamp for the document.
pub trait Clock {
    fn now(&self) -> Instant;
    fn wall_time(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    wall_base: NaiveDateTime,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new(wall_base: NaiveDateTime) -> ManualClock {
        ManualClock { base: Instant::now(), wall_base, offset: Cell::new(Duration::ZERO) }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn wall_time(&self) -> NaiveDateTime {
        // Offsets used in practice are far below chrono's range limits.
        let offset = chrono::Duration::from_std(self.offset.get()).unwrap_or(chrono::Duration::zero());
        self.wall_base + offset
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn wall_time(&self) -> NaiveDateTime {
        (**self).wall_time()
    }
}
