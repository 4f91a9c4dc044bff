use chrono::{DateTime, Local, NaiveDate};

/// Represents an entity responsible for providing dates across application. Allows commands to be
/// tested against a fixed day.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Sync + Send + 'static {
    fn now(&self) -> DateTime<Local>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Local calendar day according to the clock.
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.now().date_naive()
}
