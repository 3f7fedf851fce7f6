//! Wall-clock capability: the booking default date and chat timestamp labels.

use chrono::{Local, NaiveDate, NaiveTime};

/// Chat timestamp format, e.g. "10:31 AM".
pub const TIME_LABEL_FORMAT: &str = "%I:%M %p";

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Current time of day formatted for a chat message.
    fn time_label(&self) -> String;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn time_label(&self) -> String {
        Local::now().format(TIME_LABEL_FORMAT).to_string()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl FixedClock {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn time_label(&self) -> String {
        self.time.format(TIME_LABEL_FORMAT).to_string()
    }
}
