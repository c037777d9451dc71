use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReason {
    DateInPast,
    TimeInPast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationResult {
    Valid,
    Invalid(InvalidReason),
}

/// Checks that a proposed schedule is not in the past.
#[derive(Clone)]
pub struct ScheduleValidator {
    clock: Arc<dyn Clock>,
}

impl ScheduleValidator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn validate(&self, date: NaiveDate, time: NaiveTime) -> ValidationResult {
        validate_at(date, time, self.clock.now())
    }
}

impl Default for ScheduleValidator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

pub fn validate_at(date: NaiveDate, time: NaiveTime, now: NaiveDateTime) -> ValidationResult {
    let today = now.date();

    if date < today {
        ValidationResult::Invalid(InvalidReason::DateInPast)
    } else if date == today && time < now.time() {
        ValidationResult::Invalid(InvalidReason::TimeInPast)
    } else {
        ValidationResult::Valid
    }
}
