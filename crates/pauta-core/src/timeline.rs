use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::datetime::local_hour_minute;
use crate::task::Task;

pub const MINUTES_PER_DAY: u32 = 1_440;

/// Where a task chip sits inside a 24-hour column. `duration_minutes`
/// is a fixed visual height only; overlapping chips are not resolved
/// here, the presentation layer z-orders them.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlotPosition {
    pub task: Task,
    pub offset_minutes: u32,
    pub duration_minutes: u32,
}

pub fn position(task: &Task, tz: Tz, slot_minutes: u32) -> TimeSlotPosition {
    let (hour, minute) = local_hour_minute(task.due, tz);
    TimeSlotPosition {
        task: task.clone(),
        offset_minutes: hour * 60 + minute,
        duration_minutes: slot_minutes,
    }
}

/// Minutes since local midnight for the live "current time" marker.
/// Callers re-read this each render tick; there is no timer here.
pub fn now_offset(now: DateTime<Utc>, tz: Tz) -> u32 {
    let (hour, minute) = local_hour_minute(now, tz);
    hour * 60 + minute
}
