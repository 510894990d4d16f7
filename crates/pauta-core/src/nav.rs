use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::datetime::{local_day, parse_date_expr};
use crate::grid::{add_days, shift_months, ViewMode};

/// The engine's only persistent state: the anchor day the calendar is
/// centered on and the active view mode. Every transition replaces the
/// anchor wholesale; there is no partial update to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarState {
    pub anchor: NaiveDate,
    pub mode: ViewMode,
}

impl CalendarState {
    pub fn initial(now: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            anchor: local_day(now, tz),
            mode: ViewMode::Month,
        }
    }

    pub fn prev(&mut self) {
        self.shift(-1);
    }

    pub fn next(&mut self) {
        self.shift(1);
    }

    fn shift(&mut self, step: i64) {
        self.anchor = match self.mode {
            ViewMode::Month => shift_months(self.anchor, step as i32),
            ViewMode::Week => add_days(self.anchor, step * 7),
            ViewMode::Day => add_days(self.anchor, step),
        };
        debug!(anchor = %self.anchor, mode = self.mode.as_key(), step, "shifted anchor");
    }

    pub fn today(&mut self, now: DateTime<Utc>, tz: Tz) {
        self.anchor = local_day(now, tz);
    }

    /// Re-anchors on a user-entered date expression. Malformed input is
    /// rejected by leaving the state untouched; the return value only
    /// says whether the jump happened.
    pub fn jump_to(&mut self, input: &str, now: DateTime<Utc>, tz: Tz) -> bool {
        match parse_date_expr(input, now, tz) {
            Ok(day) => {
                self.anchor = day;
                true
            }
            Err(error) => {
                debug!(input, error = %error, "rejected jump target; state unchanged");
                false
            }
        }
    }

    pub fn drill_down(&mut self, day: NaiveDate) {
        self.anchor = day;
        self.mode = ViewMode::Day;
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }
}
