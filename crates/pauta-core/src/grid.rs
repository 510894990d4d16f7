use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Temporal granularity of the calendar. Determines the grid shape and
/// whether time-of-day positioning applies (week/day only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Month,
    Week,
    Day,
}

impl ViewMode {
    pub fn all() -> [Self; 3] {
        [Self::Month, Self::Week, Self::Day]
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::Week => "Week",
            Self::Day => "Day",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|mode| mode.as_key() == key.trim().to_ascii_lowercase())
    }
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

/// Month arithmetic clamps the day-of-month to the target month's end
/// (Jan 31 + 1 month lands on the last day of February).
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;

    while month < 1 {
        month += 12;
        year = year.saturating_sub(1);
    }
    while month > 12 {
        month -= 12;
        year = year.saturating_add(1);
    }

    let month = month as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

pub fn first_day_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month >= 12 {
        (year.saturating_add(1), 1_u32)
    } else {
        (year, month + 1)
    };
    add_days(first_day_of_month(next_year, next_month), -1)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    last_day_of_month(year, month).day()
}

pub fn start_of_week(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    let day_idx = day.weekday().num_days_from_monday() as i64;
    let start_idx = week_start.num_days_from_monday() as i64;
    let diff = (7 + day_idx - start_idx) % 7;
    add_days(day, -diff)
}

/// Dates making up the calendar grid for one view of the anchor.
///
/// Month mode covers every week intersecting the anchor's month, so the
/// result is always a multiple of seven (35 or 42 cells, 28 for a
/// February that starts exactly on the week-start day). Week mode is
/// the seven days around the anchor; day mode is the anchor alone.
pub fn view_dates(anchor: NaiveDate, mode: ViewMode, week_start: Weekday) -> Vec<NaiveDate> {
    match mode {
        ViewMode::Month => {
            let first = first_day_of_month(anchor.year(), anchor.month());
            let last = last_day_of_month(anchor.year(), anchor.month());
            let grid_start = start_of_week(first, week_start);
            let grid_end = add_days(start_of_week(last, week_start), 6);

            let len = (grid_end - grid_start).num_days() + 1;
            (0..len).map(|offset| add_days(grid_start, offset)).collect()
        }
        ViewMode::Week => {
            let start = start_of_week(anchor, week_start);
            (0..7).map(|offset| add_days(start, offset)).collect()
        }
        ViewMode::Day => vec![anchor],
    }
}

/// Whether a grid date belongs to the period the anchor names: the
/// anchor's month, its week, or the anchor day itself.
pub fn in_current_period(
    day: NaiveDate,
    anchor: NaiveDate,
    mode: ViewMode,
    week_start: Weekday,
) -> bool {
    match mode {
        ViewMode::Month => day.year() == anchor.year() && day.month() == anchor.month(),
        ViewMode::Week => start_of_week(day, week_start) == start_of_week(anchor, week_start),
        ViewMode::Day => day == anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn month_grid_covers_february_2024() {
        let dates = view_dates(day(2024, 2, 15), ViewMode::Month, Weekday::Sun);

        assert_eq!(dates.len(), 35);
        assert_eq!(dates[0], day(2024, 1, 28));
        assert_eq!(dates[34], day(2024, 3, 2));
        // Leap day sits inside the grid.
        assert!(dates.contains(&day(2024, 2, 29)));
    }

    #[test]
    fn month_grid_is_weeks_and_contains_whole_month() {
        let anchors = [
            day(2024, 1, 1),
            day(2024, 12, 31),
            day(2025, 2, 28),
            day(2023, 6, 15),
        ];

        for anchor in anchors {
            let dates = view_dates(anchor, ViewMode::Month, Weekday::Sun);
            assert_eq!(dates.len() % 7, 0, "anchor {anchor}");

            let last = last_day_of_month(anchor.year(), anchor.month());
            for offset in 0..last.day() {
                let in_month = day(anchor.year(), anchor.month(), offset + 1);
                assert!(dates.contains(&in_month), "missing {in_month}");
            }
        }
    }

    #[test]
    fn month_grid_respects_monday_week_start() {
        let dates = view_dates(day(2024, 2, 15), ViewMode::Month, Weekday::Mon);

        assert_eq!(dates[0], day(2024, 1, 29));
        assert_eq!(dates.len(), 35);
        assert_eq!(dates[34], day(2024, 3, 3));
    }

    #[test]
    fn week_grid_has_seven_days_around_anchor() {
        let anchor = day(2024, 2, 15);
        let dates = view_dates(anchor, ViewMode::Week, Weekday::Sun);

        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], day(2024, 2, 11));
        assert_eq!(dates[6], day(2024, 2, 17));
        assert!(dates.contains(&anchor));
    }

    #[test]
    fn week_grid_spans_year_boundary() {
        let dates = view_dates(day(2025, 1, 1), ViewMode::Week, Weekday::Sun);

        assert_eq!(dates[0], day(2024, 12, 29));
        assert_eq!(dates[6], day(2025, 1, 4));
    }

    #[test]
    fn day_grid_is_anchor_alone() {
        let anchor = day(2024, 2, 29);
        assert_eq!(view_dates(anchor, ViewMode::Day, Weekday::Sun), vec![anchor]);
    }

    #[test]
    fn view_dates_is_pure() {
        let anchor = day(2024, 2, 15);
        for mode in ViewMode::all() {
            assert_eq!(
                view_dates(anchor, mode, Weekday::Sun),
                view_dates(anchor, mode, Weekday::Sun),
            );
        }
    }

    #[test]
    fn shift_months_clamps_to_month_end() {
        assert_eq!(shift_months(day(2024, 1, 31), 1), day(2024, 2, 29));
        assert_eq!(shift_months(day(2023, 1, 31), 1), day(2023, 2, 28));
        assert_eq!(shift_months(day(2024, 3, 15), -1), day(2024, 2, 15));
        assert_eq!(shift_months(day(2024, 1, 15), -1), day(2023, 12, 15));
        assert_eq!(shift_months(day(2024, 11, 30), 3), day(2025, 2, 28));
    }

    #[test]
    fn in_current_period_tracks_mode() {
        let anchor = day(2024, 2, 15);

        assert!(in_current_period(day(2024, 2, 1), anchor, ViewMode::Month, Weekday::Sun));
        assert!(!in_current_period(day(2024, 1, 31), anchor, ViewMode::Month, Weekday::Sun));

        assert!(in_current_period(day(2024, 2, 11), anchor, ViewMode::Week, Weekday::Sun));
        assert!(!in_current_period(day(2024, 2, 18), anchor, ViewMode::Week, Weekday::Sun));
        // With a monday week start the 11th falls in the prior week.
        assert!(!in_current_period(day(2024, 2, 11), anchor, ViewMode::Week, Weekday::Mon));

        assert!(in_current_period(anchor, anchor, ViewMode::Day, Weekday::Sun));
        assert!(!in_current_period(day(2024, 2, 14), anchor, ViewMode::Day, Weekday::Sun));
    }
}
