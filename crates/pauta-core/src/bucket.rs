use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::datetime::{local_day, local_hour_minute};
use crate::task::Task;

/// Tasks due on `day` (project wall clock), ascending by due instant.
/// The sort is stable, so tasks sharing a timestamp keep their input
/// order.
pub fn tasks_on_day(tasks: &[Task], day: NaiveDate, tz: Tz) -> Vec<Task> {
    let mut hits: Vec<Task> = tasks
        .iter()
        .filter(|task| local_day(task.due, tz) == day)
        .cloned()
        .collect();
    hits.sort_by_key(|task| task.due);
    hits
}

/// Same-day tasks whose local hour-of-day equals `hour`, same ordering
/// rule as [`tasks_on_day`].
pub fn tasks_in_hour(tasks: &[Task], day: NaiveDate, hour: u32, tz: Tz) -> Vec<Task> {
    let mut hits: Vec<Task> = tasks
        .iter()
        .filter(|task| {
            local_day(task.due, tz) == day && local_hour_minute(task.due, tz).0 == hour
        })
        .cloned()
        .collect();
    hits.sort_by_key(|task| task.due);
    hits
}

/// One-pass grouping of a task snapshot by local calendar day, so a
/// render pass over dozens of cells does not rescan the whole
/// collection per cell. Produces exactly what [`tasks_on_day`] would.
#[derive(Debug, Default, Clone)]
pub struct DayBuckets {
    buckets: BTreeMap<NaiveDate, Vec<Task>>,
}

impl DayBuckets {
    pub fn build(tasks: &[Task], tz: Tz) -> Self {
        let mut buckets: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();
        for task in tasks {
            buckets
                .entry(local_day(task.due, tz))
                .or_default()
                .push(task.clone());
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by_key(|task| task.due);
        }
        Self { buckets }
    }

    pub fn on_day(&self, day: NaiveDate) -> &[Task] {
        self.buckets.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::America::Sao_Paulo;
    use chrono_tz::Tz;

    use super::*;
    use crate::grid::{view_dates, ViewMode};
    use chrono::Weekday;

    fn task_at(id: &str, y: i32, m: u32, d: u32, h: u32, min: u32, tz: Tz) -> Task {
        let due = tz
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("valid local instant")
            .with_timezone(&Utc);
        Task::new(id, format!("task {id}"), due)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn buckets_by_local_calendar_day() {
        let tasks = vec![
            task_at("a", 2024, 2, 15, 9, 30, Sao_Paulo),
            task_at("b", 2024, 2, 16, 8, 0, Sao_Paulo),
            // 22:30 local on the 15th is 01:30 UTC on the 16th.
            task_at("c", 2024, 2, 15, 22, 30, Sao_Paulo),
        ];

        let hits = tasks_on_day(&tasks, day(2024, 2, 15), Sao_Paulo);
        let ids: Vec<&str> = hits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        assert_eq!(tasks_on_day(&tasks, day(2024, 2, 14), Sao_Paulo).len(), 0);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let tasks = vec![
            task_at("late", 2024, 2, 15, 14, 0, Sao_Paulo),
            task_at("x", 2024, 2, 15, 9, 30, Sao_Paulo),
            task_at("y", 2024, 2, 15, 9, 30, Sao_Paulo),
            task_at("z", 2024, 2, 15, 9, 30, Sao_Paulo),
        ];

        let hits = tasks_on_day(&tasks, day(2024, 2, 15), Sao_Paulo);
        let ids: Vec<&str> = hits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z", "late"]);
    }

    #[test]
    fn hour_buckets_filter_by_local_hour() {
        let tasks = vec![
            task_at("a", 2024, 2, 15, 9, 5, Sao_Paulo),
            task_at("b", 2024, 2, 15, 9, 45, Sao_Paulo),
            task_at("c", 2024, 2, 15, 10, 0, Sao_Paulo),
            task_at("d", 2024, 2, 16, 9, 10, Sao_Paulo),
        ];

        let nine = tasks_in_hour(&tasks, day(2024, 2, 15), 9, Sao_Paulo);
        let ids: Vec<&str> = nine.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(tasks_in_hour(&tasks, day(2024, 2, 15), 11, Sao_Paulo).is_empty());
    }

    #[test]
    fn grid_bucketing_partitions_tasks() {
        let tasks = vec![
            task_at("a", 2024, 2, 1, 9, 0, Sao_Paulo),
            task_at("b", 2024, 2, 15, 9, 30, Sao_Paulo),
            task_at("c", 2024, 2, 29, 23, 59, Sao_Paulo),
            task_at("d", 2024, 3, 2, 0, 0, Sao_Paulo),
        ];

        let dates = view_dates(day(2024, 2, 15), ViewMode::Month, Weekday::Sun);
        let mut seen = 0usize;
        for cell in &dates {
            let hits = tasks_on_day(&tasks, *cell, Sao_Paulo);
            seen += hits.len();
        }
        // Every task falls in exactly one of the 35 cells.
        assert_eq!(seen, tasks.len());
    }

    #[test]
    fn day_buckets_match_naive_filter() {
        let tasks = vec![
            task_at("a", 2024, 2, 15, 9, 30, Sao_Paulo),
            task_at("b", 2024, 2, 15, 8, 0, Sao_Paulo),
            task_at("c", 2024, 2, 16, 12, 0, Sao_Paulo),
        ];

        let buckets = DayBuckets::build(&tasks, Sao_Paulo);
        assert_eq!(buckets.total(), 3);

        for cell in [day(2024, 2, 14), day(2024, 2, 15), day(2024, 2, 16)] {
            assert_eq!(
                buckets.on_day(cell),
                tasks_on_day(&tasks, cell, Sao_Paulo).as_slice(),
            );
        }
    }
}
