use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use tracing::debug;

use crate::bucket::{self, DayBuckets};
use crate::grid::{self, ViewMode};
use crate::nav::CalendarState;
use crate::providers::{company_label, CompanyDirectory, TaskSource, ToggleNotifier};
use crate::task::Task;
use crate::timeline::{self, TimeSlotPosition};

/// One date-bucket of the rendered grid. Recomputed on every read,
/// never cached; the task sequence is always complete ("+N more"
/// capping is a presentation policy, not ours).
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_current_period: bool,
    pub tasks: Vec<Task>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Stateful calendar facade for a presentation layer. Owns the
/// navigation state and an injected clock; everything else is derived
/// from a fresh collaborator snapshot per call.
pub struct CalendarEngine<S, C, N> {
    source: S,
    companies: C,
    notifier: N,
    clock: Clock,
    timezone: Tz,
    week_start: Weekday,
    slot_minutes: u32,
    state: CalendarState,
}

impl<S, C, N> CalendarEngine<S, C, N>
where
    S: TaskSource,
    C: CompanyDirectory,
    N: ToggleNotifier,
{
    pub fn new(
        source: S,
        companies: C,
        notifier: N,
        timezone: Tz,
        week_start: Weekday,
        slot_minutes: u32,
    ) -> Self {
        Self::with_clock(
            source,
            companies,
            notifier,
            timezone,
            week_start,
            slot_minutes,
            Box::new(Utc::now),
        )
    }

    /// Builds the engine around an explicit clock so tests can freeze
    /// time.
    pub fn with_clock(
        source: S,
        companies: C,
        notifier: N,
        timezone: Tz,
        week_start: Weekday,
        slot_minutes: u32,
        clock: Clock,
    ) -> Self {
        let state = CalendarState::initial(clock(), timezone);
        debug!(
            anchor = %state.anchor,
            timezone = %timezone,
            week_start = ?week_start,
            "initialized calendar engine"
        );
        Self {
            source,
            companies,
            notifier,
            clock,
            timezone,
            week_start,
            slot_minutes,
            state,
        }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.state.anchor
    }

    pub fn mode(&self) -> ViewMode {
        self.state.mode
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn prev(&mut self) {
        self.state.prev();
    }

    pub fn next(&mut self) {
        self.state.next();
    }

    pub fn today(&mut self) {
        self.state.today((self.clock)(), self.timezone);
    }

    pub fn jump_to(&mut self, input: &str) -> bool {
        self.state.jump_to(input, (self.clock)(), self.timezone)
    }

    pub fn drill_down(&mut self, day: NaiveDate) {
        self.state.drill_down(day);
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.state.set_mode(mode);
    }

    /// The grid for the current (anchor, mode), with each cell's tasks
    /// bucketed and ordered.
    pub fn grid(&self) -> Vec<CalendarCell> {
        let tasks = self.source.snapshot();
        let buckets = DayBuckets::build(&tasks, self.timezone);

        grid::view_dates(self.state.anchor, self.state.mode, self.week_start)
            .into_iter()
            .map(|date| CalendarCell {
                date,
                in_current_period: grid::in_current_period(
                    date,
                    self.state.anchor,
                    self.state.mode,
                    self.week_start,
                ),
                tasks: buckets.on_day(date).to_vec(),
            })
            .collect()
    }

    /// Time-of-day positions for the current view's tasks, ordered by
    /// date then due instant. Month mode carries no time rail, so it
    /// yields nothing.
    pub fn positioned_tasks(&self) -> Vec<TimeSlotPosition> {
        if self.state.mode == ViewMode::Month {
            return Vec::new();
        }

        self.grid()
            .iter()
            .flat_map(|cell| {
                cell.tasks
                    .iter()
                    .map(|task| timeline::position(task, self.timezone, self.slot_minutes))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn tasks_in_hour(&self, day: NaiveDate, hour: u32) -> Vec<Task> {
        bucket::tasks_in_hour(&self.source.snapshot(), day, hour, self.timezone)
    }

    /// Minutes since local midnight right now, for the live marker.
    pub fn now_marker(&self) -> u32 {
        timeline::now_offset((self.clock)(), self.timezone)
    }

    pub fn today_day(&self) -> NaiveDate {
        crate::datetime::local_day((self.clock)(), self.timezone)
    }

    pub fn company_label(&self, task: &Task) -> String {
        company_label(&self.companies, task.company_id.as_deref())
    }

    /// Relays a user toggle to the notifier. The engine never mutates
    /// the task itself; completion lives with the data owner.
    pub fn toggle_task(&self, task_id: &str) {
        debug!(task_id, "relaying task toggle");
        self.notifier.task_toggled(task_id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::America::Sao_Paulo;

    use super::*;
    use crate::providers::{CompanyIndex, NullNotifier, TaskSnapshot, UNKNOWN_COMPANY_LABEL};
    use crate::task::Company;

    #[derive(Default, Clone)]
    struct SharedTasks(Arc<Mutex<Vec<Task>>>);

    impl TaskSource for SharedTasks {
        fn snapshot(&self) -> Vec<Task> {
            self.0.lock().expect("source lock").clone()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<String>>);

    impl ToggleNotifier for Arc<RecordingNotifier> {
        fn task_toggled(&self, task_id: &str) {
            self.0.lock().expect("notifier lock").push(task_id.to_string());
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn frozen_clock() -> Clock {
        Box::new(|| {
            Utc.with_ymd_and_hms(2024, 2, 15, 12, 30, 0)
                .single()
                .expect("valid now")
        })
    }

    fn local_task(id: &str, y: i32, m: u32, d: u32, h: u32, min: u32) -> Task {
        let due = Sao_Paulo
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("valid local instant")
            .with_timezone(&Utc);
        Task::new(id, format!("task {id}"), due)
    }

    fn engine_with(
        tasks: Vec<Task>,
        companies: Vec<Company>,
    ) -> CalendarEngine<TaskSnapshot, CompanyIndex, NullNotifier> {
        CalendarEngine::with_clock(
            TaskSnapshot(tasks),
            CompanyIndex::new(&companies),
            NullNotifier,
            Sao_Paulo,
            chrono::Weekday::Sun,
            30,
            frozen_clock(),
        )
    }

    #[test]
    fn initializes_on_the_clock_day_in_month_mode() {
        let engine = engine_with(vec![], vec![]);
        assert_eq!(engine.anchor(), day(2024, 2, 15));
        assert_eq!(engine.mode(), ViewMode::Month);
    }

    #[test]
    fn month_grid_buckets_tasks_into_cells() {
        let engine = engine_with(
            vec![
                local_task("a", 2024, 2, 15, 9, 30),
                local_task("b", 2024, 2, 15, 8, 0),
                local_task("c", 2024, 3, 1, 10, 0),
            ],
            vec![],
        );

        let grid = engine.grid();
        assert_eq!(grid.len(), 35);
        assert_eq!(grid[0].date, day(2024, 1, 28));
        assert!(!grid[0].in_current_period);

        let cell = grid
            .iter()
            .find(|cell| cell.date == day(2024, 2, 15))
            .expect("anchor cell present");
        assert!(cell.in_current_period);
        let ids: Vec<&str> = cell.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        // March 1 sits in the trailing cells of the February grid.
        let trailing = grid
            .iter()
            .find(|cell| cell.date == day(2024, 3, 1))
            .expect("trailing cell present");
        assert!(!trailing.in_current_period);
        assert_eq!(trailing.tasks.len(), 1);
    }

    #[test]
    fn positioned_tasks_only_exist_in_time_granular_views() {
        let mut engine = engine_with(vec![local_task("a", 2024, 2, 15, 9, 30)], vec![]);

        assert!(engine.positioned_tasks().is_empty());

        engine.set_mode(ViewMode::Day);
        let positions = engine.positioned_tasks();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].offset_minutes, 570);
        assert_eq!(positions[0].duration_minutes, 30);

        engine.set_mode(ViewMode::Week);
        assert_eq!(engine.positioned_tasks().len(), 1);
    }

    #[test]
    fn now_marker_follows_the_injected_clock() {
        let engine = engine_with(vec![], vec![]);
        // 12:30 UTC is 09:30 on the project wall clock.
        assert_eq!(engine.now_marker(), 570);
        assert_eq!(engine.today_day(), day(2024, 2, 15));
    }

    #[test]
    fn today_preserves_day_mode() {
        let mut engine = engine_with(vec![], vec![]);
        engine.set_mode(ViewMode::Day);
        engine.next();
        engine.next();
        engine.today();
        assert_eq!(engine.anchor(), day(2024, 2, 15));
        assert_eq!(engine.mode(), ViewMode::Day);
    }

    #[test]
    fn invalid_jump_leaves_state_unchanged() {
        let mut engine = engine_with(vec![], vec![]);
        engine.set_mode(ViewMode::Week);
        assert!(!engine.jump_to("??"));
        assert_eq!(engine.anchor(), day(2024, 2, 15));
        assert_eq!(engine.mode(), ViewMode::Week);
    }

    #[test]
    fn grid_re_reads_the_source_every_time() {
        let source = SharedTasks::default();
        let mut engine = CalendarEngine::with_clock(
            source.clone(),
            CompanyIndex::default(),
            NullNotifier,
            Sao_Paulo,
            chrono::Weekday::Sun,
            30,
            frozen_clock(),
        );
        engine.set_mode(ViewMode::Day);

        assert!(engine.grid()[0].tasks.is_empty());

        source
            .0
            .lock()
            .expect("source lock")
            .push(local_task("a", 2024, 2, 15, 9, 30));
        assert_eq!(engine.grid()[0].tasks.len(), 1);
    }

    #[test]
    fn company_labels_fall_back_when_directory_misses() {
        let engine = engine_with(
            vec![],
            vec![Company {
                id: "acme".to_string(),
                name: "Acme Ltda".to_string(),
            }],
        );

        let known = local_task("a", 2024, 2, 15, 9, 0).with_company("acme");
        let unknown = local_task("b", 2024, 2, 15, 9, 0).with_company("ghost");
        let orphan = local_task("c", 2024, 2, 15, 9, 0);

        assert_eq!(engine.company_label(&known), "Acme Ltda");
        assert_eq!(engine.company_label(&unknown), UNKNOWN_COMPANY_LABEL);
        assert_eq!(engine.company_label(&orphan), UNKNOWN_COMPANY_LABEL);
    }

    #[test]
    fn toggle_relays_to_the_notifier() {
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = CalendarEngine::with_clock(
            TaskSnapshot(vec![]),
            CompanyIndex::default(),
            Arc::clone(&notifier),
            Sao_Paulo,
            chrono::Weekday::Sun,
            30,
            frozen_clock(),
        );

        engine.toggle_task("t-42");
        engine.toggle_task("t-43");
        assert_eq!(
            *notifier.0.lock().expect("notifier lock"),
            vec!["t-42".to_string(), "t-43".to_string()],
        );
    }
}
