use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate, Weekday};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::datetime::local_hour_minute;
use crate::engine::{CalendarCell, CalendarEngine};
use crate::grid::{ViewMode, add_days, start_of_week};
use crate::providers::{CompanyDirectory, TaskSource, ToggleNotifier};
use crate::task::Task;

/// Month cells show at most this many chips; the rest collapse into a
/// "+N more" line. The engine's cells stay complete, the cap is ours.
const MONTH_CELL_TASK_CAP: usize = 3;
const MONTH_CELL_WIDTH: usize = 18;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, engine))]
    pub fn print_month<S, C, N>(&mut self, engine: &CalendarEngine<S, C, N>) -> anyhow::Result<()>
    where
        S: TaskSource,
        C: CompanyDirectory,
        N: ToggleNotifier,
    {
        let mut out = io::stdout().lock();
        let grid = engine.grid();
        let today = engine.today_day();

        writeln!(
            out,
            "{}",
            view_title(ViewMode::Month, engine.anchor(), engine.week_start())
        )?;

        for label in weekday_labels(engine.week_start()) {
            write!(out, "{} ", pad_visible(label, MONTH_CELL_WIDTH))?;
        }
        writeln!(out)?;

        for week in grid.chunks(7) {
            let cells: Vec<Vec<String>> = week
                .iter()
                .map(|cell| self.month_cell_lines(engine, cell, today))
                .collect();
            let height = cells.iter().map(Vec::len).max().unwrap_or(1);

            for line_idx in 0..height {
                for lines in &cells {
                    let line = lines.get(line_idx).map(String::as_str).unwrap_or("");
                    write!(out, "{} ", pad_visible(line, MONTH_CELL_WIDTH))?;
                }
                writeln!(out)?;
            }
            writeln!(out)?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, engine))]
    pub fn print_week<S, C, N>(&mut self, engine: &CalendarEngine<S, C, N>) -> anyhow::Result<()>
    where
        S: TaskSource,
        C: CompanyDirectory,
        N: ToggleNotifier,
    {
        let mut out = io::stdout().lock();
        let today = engine.today_day();

        writeln!(
            out,
            "{}",
            view_title(ViewMode::Week, engine.anchor(), engine.week_start())
        )?;

        for cell in engine.grid() {
            let mut head = format!(
                "{}  ({} task{})",
                cell.date.format("%a %Y-%m-%d"),
                cell.tasks.len(),
                if cell.tasks.len() == 1 { "" } else { "s" }
            );
            if cell.date == today {
                head = self.paint(&head, "33");
            }
            writeln!(out, "{head}")?;

            for task in &cell.tasks {
                writeln!(out, "  {}", self.task_line(engine, task))?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, engine))]
    pub fn print_day<S, C, N>(&mut self, engine: &CalendarEngine<S, C, N>) -> anyhow::Result<()>
    where
        S: TaskSource,
        C: CompanyDirectory,
        N: ToggleNotifier,
    {
        let mut out = io::stdout().lock();
        let anchor = engine.anchor();

        writeln!(
            out,
            "{}",
            view_title(ViewMode::Day, anchor, engine.week_start())
        )?;

        let positions = engine.positioned_tasks();
        let now = (anchor == engine.today_day()).then(|| engine.now_marker());

        for hour in 0..24_u32 {
            writeln!(out, "{hour:02}:00")?;

            // Chips and the live marker interleave by minute.
            let mut entries: Vec<(u32, String)> = positions
                .iter()
                .filter(|slot| slot.offset_minutes / 60 == hour)
                .map(|slot| {
                    (
                        slot.offset_minutes % 60,
                        format!("      {}", self.task_line(engine, &slot.task)),
                    )
                })
                .collect();

            if let Some(offset) = now
                && offset / 60 == hour
            {
                let marker = format!(
                    "  ──── now {:02}:{:02} ────",
                    offset / 60,
                    offset % 60
                );
                entries.push((offset % 60, self.paint(&marker, "31")));
            }

            entries.sort_by_key(|(minute, _)| *minute);
            for (_, line) in entries {
                writeln!(out, "{line}")?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn print_toggle_receipt(&mut self, task: &Task) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let state = if task.completed {
            self.paint("done", "32")
        } else {
            "pending".to_string()
        };
        writeln!(out, "toggled {}: {} -> {}", task.id, task.title, state)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, cfg))]
    pub fn print_config(&mut self, cfg: &Config) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let mut entries: Vec<(&String, &String)> = cfg.iter().collect();
        entries.sort_by_key(|(key, _)| *key);
        for (key, value) in entries {
            writeln!(out, "{key}={value}")?;
        }

        for path in &cfg.loaded_files {
            writeln!(out, "# loaded {}", path.display())?;
        }

        Ok(())
    }

    fn month_cell_lines<S, C, N>(
        &self,
        engine: &CalendarEngine<S, C, N>,
        cell: &CalendarCell,
        today: NaiveDate,
    ) -> Vec<String>
    where
        S: TaskSource,
        C: CompanyDirectory,
        N: ToggleNotifier,
    {
        let mut label = format!("{:>2}", cell.date.day());
        if cell.date == today {
            label = self.paint(&label, "33");
        } else if !cell.in_current_period {
            label = self.paint(&label, "90");
        }

        let mut lines = vec![label];
        for task in cell.tasks.iter().take(MONTH_CELL_TASK_CAP) {
            let (hour, minute) = local_hour_minute(task.due, engine.timezone());
            let chip = format!("{hour:02}:{minute:02} {}", task.title);
            lines.push(fit_visible(&chip, MONTH_CELL_WIDTH));
        }
        if cell.tasks.len() > MONTH_CELL_TASK_CAP {
            lines.push(format!("+{} more", cell.tasks.len() - MONTH_CELL_TASK_CAP));
        }

        lines
    }

    fn task_line<S, C, N>(&self, engine: &CalendarEngine<S, C, N>, task: &Task) -> String
    where
        S: TaskSource,
        C: CompanyDirectory,
        N: ToggleNotifier,
    {
        let (hour, minute) = local_hour_minute(task.due, engine.timezone());
        let check = if task.completed {
            self.paint("[x]", "32")
        } else {
            "[ ]".to_string()
        };
        format!(
            "{hour:02}:{minute:02} {check} {} ({})",
            task.title,
            engine.company_label(task)
        )
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn view_title(mode: ViewMode, anchor: NaiveDate, week_start: Weekday) -> String {
    match mode {
        ViewMode::Month => format!("{} View {}", mode.label(), anchor.format("%B %Y")),
        ViewMode::Week => {
            let start = start_of_week(anchor, week_start);
            let end = add_days(start, 6);
            format!(
                "{} View {} - {}",
                mode.label(),
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            )
        }
        ViewMode::Day => format!("{} View {}", mode.label(), anchor.format("%A, %Y-%m-%d")),
    }
}

fn weekday_labels(week_start: Weekday) -> Vec<&'static str> {
    match week_start {
        Weekday::Sun => vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
        _ => vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    }
}

fn pad_visible(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(strip_ansi(text).as_str());
    let padding = width.saturating_sub(visible);
    format!("{}{}", text, " ".repeat(padding))
}

/// Clamps a chip to `width` terminal columns, appending an ellipsis
/// when it had to cut.
fn fit_visible(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    out
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
