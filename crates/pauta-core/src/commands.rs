use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::DataStore;
use crate::datetime::{self, parse_date_expr};
use crate::engine::CalendarEngine;
use crate::grid::ViewMode;
use crate::hooks::HookRunner;
use crate::providers::{CompanyIndex, TaskSnapshot};
use crate::render::Renderer;

pub fn known_command_names() -> Vec<&'static str> {
    vec!["month", "week", "day", "today", "toggle", "config"]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let command = inv.command.as_str();

    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "month" => cmd_view(store, cfg, renderer, ViewMode::Month, &inv.command_args, now),
        "week" => cmd_view(store, cfg, renderer, ViewMode::Week, &inv.command_args, now),
        "day" => cmd_view(store, cfg, renderer, ViewMode::Day, &inv.command_args, now),
        "today" => cmd_view(store, cfg, renderer, cfg.default_view(), &[], now),
        "toggle" => cmd_toggle(store, cfg, renderer, &inv.command_args),
        "config" => renderer.print_config(cfg),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(store, cfg, renderer, now))]
fn cmd_view(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    mode: ViewMode,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let mut engine = build_engine(store, cfg)?;

    // A date argument re-anchors before the view renders. Unlike the
    // engine's silent jump, the CLI surfaces the parse error.
    if let Some(expr) = args.first() {
        let day = parse_date_expr(expr, now, *datetime::project_timezone())?;
        engine.drill_down(day);
    }
    engine.set_mode(mode);

    match mode {
        ViewMode::Month => renderer.print_month(&engine),
        ViewMode::Week => renderer.print_week(&engine),
        ViewMode::Day => renderer.print_day(&engine),
    }
}

#[instrument(skip(store, cfg, renderer))]
fn cmd_toggle(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    let task_id = args
        .first()
        .ok_or_else(|| anyhow!("usage: pauta toggle <task-id>"))?;

    // The store owns completion; the engine only relays the toggle to
    // its notifier (hook scripts here).
    let toggled = store.toggle_task(task_id)?;
    let engine = build_engine(store, cfg)?;
    engine.toggle_task(&toggled.id);

    renderer.print_toggle_receipt(&toggled)
}

fn build_engine(
    store: &DataStore,
    cfg: &Config,
) -> anyhow::Result<CalendarEngine<TaskSnapshot, CompanyIndex, HookRunner>> {
    let tasks = store.load_tasks()?;
    let companies = CompanyIndex::new(&store.load_companies()?);
    let hooks = HookRunner::new(cfg, &store.data_dir);

    Ok(CalendarEngine::new(
        TaskSnapshot(tasks),
        companies,
        hooks,
        *datetime::project_timezone(),
        cfg.week_start(),
        cfg.slot_minutes(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names};

    #[test]
    fn expands_unambiguous_prefixes() {
        let known = known_command_names();

        assert_eq!(expand_command_abbrev("m", &known), Some("month"));
        assert_eq!(expand_command_abbrev("w", &known), Some("week"));
        assert_eq!(expand_command_abbrev("tod", &known), Some("today"));
        assert_eq!(expand_command_abbrev("tog", &known), Some("toggle"));
        assert_eq!(expand_command_abbrev("config", &known), Some("config"));
    }

    #[test]
    fn ambiguous_or_unknown_prefixes_do_not_expand() {
        let known = known_command_names();

        // "to" could be today or toggle.
        assert_eq!(expand_command_abbrev("to", &known), None);
        assert_eq!(expand_command_abbrev("2024-02-15", &known), None);
    }
}
