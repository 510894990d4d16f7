use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::providers::ToggleNotifier;

/// Runs executable `on-toggle.*` scripts from `<data>/hooks` with the
/// task id as the only argument. Strictly fire-and-forget: failures
/// are logged and swallowed, never returned to the caller.
#[derive(Debug, Clone)]
pub struct HookRunner {
    enabled: bool,
    hooks_dir: PathBuf,
}

impl HookRunner {
    pub fn new(cfg: &Config, data_dir: &Path) -> Self {
        let enabled = cfg.get_bool("hooks").unwrap_or(true);
        let hooks_dir = data_dir.join("hooks");
        debug!(
            enabled,
            hooks_dir = %hooks_dir.display(),
            "initialized hook runner"
        );
        Self { enabled, hooks_dir }
    }

    #[instrument(skip(self))]
    pub fn fire_on_toggle(&self, task_id: &str) {
        if !self.enabled {
            debug!("hooks disabled; skipping on-toggle");
            return;
        }

        let scripts = match self.list_scripts("on-toggle") {
            Ok(scripts) => scripts,
            Err(error) => {
                warn!(error = %error, "failed listing on-toggle hooks");
                return;
            }
        };

        debug!(count = scripts.len(), "running on-toggle hooks");
        for script in scripts {
            if let Err(error) = run_hook(&script, task_id) {
                warn!(
                    hook = %script.display(),
                    error = %error,
                    "on-toggle hook failed"
                );
            }
        }
    }

    #[instrument(skip(self))]
    fn list_scripts(&self, event: &str) -> anyhow::Result<Vec<PathBuf>> {
        if !self.hooks_dir.exists() {
            return Ok(Vec::new());
        }

        let mut scripts = Vec::new();
        for entry in fs::read_dir(&self.hooks_dir)
            .with_context(|| format!("failed to read hooks dir {}", self.hooks_dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !name.starts_with(&format!("{event}.")) {
                continue;
            }

            if !is_executable(&path)? {
                debug!(path = %path.display(), "skipping non-executable hook");
                continue;
            }

            debug!(event, path = %path.display(), "selected hook script");
            scripts.push(path);
        }

        scripts.sort();
        Ok(scripts)
    }
}

impl ToggleNotifier for HookRunner {
    fn task_toggled(&self, task_id: &str) {
        self.fire_on_toggle(task_id);
    }
}

fn run_hook(path: &Path, task_id: &str) -> anyhow::Result<()> {
    info!(hook = %path.display(), task_id, "running hook");
    let output = Command::new(path)
        .arg(task_id)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to run hook {}", path.display()))?;

    if !output.status.success() {
        warn!(
            hook = %path.display(),
            status = ?output.status.code(),
            "hook exited nonzero"
        );
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        warn!(hook = %path.display(), stderr = %stderr, "hook wrote stderr");
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> anyhow::Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> anyhow::Result<bool> {
    Ok(path.is_file())
}
