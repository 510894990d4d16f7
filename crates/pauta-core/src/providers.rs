use std::collections::HashMap;

use crate::task::{Company, Task};

/// Display name used when a task's company is missing from the
/// directory. Lookup misses are never an error.
pub const UNKNOWN_COMPANY_LABEL: &str = "Empresa desconhecida";

/// Read-only task snapshot, re-read by the engine on every recompute.
pub trait TaskSource {
    fn snapshot(&self) -> Vec<Task>;
}

pub trait CompanyDirectory {
    fn company_name(&self, company_id: &str) -> Option<String>;
}

/// Fire-and-forget notification that a task was toggled. No return
/// value; implementations swallow their own failures.
pub trait ToggleNotifier {
    fn task_toggled(&self, task_id: &str);
}

/// A fixed task collection standing in for the external data provider.
#[derive(Debug, Default, Clone)]
pub struct TaskSnapshot(pub Vec<Task>);

impl TaskSource for TaskSnapshot {
    fn snapshot(&self) -> Vec<Task> {
        self.0.clone()
    }
}

#[derive(Debug, Default, Clone)]
pub struct CompanyIndex {
    by_id: HashMap<String, String>,
}

impl CompanyIndex {
    pub fn new(companies: &[Company]) -> Self {
        let by_id = companies
            .iter()
            .map(|company| (company.id.clone(), company.name.clone()))
            .collect();
        Self { by_id }
    }
}

impl CompanyDirectory for CompanyIndex {
    fn company_name(&self, company_id: &str) -> Option<String> {
        self.by_id.get(company_id).cloned()
    }
}

#[derive(Debug, Default, Clone)]
pub struct NullNotifier;

impl ToggleNotifier for NullNotifier {
    fn task_toggled(&self, _task_id: &str) {}
}

pub fn company_label<D: CompanyDirectory>(directory: &D, company_id: Option<&str>) -> String {
    company_id
        .and_then(|id| directory.company_name(id))
        .unwrap_or_else(|| UNKNOWN_COMPANY_LABEL.to_string())
}
