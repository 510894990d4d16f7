use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::crm_date_serde;

/// A scheduled CRM task. The calendar engine only ever reads these;
/// completion is flipped by the datastore, never in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(rename = "dueDate", with = "crm_date_serde")]
    pub due: DateTime<Utc>,

    #[serde(rename = "isCompleted", default)]
    pub completed: bool,

    #[serde(default)]
    pub company_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub id: String,
    pub name: String,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, due: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            due,
            completed: false,
            company_id: None,
        }
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }
}
