//! Stateless view models for the institution list and its job rows.
//!
//! Every button carries the IDs it acts on, so a click never depends on where
//! the button happens to sit in the rendered list.

use std::fmt;

use chrono::SecondsFormat;
use shared::domain::{Institution, InstitutionId, Job, JobId};

use crate::store::CollectionStore;

pub const NO_JOBS_PLACEHOLDER: &str = "No jobs yet!";
pub const ENTIRE_REPOSITORY: &str = "(entire repository)";
pub const NEVER_RUN: &str = "never";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
    AddInstitution,
    EditInstitution(InstitutionId),
    RemoveInstitution(InstitutionId),
    AddJob(InstitutionId),
    EditJob {
        institution_id: InstitutionId,
        job_id: JobId,
    },
    RemoveJob {
        institution_id: InstitutionId,
        job_id: JobId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelButton {
    pub label: &'static str,
    pub action: AdminAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetsDisplay {
    EntireRepository,
    Selected(Vec<String>),
}

impl SetsDisplay {
    pub fn for_job(job: &Job) -> Self {
        if job.harvests_entire_repository() {
            Self::EntireRepository
        } else {
            Self::Selected(job.sets.clone())
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        match self {
            Self::EntireRepository => vec![ENTIRE_REPOSITORY],
            Self::Selected(sets) => sets.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for SetsDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPanel {
    pub institution_id: InstitutionId,
    pub job_id: JobId,
    pub repository_base_url: String,
    pub sets: SetsDisplay,
    pub metadata_prefix: String,
    pub schedule: String,
    pub last_successful_run: String,
    pub buttons: [PanelButton; 2],
}

impl JobPanel {
    pub fn new(job: &Job) -> Self {
        let institution_id = job.institution_id;
        let job_id = job.id;
        Self {
            institution_id,
            job_id,
            repository_base_url: job.repository_base_url.clone(),
            sets: SetsDisplay::for_job(job),
            metadata_prefix: job.metadata_prefix.clone(),
            schedule: job.schedule_cron_expression.clone(),
            last_successful_run: job
                .last_successful_run
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| NEVER_RUN.to_string()),
            buttons: [
                PanelButton {
                    label: "Edit",
                    action: AdminAction::EditJob {
                        institution_id,
                        job_id,
                    },
                },
                PanelButton {
                    label: "Remove",
                    action: AdminAction::RemoveJob {
                        institution_id,
                        job_id,
                    },
                },
            ],
        }
    }
}

impl fmt::Display for JobPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository: {}", self.repository_base_url)?;
        writeln!(f, "Sets: {}", self.sets)?;
        writeln!(f, "Metadata prefix: {}", self.metadata_prefix)?;
        writeln!(f, "Schedule: {}", self.schedule)?;
        write!(f, "Last successful run: {}", self.last_successful_run)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobList {
    Empty,
    Jobs(Vec<JobPanel>),
}

impl JobList {
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Jobs(jobs) => jobs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionRow {
    pub id: InstitutionId,
    pub name: String,
    /// Labelled optional fields that are present on the record.
    pub details: Vec<(&'static str, String)>,
    pub buttons: [PanelButton; 3],
    pub jobs: JobList,
}

impl InstitutionRow {
    pub fn new<'a>(institution: &Institution, jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let id = institution.id;
        let details = [
            ("Description", &institution.description),
            ("Location", &institution.location),
            ("Website", &institution.website),
            ("Email", &institution.email),
            ("Phone", &institution.phone),
            ("Web Contact", &institution.web_contact),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|value| (label, value.clone())))
        .collect();

        let jobs: Vec<JobPanel> = jobs.into_iter().map(JobPanel::new).collect();
        let jobs = if jobs.is_empty() {
            JobList::Empty
        } else {
            JobList::Jobs(jobs)
        };

        Self {
            id,
            name: institution.name.clone(),
            details,
            buttons: [
                PanelButton {
                    label: "Edit",
                    action: AdminAction::EditInstitution(id),
                },
                PanelButton {
                    label: "Remove",
                    action: AdminAction::RemoveInstitution(id),
                },
                PanelButton {
                    label: "Add Job",
                    action: AdminAction::AddJob(id),
                },
            ],
            jobs,
        }
    }
}

impl fmt::Display for InstitutionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (label, value) in &self.details {
            writeln!(f, "{label}: {value}")?;
        }
        match &self.jobs {
            JobList::Empty => write!(f, "{NO_JOBS_PLACEHOLDER}"),
            JobList::Jobs(jobs) => {
                for (idx, job) in jobs.iter().enumerate() {
                    if idx > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{job}")?;
                }
                Ok(())
            }
        }
    }
}

/// Top-level listing: the "Add Institution" button plus one row per institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionPanel {
    pub add_institution: PanelButton,
    pub rows: Vec<InstitutionRow>,
}

impl InstitutionPanel {
    pub fn build(store: &CollectionStore) -> Self {
        Self {
            add_institution: PanelButton {
                label: "Add Institution",
                action: AdminAction::AddInstitution,
            },
            rows: store
                .institutions()
                .values()
                .map(|institution| InstitutionRow::new(institution, store.jobs_for(institution.id)))
                .collect(),
        }
    }

    /// Every button in render order.
    pub fn buttons(&self) -> Vec<PanelButton> {
        let mut buttons = vec![self.add_institution];
        for row in &self.rows {
            buttons.extend(row.buttons);
            if let JobList::Jobs(jobs) = &row.jobs {
                for job in jobs {
                    buttons.extend(job.buttons);
                }
            }
        }
        buttons
    }
}

#[cfg(test)]
#[path = "tests/panels_tests.rs"]
mod tests;
