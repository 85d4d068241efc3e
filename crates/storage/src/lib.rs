use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};

use shared::{
    domain::{Institution, InstitutionId, Job, JobId, NewInstitution, NewJob, RecordRef},
    error::ApiException,
    protocol::{CatalogSnapshot, Intent, NewRecord, Record},
};

const INSTITUTION_COLUMNS: &str =
    "id, name, description, location, website, email, phone, web_contact";
const JOB_COLUMNS: &str = "id, institution_id, repository_base_url, metadata_prefix, sets, \
     schedule_cron_expression, last_successful_run";

/// Outcome of applying one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedIntent {
    Created(RecordRef),
    Updated(RecordRef),
    /// `cascaded_jobs` counts jobs removed together with an institution.
    Deleted {
        target: RecordRef,
        cascaded_jobs: u64,
    },
}

/// Persistent home of harvest configurations.
#[async_trait]
pub trait HarvestScheduleStore: Send + Sync {
    async fn get_institution(&self, id: InstitutionId) -> Result<Option<Institution>>;
    async fn list_institutions(&self) -> Result<Vec<Institution>>;
    async fn add_institution(&self, institution: &NewInstitution) -> Result<InstitutionId>;
    async fn update_institution(&self, institution: &Institution) -> Result<()>;
    /// Removes the institution and its jobs, returning how many jobs went with it.
    async fn remove_institution(&self, id: InstitutionId) -> Result<u64>;

    async fn get_job(&self, id: JobId) -> Result<Option<Job>>;
    async fn list_jobs(&self) -> Result<Vec<Job>>;
    async fn add_job(&self, job: &NewJob) -> Result<JobId>;
    async fn update_job(&self, job: &Job) -> Result<()>;
    /// Removes a job only if it belongs to `institution_id`.
    async fn remove_job(&self, institution_id: InstitutionId, id: JobId) -> Result<()>;

    async fn snapshot(&self) -> Result<CatalogSnapshot> {
        let institutions = self.list_institutions().await?;
        let jobs = self.list_jobs().await?;
        Ok(CatalogSnapshot::from_records(institutions, jobs))
    }

    async fn apply_intent(&self, intent: &Intent) -> Result<AppliedIntent> {
        let applied = match intent {
            Intent::Create {
                record: NewRecord::Institution(fields),
            } => {
                let id = self.add_institution(fields).await?;
                AppliedIntent::Created(RecordRef::Institution { id })
            }
            Intent::Create {
                record: NewRecord::Job(fields),
            } => {
                let id = self.add_job(fields).await?;
                AppliedIntent::Created(RecordRef::Job {
                    institution_id: fields.institution_id,
                    id,
                })
            }
            Intent::Update { record } => {
                match record {
                    Record::Institution(institution) => self.update_institution(institution).await?,
                    Record::Job(job) => self.update_job(job).await?,
                }
                AppliedIntent::Updated(record.record_ref())
            }
            Intent::Delete { target } => {
                let cascaded_jobs = match *target {
                    RecordRef::Institution { id } => self.remove_institution(id).await?,
                    RecordRef::Job { institution_id, id } => {
                        self.remove_job(institution_id, id).await?;
                        0
                    }
                };
                AppliedIntent::Deleted {
                    target: *target,
                    cascaded_jobs,
                }
            }
        };
        info!(?applied, "intent applied");
        Ok(applied)
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(database_url, "harvest schedule store opened");
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts several institutions in one transaction; either all are added or none.
    pub async fn add_institutions(
        &self,
        institutions: &[NewInstitution],
    ) -> Result<Vec<InstitutionId>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(institutions.len());
        for institution in institutions {
            let rec = sqlx::query(
                "INSERT INTO institutions
                    (name, description, location, website, email, phone, web_contact)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING id",
            )
            .bind(&institution.name)
            .bind(&institution.description)
            .bind(&institution.location)
            .bind(&institution.website)
            .bind(&institution.email)
            .bind(&institution.phone)
            .bind(&institution.web_contact)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("failed to add institution '{}'", institution.name))?;
            ids.push(InstitutionId(rec.get::<i64, _>(0)));
        }
        tx.commit().await?;
        Ok(ids)
    }

    /// Written by the scheduler after a harvest completes; never by the admin UI.
    pub async fn record_successful_run(&self, id: JobId, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE harvest_jobs SET last_successful_run = ? WHERE id = ?")
            .bind(at)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to record successful run for job {id}"))?;
        if result.rows_affected() == 0 {
            return Err(ApiException::not_found(format!("job {id} not found")).into());
        }
        Ok(())
    }
}

#[async_trait]
impl HarvestScheduleStore for Storage {
    async fn get_institution(&self, id: InstitutionId) -> Result<Option<Institution>> {
        let row = sqlx::query(&format!(
            "SELECT {INSTITUTION_COLUMNS} FROM institutions WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(institution_from_row).transpose()
    }

    async fn list_institutions(&self) -> Result<Vec<Institution>> {
        let rows = sqlx::query(&format!(
            "SELECT {INSTITUTION_COLUMNS} FROM institutions ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list institutions")?;
        rows.iter().map(institution_from_row).collect()
    }

    async fn add_institution(&self, institution: &NewInstitution) -> Result<InstitutionId> {
        let ids = self.add_institutions(std::slice::from_ref(institution)).await?;
        ids.into_iter()
            .next()
            .context("institution insert returned no id")
    }

    async fn update_institution(&self, institution: &Institution) -> Result<()> {
        let result = sqlx::query(
            "UPDATE institutions
             SET name = ?, description = ?, location = ?, website = ?, email = ?, phone = ?,
                 web_contact = ?
             WHERE id = ?",
        )
        .bind(&institution.name)
        .bind(&institution.description)
        .bind(&institution.location)
        .bind(&institution.website)
        .bind(&institution.email)
        .bind(&institution.phone)
        .bind(&institution.web_contact)
        .bind(institution.id.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update institution {}", institution.id))?;
        if result.rows_affected() == 0 {
            return Err(
                ApiException::not_found(format!("institution {} not found", institution.id)).into(),
            );
        }
        Ok(())
    }

    async fn remove_institution(&self, id: InstitutionId) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let jobs = sqlx::query("DELETE FROM harvest_jobs WHERE institution_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to remove jobs of institution {id}"))?
            .rows_affected();
        let removed = sqlx::query("DELETE FROM institutions WHERE id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to remove institution {id}"))?
            .rows_affected();
        if removed == 0 {
            return Err(ApiException::not_found(format!("institution {id} not found")).into());
        }
        tx.commit().await?;
        Ok(jobs)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM harvest_jobs WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(job_from_row).transpose()
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM harvest_jobs ORDER BY institution_id, id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list harvest jobs")?;
        rows.iter().map(job_from_row).collect()
    }

    async fn add_job(&self, job: &NewJob) -> Result<JobId> {
        if self.get_institution(job.institution_id).await?.is_none() {
            return Err(ApiException::not_found(format!(
                "institution {} not found",
                job.institution_id
            ))
            .into());
        }
        let rec = sqlx::query(
            "INSERT INTO harvest_jobs
                (institution_id, repository_base_url, metadata_prefix, sets,
                 schedule_cron_expression)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(job.institution_id.0)
        .bind(&job.repository_base_url)
        .bind(&job.metadata_prefix)
        .bind(serde_json::to_string(&job.sets)?)
        .bind(&job.schedule_cron_expression)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to add job for institution {}", job.institution_id))?;
        Ok(JobId(rec.get::<i64, _>(0)))
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let result = sqlx::query(
            "UPDATE harvest_jobs
             SET repository_base_url = ?, metadata_prefix = ?, sets = ?,
                 schedule_cron_expression = ?
             WHERE id = ? AND institution_id = ?",
        )
        .bind(&job.repository_base_url)
        .bind(&job.metadata_prefix)
        .bind(serde_json::to_string(&job.sets)?)
        .bind(&job.schedule_cron_expression)
        .bind(job.id.0)
        .bind(job.institution_id.0)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update job {}", job.id))?;
        if result.rows_affected() == 0 {
            return Err(ApiException::not_found(format!(
                "job {} of institution {} not found",
                job.id, job.institution_id
            ))
            .into());
        }
        Ok(())
    }

    async fn remove_job(&self, institution_id: InstitutionId, id: JobId) -> Result<()> {
        let result = sqlx::query("DELETE FROM harvest_jobs WHERE id = ? AND institution_id = ?")
            .bind(id.0)
            .bind(institution_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove job {id}"))?;
        if result.rows_affected() == 0 {
            return Err(ApiException::not_found(format!(
                "job {id} of institution {institution_id} not found"
            ))
            .into());
        }
        Ok(())
    }
}

fn institution_from_row(row: &SqliteRow) -> Result<Institution> {
    Ok(Institution {
        id: InstitutionId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        website: row.try_get("website")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        web_contact: row.try_get("web_contact")?,
    })
}

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    let id = JobId(row.try_get("id")?);
    let sets: String = row.try_get("sets")?;
    Ok(Job {
        id,
        institution_id: InstitutionId(row.try_get("institution_id")?),
        repository_base_url: row.try_get("repository_base_url")?,
        sets: serde_json::from_str(&sets)
            .with_context(|| format!("job {id} has malformed sets column"))?,
        metadata_prefix: row.try_get("metadata_prefix")?,
        schedule_cron_expression: row.try_get("schedule_cron_expression")?,
        last_successful_run: row.try_get("last_successful_run")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
