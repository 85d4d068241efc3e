use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata format requested from every OAI-PMH provider unless a job says otherwise.
pub const DEFAULT_METADATA_PREFIX: &str = "oai_dc";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(InstitutionId);
id_newtype!(JobId);

/// A content provider whose metadata can be harvested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: InstitutionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub web_contact: Option<String>,
}

/// Institution fields without an identifier; used for creation and as a form buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstitution {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub web_contact: Option<String>,
}

impl Institution {
    pub fn fields(&self) -> NewInstitution {
        NewInstitution {
            name: self.name.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            website: self.website.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            web_contact: self.web_contact.clone(),
        }
    }
}

impl NewInstitution {
    pub fn with_id(self, id: InstitutionId) -> Institution {
        Institution {
            id,
            name: self.name,
            description: self.description,
            location: self.location,
            website: self.website,
            email: self.email,
            phone: self.phone,
            web_contact: self.web_contact,
        }
    }
}

/// A scheduled OAI-PMH harvest belonging to one institution.
///
/// An empty `sets` list means the whole repository is harvested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "institutionID")]
    pub institution_id: InstitutionId,
    #[serde(rename = "repositoryBaseURL")]
    pub repository_base_url: String,
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(rename = "metadataPrefix", default = "default_metadata_prefix")]
    pub metadata_prefix: String,
    #[serde(rename = "scheduleCronExpression")]
    pub schedule_cron_expression: String,
    #[serde(rename = "lastSuccessfulRun", default)]
    pub last_successful_run: Option<DateTime<Utc>>,
}

/// Job fields a user may set. `last_successful_run` is owned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    #[serde(rename = "institutionID")]
    pub institution_id: InstitutionId,
    #[serde(rename = "repositoryBaseURL")]
    pub repository_base_url: String,
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(rename = "metadataPrefix", default = "default_metadata_prefix")]
    pub metadata_prefix: String,
    #[serde(rename = "scheduleCronExpression")]
    pub schedule_cron_expression: String,
}

fn default_metadata_prefix() -> String {
    DEFAULT_METADATA_PREFIX.to_string()
}

impl Job {
    pub fn fields(&self) -> NewJob {
        NewJob {
            institution_id: self.institution_id,
            repository_base_url: self.repository_base_url.clone(),
            sets: self.sets.clone(),
            metadata_prefix: self.metadata_prefix.clone(),
            schedule_cron_expression: self.schedule_cron_expression.clone(),
        }
    }

    pub fn harvests_entire_repository(&self) -> bool {
        self.sets.is_empty()
    }
}

impl NewJob {
    /// Blank job form for `institution_id`, pre-set to the default metadata prefix.
    pub fn for_institution(institution_id: InstitutionId) -> Self {
        Self {
            institution_id,
            repository_base_url: String::new(),
            sets: Vec::new(),
            metadata_prefix: default_metadata_prefix(),
            schedule_cron_expression: String::new(),
        }
    }

    pub fn with_id(self, id: JobId, last_successful_run: Option<DateTime<Utc>>) -> Job {
        Job {
            id,
            institution_id: self.institution_id,
            repository_base_url: self.repository_base_url,
            sets: self.sets,
            metadata_prefix: self.metadata_prefix,
            schedule_cron_expression: self.schedule_cron_expression,
            last_successful_run,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Institution,
    Job,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Institution => f.write_str("institution"),
            Self::Job => f.write_str("job"),
        }
    }
}

/// Identity of a single record. Jobs are always addressed through their institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordRef {
    Institution {
        id: InstitutionId,
    },
    Job {
        #[serde(rename = "institutionID")]
        institution_id: InstitutionId,
        id: JobId,
    },
}

impl RecordRef {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Institution { .. } => RecordKind::Institution,
            Self::Job { .. } => RecordKind::Job,
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Institution { id } => write!(f, "institution {id}"),
            Self::Job { institution_id, id } => {
                write!(f, "job {id} of institution {institution_id}")
            }
        }
    }
}
