use std::collections::HashSet;

use shared::domain::{NewInstitution, NewJob};

use crate::error::{FieldIssue, Problem};

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub(crate) fn institution_fields(fields: &NewInstitution, issues: &mut Vec<FieldIssue>) {
    if blank(&fields.name) {
        issues.push(FieldIssue {
            field: "name",
            problem: Problem::Blank,
        });
    }
}

pub(crate) fn job_fields(fields: &NewJob, issues: &mut Vec<FieldIssue>) {
    let required = [
        ("repositoryBaseURL", fields.repository_base_url.as_str()),
        ("metadataPrefix", fields.metadata_prefix.as_str()),
        ("scheduleCronExpression", fields.schedule_cron_expression.as_str()),
    ];
    for (field, value) in required {
        if blank(value) {
            issues.push(FieldIssue {
                field,
                problem: Problem::Blank,
            });
        }
    }

    let mut seen = HashSet::new();
    for set in &fields.sets {
        if blank(set) {
            issues.push(FieldIssue {
                field: "sets",
                problem: Problem::Blank,
            });
        } else if !seen.insert(set.as_str()) {
            issues.push(FieldIssue {
                field: "sets",
                problem: Problem::Duplicate(set.clone()),
            });
        }
    }
}
