use serde::Serialize;

use crate::{model::student_record::StudentRecord, rules};

/// A single record with its recurring lesson day spelled out.
#[derive(Debug, Serialize)]
pub struct StudentDetail<'a> {
    #[serde(flatten)]
    pub record: &'a StudentRecord,
    pub recurring_day: &'static str,
}

impl<'a> From<&'a StudentRecord> for StudentDetail<'a> {
    fn from(record: &'a StudentRecord) -> Self {
        Self {
            record,
            recurring_day: rules::weekday_name(record.recurring_weekday),
        }
    }
}
