//! Backfill for records written before remaining credits and the recurring lesson slot were
//! tracked.
//!
//! Records are read field by field from the raw JSON, so a value of an unexpected type only costs
//! that one field its stored value. Credits are filled in when absent. The recurring weekday and
//! time are treated as a pair: if either is missing, both are derived again from the lesson date
//! and time.
//!
//! Records without `remaining_credits` are assumed to have had their first lesson taken at
//! registration, same as new ones. Nothing in the old files confirms that, it's a best guess.

use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    model::{
        register_request::DEFAULT_INSTRUCTOR,
        student_record::{Amount, StudentRecord},
    },
    rules::{self, FeePackage},
};

const DEFAULT_FEE_PACKAGE: &str = "8-lesson";
const DEFAULT_LESSON_DATE: &str = "01/01/2024";
const DEFAULT_LESSON_TIME: &str = "13:50";

// Stored key first, then the English name some clients send
const ID: &[&str] = &["id"];
const FULL_NAME: &[&str] = &["ad_soyad", "full_name"];
const GUARDIAN_PHONE: &[&str] = &["veli_telefon", "guardian_phone"];
const CLASS_LABEL: &[&str] = &["sinif", "class_label"];
const MOUNT_INFO: &[&str] = &["at_bilgisi", "mount_info"];
const FEE_PACKAGE_TYPE: &[&str] = &["ucret_turu", "fee_package_type"];
const AMOUNT_PAID: &[&str] = &["odenen_tutar", "amount_paid"];
const INSTRUCTOR: &[&str] = &["ogretmen", "instructor"];
const REGISTERED_AT: &[&str] = &["kayit_zamani", "registered_at"];
const LESSON_DATE: &[&str] = &["tarih", "lesson_date"];
const LESSON_TIME: &[&str] = &["saat", "lesson_time"];
const REMAINING_CREDITS: &[&str] = &["remaining_credits"];
const RECURRING_WEEKDAY: &[&str] = &["recurring_day_of_week", "recurring_weekday"];
const RECURRING_TIME: &[&str] = &["recurring_time"];

/// One element of the stored array, before migration
pub(super) struct StoredRecord(Map<String, Value>);

fn backfill_credits(fee_package_type: &str) -> u32 {
    match FeePackage::from_label(fee_package_type) {
        Some(_) => rules::credits_after_first_lesson(fee_package_type),
        None => rules::initial_credits(fee_package_type),
    }
}

fn recurring_slot(lesson_date: Option<&str>, lesson_time: Option<&str>) -> (u8, String) {
    let date = lesson_date.unwrap_or(DEFAULT_LESSON_DATE);
    let weekday = rules::parse_lesson_date(date).map_or(0, rules::recurring_weekday);
    (weekday, lesson_time.unwrap_or(DEFAULT_LESSON_TIME).to_string())
}

impl StoredRecord {
    pub(super) fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                warn!("Stored record is not an object, using defaults for all of it: {other}");
                Self(Map::new())
            }
        }
    }

    /// The first of `keys` holding a non-null value
    fn get(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !value.is_null())
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        match self.get(keys)? {
            Value::String(s) => Some(s.clone()),
            value @ (Value::Number(_) | Value::Bool(_)) => Some(value.to_string()),
            _ => None,
        }
    }

    fn count(&self, keys: &[&str]) -> Option<u32> {
        match self.get(keys)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn weekday(&self, keys: &[&str]) -> Option<u8> {
        self.count(keys)
            .and_then(|day| u8::try_from(day).ok())
            .filter(|&day| day <= 6)
    }

    pub(super) fn migrate(self) -> StudentRecord {
        let fee_package_type = self.text(FEE_PACKAGE_TYPE);
        let remaining_credits = self.count(REMAINING_CREDITS).unwrap_or_else(|| {
            backfill_credits(fee_package_type.as_deref().unwrap_or(DEFAULT_FEE_PACKAGE))
        });

        let lesson_date = self.text(LESSON_DATE);
        let lesson_time = self.text(LESSON_TIME);
        let (recurring_weekday, recurring_time) =
            match (self.weekday(RECURRING_WEEKDAY), self.text(RECURRING_TIME)) {
                (Some(day), Some(time)) => (day, time),
                _ => recurring_slot(lesson_date.as_deref(), lesson_time.as_deref()),
            };

        StudentRecord {
            id: self.text(ID),
            full_name: self.text(FULL_NAME).unwrap_or_default(),
            guardian_phone: self.text(GUARDIAN_PHONE).unwrap_or_default(),
            class_label: self.text(CLASS_LABEL).unwrap_or_default(),
            mount_info: self.text(MOUNT_INFO).unwrap_or_default(),
            fee_package_type: fee_package_type.unwrap_or_default(),
            amount_paid: self
                .get(AMOUNT_PAID)
                .cloned()
                .map(Amount::from)
                .unwrap_or_default(),
            instructor: self
                .text(INSTRUCTOR)
                .unwrap_or_else(|| DEFAULT_INSTRUCTOR.to_string()),
            registered_at: self.text(REGISTERED_AT).unwrap_or_default(),
            lesson_date: lesson_date.unwrap_or_default(),
            lesson_time: lesson_time.unwrap_or_default(),
            remaining_credits,
            recurring_weekday,
            recurring_time,
        }
    }
}
