use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    error::ApiError,
    model::student_record::{Amount, StudentRecord, new_record_id},
    rules,
};

pub const DEFAULT_INSTRUCTOR: &str = "unspecified";

/// Body of `POST /api/students/register`, under the stored key names. English field names are
/// accepted as well.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    #[serde(rename = "ad_soyad", alias = "full_name")]
    pub full_name: Option<String>,
    #[serde(rename = "veli_telefon", alias = "guardian_phone")]
    pub guardian_phone: Option<String>,
    #[serde(rename = "sinif", alias = "class_label")]
    pub class_label: Option<String>,
    #[serde(rename = "at_bilgisi", alias = "mount_info")]
    pub mount_info: Option<String>,
    #[serde(rename = "ucret_turu", alias = "fee_package_type")]
    pub fee_package_type: Option<String>,
    #[serde(rename = "odenen_tutar", alias = "amount_paid")]
    pub amount_paid: Option<Amount>,
    #[serde(rename = "ogretmen", alias = "instructor")]
    pub instructor: Option<String>,
    #[serde(rename = "kayit_zamani", alias = "registered_at")]
    pub registered_at: Option<String>,
    #[serde(rename = "tarih", alias = "lesson_date")]
    pub lesson_date: Option<String>,
    #[serde(rename = "saat", alias = "lesson_time")]
    pub lesson_time: Option<String>,
    #[serde(rename = "recurring_day_of_week", alias = "recurring_weekday")]
    pub recurring_weekday: Option<u8>,
    pub recurring_time: Option<String>,
}

fn required<T>(field: Option<T>, name: &'static str) -> Result<T, ApiError> {
    field.ok_or(ApiError::MissingField(name))
}

impl RegisterRequest {
    /// Validates the request and builds the record, with the first lesson already taken off the
    /// package.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<StudentRecord, ApiError> {
        let full_name = required(self.full_name, "ad_soyad")?;
        let guardian_phone = required(self.guardian_phone, "veli_telefon")?;
        let amount_paid = required(self.amount_paid, "odenen_tutar")?;
        let lesson_date = required(self.lesson_date, "tarih")?;
        let lesson_time = required(self.lesson_time, "saat")?;
        let fee_package_type = required(self.fee_package_type, "ucret_turu")?;

        let amount_paid = amount_paid.value().ok_or(ApiError::InvalidAmount)?;
        if amount_paid < 0.0 {
            return Err(ApiError::NegativeAmount);
        }

        let date = rules::parse_lesson_date(&lesson_date).ok_or(ApiError::InvalidDate)?;
        let recurring_weekday = match self.recurring_weekday {
            Some(day) if day > 6 => return Err(ApiError::InvalidWeekday),
            Some(day) => day,
            None => rules::recurring_weekday(date),
        };

        Ok(StudentRecord {
            id: Some(new_record_id()),
            remaining_credits: rules::credits_after_first_lesson(&fee_package_type),
            recurring_time: self.recurring_time.unwrap_or_else(|| lesson_time.clone()),
            recurring_weekday,
            full_name,
            guardian_phone,
            class_label: self.class_label.unwrap_or_default(),
            mount_info: self.mount_info.unwrap_or_default(),
            fee_package_type,
            amount_paid: Amount::Number(amount_paid),
            instructor: self
                .instructor
                .unwrap_or_else(|| DEFAULT_INSTRUCTOR.to_string()),
            registered_at: self.registered_at.unwrap_or_else(|| now.to_rfc3339()),
            lesson_date,
            lesson_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(body: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid() -> serde_json::Value {
        json!({
            "full_name": "Ali Veli",
            "guardian_phone": "555",
            "amount_paid": "100,50",
            "lesson_date": "13/01/2025",
            "lesson_time": "14:00",
            "fee_package_type": "8-lesson",
        })
    }

    #[test]
    fn builds_record_with_first_lesson_taken() {
        let record = request(valid()).into_record(Utc::now()).unwrap();
        assert_eq!(record.remaining_credits, 7);
        assert_eq!(record.recurring_weekday, 1);
        assert_eq!(record.recurring_time, "14:00");
        assert_eq!(record.amount_paid, Amount::Number(100.5));
        assert_eq!(record.instructor, DEFAULT_INSTRUCTOR);
        assert_eq!(record.class_label, "");
        assert!(record.id.is_some());
        assert!(!record.registered_at.is_empty());
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let err = request(json!({ "amount_paid": 10 })).into_record(Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("ad_soyad")));

        let mut body = valid();
        body.as_object_mut().unwrap().remove("lesson_time");
        body.as_object_mut().unwrap().remove("fee_package_type");
        let err = request(body).into_record(Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("saat")));
    }

    #[test]
    fn amount_is_checked_before_date() {
        let mut body = valid();
        body["amount_paid"] = json!("ten");
        body["lesson_date"] = json!("2025-01-13");
        let err = request(body).into_record(Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidAmount));

        let mut body = valid();
        body["amount_paid"] = json!(-5);
        let err = request(body).into_record(Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::NegativeAmount));

        let mut body = valid();
        body["lesson_date"] = json!("2025-01-13");
        let err = request(body).into_record(Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate));
    }

    #[test]
    fn client_may_supply_optional_fields() {
        let mut body = valid();
        body["instructor"] = json!("Ayse");
        body["registered_at"] = json!("2025-01-10T09:00:00");
        body["recurring_weekday"] = json!(3);
        body["recurring_time"] = json!("15:30");
        body["fee_package_type"] = json!("monthly");
        let record = request(body).into_record(Utc::now()).unwrap();
        assert_eq!(record.instructor, "Ayse");
        assert_eq!(record.registered_at, "2025-01-10T09:00:00");
        assert_eq!(record.recurring_weekday, 3);
        assert_eq!(record.recurring_time, "15:30");
        assert_eq!(record.remaining_credits, 0);

        let mut body = valid();
        body["recurring_weekday"] = json!(7);
        let err = request(body).into_record(Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidWeekday));
    }

    #[test]
    fn stored_key_names_are_accepted() {
        let body = json!({
            "ad_soyad": "Ali Veli",
            "veli_telefon": "555",
            "odenen_tutar": 250,
            "tarih": "18/01/2025",
            "saat": "10:00",
            "ucret_turu": "24 Ders",
        });
        let record = request(body).into_record(Utc::now()).unwrap();
        assert_eq!(record.remaining_credits, 23);
        assert_eq!(record.recurring_weekday, 6);
        assert_eq!(record.fee_package_type, "24 Ders");
    }
}
