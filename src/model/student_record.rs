use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rules;

/// One lesson registration, as stored on disk and returned to the client. Keys are the ones the
/// first version of the app wrote, so its data files and mobile client keep working.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    /// Only set on records registered by this service. Positions stay the public identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "ad_soyad")]
    pub full_name: String,
    #[serde(rename = "veli_telefon")]
    pub guardian_phone: String,
    #[serde(rename = "sinif")]
    pub class_label: String,
    #[serde(rename = "at_bilgisi")]
    pub mount_info: String,
    #[serde(rename = "ucret_turu")]
    pub fee_package_type: String,
    #[serde(rename = "odenen_tutar")]
    pub amount_paid: Amount,
    #[serde(rename = "ogretmen")]
    pub instructor: String,
    #[serde(rename = "kayit_zamani")]
    pub registered_at: String,
    #[serde(rename = "tarih")]
    pub lesson_date: String,
    #[serde(rename = "saat")]
    pub lesson_time: String,
    pub remaining_credits: u32,
    #[serde(rename = "recurring_day_of_week")]
    pub recurring_weekday: u8,
    pub recurring_time: String,
}

/// A stored payment. Older files may hold it as text, or as something that isn't a number at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Amount {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.is_finite().then_some(*n),
            Self::Text(s) => rules::parse_amount(s),
            Self::Other(_) => None,
        }
    }
}

impl From<serde_json::Value> for Amount {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Other(n.into()), Self::Number),
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Other(other),
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

pub fn new_record_id() -> String {
    let mut bytes = [0u8; 12];
    rand::fill(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_numbers_and_text() {
        let amounts: Vec<Amount> = serde_json::from_str(r#"[100, 12.5, "7,25", "n/a", null]"#).unwrap();
        let values: Vec<_> = amounts.iter().map(Amount::value).collect();
        assert_eq!(values, vec![Some(100.0), Some(12.5), Some(7.25), None, None]);
    }

    #[test]
    fn amount_serializes_unchanged() {
        assert_eq!(serde_json::to_string(&Amount::Number(100.5)).unwrap(), "100.5");
        assert_eq!(serde_json::to_string(&Amount::Text("n/a".into())).unwrap(), r#""n/a""#);
    }

    #[test]
    fn amount_from_stored_value() {
        assert_eq!(Amount::from(serde_json::json!(90)), Amount::Number(90.0));
        assert_eq!(Amount::from(serde_json::json!("12,5")).value(), Some(12.5));
        assert_eq!(Amount::from(serde_json::json!([1])).value(), None);
    }

    #[test]
    fn record_ids_are_unique_and_url_safe() {
        let a = new_record_id();
        let b = new_record_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
