//! Pure lesson-credit and calendar rules shared by registration, the load-time migration and the
//! endpoints.

use chrono::{Datelike, NaiveDate};

/// Date layout used by the mobile client, e.g. `13/01/2025`.
pub const LESSON_DATE_FORMAT: &str = "%d/%m/%Y";

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// The fixed lesson packages a payment can buy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeePackage {
    EightLessons,
    TwentyFourLessons,
    SingleLesson,
}

impl FeePackage {
    /// Recognises both the current labels and the ones written by the first version of the app.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "8-lesson" | "8 Ders" => Some(Self::EightLessons),
            "24-lesson" | "24 Ders" => Some(Self::TwentyFourLessons),
            "single-lesson" | "Tek Ders" => Some(Self::SingleLesson),
            _ => None,
        }
    }

    pub fn credits(self) -> u32 {
        match self {
            Self::EightLessons => 8,
            Self::TwentyFourLessons => 24,
            Self::SingleLesson => 1,
        }
    }
}

/// Credits bought by a fee package. Anything outside the fixed packages buys none.
pub fn initial_credits(fee_package_type: &str) -> u32 {
    FeePackage::from_label(fee_package_type).map_or(0, FeePackage::credits)
}

/// Credits left once the registration lesson has been taken.
pub fn credits_after_first_lesson(fee_package_type: &str) -> u32 {
    initial_credits(fee_package_type).saturating_sub(1)
}

pub fn parse_lesson_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), LESSON_DATE_FORMAT).ok()
}

/// Sunday = 0, Monday = 1, ..., Saturday = 6
pub fn recurring_weekday(date: NaiveDate) -> u8 {
    // chrono counts Monday = 0 ... Sunday = 6
    let native = date.weekday().num_days_from_monday();
    ((native + 1) % 7) as u8
}

pub fn weekday_name(weekday: u8) -> &'static str {
    WEEKDAY_NAMES[(weekday % 7) as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Credit decrease failed. Remaining credit is already {current} lessons.")]
pub struct InsufficientCredit {
    pub current: u32,
}

pub fn decrement_credit(current: u32) -> Result<u32, InsufficientCredit> {
    if current == 0 {
        return Err(InsufficientCredit { current });
    }
    Ok(current - 1)
}

/// Parses a payment amount written with either `.` or `,` as the decimal separator.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let amount = raw.trim().replace(',', ".").parse::<f64>().ok()?;
    amount.is_finite().then_some(amount)
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
