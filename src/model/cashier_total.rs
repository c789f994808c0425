use serde::Serialize;

use crate::{model::student_record::StudentRecord, rules};

#[derive(Debug, Serialize)]
pub struct CashierTotal {
    pub message: &'static str,
    pub total_amount: f64,
    pub record_count: usize,
}

impl CashierTotal {
    /// Sums every payment that reads as a number. Unreadable amounts are skipped but still counted
    /// as records.
    pub fn from_records(records: &[StudentRecord]) -> Self {
        let total: f64 = records.iter().filter_map(|r| r.amount_paid.value()).sum();
        Self {
            message: "Total cash collected.",
            total_amount: rules::round_cents(total),
            record_count: records.len(),
        }
    }
}
