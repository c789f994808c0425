pub mod cashier_total;
pub mod register_request;
pub mod student_detail;
pub mod student_record;
