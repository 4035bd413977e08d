pub mod submission;
pub mod export;

pub use submission::{GroupBookingSubmission, validate_service_duration, validate_submission};
pub use export::export_booking_to_csv;
