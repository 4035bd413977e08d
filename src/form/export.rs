use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

use crate::error::LoadError;
use crate::parser::APPOINTMENT_HEADERS;
use crate::schedule::booking::GroupBooking;

/// Appends a committed group booking to an appointments CSV
///
/// Rows use the same layout `parser::load_appointments` reads, so the file can
/// be fed back in as the next day's appointment list. The header is written
/// only when the file is new or empty.
pub fn export_booking_to_csv(booking: &GroupBooking, csv_path: &Path) -> Result<usize, LoadError> {
    let needs_header = std::fs::metadata(csv_path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        wtr.write_record(APPOINTMENT_HEADERS)?;
    }

    let date = booking.receipt.date.format("%Y-%m-%d").to_string();
    let mut written = 0;
    for (id, assignment) in booking
        .receipt
        .appointment_ids
        .iter()
        .zip(&booking.recommendation.assignments)
    {
        let Some(staff_id) = assignment.staff_id.as_deref() else {
            continue;
        };
        let duration = assignment.duration.to_string();
        wtr.write_record([
            id.as_str(),
            staff_id,
            date.as_str(),
            assignment.start_time.as_str(),
            duration.as_str(),
            "confirmed",
        ])?;
        written += 1;
    }

    wtr.flush()?;
    Ok(written)
}
