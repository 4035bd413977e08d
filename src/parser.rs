use csv::{Reader, StringRecord};
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::repository::RosterEntry;
use crate::schedule::slot_utils::parse_time_to_minutes;
use crate::schedule::types::{AppointmentRecord, AppointmentStatus, StaffMember};

pub const STAFF_HEADERS: [&str; 4] = ["id", "name", "specialty", "active"];
pub const APPOINTMENT_HEADERS: [&str; 6] = ["id", "staff_id", "date", "time", "service_duration", "status"];

/// Parses a boolean value from various string representations; empty means true
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower.is_empty() || lower == "yes" || lower == "true" || lower == "1"
}

fn column(headers: &StringRecord, name: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or(LoadError::MissingColumn(name))
}

fn optional_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn field<'r>(record: &'r StringRecord, col: Option<usize>) -> &'r str {
    col.and_then(|c| record.get(c)).unwrap_or("").trim()
}

/// Reads a staff roster (`id,name,specialty,active`) from any reader
pub fn read_staff<R: Read>(input: R) -> Result<Vec<RosterEntry>, LoadError> {
    let mut reader = Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    let id_col = column(&headers, "id")?;
    let name_col = column(&headers, "name")?;
    let specialty_col = optional_column(&headers, "specialty");
    let active_col = optional_column(&headers, "active");

    let mut roster = Vec::new();
    for result in reader.records() {
        let record = result?;
        let id = field(&record, Some(id_col));
        let name = field(&record, Some(name_col));

        // Skip if essential fields are missing
        if id.is_empty() || name.is_empty() {
            debug!(line = record.position().map(|p| p.line()), "Skipping roster row without id or name");
            continue;
        }

        let specialty = field(&record, specialty_col);
        roster.push(RosterEntry {
            staff: StaffMember {
                id: id.to_string(),
                name: name.to_string(),
                specialty: (!specialty.is_empty()).then(|| specialty.to_string()),
            },
            active: parse_bool(field(&record, active_col)),
        });
    }

    Ok(roster)
}

/// Reads appointments (`id,staff_id,date,time,service_duration,status`) from any reader
pub fn read_appointments<R: Read>(input: R) -> Result<Vec<AppointmentRecord>, LoadError> {
    let mut reader = Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    let id_col = optional_column(&headers, "id");
    let staff_col = column(&headers, "staff_id")?;
    let date_col = column(&headers, "date")?;
    let time_col = column(&headers, "time")?;
    let duration_col = optional_column(&headers, "service_duration");
    let status_col = optional_column(&headers, "status");

    let mut appointments = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(index as u64 + 2);

        let staff_id = field(&record, Some(staff_col));
        if staff_id.is_empty() {
            debug!(line, "Skipping appointment without staff");
            continue;
        }

        let date_str = field(&record, Some(date_col));
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| LoadError::Record {
            line,
            message: format!("invalid date '{}'", date_str),
        })?;

        let time = field(&record, Some(time_col));
        let Some(minutes) = parse_time_to_minutes(time) else {
            return Err(LoadError::Record {
                line,
                message: format!("invalid time '{}'", time),
            });
        };

        let duration_str = field(&record, duration_col);
        let service_duration = if duration_str.is_empty() {
            None
        } else {
            Some(duration_str.parse::<u32>().map_err(|_| LoadError::Record {
                line,
                message: format!("invalid service duration '{}'", duration_str),
            })?)
        };

        let status_str = field(&record, status_col);
        let status = if status_str.is_empty() {
            AppointmentStatus::Confirmed
        } else {
            match AppointmentStatus::parse(status_str) {
                Some(status) => status,
                None => {
                    warn!(line, status = status_str, "Unknown appointment status, treating as pending");
                    AppointmentStatus::Pending
                }
            }
        };

        let id = field(&record, id_col);
        appointments.push(AppointmentRecord {
            id: if id.is_empty() { format!("row-{}", line) } else { id.to_string() },
            staff_id: staff_id.to_string(),
            date,
            time: crate::schedule::minutes_to_time(minutes),
            service_duration,
            status,
        });
    }

    Ok(appointments)
}

/// Loads a staff roster from a CSV file
pub fn load_staff<P: AsRef<Path>>(csv_path: P) -> Result<Vec<RosterEntry>, LoadError> {
    let file = std::fs::File::open(csv_path)?;
    read_staff(file)
}

/// Loads appointments from a CSV file
pub fn load_appointments<P: AsRef<Path>>(csv_path: P) -> Result<Vec<AppointmentRecord>, LoadError> {
    let file = std::fs::File::open(csv_path)?;
    read_appointments(file)
}
