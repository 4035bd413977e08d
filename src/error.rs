use chrono::NaiveDate;
use thiserror::Error;

/// Failures reported by a schedule data source
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("schedule for {date} changed (expected version {expected}, found {found})")]
    VersionConflict {
        date: NaiveDate,
        expected: u64,
        found: u64,
    },
    #[error("staff {staff_id} is already booked at {time} on {date}")]
    SlotTaken {
        staff_id: String,
        date: NaiveDate,
        time: String,
    },
    #[error("unknown staff member: {0}")]
    UnknownStaff(String),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("could not determine availability: {0}")]
    Repository(#[source] RepositoryError),
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("no staff available on {date} at {time}")]
    NoStaffAvailable { date: NaiveDate, time: String },
    #[error("booking conflict: {0}")]
    Conflict(#[source] RepositoryError),
}

impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::VersionConflict { .. } | RepositoryError::SlotTaken { .. } => {
                SchedulingError::Conflict(err)
            }
            other => SchedulingError::Repository(other),
        }
    }
}

/// Rejected scheduling input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("party size must be between 1 and {max}, got {got}")]
    PartySize { got: usize, max: usize },
    #[error("service duration must be between {min} and {max} minutes, got {got}")]
    ServiceDuration { got: u32, min: u32, max: u32 },
    #[error("invalid start time '{0}', expected HH:MM")]
    StartTime(String),
}

/// Errors while reading roster or appointment CSV files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: {message}")]
    Record { line: u64, message: String },
}
