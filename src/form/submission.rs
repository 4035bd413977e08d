use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::schedule::slot_utils::parse_time_to_minutes;
use crate::schedule::types::{SchedulingRequest, Strategy};

pub const MAX_PARTY_SIZE: usize = 20;
pub const MIN_SERVICE_DURATION: u32 = 5;
pub const MAX_SERVICE_DURATION: u32 = 8 * 60;

/// Group booking request from the frontend or CLI
#[derive(Debug, Clone, Deserialize)]
pub struct GroupBookingSubmission {
    pub date: NaiveDate,
    pub start_time: String,
    pub party_size: usize,
    pub service_duration: u32,
    #[serde(default)]
    pub preferred_strategy: Option<Strategy>,
}

/// Checks a service length in minutes against the bookable range
pub fn validate_service_duration(minutes: u32) -> Result<(), ValidationError> {
    if (MIN_SERVICE_DURATION..=MAX_SERVICE_DURATION).contains(&minutes) {
        Ok(())
    } else {
        Err(ValidationError::ServiceDuration {
            got: minutes,
            min: MIN_SERVICE_DURATION,
            max: MAX_SERVICE_DURATION,
        })
    }
}

/// Validates a group booking submission
pub fn validate_submission(req: &GroupBookingSubmission) -> Result<(), ValidationError> {
    if req.party_size == 0 || req.party_size > MAX_PARTY_SIZE {
        return Err(ValidationError::PartySize {
            got: req.party_size,
            max: MAX_PARTY_SIZE,
        });
    }

    validate_service_duration(req.service_duration)?;

    if parse_time_to_minutes(&req.start_time).is_none() {
        return Err(ValidationError::StartTime(req.start_time.clone()));
    }

    Ok(())
}

impl GroupBookingSubmission {
    /// Validates and converts into a scheduling request with a normalized start time
    pub fn into_request(self) -> Result<SchedulingRequest, ValidationError> {
        validate_submission(&self)?;
        let minutes = parse_time_to_minutes(&self.start_time)
            .ok_or_else(|| ValidationError::StartTime(self.start_time.clone()))?;

        Ok(SchedulingRequest {
            date: self.date,
            start_time: crate::schedule::minutes_to_time(minutes),
            party_size: self.party_size,
            service_duration: self.service_duration,
            preferred_strategy: self.preferred_strategy,
        })
    }
}
