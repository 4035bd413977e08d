use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A member of the salon roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

/// An existing booking as stored by the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: String,
    pub staff_id: String,
    pub date: NaiveDate,
    pub time: String, // HH:MM
    pub service_duration: Option<u32>,
    pub status: AppointmentStatus,
}

/// A new booking to be written by a group commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub staff_id: String,
    pub time: String,
    pub service_duration: u32,
}

/// Time window a staff member is already busy for on a given day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentOccupancy {
    pub staff_id: String,
    pub start: u32,
    pub duration: u32,
}

impl AppointmentOccupancy {
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Parallel,
    Staggered,
    Sequential,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Parallel => "parallel",
            Strategy::Staggered => "staggered",
            Strategy::Sequential => "sequential",
        };
        f.write_str(name)
    }
}

/// A group booking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    pub date: NaiveDate,
    pub start_time: String,
    pub party_size: usize,
    /// Minutes per member
    pub service_duration: u32,
    #[serde(default)]
    pub preferred_strategy: Option<Strategy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAvailability {
    pub staff: StaffMember,
    pub available: bool,
}

/// Where and when a single party member is served
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAssignment {
    pub member_index: usize,
    /// None only when nobody was available to take the member
    pub staff_id: Option<String>,
    pub staff_name: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingRecommendation {
    pub strategy: Strategy,
    pub reason: String,
    pub available_staff: usize,
    pub total_duration: u32,
    pub estimated_end_time: String,
    pub assignments: Vec<MemberAssignment>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityStatus {
    Full,
    Partial,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeSlot {
    pub date: NaiveDate,
    pub time: String,
    pub available_staff: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityCheck {
    pub status: CapacityStatus,
    pub available_staff: usize,
    pub party_size: usize,
    pub alternatives: Vec<AlternativeSlot>,
}

impl CapacityCheck {
    pub fn can_accommodate(&self) -> bool {
        self.status == CapacityStatus::Full
    }
}

/// Result of a successful group commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub date: NaiveDate,
    /// Day version after the commit
    pub version: u64,
    pub appointment_ids: Vec<String>,
}

/// One consistent read of a day's roster and bookings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub version: u64,
    pub staff: Vec<StaffMember>,
    pub occupancy: Vec<AppointmentOccupancy>,
}
