//! Data access for staff rosters and appointments.
//!
//! Scheduling code only sees the [`ScheduleRepository`] trait; the in-memory
//! implementation backs the web server, the CLI and the tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::RepositoryError;
use crate::schedule::slot_utils::{overlaps, parse_time_to_minutes};
use crate::schedule::types::{
    AppointmentRecord, AppointmentStatus, BookingReceipt, NewAppointment, StaffMember,
};

/// Read and write access to the schedule data store
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Active members of the roster
    async fn get_active_staff(&self) -> Result<Vec<StaffMember>, RepositoryError>;

    /// Appointments on `date`, excluding cancelled ones
    async fn get_appointments(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>, RepositoryError>;

    /// Optimistic-concurrency token for `date`; changes whenever that day is written
    async fn day_version(&self, date: NaiveDate) -> Result<u64, RepositoryError>;

    /// Atomically writes every appointment or none of them.
    ///
    /// Fails with `VersionConflict` when the day moved past `expected_version`,
    /// and with `SlotTaken` when a new appointment overlaps an existing one for
    /// the same staff member.
    async fn book_group(
        &self,
        date: NaiveDate,
        expected_version: u64,
        appointments: &[NewAppointment],
    ) -> Result<BookingReceipt, RepositoryError>;
}

/// Roster entry as held by the store, including inactive staff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub staff: StaffMember,
    pub active: bool,
}

#[derive(Debug, Default)]
struct DayLedger {
    version: u64,
    appointments: Vec<AppointmentRecord>,
}

#[derive(Debug, Default)]
struct StoreState {
    roster: Vec<RosterEntry>,
    days: HashMap<NaiveDate, DayLedger>,
    next_id: u64,
    unavailable: Option<String>,
}

/// Mutex-guarded store used by the server and tests
#[derive(Debug)]
pub struct InMemoryRepository {
    state: Mutex<StoreState>,
    default_service_duration: u32,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                next_id: 1,
                ..StoreState::default()
            }),
            default_service_duration: 60,
        }
    }

    pub fn with_default_service_duration(mut self, minutes: u32) -> Self {
        self.default_service_duration = minutes;
        self
    }

    pub fn with_data(roster: Vec<RosterEntry>, appointments: Vec<AppointmentRecord>) -> Self {
        let repo = Self::new();
        repo.replace_roster(roster);
        repo.replace_appointments(appointments);
        repo
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn replace_roster(&self, roster: Vec<RosterEntry>) {
        let mut state = self.lock();
        info!(staff = roster.len(), "Roster replaced");
        state.roster = roster;
    }

    /// Replaces every stored appointment, bumping the version of each affected day
    pub fn replace_appointments(&self, appointments: Vec<AppointmentRecord>) {
        let mut state = self.lock();
        let mut touched: Vec<NaiveDate> = state.days.keys().copied().collect();
        for ledger in state.days.values_mut() {
            ledger.appointments.clear();
        }

        let count = appointments.len();
        for appointment in appointments {
            touched.push(appointment.date);
            state
                .days
                .entry(appointment.date)
                .or_default()
                .appointments
                .push(appointment);
        }

        touched.sort();
        touched.dedup();
        for date in touched {
            if let Some(ledger) = state.days.get_mut(&date) {
                ledger.version += 1;
            }
        }
        info!(appointments = count, "Appointments replaced");
    }

    /// Adds a single appointment outside of a group commit
    pub fn insert_appointment(&self, appointment: AppointmentRecord) {
        let mut state = self.lock();
        let ledger = state.days.entry(appointment.date).or_default();
        ledger.version += 1;
        ledger.appointments.push(appointment);
    }

    /// Marks an appointment cancelled; returns false when the id is unknown
    pub fn cancel_appointment(&self, date: NaiveDate, appointment_id: &str) -> bool {
        let mut state = self.lock();
        let Some(ledger) = state.days.get_mut(&date) else {
            return false;
        };
        match ledger.appointments.iter_mut().find(|a| a.id == appointment_id) {
            Some(appointment) => {
                appointment.status = AppointmentStatus::Cancelled;
                ledger.version += 1;
                true
            }
            None => false,
        }
    }

    /// Makes every read fail with `RepositoryError::Unavailable` until cleared
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.lock().unavailable = reason.map(str::to_string);
    }

    fn check_available(state: &StoreState) -> Result<(), RepositoryError> {
        match &state.unavailable {
            Some(reason) => Err(RepositoryError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryRepository {
    async fn get_active_staff(&self) -> Result<Vec<StaffMember>, RepositoryError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state
            .roster
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.staff.clone())
            .collect())
    }

    async fn get_appointments(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>, RepositoryError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state
            .days
            .get(&date)
            .map(|ledger| {
                ledger
                    .appointments
                    .iter()
                    .filter(|a| a.status != AppointmentStatus::Cancelled)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn day_version(&self, date: NaiveDate) -> Result<u64, RepositoryError> {
        let state = self.lock();
        Self::check_available(&state)?;
        Ok(state.days.get(&date).map(|l| l.version).unwrap_or(0))
    }

    async fn book_group(
        &self,
        date: NaiveDate,
        expected_version: u64,
        appointments: &[NewAppointment],
    ) -> Result<BookingReceipt, RepositoryError> {
        let mut state = self.lock();
        Self::check_available(&state)?;

        for new in appointments {
            if !state.roster.iter().any(|e| e.active && e.staff.id == new.staff_id) {
                return Err(RepositoryError::UnknownStaff(new.staff_id.clone()));
            }
        }

        let default_duration = self.default_service_duration;
        let ledger = state.days.entry(date).or_default();
        if ledger.version != expected_version {
            warn!(
                %date,
                expected = expected_version,
                found = ledger.version,
                "Rejecting group booking on stale snapshot"
            );
            return Err(RepositoryError::VersionConflict {
                date,
                expected: expected_version,
                found: ledger.version,
            });
        }

        let mut accepted: Vec<(&str, u32, u32)> = Vec::with_capacity(appointments.len());
        for new in appointments {
            let Some(start) = parse_time_to_minutes(&new.time) else {
                return Err(RepositoryError::InvalidRecord(format!(
                    "invalid appointment time '{}'",
                    new.time
                )));
            };
            let end = start.saturating_add(new.service_duration);

            let clashes_in_group = accepted.iter().any(|&(staff_id, other_start, other_end)| {
                staff_id == new.staff_id && overlaps(start, end, other_start, other_end)
            });
            let clash = clashes_in_group || ledger.appointments.iter().any(|existing| {
                if existing.status == AppointmentStatus::Cancelled
                    || existing.staff_id != new.staff_id
                {
                    return false;
                }
                match parse_time_to_minutes(&existing.time) {
                    Some(existing_start) => {
                        let existing_end = existing_start
                            .saturating_add(existing.service_duration.unwrap_or(default_duration));
                        overlaps(start, end, existing_start, existing_end)
                    }
                    None => false,
                }
            });
            if clash {
                return Err(RepositoryError::SlotTaken {
                    staff_id: new.staff_id.clone(),
                    date,
                    time: new.time.clone(),
                });
            }
            accepted.push((new.staff_id.as_str(), start, end));
        }

        let mut ids = Vec::with_capacity(appointments.len());
        let mut next_id = state.next_id;
        let mut records = Vec::with_capacity(appointments.len());
        for new in appointments {
            let id = format!("apt-{}", next_id);
            next_id += 1;
            ids.push(id.clone());
            records.push(AppointmentRecord {
                id,
                staff_id: new.staff_id.clone(),
                date,
                time: new.time.clone(),
                service_duration: Some(new.service_duration),
                status: AppointmentStatus::Confirmed,
            });
        }
        state.next_id = next_id;

        let ledger = state.days.entry(date).or_default();
        ledger.appointments.extend(records);
        ledger.version += 1;
        debug!(%date, version = ledger.version, booked = ids.len(), "Group booking committed");

        Ok(BookingReceipt {
            date,
            version: ledger.version,
            appointment_ids: ids,
        })
    }
}
