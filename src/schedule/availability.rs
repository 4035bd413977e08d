use chrono::NaiveDate;
use tracing::{debug, error};

use crate::config::SchedulingPolicy;
use crate::error::{RepositoryError, SchedulingError};
use crate::repository::ScheduleRepository;
use super::slot_utils::{overlaps, parse_time_to_minutes, time_to_minutes};
use super::types::{AppointmentOccupancy, AppointmentRecord, DaySnapshot, StaffAvailability, StaffMember};

/// Converts stored appointments into busy windows, skipping rows with unreadable times
pub fn occupancy_from_records(
    records: &[AppointmentRecord],
    default_duration: u32,
) -> Vec<AppointmentOccupancy> {
    records
        .iter()
        .filter_map(|record| match parse_time_to_minutes(&record.time) {
            Some(start) => Some(AppointmentOccupancy {
                staff_id: record.staff_id.clone(),
                start,
                duration: record.service_duration.unwrap_or(default_duration),
            }),
            None => {
                debug!(appointment = %record.id, time = %record.time, "Skipping appointment with unreadable time");
                None
            }
        })
        .collect()
}

/// Annotates the roster with whether each member is free for `[start, start + duration)`
pub fn staff_availability(
    staff: &[StaffMember],
    occupancy: &[AppointmentOccupancy],
    start: u32,
    duration: u32,
) -> Vec<StaffAvailability> {
    let end = start.saturating_add(duration);
    staff
        .iter()
        .map(|member| {
            let busy = occupancy
                .iter()
                .filter(|o| o.staff_id == member.id)
                .any(|o| overlaps(start, end, o.start, o.end()));
            StaffAvailability {
                staff: member.clone(),
                available: !busy,
            }
        })
        .collect()
}

/// Staff free for the window, in roster order
pub fn available_staff(
    staff: &[StaffMember],
    occupancy: &[AppointmentOccupancy],
    start: u32,
    duration: u32,
) -> Vec<StaffMember> {
    staff_availability(staff, occupancy, start, duration)
        .into_iter()
        .filter(|a| a.available)
        .map(|a| a.staff)
        .collect()
}

/// Reads the roster and bookings for `date` in one pass.
///
/// The version is read first so that a commit made with it fails if anything
/// changed while the rest of the snapshot was being read.
pub async fn load_day(
    repo: &dyn ScheduleRepository,
    date: NaiveDate,
    policy: &SchedulingPolicy,
) -> Result<DaySnapshot, SchedulingError> {
    let result = async {
        let version = repo.day_version(date).await?;
        let staff = repo.get_active_staff().await?;
        let records = repo.get_appointments(date).await?;
        Ok::<_, RepositoryError>((version, staff, records))
    }
    .await;

    match result {
        Ok((version, staff, records)) => Ok(DaySnapshot {
            date,
            version,
            staff,
            occupancy: occupancy_from_records(&records, policy.default_service_duration),
        }),
        Err(e) => {
            error!(%date, error = %e, "Failed to load staff availability");
            Err(SchedulingError::from(e))
        }
    }
}

/// Full roster for `date`, each member flagged available or not for the window
pub async fn check_staff_availability(
    repo: &dyn ScheduleRepository,
    date: NaiveDate,
    start_time: &str,
    duration: u32,
    policy: &SchedulingPolicy,
) -> Result<Vec<StaffAvailability>, SchedulingError> {
    let start = time_to_minutes(start_time)?;
    let snapshot = load_day(repo, date, policy).await?;
    let availability = staff_availability(&snapshot.staff, &snapshot.occupancy, start, duration);

    debug!(
        %date,
        start_time,
        duration,
        available = availability.iter().filter(|a| a.available).count(),
        total = availability.len(),
        "Checked staff availability"
    );
    Ok(availability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRepository, RosterEntry};
    use crate::schedule::types::AppointmentStatus;

    fn member(id: &str) -> StaffMember {
        StaffMember {
            id: id.to_string(),
            name: id.to_uppercase(),
            specialty: Some("hair".to_string()),
        }
    }

    fn busy(staff_id: &str, start: u32, duration: u32) -> AppointmentOccupancy {
        AppointmentOccupancy {
            staff_id: staff_id.to_string(),
            start,
            duration,
        }
    }

    #[test]
    fn test_overlapping_appointment_marks_unavailable() {
        let staff = vec![member("a"), member("b"), member("c")];
        let occupancy = vec![busy("a", 630, 60), busy("b", 540, 60), busy("c", 660, 30)];

        // Request 10:00 for 60 minutes: a overlaps, b ends exactly at 10:00, c starts exactly at 11:00
        let result = staff_availability(&staff, &occupancy, 600, 60);
        let flags: Vec<(&str, bool)> = result.iter().map(|a| (a.staff.id.as_str(), a.available)).collect();
        assert_eq!(flags, vec![("a", false), ("b", true), ("c", true)]);
    }

    #[test]
    fn test_available_staff_keeps_roster_order() {
        let staff = vec![member("x"), member("y"), member("z")];
        let occupancy = vec![busy("y", 600, 60)];
        let free: Vec<String> = available_staff(&staff, &occupancy, 600, 60)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(free, vec!["x", "z"]);
    }

    #[test]
    fn test_occupancy_defaults_missing_duration() {
        let records = vec![
            AppointmentRecord {
                id: "1".to_string(),
                staff_id: "a".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                time: "10:00".to_string(),
                service_duration: None,
                status: AppointmentStatus::Confirmed,
            },
            AppointmentRecord {
                id: "2".to_string(),
                staff_id: "a".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                time: "garbage".to_string(),
                service_duration: Some(30),
                status: AppointmentStatus::Confirmed,
            },
        ];
        let occupancy = occupancy_from_records(&records, 60);
        assert_eq!(occupancy, vec![busy("a", 600, 60)]);
    }

    #[tokio::test]
    async fn test_check_staff_availability_returns_full_roster() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let repo = InMemoryRepository::with_data(
            vec![
                RosterEntry { staff: member("a"), active: true },
                RosterEntry { staff: member("b"), active: true },
            ],
            vec![AppointmentRecord {
                id: "1".to_string(),
                staff_id: "b".to_string(),
                date,
                time: "10:15".to_string(),
                service_duration: Some(45),
                status: AppointmentStatus::Confirmed,
            }],
        );

        let availability = check_staff_availability(&repo, date, "10:00", 60, &SchedulingPolicy::default()).await.unwrap();
        assert_eq!(availability.len(), 2);
        assert!(availability[0].available);
        assert!(!availability[1].available);
    }

    #[tokio::test]
    async fn test_data_source_failure_is_an_error_not_an_empty_list() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let repo = InMemoryRepository::with_data(vec![RosterEntry { staff: member("a"), active: true }], vec![]);
        repo.set_unavailable(Some("timeout"));

        let result = check_staff_availability(&repo, date, "10:00", 60, &SchedulingPolicy::default()).await;
        assert!(matches!(result, Err(SchedulingError::Repository(_))));
    }

    #[tokio::test]
    async fn test_empty_roster_is_ok_and_empty() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let repo = InMemoryRepository::new();
        let availability = check_staff_availability(&repo, date, "10:00", 60, &SchedulingPolicy::default()).await.unwrap();
        assert!(availability.is_empty());
    }

    #[tokio::test]
    async fn test_huge_duration_does_not_overflow() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let repo = InMemoryRepository::with_data(
            vec![RosterEntry { staff: member("a"), active: true }],
            vec![AppointmentRecord {
                id: "1".to_string(),
                staff_id: "a".to_string(),
                date,
                time: "23:00".to_string(),
                service_duration: Some(30),
                status: AppointmentStatus::Confirmed,
            }],
        );

        let availability = check_staff_availability(&repo, date, "23:59", u32::MAX, &SchedulingPolicy::default())
            .await
            .unwrap();
        assert!(availability[0].available);

        let availability = check_staff_availability(&repo, date, "22:00", u32::MAX, &SchedulingPolicy::default())
            .await
            .unwrap();
        assert!(!availability[0].available);
    }

    #[tokio::test]
    async fn test_malformed_start_time_rejected() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let repo = InMemoryRepository::new();
        let result = check_staff_availability(&repo, date, "10h00", 60, &SchedulingPolicy::default()).await;
        assert!(matches!(result, Err(SchedulingError::InvalidTime(_))));
    }
}
