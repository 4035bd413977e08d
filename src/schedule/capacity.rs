use chrono::NaiveDate;
use tracing::info;

use crate::config::SchedulingPolicy;
use crate::error::SchedulingError;
use crate::repository::ScheduleRepository;
use super::availability::{available_staff, load_day};
use super::slot_utils::{div_ceil, minutes_to_time, probe_times, time_to_minutes};
use super::types::{AlternativeSlot, CapacityCheck, CapacityStatus, DaySnapshot};

pub fn capacity_status(available: usize, party_size: usize) -> CapacityStatus {
    if available >= party_size {
        CapacityStatus::Full
    } else if available > 0 {
        CapacityStatus::Partial
    } else {
        CapacityStatus::None
    }
}

/// Probe times on the same day where at least half the party can be seated at once
pub fn find_alternatives(
    snapshot: &DaySnapshot,
    party_size: usize,
    duration: u32,
    policy: &SchedulingPolicy,
) -> Vec<AlternativeSlot> {
    let needed = div_ceil(party_size, 2);

    probe_times(policy)
        .into_iter()
        .filter_map(|start| {
            let count = available_staff(&snapshot.staff, &snapshot.occupancy, start, duration).len();
            (count > 0 && count >= needed).then(|| AlternativeSlot {
                date: snapshot.date,
                time: minutes_to_time(start),
                available_staff: count,
            })
        })
        .take(policy.max_alternatives)
        .collect()
}

/// Capacity at `start_time`, computed from an already loaded snapshot
pub fn capacity_on_snapshot(
    snapshot: &DaySnapshot,
    start_time: &str,
    party_size: usize,
    duration: u32,
    policy: &SchedulingPolicy,
) -> Result<CapacityCheck, SchedulingError> {
    let start = time_to_minutes(start_time)?;
    let available = available_staff(&snapshot.staff, &snapshot.occupancy, start, duration).len();
    let status = capacity_status(available, party_size);

    let alternatives = if status == CapacityStatus::None {
        find_alternatives(snapshot, party_size, duration, policy)
    } else {
        Vec::new()
    };

    Ok(CapacityCheck {
        status,
        available_staff: available,
        party_size,
        alternatives,
    })
}

/// Whether the salon can take the whole party at `start_time` on `date`
pub async fn check_group_capacity(
    repo: &dyn ScheduleRepository,
    date: NaiveDate,
    start_time: &str,
    party_size: usize,
    duration: u32,
    policy: &SchedulingPolicy,
) -> Result<CapacityCheck, SchedulingError> {
    time_to_minutes(start_time)?;
    let snapshot = load_day(repo, date, policy).await?;
    let check = capacity_on_snapshot(&snapshot, start_time, party_size, duration, policy)?;

    info!(
        %date,
        start_time,
        party_size,
        status = ?check.status,
        available = check.available_staff,
        alternatives = check.alternatives.len(),
        "Group capacity checked"
    );
    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{AppointmentOccupancy, StaffMember};

    fn snapshot(staff: usize, busy: &[(&str, u32, u32)]) -> DaySnapshot {
        DaySnapshot {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            version: 0,
            staff: (1..=staff)
                .map(|i| StaffMember {
                    id: format!("s{}", i),
                    name: format!("Stylist {}", i),
                    specialty: None,
                })
                .collect(),
            occupancy: busy
                .iter()
                .map(|(id, start, duration)| AppointmentOccupancy {
                    staff_id: id.to_string(),
                    start: *start,
                    duration: *duration,
                })
                .collect(),
        }
    }

    #[test]
    fn test_ternary_status() {
        assert_eq!(capacity_status(4, 4), CapacityStatus::Full);
        assert_eq!(capacity_status(2, 4), CapacityStatus::Partial);
        assert_eq!(capacity_status(0, 4), CapacityStatus::None);
    }

    #[test]
    fn test_full_and_partial_have_no_alternatives() {
        let policy = SchedulingPolicy::default();
        let snap = snapshot(2, &[]);

        let full = capacity_on_snapshot(&snap, "10:00", 2, 60, &policy).unwrap();
        assert!(full.can_accommodate());
        assert!(full.alternatives.is_empty());

        let partial = capacity_on_snapshot(&snap, "10:00", 3, 60, &policy).unwrap();
        assert_eq!(partial.status, CapacityStatus::Partial);
        assert!(!partial.can_accommodate());
        assert!(partial.alternatives.is_empty());
    }

    #[test]
    fn test_no_capacity_suggests_up_to_three_workable_times() {
        let policy = SchedulingPolicy::default();
        // Both stylists busy 09:00-12:00, s2 also busy 13:00-14:00
        let snap = snapshot(2, &[("s1", 540, 180), ("s2", 540, 180), ("s2", 780, 60)]);

        let check = capacity_on_snapshot(&snap, "10:00", 4, 60, &policy).unwrap();
        assert_eq!(check.status, CapacityStatus::None);
        let times: Vec<(&str, usize)> = check
            .alternatives
            .iter()
            .map(|a| (a.time.as_str(), a.available_staff))
            .collect();
        // 13:00 has only one stylist, below ceil(4/2)
        assert_eq!(times, vec![("12:00", 2), ("14:00", 2), ("15:00", 2)]);
    }

    #[test]
    fn test_no_alternatives_when_day_is_full() {
        let policy = SchedulingPolicy::default();
        let snap = snapshot(1, &[("s1", 480, 600)]);
        let check = capacity_on_snapshot(&snap, "10:00", 1, 60, &policy).unwrap();
        assert_eq!(check.status, CapacityStatus::None);
        assert!(check.alternatives.is_empty());
    }

    #[test]
    fn test_alternatives_respect_configured_limit() {
        let policy = SchedulingPolicy {
            max_alternatives: 1,
            ..SchedulingPolicy::default()
        };
        let snap = snapshot(1, &[("s1", 600, 60)]);
        let check = capacity_on_snapshot(&snap, "10:00", 2, 60, &policy).unwrap();
        assert_eq!(check.alternatives.len(), 1);
        assert_eq!(check.alternatives[0].time, "09:00");
    }
}
