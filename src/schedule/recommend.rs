use tracing::{info, warn};

use crate::config::SchedulingPolicy;
use crate::error::SchedulingError;
use crate::repository::ScheduleRepository;
use super::assign::{plan_slots, PlannedSlot};
use super::availability::{available_staff, load_day};
use super::slot_utils::{div_ceil, minutes_to_time, time_to_minutes};
use super::types::{DaySnapshot, SchedulingRecommendation, SchedulingRequest, StaffMember, Strategy};

/// Picks a strategy from available staff `available` and party size `party_size`.
///
/// Rules are checked in order: nobody free, everyone at once, half the party
/// at a time, and finally back to back.
pub fn choose_strategy(available: usize, party_size: usize) -> (Strategy, String) {
    if available == 0 {
        (
            Strategy::Sequential,
            "No staff available at the requested time".to_string(),
        )
    } else if available >= party_size {
        (
            Strategy::Parallel,
            format!(
                "{} staff available for {} guests, everyone can be served at the same time",
                available, party_size
            ),
        )
    } else if available >= div_ceil(party_size, 2) {
        (
            Strategy::Staggered,
            format!(
                "{} staff available for {} guests, appointments will be staggered",
                available, party_size
            ),
        )
    } else {
        (
            Strategy::Sequential,
            format!(
                "Only {} staff available for {} guests, appointments will run back to back",
                available, party_size
            ),
        )
    }
}

fn preference_is_feasible(preferred: Strategy, available: usize, party_size: usize) -> bool {
    match preferred {
        _ if available == 0 => false,
        Strategy::Parallel => available >= party_size,
        Strategy::Staggered => available >= div_ceil(party_size, 2),
        Strategy::Sequential => true,
    }
}

/// Builds a recommendation from staff already known to be free for the request window
pub fn recommend_for_available(
    request: &SchedulingRequest,
    available: &[StaffMember],
    policy: &SchedulingPolicy,
) -> Result<SchedulingRecommendation, SchedulingError> {
    let start = time_to_minutes(&request.start_time)?;
    let staff_count = available.len();
    let party_size = request.party_size;
    let duration = request.service_duration;

    let (mut strategy, mut reason) = choose_strategy(staff_count, party_size);
    let mut warnings = Vec::new();

    if let Some(preferred) = request.preferred_strategy {
        if preferred != strategy {
            if preference_is_feasible(preferred, staff_count, party_size) {
                strategy = preferred;
                reason = format!("{} scheduling requested", preferred);
            } else {
                warnings.push(format!(
                    "Requested {} scheduling is not possible with {} staff available, using {} instead",
                    preferred, staff_count, strategy
                ));
            }
        }
    }

    if staff_count == 0 {
        warnings.push(format!(
            "No staff available at {}. Please choose a different time.",
            request.start_time
        ));
    } else {
        match strategy {
            Strategy::Parallel => {}
            Strategy::Staggered => {
                let offset = policy.stagger_offset_minutes;
                warnings.push(format!(
                    "Appointments are staggered in groups of {}, each group starting {} minutes after the previous one",
                    staff_count, offset
                ));
                if offset < duration && party_size > staff_count {
                    warnings.push(format!(
                        "Staff will overlap appointments: groups start {} minutes apart but each service takes {} minutes",
                        offset, duration
                    ));
                }
            }
            Strategy::Sequential => {
                let total = div_ceil(party_size, staff_count) as u32 * duration;
                warnings.push(format!(
                    "Group will take approximately {} minutes to complete",
                    total
                ));
            }
        }
    }

    let plan = plan_slots(available, strategy, start, party_size, duration, policy);
    let end = plan.last().map(|slot| slot.end).unwrap_or(start);

    Ok(SchedulingRecommendation {
        strategy,
        reason,
        available_staff: staff_count,
        total_duration: end - start,
        estimated_end_time: minutes_to_time(end),
        assignments: plan.iter().map(PlannedSlot::to_assignment).collect(),
        warnings,
    })
}

/// Recommends a strategy using an already loaded snapshot of the day
pub fn recommend_on_snapshot(
    snapshot: &DaySnapshot,
    request: &SchedulingRequest,
    policy: &SchedulingPolicy,
) -> Result<SchedulingRecommendation, SchedulingError> {
    let start = time_to_minutes(&request.start_time)?;
    let available = available_staff(&snapshot.staff, &snapshot.occupancy, start, request.service_duration);
    recommend_for_available(request, &available, policy)
}

/// Reads the day and recommends how to schedule the whole party
pub async fn get_scheduling_recommendation(
    repo: &dyn ScheduleRepository,
    request: &SchedulingRequest,
    policy: &SchedulingPolicy,
) -> Result<SchedulingRecommendation, SchedulingError> {
    time_to_minutes(&request.start_time)?;
    let snapshot = load_day(repo, request.date, policy).await?;
    let recommendation = recommend_on_snapshot(&snapshot, request, policy)?;

    if recommendation.available_staff == 0 {
        warn!(
            date = %request.date,
            start_time = %request.start_time,
            party_size = request.party_size,
            "No staff available for group request"
        );
    }
    info!(
        date = %request.date,
        start_time = %request.start_time,
        party_size = request.party_size,
        strategy = %recommendation.strategy,
        available = recommendation.available_staff,
        end = %recommendation.estimated_end_time,
        "Scheduling recommendation computed"
    );
    Ok(recommendation)
}
