use tracing::{debug, info, warn};

use crate::config::SchedulingPolicy;
use crate::error::SchedulingError;
use crate::repository::ScheduleRepository;
use super::availability::load_day;
use super::recommend::recommend_on_snapshot;
use super::slot_utils::time_to_minutes;
use super::types::{
    BookingReceipt, MemberAssignment, NewAppointment, SchedulingRecommendation, SchedulingRequest, Strategy,
};

/// A recommendation that has been written to the store
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GroupBooking {
    pub recommendation: SchedulingRecommendation,
    pub receipt: BookingReceipt,
}

/// Turns assignments into rows for a group commit; `None` if any member has no staff
pub fn to_new_appointments(assignments: &[MemberAssignment]) -> Option<Vec<NewAppointment>> {
    assignments
        .iter()
        .map(|a| {
            a.staff_id.as_ref().map(|staff_id| NewAppointment {
                staff_id: staff_id.clone(),
                time: a.start_time.clone(),
                service_duration: a.duration,
            })
        })
        .collect()
}

/// Whether a staggered plan puts a stylist in two overlapping windows
fn double_books_staff(
    recommendation: &SchedulingRecommendation,
    request: &SchedulingRequest,
    policy: &SchedulingPolicy,
) -> bool {
    recommendation.strategy == Strategy::Staggered
        && recommendation.available_staff > 0
        && request.party_size > recommendation.available_staff
        && policy.stagger_offset_minutes < request.service_duration
}

/// Recommends and books the party against a single read of the day.
///
/// The commit carries the version the recommendation was computed on, so a
/// booking made by someone else in between is reported as
/// `SchedulingError::Conflict` instead of producing a double booking. A
/// staggered plan that would overlap a stylist with themselves is booked back
/// to back instead.
pub async fn schedule_and_book(
    repo: &dyn ScheduleRepository,
    request: &SchedulingRequest,
    policy: &SchedulingPolicy,
) -> Result<GroupBooking, SchedulingError> {
    time_to_minutes(&request.start_time)?;
    let snapshot = load_day(repo, request.date, policy).await?;
    let mut recommendation = recommend_on_snapshot(&snapshot, request, policy)?;

    if double_books_staff(&recommendation, request, policy) {
        let sequential = SchedulingRequest {
            preferred_strategy: Some(Strategy::Sequential),
            ..request.clone()
        };
        debug!(date = %request.date, "Staggered plan overlaps staff, booking sequentially");
        recommendation = recommend_on_snapshot(&snapshot, &sequential, policy)?;
        recommendation.reason = format!(
            "Staggered batches {} minutes apart would double-book staff, booked back to back instead",
            policy.stagger_offset_minutes
        );
    }

    let Some(appointments) = to_new_appointments(&recommendation.assignments) else {
        warn!(
            date = %request.date,
            start_time = %request.start_time,
            "Refusing to book a group with unassigned members"
        );
        return Err(SchedulingError::NoStaffAvailable {
            date: request.date,
            time: request.start_time.clone(),
        });
    };

    let receipt = repo
        .book_group(request.date, snapshot.version, &appointments)
        .await
        .map_err(|e| {
            warn!(date = %request.date, error = %e, "Group booking rejected");
            SchedulingError::from(e)
        })?;

    info!(
        date = %request.date,
        strategy = %recommendation.strategy,
        booked = receipt.appointment_ids.len(),
        version = receipt.version,
        "Group booked"
    );
    Ok(GroupBooking {
        recommendation,
        receipt,
    })
}
