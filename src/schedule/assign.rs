use tracing::info;

use crate::config::SchedulingPolicy;
use crate::error::SchedulingError;
use crate::repository::ScheduleRepository;
use super::availability::{available_staff, load_day};
use super::slot_utils::{minutes_to_time, time_to_minutes};
use super::types::{MemberAssignment, SchedulingRequest, StaffMember, Strategy};

pub const UNASSIGNED_STAFF_NAME: &str = "Unassigned";

/// A member's slot before it is rendered to HH:MM strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedSlot<'a> {
    pub member_index: usize,
    pub staff: Option<&'a StaffMember>,
    pub start: u32,
    pub end: u32,
}

impl PlannedSlot<'_> {
    pub(crate) fn to_assignment(&self) -> MemberAssignment {
        MemberAssignment {
            member_index: self.member_index,
            staff_id: self.staff.map(|s| s.id.clone()),
            staff_name: self
                .staff
                .map(|s| s.name.clone())
                .unwrap_or_else(|| UNASSIGNED_STAFF_NAME.to_string()),
            start_time: minutes_to_time(self.start),
            end_time: minutes_to_time(self.end),
            duration: self.end - self.start,
        }
    }
}

/// Lays out every member of the party for `strategy`.
///
/// Member `i` goes to `available[i % A]` in batch `i / A`. Batches all start at
/// `start` (parallel), `offset` minutes apart (staggered) or one service
/// duration apart (sequential). With nobody available each member gets their
/// own back-to-back block and no staff.
pub(crate) fn plan_slots<'a>(
    available: &'a [StaffMember],
    strategy: Strategy,
    start: u32,
    party_size: usize,
    duration: u32,
    policy: &SchedulingPolicy,
) -> Vec<PlannedSlot<'a>> {
    let staff_count = available.len();

    (0..party_size)
        .map(|member_index| {
            if staff_count == 0 {
                let slot_start = start.saturating_add((member_index as u32).saturating_mul(duration));
                return PlannedSlot {
                    member_index,
                    staff: None,
                    start: slot_start,
                    end: slot_start.saturating_add(duration),
                };
            }

            let batch = (member_index / staff_count) as u32;
            let slot_start = match strategy {
                Strategy::Parallel => start,
                Strategy::Staggered => start.saturating_add(batch.saturating_mul(policy.stagger_offset_minutes)),
                Strategy::Sequential => start.saturating_add(batch.saturating_mul(duration)),
            };
            PlannedSlot {
                member_index,
                staff: Some(&available[member_index % staff_count]),
                start: slot_start,
                end: slot_start.saturating_add(duration),
            }
        })
        .collect()
}

/// Maps each party member to a (staff, time) pair by index
pub fn assign_members(
    available: &[StaffMember],
    strategy: Strategy,
    start: u32,
    party_size: usize,
    duration: u32,
    policy: &SchedulingPolicy,
) -> Vec<MemberAssignment> {
    plan_slots(available, strategy, start, party_size, duration, policy)
        .iter()
        .map(PlannedSlot::to_assignment)
        .collect()
}

/// Reads availability afresh and assigns the party with an already chosen strategy.
///
/// This is a separate read from any earlier recommendation or capacity check;
/// use `booking::schedule_and_book` when the plan must be written consistently.
pub async fn auto_assign(
    repo: &dyn ScheduleRepository,
    request: &SchedulingRequest,
    strategy: Strategy,
    policy: &SchedulingPolicy,
) -> Result<Vec<MemberAssignment>, SchedulingError> {
    let start = time_to_minutes(&request.start_time)?;
    let snapshot = load_day(repo, request.date, policy).await?;
    let available = available_staff(&snapshot.staff, &snapshot.occupancy, start, request.service_duration);

    info!(
        date = %request.date,
        start_time = %request.start_time,
        party_size = request.party_size,
        %strategy,
        available = available.len(),
        "Auto-assigning group"
    );
    Ok(assign_members(
        &available,
        strategy,
        start,
        request.party_size,
        request.service_duration,
        policy,
    ))
}
