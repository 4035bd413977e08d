pub mod types;
pub mod slot_utils;
pub mod availability;
pub mod assign;
pub mod recommend;
pub mod capacity;
pub mod booking;

pub use types::{
    AlternativeSlot, AppointmentOccupancy, AppointmentRecord, AppointmentStatus, BookingReceipt,
    CapacityCheck, CapacityStatus, DaySnapshot, MemberAssignment, NewAppointment,
    SchedulingRecommendation, SchedulingRequest, StaffAvailability, StaffMember, Strategy,
};
pub use slot_utils::{minutes_to_time, time_to_minutes};
pub use availability::{check_staff_availability, load_day};
pub use assign::{assign_members, auto_assign};
pub use recommend::get_scheduling_recommendation;
pub use capacity::check_group_capacity;
pub use booking::{schedule_and_book, GroupBooking};
