//! Group appointment scheduling for a salon: staff availability, strategy
//! recommendation, capacity checks and consistent group bookings.

pub mod config;
pub mod error;
pub mod repository;
pub mod schedule;
pub mod parser;
pub mod form;
pub mod display;
pub mod web;

pub use config::{Config, SchedulingPolicy};
pub use error::{LoadError, RepositoryError, SchedulingError, ValidationError};
pub use repository::{InMemoryRepository, RosterEntry, ScheduleRepository};
