//! Database repositories.

mod academic_period;
mod activity_log;
mod employee;
mod event;
mod news;
mod notification;
mod participant;
mod user;

pub use academic_period::AcademicPeriodRepository;
pub use activity_log::ActivityLogRepository;
pub use employee::EmployeeRepository;
pub use event::{EventFilter, EventRepository};
pub use news::NewsRepository;
pub use notification::NotificationRepository;
pub use participant::{ParticipantFilter, ParticipantRepository};
pub use user::UserRepository;
