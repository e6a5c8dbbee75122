//! Business logic services.

#![allow(missing_docs)]

pub mod academic_period;
pub mod account;
pub mod activity_log;
pub mod dashboard;
pub mod employee;
pub mod event;
pub mod event_publisher;
pub mod import;
pub mod news;
pub mod notification;
pub mod participant;

pub use academic_period::AcademicPeriodService;
pub use account::AccountService;
pub use activity_log::{ActivityEntry, ActivityLogService};
pub use dashboard::DashboardService;
pub use employee::EmployeeService;
pub use event::EventService;
pub use event_publisher::{
    ChangeEvent, ChangeKind, Collection, EventPublisher, EventPublisherService,
    NoOpEventPublisher,
};
pub use import::ImportService;
pub use news::NewsService;
pub use notification::NotificationService;
pub use participant::ParticipantService;
