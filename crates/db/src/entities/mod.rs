//! Database entities.

#![allow(missing_docs)]

pub mod academic_period;
pub mod activity_log;
pub mod employee;
pub mod employee_survey;
pub mod event;
pub mod news;
pub mod notification;
pub mod participant;
pub mod user;

pub use academic_period::Entity as AcademicPeriod;
pub use activity_log::Entity as ActivityLog;
pub use employee::Entity as Employee;
pub use employee_survey::Entity as EmployeeSurvey;
pub use event::Entity as Event;
pub use news::Entity as News;
pub use notification::Entity as Notification;
pub use participant::Entity as Participant;
pub use user::Entity as User;
