//! Core business logic for the GAD portal.
//!
//! Services wrap the repositories of `gad-db` with validation, logging and
//! change publishing. Demographic aggregation and location categorization
//! are pure functions in [`demographics`] and [`gazetteer`].

pub mod demographics;
pub mod gazetteer;
pub mod scheduler;
pub mod services;

pub use services::*;
