//! FarmLog client
//!
//! Screen controllers, form validation and date handling on top of the
//! `farmlog-data` repositories.

pub mod config;
pub mod connectivity;
pub mod context;
pub mod dates;
pub mod forms;
pub mod view;
pub mod weather;
