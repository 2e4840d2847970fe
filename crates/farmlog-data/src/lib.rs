//! FarmLog data layer
//!
//! Domain entities, the record store client, and the repositories that sit
//! between them and the screens.

pub mod client;
pub mod domain;
pub mod notify;
pub mod repository;
