//! Domain module - core entities and collaborator contracts
//!
//! Region constants, catalog entities, the regional-food keyword catalog,
//! price statistics types, and the traits the pipeline consumes.

pub mod batch;
pub mod constants;
pub mod geo;
pub mod local_food;
pub mod price;
pub mod repositories;
pub mod restaurant;
