//! Step definitions for task retry BDD scenarios.

pub mod given;
pub mod when;
pub mod world;
