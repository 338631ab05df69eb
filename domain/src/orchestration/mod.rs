//! Multi-cluster orchestration: classification, plans, sub-results and
//! synthesis of the reduced answer.

pub mod classify;
pub mod plan;
pub mod synthesis;
pub mod value_objects;
