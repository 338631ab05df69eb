//! Planning oracle adapters.

pub mod http;
pub mod mention;

pub use http::HttpPlanningOracle;
pub use mention::MentionPlanner;
