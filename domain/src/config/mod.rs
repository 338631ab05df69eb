//! Configuration value objects shared across layers

mod output_format;
pub mod validation;

pub use output_format::OutputFormat;
