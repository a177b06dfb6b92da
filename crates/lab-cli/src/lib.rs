//! CLI library components for the lab table processor.

pub mod logging;
pub mod output;
