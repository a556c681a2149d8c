//! Utility modules shared by the deploy pipeline.

pub mod date;
pub mod exec;
pub mod git;
pub mod path;
