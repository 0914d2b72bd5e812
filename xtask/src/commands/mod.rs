//! Maintenance tasks.

pub mod completions;

pub mod man;
