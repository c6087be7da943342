//! API endpoint implementations.

pub mod track;
