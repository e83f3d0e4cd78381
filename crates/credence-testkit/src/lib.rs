//! Test fixtures and proptest generators for the credence trust core.

pub mod fixtures;
pub mod generators;

pub use fixtures::{parties, Party, TestNet};
