//! Shared test fixtures for Tempora crates.
//!
//! This crate provides small problem instances and helpers for testing.
//! It depends only on `tempora-core`, so every other crate can pull it in
//! as a dev-dependency.
//!
//! - [`timetable`] - lectures placed on a time x room grid
//! - [`enrollment`] - course sections of one student, for feasibility checks
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! tempora-test = { workspace = true }
//! ```
//!
//! ```ignore
//! use tempora_test::timetable::{slot, TimetableBuilder};
//! ```

pub mod enrollment;
pub mod timetable;

pub use enrollment::{sections, Enrollment, Section};
pub use timetable::{place, slot, Slot, TimetableBuilder};
