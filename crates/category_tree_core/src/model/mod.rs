//! Domain model for the category tree and its courses.
//!
//! # Responsibility
//! - Define the flat read-model rows and the nested tree node shape.
//! - Keep level/parent invariants expressible in types.
//!
//! # Invariants
//! - Category levels are limited to 1..=3.
//! - A category has a parent iff its level is greater than 1.

pub mod category;
pub mod course;
