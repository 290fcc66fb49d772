//! Use-case services over the category store.
//!
//! # Responsibility
//! - Wrap store calls into validated, notice-producing mutations.
//! - Drive drag sessions: reorder batches and the move confirmation gate.
//! - Run the course review workflow.

pub mod category_service;
pub mod course_service;
pub mod move_gate;
pub mod notice;
pub mod organizer;
