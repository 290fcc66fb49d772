//! Pure tree logic over category snapshots.
//!
//! # Responsibility
//! - Build the nested three-level view from flat store rows.
//! - Resolve drag gestures into level/parent changes or sibling reorders.
//! - Hold the optimistic order overlay on top of the confirmed snapshot.
//!
//! # Invariants
//! - Nothing in this module talks to a store; every function is a pure
//!   function of its inputs, except `TreeCache` which owns its snapshot.

pub mod cache;
pub mod normalize;
pub mod reorder;
pub mod resolver;
