//! Repository layer: the category store contract and its SQLite backing.
//!
//! # Responsibility
//! - Define the data-service contract (`CategoryStore`) used by services.
//! - Isolate SQLite query details from tree and service logic.
//!
//! # Invariants
//! - Repositories refuse connections whose schema is not fully migrated.
//! - Store APIs return semantic errors (`NotFound`, `HasChildren`, ...) in
//!   addition to DB transport errors.

pub mod category_repo;
pub mod course_repo;
mod schema;
