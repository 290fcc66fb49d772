//! Core logic for the LMS admin category tree.
//! Normalization, drag resolution, reordering and the mutation façade live
//! here; hosts render the tree and forward gestures.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use config::{load_config, parse_config, ConfigError, OrganizerConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::category::{
    CategoryId, CategoryLevel, CategoryNode, CategoryPatch, CategoryRecord,
    CategoryValidationError, NewCategory,
};
pub use model::course::{Course, CourseId, CourseStatus};
pub use repo::category_repo::{
    CategoryRepoError, CategoryRepoResult, CategoryStore, OrderOutcome, OrderUpdate,
    SqliteCategoryStore,
};
pub use repo::course_repo::{
    CourseListQuery, CourseRepoError, CourseRepository, SqliteCourseRepository,
};
pub use service::category_service::{delete_blocker, CategoryService, CategoryServiceError};
pub use service::course_service::{CourseService, CourseServiceError};
pub use service::move_gate::{GateState, MoveGate, PendingMove};
pub use service::notice::{MutationAction, MutationOutcome, Notice, NoticeKind};
pub use service::organizer::{DragOutcome, TreeOrganizer};
pub use tree::cache::TreeCache;
pub use tree::normalize::{count_descendants, find_node, flatten, normalize, FlatPlacement, LevelIndex};
pub use tree::reorder::{move_within, plan_reorder, ReorderReport};
pub use tree::resolver::{resolve_move, DropPosition, MoveResolution, ResolveError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
