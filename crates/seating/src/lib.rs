//! Table & seat allocation engine.
//!
//! Tracks physical tables, merges 2–3 of them into a virtual table, seats
//! parties on tables or groups and derives occupancy statistics. Decision
//! logic lives on the [`FloorPlan`] aggregate (pure, no IO); [`TableCatalog`]
//! wraps it with locking, persistence and change notification.

pub mod catalog;
pub mod change;
pub mod groups;
pub mod model;
pub mod occupancy;
pub mod plan;
pub mod planner;
pub mod stats;
pub mod storage;

mod store;

pub use catalog::{CatalogError, CatalogResult, ChangeEnvelope, TableCatalog};
pub use change::{ChangeOperation, TableChange};
pub use groups::{GroupTotals, GroupView, distribute_seats};
pub use model::{
    DEFAULT_SECTION, Environment, MAX_TABLE_CAPACITY, Floor, Membership, NewTable, Section, Table, TablePatch,
    TableStatus,
};
pub use plan::{FloorEvent, FloorPlan, TableCommand};
pub use planner::{MergeSuggestion, OptionKind, SeatingOption};
pub use stats::{FloorStats, TableStats};
pub use storage::{InMemoryStorage, Storage, StorageError};
