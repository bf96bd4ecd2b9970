//! `TableCatalog`: the engine's entry point.
//!
//! One catalog per venue per process. It owns the [`FloorPlan`] behind a lock,
//! persists through an injected [`Storage`] after every committed mutation and
//! announces each change on an injected [`EventBus`].
//!
//! ```text
//! command
//!   ↓
//! 1. write lock
//!   ↓
//! 2. handle + apply on a copy of the plan (nothing visible yet)
//!   ↓
//! 3. invariant check, then swap the copy in
//!   ↓
//! 4. storage.save(all rows)      failure: keep state, mark dirty, report
//!   ↓
//! 5. bus.publish(change)         failure: log only
//! ```
//!
//! Readers take the read lock and get owned snapshots, so no reader ever sees a
//! partially merged or partially allocated plan.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use tableside_core::{Aggregate, DomainError, DomainResult, FloorId, GroupId, TableId};
use tableside_events::{EventBus, EventEnvelope, Subscription};

use crate::change::TableChange;
use crate::groups::GroupView;
use crate::model::{Floor, NewTable, Section, Table, TablePatch, TableStatus};
use crate::plan::{FloorEvent, FloorPlan, TableCommand};
use crate::planner::{MergeSuggestion, SeatingOption};
use crate::stats::{FloorStats, TableStats};
use crate::storage::{Storage, StorageError};

/// `source` stamped on every published envelope.
pub const EVENT_SOURCE: &str = "table_catalog";

pub type ChangeEnvelope = EventEnvelope<TableChange>;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Loading or flushing failed.
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The change was committed in memory and published, but could not be
    /// persisted. `change` names the rows it touched; call
    /// [`TableCatalog::flush`] to retry the save.
    #[error("change applied but not persisted: {source}")]
    NotPersisted {
        source: StorageError,
        change: TableChange,
    },

    #[error("catalog lock poisoned")]
    Poisoned,
}

impl CatalogError {
    /// The domain error, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            CatalogError::Domain(e) => Some(e),
            _ => None,
        }
    }

    /// The committed but unsaved change, if the failure came after commit.
    pub fn committed(&self) -> Option<&TableChange> {
        match self {
            CatalogError::NotPersisted { change, .. } => Some(change),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct CatalogState {
    plan: FloorPlan,
    sequence: u64,
    dirty: bool,
}

pub struct TableCatalog<S, B> {
    state: RwLock<CatalogState>,
    storage: S,
    bus: B,
}

impl<S, B> TableCatalog<S, B>
where
    S: Storage,
    B: EventBus<ChangeEnvelope>,
{
    /// Load the persisted rows and start serving.
    pub fn open(storage: S, bus: B) -> CatalogResult<Self> {
        let tables = storage.load()?;
        let plan = FloorPlan::from_tables(tables).inspect_err(|e| {
            error!(error = %e, "refusing to open catalog from inconsistent storage");
        })?;
        info!(tables = plan.tables().len(), "table catalog opened");

        Ok(Self {
            state: RwLock::new(CatalogState {
                plan,
                sequence: 0,
                dirty: false,
            }),
            storage,
            bus,
        })
    }


    // ---- TableStore ------------------------------------------------------

    pub fn create_table(&self, new: NewTable) -> CatalogResult<Table> {
        self.execute(TableCommand::CreateTable(new), |plan, events| {
            let table_id = events
                .first()
                .and_then(|e| e.affected_table_ids().first().copied())
                .ok_or_else(|| DomainError::invariant("table creation produced no events"))?;
            plan.require(table_id).cloned()
        })
    }

    pub fn update_table(&self, table_id: TableId, patch: TablePatch) -> CatalogResult<Table> {
        self.execute(TableCommand::UpdateTable { table_id, patch }, row(table_id))
    }

    pub fn delete_table(&self, table_id: TableId) -> CatalogResult<()> {
        self.execute(TableCommand::DeleteTable(table_id), |_, _| Ok(()))
    }

    pub fn get_by_id(&self, table_id: TableId) -> CatalogResult<Table> {
        Ok(self.read()?.plan.require(table_id)?.clone())
    }

    pub fn list_all(&self) -> CatalogResult<Vec<Table>> {
        Ok(self.read()?.plan.list_all())
    }

    pub fn list_by_floor(&self, floor_id: FloorId) -> CatalogResult<Vec<Table>> {
        Ok(self.read()?.plan.list_by_floor(floor_id))
    }

    pub fn list_by_section(&self, section: &Section) -> CatalogResult<Vec<Table>> {
        Ok(self.read()?.plan.list_by_section(section))
    }

    pub fn list_available(&self) -> CatalogResult<Vec<Table>> {
        Ok(self.read()?.plan.list_available())
    }

    // ---- OccupancyController ---------------------------------------------

    pub fn set_status(
        &self,
        table_id: TableId,
        status: TableStatus,
        seats: u32,
    ) -> CatalogResult<Table> {
        self.execute(
            TableCommand::SetStatus {
                table_id,
                status,
                seats,
            },
            row(table_id),
        )
    }

    pub fn set_occupied_seats(&self, table_id: TableId, seats: u32) -> CatalogResult<Table> {
        self.execute(
            TableCommand::SetOccupiedSeats { table_id, seats },
            row(table_id),
        )
    }

    // ---- GroupManager ----------------------------------------------------

    pub fn create_group(
        &self,
        table_ids: Vec<TableId>,
        name: Option<String>,
    ) -> CatalogResult<GroupView> {
        self.execute(TableCommand::CreateGroup { table_ids, name }, |plan, events| {
            let group_id = events
                .iter()
                .find_map(FloorEvent::group_id)
                .ok_or_else(|| DomainError::invariant("group creation produced no group"))?;
            plan.get_group(group_id)
        })
    }

    pub fn dissolve_group(&self, group_id: GroupId) -> CatalogResult<()> {
        self.execute(TableCommand::DissolveGroup(group_id), |_, _| Ok(()))
    }

    pub fn get_group(&self, group_id: GroupId) -> CatalogResult<GroupView> {
        Ok(self.read()?.plan.get_group(group_id)?)
    }

    pub fn list_groups(&self) -> CatalogResult<Vec<GroupView>> {
        Ok(self.read()?.plan.list_groups()?)
    }

    // ---- AllocationPlanner -----------------------------------------------

    /// Seat a party of `seats` at a table or group (replacing any current count).
    pub fn allocate_seats(&self, table_id: TableId, seats: u32) -> CatalogResult<Table> {
        self.execute(TableCommand::AllocateSeats { table_id, seats }, row(table_id))
    }

    pub fn release_seats(&self, table_id: TableId) -> CatalogResult<Table> {
        self.execute(TableCommand::ReleaseSeats(table_id), row(table_id))
    }

    pub fn find_seating_options(
        &self,
        party_size: u32,
        preferred_section: Option<&str>,
    ) -> CatalogResult<Vec<SeatingOption>> {
        Ok(self
            .read()?
            .plan
            .find_seating_options(party_size, preferred_section)?)
    }

    pub fn suggest_merges(
        &self,
        party_size: u32,
        preferred_section: Option<&str>,
        limit: usize,
    ) -> CatalogResult<Vec<MergeSuggestion>> {
        Ok(self
            .read()?
            .plan
            .suggest_merges(party_size, preferred_section, limit)?)
    }

    // ---- StatsAggregator -------------------------------------------------

    pub fn compute_stats(&self) -> CatalogResult<TableStats> {
        Ok(self.read()?.plan.compute_stats())
    }

    pub fn compute_floor_stats(&self, floor: &Floor) -> CatalogResult<FloorStats> {
        Ok(self.read()?.plan.compute_floor_stats(floor))
    }

    // ---- lifecycle -------------------------------------------------------

    /// Owned copy of the whole plan, consistent as of one instant.
    pub fn snapshot(&self) -> CatalogResult<FloorPlan> {
        Ok(self.read()?.plan.clone())
    }

    /// Whether the last save failed and in-memory state is ahead of storage.
    pub fn is_dirty(&self) -> CatalogResult<bool> {
        Ok(self.read()?.dirty)
    }

    /// Persist the current rows, retrying a previously failed save.
    pub fn flush(&self) -> CatalogResult<()> {
        let mut state = self.write()?;
        self.storage.save(state.plan.tables())?;
        state.dirty = false;
        Ok(())
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> Subscription<ChangeEnvelope> {
        self.bus.subscribe()
    }

    fn read(&self) -> CatalogResult<RwLockReadGuard<'_, CatalogState>> {
        self.state.read().map_err(|_| CatalogError::Poisoned)
    }

    fn write(&self) -> CatalogResult<RwLockWriteGuard<'_, CatalogState>> {
        self.state.write().map_err(|_| CatalogError::Poisoned)
    }

    /// Run `command` and read its outcome from the committed plan, all under
    /// the write lock.
    fn execute<T, F>(&self, command: TableCommand, outcome: F) -> CatalogResult<T>
    where
        F: FnOnce(&FloorPlan, &[FloorEvent]) -> DomainResult<T>,
    {
        let mut state = self.write()?;

        let mut next = state.plan.clone();
        let events = next.execute(&command)?;
        if let Err(violation) = next.check_invariants() {
            error!(error = %violation, ?command, "command would break catalog invariants");
            if cfg!(debug_assertions) {
                panic!("catalog invariant violated by {command:?}: {violation}");
            }
            return Err(violation.into());
        }
        state.plan = next;
        state.sequence += 1;
        let result = outcome(&state.plan, &events);

        let change = TableChange::from_events(&command, &events, Utc::now());
        info!(
            operation = change.operation.as_str(),
            tables = ?change.affected_table_ids,
            group_id = ?change.group_id,
            sequence = state.sequence,
            "catalog change committed"
        );

        let saved = self.storage.save(state.plan.tables());
        if let Err(e) = &saved {
            warn!(error = %e, sequence = state.sequence, "failed to persist catalog change");
        }
        state.dirty = saved.is_err();

        let envelope = EventEnvelope::wrap(EVENT_SOURCE, state.sequence, change.clone());
        if let Err(e) = self.bus.publish(envelope) {
            warn!(error = ?e, sequence = state.sequence, "failed to publish catalog change");
        }

        if let Err(source) = saved {
            return Err(CatalogError::NotPersisted { source, change });
        }
        Ok(result?)
    }
}

fn row(table_id: TableId) -> impl FnOnce(&FloorPlan, &[FloorEvent]) -> DomainResult<Table> {
    move |plan, _| plan.require(table_id).cloned()
}
