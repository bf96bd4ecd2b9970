//! `FloorPlan`: the table catalog aggregate.
//!
//! All tables of one venue (physical and virtual group rows) live in a single
//! aggregate so that group membership and seat distribution are always
//! validated against a consistent view. Commands are decided by `handle`
//! (pure, no mutation) and committed by `apply`; see the sibling modules for
//! the decision logic of each component.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use tableside_core::entity::{next_id, position_of};
use tableside_core::{Aggregate, AggregateRoot, DomainError, DomainResult, FloorId, GroupId, TableId};

use crate::model::{
    MAX_TABLE_CAPACITY, Membership, NewTable, Section, Table, TablePatch, TableStatus,
};

/// Command accepted by the floor plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableCommand {
    CreateTable(NewTable),
    UpdateTable {
        table_id: TableId,
        patch: TablePatch,
    },
    DeleteTable(TableId),
    SetStatus {
        table_id: TableId,
        status: TableStatus,
        seats: u32,
    },
    SetOccupiedSeats {
        table_id: TableId,
        seats: u32,
    },
    CreateGroup {
        table_ids: Vec<TableId>,
        name: Option<String>,
    },
    DissolveGroup(GroupId),
    AllocateSeats {
        table_id: TableId,
        seats: u32,
    },
    ReleaseSeats(TableId),
}

/// Fact produced by a successful command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FloorEvent {
    TableCreated(Table),
    /// Descriptive fields (number, capacity, section, floor, shape) replaced.
    TableUpdated(Table),
    TableDeleted(TableId),
    OccupancyChanged {
        table_id: TableId,
        status: TableStatus,
        occupied_seats: u32,
    },
    GroupCreated {
        group_id: GroupId,
        virtual_table: Table,
    },
    GroupDissolved {
        group_id: GroupId,
        virtual_table_id: TableId,
        members: Vec<TableId>,
    },
}

impl FloorEvent {
    /// Table rows touched by this event.
    pub fn affected_table_ids(&self) -> Vec<TableId> {
        match self {
            FloorEvent::TableCreated(t) | FloorEvent::TableUpdated(t) => vec![t.id],
            FloorEvent::TableDeleted(id) => vec![*id],
            FloorEvent::OccupancyChanged { table_id, .. } => vec![*table_id],
            FloorEvent::GroupCreated { virtual_table, .. } => {
                let mut ids = vec![virtual_table.id];
                ids.extend_from_slice(virtual_table.member_table_ids());
                ids
            }
            FloorEvent::GroupDissolved {
                virtual_table_id,
                members,
                ..
            } => {
                let mut ids = vec![*virtual_table_id];
                ids.extend_from_slice(members);
                ids
            }
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            FloorEvent::GroupCreated { group_id, .. }
            | FloorEvent::GroupDissolved { group_id, .. } => Some(*group_id),
            _ => None,
        }
    }
}

/// Aggregate holding every table row of a venue.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorPlan {
    tables: Vec<Table>,
    next_table_id: TableId,
    next_group_id: GroupId,
    version: u64,
}

impl Default for FloorPlan {
    fn default() -> Self {
        Self::empty()
    }
}

impl FloorPlan {
    pub fn empty() -> Self {
        Self {
            tables: Vec::new(),
            next_table_id: TableId::new(1),
            next_group_id: GroupId::new(1),
            version: 0,
        }
    }

    /// Rebuild a plan from persisted rows, rejecting any inconsistent snapshot.
    pub fn from_tables(tables: Vec<Table>) -> DomainResult<Self> {
        let next_table_id = next_id(&tables, TableId::new(1), |id| id.next());
        let next_group_id = tables
            .iter()
            .filter_map(Table::group_id)
            .max()
            .map(|id| id.next())
            .unwrap_or(GroupId::new(1));

        let plan = Self {
            tables,
            next_table_id,
            next_group_id,
            version: 0,
        };
        plan.check_invariants()?;
        Ok(plan)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, table_id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn require(&self, table_id: TableId) -> DomainResult<&Table> {
        self.get(table_id)
            .ok_or_else(|| DomainError::not_found(format!("table {table_id}")))
    }

    pub fn list_all(&self) -> Vec<Table> {
        self.tables.clone()
    }

    pub fn list_by_floor(&self, floor_id: FloorId) -> Vec<Table> {
        self.tables
            .iter()
            .filter(|t| t.floor_id == Some(floor_id))
            .cloned()
            .collect()
    }

    pub fn list_by_section(&self, section: &Section) -> Vec<Table> {
        self.tables
            .iter()
            .filter(|t| section.contains(t))
            .cloned()
            .collect()
    }

    /// Allocatable rows (standalone or virtual) that are free right now.
    pub fn list_available(&self) -> Vec<Table> {
        self.allocatable()
            .filter(|t| t.status == TableStatus::Available)
            .cloned()
            .collect()
    }

    pub(crate) fn allocatable(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| t.is_allocatable())
    }

    /// The virtual row representing `group_id`.
    pub(crate) fn virtual_row(&self, group_id: GroupId) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.is_merged_virtual() && t.group_id() == Some(group_id))
    }

    /// Resolve the member rows of a virtual table.
    pub(crate) fn members_of(&self, virtual_table: &Table) -> DomainResult<Vec<&Table>> {
        let ids = virtual_table.member_table_ids();
        if ids.is_empty() {
            return Err(DomainError::invariant(format!(
                "virtual table {} has no members",
                virtual_table.id
            )));
        }
        ids.iter()
            .map(|id| {
                self.get(*id).ok_or_else(|| {
                    DomainError::invariant(format!(
                        "virtual table {} references missing member {id}",
                        virtual_table.id
                    ))
                })
            })
            .collect()
    }

    pub(crate) fn next_table_id(&self) -> TableId {
        self.next_table_id
    }

    pub(crate) fn next_group_id(&self) -> GroupId {
        self.next_group_id
    }

    /// Verify every catalog invariant.
    ///
    /// Returns the first violation found as `InvariantViolation`.
    pub fn check_invariants(&self) -> DomainResult<()> {
        let mut seen = BTreeSet::new();
        let mut groups: BTreeMap<GroupId, &Table> = BTreeMap::new();

        for table in &self.tables {
            if !seen.insert(table.id) {
                return Err(DomainError::invariant(format!("duplicate table id {}", table.id)));
            }
            check_row(table)?;
            if let Membership::Virtual { group_id, .. } = &table.membership {
                if groups.insert(*group_id, table).is_some() {
                    return Err(DomainError::invariant(format!(
                        "group {group_id} has more than one virtual row"
                    )));
                }
            }
        }

        for (group_id, virtual_table) in &groups {
            let members = self.members_of(virtual_table)?;
            if !(2..=3).contains(&members.len()) {
                return Err(DomainError::invariant(format!(
                    "group {group_id} has {} members",
                    members.len()
                )));
            }
            let mut capacity = 0u32;
            let mut occupied = 0u32;
            for member in &members {
                if member.membership != (Membership::Member { group_id: *group_id }) {
                    return Err(DomainError::invariant(format!(
                        "table {} is listed in group {group_id} but not stamped with it",
                        member.id
                    )));
                }
                capacity += member.capacity;
                occupied += member.occupied_seats;
            }
            if capacity != virtual_table.capacity {
                return Err(DomainError::invariant(format!(
                    "group {group_id} capacity {} differs from member total {capacity}",
                    virtual_table.capacity
                )));
            }
            if occupied != virtual_table.occupied_seats {
                return Err(DomainError::invariant(format!(
                    "group {group_id} occupancy {} differs from member total {occupied}",
                    virtual_table.occupied_seats
                )));
            }
        }

        for table in &self.tables {
            if let Membership::Member { group_id } = &table.membership {
                let listed = groups
                    .get(group_id)
                    .is_some_and(|v| v.member_table_ids().contains(&table.id));
                if !listed {
                    return Err(DomainError::invariant(format!(
                        "table {} points at group {group_id} which does not list it",
                        table.id
                    )));
                }
            }
        }

        Ok(())
    }

    fn row_mut(&mut self, table_id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == table_id)
    }
}

fn check_row(table: &Table) -> DomainResult<()> {
    if table.capacity == 0 {
        return Err(DomainError::invariant(format!("table {} has zero capacity", table.id)));
    }
    // virtual rows are checked against their members' total instead
    if !table.is_merged_virtual() && table.capacity > MAX_TABLE_CAPACITY {
        return Err(DomainError::invariant(format!(
            "table {} capacity {} exceeds {MAX_TABLE_CAPACITY}",
            table.id, table.capacity
        )));
    }
    if table.occupied_seats > table.capacity {
        return Err(DomainError::invariant(format!(
            "table {} seats {} exceed capacity {}",
            table.id, table.occupied_seats, table.capacity
        )));
    }
    let consistent = match table.status {
        TableStatus::Occupied => table.occupied_seats > 0,
        TableStatus::Available | TableStatus::Reserved | TableStatus::Cleaning => {
            table.occupied_seats == 0
        }
    };
    if !consistent {
        return Err(DomainError::invariant(format!(
            "table {} is {} with {} seats occupied",
            table.id, table.status, table.occupied_seats
        )));
    }
    Ok(())
}

impl AggregateRoot for FloorPlan {
    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for FloorPlan {
    type Command = TableCommand;
    type Event = FloorEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            FloorEvent::TableCreated(table) => {
                if table.id >= self.next_table_id {
                    self.next_table_id = table.id.next();
                }
                self.tables.push(table.clone());
            }
            FloorEvent::TableUpdated(table) => {
                if let Some(row) = self.row_mut(table.id) {
                    *row = table.clone();
                }
            }
            FloorEvent::TableDeleted(table_id) => {
                if let Some(idx) = position_of(&self.tables, *table_id) {
                    self.tables.remove(idx);
                }
            }
            FloorEvent::OccupancyChanged {
                table_id,
                status,
                occupied_seats,
            } => {
                if let Some(row) = self.row_mut(*table_id) {
                    row.status = *status;
                    row.occupied_seats = *occupied_seats;
                }
            }
            FloorEvent::GroupCreated {
                group_id,
                virtual_table,
            } => {
                for member in virtual_table.member_table_ids() {
                    if let Some(row) = self.row_mut(*member) {
                        row.membership = Membership::Member {
                            group_id: *group_id,
                        };
                    }
                }
                if virtual_table.id >= self.next_table_id {
                    self.next_table_id = virtual_table.id.next();
                }
                if *group_id >= self.next_group_id {
                    self.next_group_id = group_id.next();
                }
                self.tables.push(virtual_table.clone());
            }
            FloorEvent::GroupDissolved {
                virtual_table_id,
                members,
                ..
            } => {
                if let Some(idx) = position_of(&self.tables, *virtual_table_id) {
                    self.tables.remove(idx);
                }
                for member in members {
                    if let Some(row) = self.row_mut(*member) {
                        row.membership = Membership::Standalone;
                        row.status = TableStatus::Available;
                        row.occupied_seats = 0;
                    }
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            TableCommand::CreateTable(new) => self.handle_create(new),
            TableCommand::UpdateTable { table_id, patch } => self.handle_update(*table_id, patch),
            TableCommand::DeleteTable(table_id) => self.handle_delete(*table_id),
            TableCommand::SetStatus {
                table_id,
                status,
                seats,
            } => self.handle_set_status(*table_id, *status, *seats),
            TableCommand::SetOccupiedSeats { table_id, seats } => {
                self.handle_set_occupied_seats(*table_id, *seats)
            }
            TableCommand::CreateGroup { table_ids, name } => {
                self.handle_create_group(table_ids, name.as_deref())
            }
            TableCommand::DissolveGroup(group_id) => self.handle_dissolve_group(*group_id),
            TableCommand::AllocateSeats { table_id, seats } => {
                self.handle_allocate(*table_id, *seats)
            }
            TableCommand::ReleaseSeats(table_id) => self.handle_allocate(*table_id, 0),
        }
    }
}
