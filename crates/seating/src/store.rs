//! Table CRUD decisions: create, shallow update, delete.

use tableside_core::{DomainError, DomainResult, TableId};

use crate::model::{
    DEFAULT_SECTION, MAX_TABLE_CAPACITY, Membership, NewTable, Table, TablePatch, TableStatus,
};
use crate::plan::{FloorEvent, FloorPlan};

fn non_empty(value: &str, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn check_capacity(capacity: u32) -> DomainResult<()> {
    if capacity == 0 || capacity > MAX_TABLE_CAPACITY {
        return Err(DomainError::validation(format!(
            "capacity must be between 1 and {MAX_TABLE_CAPACITY}, got {capacity}"
        )));
    }
    Ok(())
}

impl FloorPlan {
    pub(crate) fn handle_create(&self, new: &NewTable) -> DomainResult<Vec<FloorEvent>> {
        let number = non_empty(&new.number, "table number")?;
        check_capacity(new.capacity)?;
        let section = match new.section.as_deref().map(str::trim) {
            Some(section) if !section.is_empty() => section.to_string(),
            _ => DEFAULT_SECTION.to_string(),
        };

        Ok(vec![FloorEvent::TableCreated(Table {
            id: self.next_table_id(),
            number,
            capacity: new.capacity,
            status: TableStatus::Available,
            occupied_seats: 0,
            section,
            floor_id: new.floor_id,
            shape: new.shape.clone(),
            membership: Membership::Standalone,
        })])
    }

    pub(crate) fn handle_update(
        &self,
        table_id: TableId,
        patch: &TablePatch,
    ) -> DomainResult<Vec<FloorEvent>> {
        let current = self.require(table_id)?;
        let mut updated = current.clone();

        if let Some(number) = &patch.number {
            updated.number = non_empty(number, "table number")?;
        }
        if let Some(capacity) = patch.capacity {
            if capacity != current.capacity {
                check_capacity(capacity)?;
                if let Some(group_id) = current.group_id() {
                    return Err(DomainError::conflict(format!(
                        "capacity of table {table_id} is fixed while group {group_id} is live"
                    )));
                }
            }
            if capacity < current.occupied_seats {
                return Err(DomainError::validation(format!(
                    "capacity {capacity} is below the {} seats occupied at table {table_id}",
                    current.occupied_seats
                )));
            }
            updated.capacity = capacity;
        }
        if let Some(section) = &patch.section {
            updated.section = non_empty(section, "section")?;
        }
        if let Some(floor_id) = patch.floor_id {
            updated.floor_id = Some(floor_id);
        }
        if let Some(shape) = &patch.shape {
            updated.shape = Some(shape.clone());
        }

        let mut events = Vec::new();
        if patch.touches_occupancy() {
            events = match patch.status {
                Some(status) => {
                    self.plan_status(&updated, status, patch.occupied_seats.unwrap_or(0))?
                }
                None => self.plan_seats(&updated, patch.occupied_seats.unwrap_or(0))?,
            };
        }
        events.insert(0, FloorEvent::TableUpdated(updated));

        Ok(events)
    }

    pub(crate) fn handle_delete(&self, table_id: TableId) -> DomainResult<Vec<FloorEvent>> {
        let table = self.require(table_id)?;
        match &table.membership {
            Membership::Standalone => Ok(vec![FloorEvent::TableDeleted(table_id)]),
            Membership::Member { group_id } => Err(DomainError::conflict(format!(
                "table {table_id} belongs to group {group_id}; dissolve the group first"
            ))),
            Membership::Virtual { group_id, .. } => Err(DomainError::conflict(format!(
                "table {table_id} is the virtual row of group {group_id}; dissolve the group instead"
            ))),
        }
    }
}
