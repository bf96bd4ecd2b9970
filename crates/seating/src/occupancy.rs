//! Status and seat-count transitions for a single allocatable table.
//!
//! Legal status transitions:
//!
//! ```text
//! available <-> occupied      (seat count goes above / back to zero)
//! available <-> reserved      (explicit hold, no seats)
//! available | occupied -> cleaning -> available   (operator driven only)
//! ```
//!
//! Setting a status a table already has is always accepted. When the target
//! is a virtual group row the seats are spread over its members (see
//! [`crate::groups::distribute_seats`]) and the status is mirrored onto them.

use tableside_core::{DomainError, DomainResult, TableId};

use crate::groups::distribute_seats;
use crate::model::{Membership, Table, TableStatus};
use crate::plan::{FloorEvent, FloorPlan};

/// Validate a status transition against the table state machine.
pub fn check_transition(from: TableStatus, to: TableStatus) -> DomainResult<()> {
    use TableStatus::*;

    let legal = from == to
        || matches!(
            (from, to),
            (Available, Occupied)
                | (Occupied, Available)
                | (Available, Reserved)
                | (Reserved, Available)
                | (Available, Cleaning)
                | (Occupied, Cleaning)
                | (Cleaning, Available)
        );

    if legal {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "illegal status transition {from} -> {to}"
        )))
    }
}

fn reject_member(table: &Table) -> DomainResult<()> {
    if let Membership::Member { group_id } = &table.membership {
        return Err(DomainError::conflict(format!(
            "table {} belongs to group {group_id}; change the group instead",
            table.id
        )));
    }
    Ok(())
}

impl FloorPlan {
    pub(crate) fn handle_set_status(
        &self,
        table_id: TableId,
        status: TableStatus,
        seats: u32,
    ) -> DomainResult<Vec<FloorEvent>> {
        let table = self.require(table_id)?;
        self.plan_status(table, status, seats)
    }

    pub(crate) fn handle_set_occupied_seats(
        &self,
        table_id: TableId,
        seats: u32,
    ) -> DomainResult<Vec<FloorEvent>> {
        let table = self.require(table_id)?;
        self.plan_seats(table, seats)
    }

    /// Decide an explicit status change. `seats` only matters for `Occupied`.
    pub(crate) fn plan_status(
        &self,
        table: &Table,
        status: TableStatus,
        seats: u32,
    ) -> DomainResult<Vec<FloorEvent>> {
        reject_member(table)?;

        let occupied = match status {
            TableStatus::Occupied => {
                if seats == 0 || seats > table.capacity {
                    return Err(DomainError::validation(format!(
                        "occupied seats must be between 1 and {} for table {}, got {seats}",
                        table.capacity, table.id
                    )));
                }
                seats
            }
            // available resets, reserved and cleaning force zero
            TableStatus::Available | TableStatus::Reserved | TableStatus::Cleaning => 0,
        };
        check_transition(table.status, status)?;

        self.occupancy_events(table, status, occupied)
    }

    /// Decide a seat-count change; the status follows from the count.
    pub(crate) fn plan_seats(&self, table: &Table, seats: u32) -> DomainResult<Vec<FloorEvent>> {
        reject_member(table)?;

        if seats > table.capacity {
            return Err(DomainError::validation(format!(
                "seats must be between 0 and {} for table {}, got {seats}",
                table.capacity, table.id
            )));
        }
        if !table.status.holds_seats() {
            return Err(DomainError::validation(format!(
                "cannot seat guests at table {} while it is {}",
                table.id, table.status
            )));
        }

        let status = if seats > 0 {
            TableStatus::Occupied
        } else {
            TableStatus::Available
        };
        check_transition(table.status, status)?;

        self.occupancy_events(table, status, seats)
    }

    fn occupancy_events(
        &self,
        table: &Table,
        status: TableStatus,
        seats: u32,
    ) -> DomainResult<Vec<FloorEvent>> {
        let mut events = vec![FloorEvent::OccupancyChanged {
            table_id: table.id,
            status,
            occupied_seats: seats,
        }];

        if table.is_merged_virtual() {
            let members = self.members_of(table)?;
            for (member_id, member_seats) in distribute_seats(&members, seats)? {
                let member_status = match status {
                    TableStatus::Occupied if member_seats == 0 => TableStatus::Available,
                    other => other,
                };
                events.push(FloorEvent::OccupancyChanged {
                    table_id: member_id,
                    status: member_status,
                    occupied_seats: member_seats,
                });
            }
        }

        Ok(events)
    }
}
