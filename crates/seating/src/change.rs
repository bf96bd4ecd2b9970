//! Change notifications published after every committed catalog mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tableside_core::{GroupId, TableId};
use tableside_events::Event;

use crate::plan::{FloorEvent, TableCommand};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOperation {
    #[serde(rename = "table.created")]
    TableCreated,
    #[serde(rename = "table.updated")]
    TableUpdated,
    #[serde(rename = "table.deleted")]
    TableDeleted,
    #[serde(rename = "table.status_changed")]
    StatusChanged,
    #[serde(rename = "table.seats_changed")]
    SeatsChanged,
    #[serde(rename = "group.created")]
    GroupCreated,
    #[serde(rename = "group.dissolved")]
    GroupDissolved,
    #[serde(rename = "seats.allocated")]
    SeatsAllocated,
}

impl ChangeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOperation::TableCreated => "table.created",
            ChangeOperation::TableUpdated => "table.updated",
            ChangeOperation::TableDeleted => "table.deleted",
            ChangeOperation::StatusChanged => "table.status_changed",
            ChangeOperation::SeatsChanged => "table.seats_changed",
            ChangeOperation::GroupCreated => "group.created",
            ChangeOperation::GroupDissolved => "group.dissolved",
            ChangeOperation::SeatsAllocated => "seats.allocated",
        }
    }
}

impl TableCommand {
    pub fn operation(&self) -> ChangeOperation {
        match self {
            TableCommand::CreateTable(_) => ChangeOperation::TableCreated,
            TableCommand::UpdateTable { .. } => ChangeOperation::TableUpdated,
            TableCommand::DeleteTable(_) => ChangeOperation::TableDeleted,
            TableCommand::SetStatus { .. } => ChangeOperation::StatusChanged,
            TableCommand::SetOccupiedSeats { .. } => ChangeOperation::SeatsChanged,
            TableCommand::CreateGroup { .. } => ChangeOperation::GroupCreated,
            TableCommand::DissolveGroup(_) => ChangeOperation::GroupDissolved,
            TableCommand::AllocateSeats { .. } | TableCommand::ReleaseSeats(_) => {
                ChangeOperation::SeatsAllocated
            }
        }
    }
}

/// What changed, for views that need to refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub operation: ChangeOperation,
    /// Sorted, without duplicates.
    pub affected_table_ids: Vec<TableId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    pub occurred_at: DateTime<Utc>,
}

impl TableChange {
    pub fn from_events(
        command: &TableCommand,
        events: &[FloorEvent],
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let mut affected_table_ids: Vec<TableId> =
            events.iter().flat_map(FloorEvent::affected_table_ids).collect();
        affected_table_ids.sort();
        affected_table_ids.dedup();

        Self {
            operation: command.operation(),
            affected_table_ids,
            group_id: events.iter().find_map(FloorEvent::group_id),
            occurred_at,
        }
    }
}

impl Event for TableChange {
    fn event_type(&self) -> &'static str {
        self.operation.as_str()
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Membership, Table, TableStatus};

    #[test]
    fn collects_sorted_unique_table_ids() {
        let group_id = GroupId::new(1);
        let events = vec![FloorEvent::GroupCreated {
            group_id,
            virtual_table: Table {
                id: TableId::new(5),
                number: "T2+T1".to_string(),
                capacity: 6,
                status: TableStatus::Available,
                occupied_seats: 0,
                section: "Main".to_string(),
                floor_id: None,
                shape: None,
                membership: Membership::Virtual {
                    group_id,
                    members: vec![TableId::new(2), TableId::new(1)],
                },
            },
        }];
        let command = TableCommand::CreateGroup {
            table_ids: vec![TableId::new(2), TableId::new(1)],
            name: None,
        };

        let change = TableChange::from_events(&command, &events, Utc::now());
        assert_eq!(change.operation, ChangeOperation::GroupCreated);
        assert_eq!(
            change.affected_table_ids,
            vec![TableId::new(1), TableId::new(2), TableId::new(5)]
        );
        assert_eq!(change.group_id, Some(group_id));
        assert_eq!(change.event_type(), "group.created");
    }

    #[test]
    fn operation_serializes_as_dotted_name() {
        let json = serde_json::to_string(&ChangeOperation::SeatsAllocated).unwrap();
        assert_eq!(json, "\"seats.allocated\"");
        assert_eq!(TableCommand::ReleaseSeats(TableId::new(1)).operation(), ChangeOperation::SeatsAllocated);
    }
}
