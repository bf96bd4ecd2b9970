//! Table, floor and section records.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tableside_core::{Entity, FloorId, GroupId, SectionId, TableId};

/// Section name given to tables created without one.
pub const DEFAULT_SECTION: &str = "Main";

/// Largest capacity a physical table may have.
///
/// Keeps every group total (at most three members) and every seat sum well
/// inside `u32`.
pub const MAX_TABLE_CAPACITY: u32 = 1_000;

/// Operational status of a table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Cleaning,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::Reserved => "reserved",
            TableStatus::Cleaning => "cleaning",
        }
    }

    /// Whether seats can be counted while in this status.
    pub fn holds_seats(&self) -> bool {
        matches!(self, TableStatus::Available | TableStatus::Occupied)
    }
}

impl core::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a table row takes part in grouping.
///
/// Totals and allocation listings only ever look at `Standalone` and
/// `Virtual` rows; a `Member` is represented by its group's virtual row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Membership {
    Standalone,
    Member {
        group_id: GroupId,
    },
    Virtual {
        group_id: GroupId,
        members: Vec<TableId>,
    },
}

/// A seating resource: a physical table or the virtual row of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    /// Number shown to staff ("T9", "12", "Bar 3").
    pub number: String,
    pub capacity: u32,
    pub status: TableStatus,
    pub occupied_seats: u32,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<FloorId>,
    /// Floor-plan geometry owned by the view layer; never inspected here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<JsonValue>,
    pub membership: Membership,
}

impl Table {
    /// Seats that can still be given out. Zero while reserved or being cleaned.
    pub fn available_seats(&self) -> u32 {
        if self.status.holds_seats() {
            self.capacity.saturating_sub(self.occupied_seats)
        } else {
            0
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match &self.membership {
            Membership::Standalone => None,
            Membership::Member { group_id } | Membership::Virtual { group_id, .. } => {
                Some(*group_id)
            }
        }
    }

    pub fn is_merged_virtual(&self) -> bool {
        matches!(self.membership, Membership::Virtual { .. })
    }

    pub fn is_group_member(&self) -> bool {
        matches!(self.membership, Membership::Member { .. })
    }

    /// Member ids of a virtual row; empty for every other row.
    pub fn member_table_ids(&self) -> &[TableId] {
        match &self.membership {
            Membership::Virtual { members, .. } => members,
            _ => &[],
        }
    }

    /// Standalone tables and virtual group rows: the units seats are allocated to.
    pub fn is_allocatable(&self) -> bool {
        !self.is_group_member()
    }
}

impl Entity for Table {
    type Id = TableId;

    fn id(&self) -> TableId {
        self.id
    }
}

/// Input for creating a physical table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewTable {
    pub number: String,
    pub capacity: u32,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub floor_id: Option<FloorId>,
    #[serde(default)]
    pub shape: Option<JsonValue>,
}

impl NewTable {
    pub fn new(number: impl Into<String>, capacity: u32) -> Self {
        Self {
            number: number.into(),
            capacity,
            ..Self::default()
        }
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn on_floor(mut self, floor_id: FloorId) -> Self {
        self.floor_id = Some(floor_id);
        self
    }
}

/// Partial update of a table. `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TablePatch {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub floor_id: Option<FloorId>,
    #[serde(default)]
    pub shape: Option<JsonValue>,
    #[serde(default)]
    pub status: Option<TableStatus>,
    #[serde(default)]
    pub occupied_seats: Option<u32>,
}

impl TablePatch {
    pub fn touches_occupancy(&self) -> bool {
        self.status.is_some() || self.occupied_seats.is_some()
    }
}

/// Kind of space a floor represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Indoor,
    Outdoor,
    Terrace,
    Bar,
}

/// A floor of the venue. Container only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub id: FloorId,
    pub name: String,
    pub environment: Environment,
}

impl Entity for Floor {
    type Id = FloorId;

    fn id(&self) -> FloorId {
        self.id
    }
}

/// A named zone on a floor. Tables refer to sections by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub floor_id: FloorId,
}

impl Section {
    /// Whether `table` sits in this section.
    pub fn contains(&self, table: &Table) -> bool {
        table.section == self.name && table.floor_id == Some(self.floor_id)
    }
}

impl Entity for Section {
    type Id = SectionId;

    fn id(&self) -> SectionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(status: TableStatus, capacity: u32, occupied: u32) -> Table {
        Table {
            id: TableId::new(1),
            number: "T1".to_string(),
            capacity,
            status,
            occupied_seats: occupied,
            section: DEFAULT_SECTION.to_string(),
            floor_id: None,
            shape: None,
            membership: Membership::Standalone,
        }
    }

    #[test]
    fn available_seats_follow_status() {
        assert_eq!(table(TableStatus::Available, 4, 0).available_seats(), 4);
        assert_eq!(table(TableStatus::Occupied, 4, 3).available_seats(), 1);
        assert_eq!(table(TableStatus::Reserved, 4, 0).available_seats(), 0);
        assert_eq!(table(TableStatus::Cleaning, 4, 0).available_seats(), 0);
    }

    #[test]
    fn membership_accessors() {
        let mut t = table(TableStatus::Available, 4, 0);
        assert_eq!(t.group_id(), None);
        assert!(t.is_allocatable());

        t.membership = Membership::Member {
            group_id: GroupId::new(2),
        };
        assert_eq!(t.group_id(), Some(GroupId::new(2)));
        assert!(!t.is_allocatable());
        assert!(t.member_table_ids().is_empty());

        t.membership = Membership::Virtual {
            group_id: GroupId::new(2),
            members: vec![TableId::new(5), TableId::new(6)],
        };
        assert!(t.is_merged_virtual());
        assert_eq!(t.member_table_ids(), &[TableId::new(5), TableId::new(6)]);
    }

    #[test]
    fn membership_serializes_with_kind_tag() {
        let json = serde_json::to_value(Membership::Member {
            group_id: GroupId::new(9),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"kind": "member", "group_id": 9}));
    }

    #[test]
    fn section_membership_checks_name_and_floor() {
        let section = Section {
            id: SectionId::new(1),
            name: "Patio".to_string(),
            floor_id: FloorId::new(2),
        };
        let mut t = table(TableStatus::Available, 2, 0);
        t.section = "Patio".to_string();
        assert!(!section.contains(&t));
        t.floor_id = Some(FloorId::new(2));
        assert!(section.contains(&t));
    }
}
