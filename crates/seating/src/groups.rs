//! Table groups: merging 2–3 tables into one virtual, allocatable row.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tableside_core::{DomainError, DomainResult, GroupId, TableId};

use crate::model::{Membership, Table, TableStatus};
use crate::plan::{FloorEvent, FloorPlan};

pub const MIN_GROUP_SIZE: usize = 2;
pub const MAX_GROUP_SIZE: usize = 3;

/// Aggregated seat figures of a group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub member_count: usize,
    pub capacity: u32,
    pub occupied_seats: u32,
    pub available_seats: u32,
}

/// Read-only composition of a group: its virtual row plus member rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupView {
    pub group_id: GroupId,
    pub virtual_table: Table,
    pub members: Vec<Table>,
    pub totals: GroupTotals,
}

/// Spread `seats` over `members`, largest table first.
///
/// Members are ordered by capacity descending (ties by ascending id) and each
/// takes `min(remaining, capacity)`. Every member appears in the result, in
/// that order, even when it receives nothing.
pub fn distribute_seats(members: &[&Table], seats: u32) -> DomainResult<Vec<(TableId, u32)>> {
    let total: u32 = members.iter().map(|m| m.capacity).sum();
    if seats > total {
        return Err(DomainError::conflict(format!(
            "{seats} seats exceed combined capacity {total}"
        )));
    }

    let mut ordered: Vec<&Table> = members.to_vec();
    ordered.sort_by_key(|m| (Reverse(m.capacity), m.id));

    let mut remaining = seats;
    Ok(ordered
        .into_iter()
        .map(|member| {
            let take = remaining.min(member.capacity);
            remaining -= take;
            (member.id, take)
        })
        .collect())
}

impl FloorPlan {
    pub(crate) fn handle_create_group(
        &self,
        table_ids: &[TableId],
        name: Option<&str>,
    ) -> DomainResult<Vec<FloorEvent>> {
        if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&table_ids.len()) {
            return Err(DomainError::validation(format!(
                "a group needs {MIN_GROUP_SIZE} to {MAX_GROUP_SIZE} tables, got {}",
                table_ids.len()
            )));
        }
        let unique: BTreeSet<_> = table_ids.iter().collect();
        if unique.len() != table_ids.len() {
            return Err(DomainError::validation("a table cannot be merged with itself"));
        }

        let mut members = Vec::with_capacity(table_ids.len());
        for table_id in table_ids {
            let table = self.require(*table_id)?;
            match &table.membership {
                Membership::Standalone => {}
                Membership::Member { group_id } => {
                    return Err(DomainError::conflict(format!(
                        "table {table_id} already belongs to group {group_id}"
                    )));
                }
                Membership::Virtual { group_id, .. } => {
                    return Err(DomainError::conflict(format!(
                        "table {table_id} is the virtual row of group {group_id}"
                    )));
                }
            }
            if table.status != TableStatus::Available {
                return Err(DomainError::conflict(format!(
                    "table {table_id} is {} and cannot be merged",
                    table.status
                )));
            }
            members.push(table);
        }

        let number = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => members
                .iter()
                .map(|m| m.number.as_str())
                .collect::<Vec<_>>()
                .join("+"),
        };
        let first = members[0];
        let group_id = self.next_group_id();

        Ok(vec![FloorEvent::GroupCreated {
            group_id,
            virtual_table: Table {
                id: self.next_table_id(),
                number,
                capacity: members.iter().map(|m| m.capacity).sum(),
                status: TableStatus::Available,
                occupied_seats: 0,
                section: first.section.clone(),
                floor_id: first.floor_id,
                shape: None,
                membership: Membership::Virtual {
                    group_id,
                    members: table_ids.to_vec(),
                },
            },
        }])
    }

    pub(crate) fn handle_dissolve_group(&self, group_id: GroupId) -> DomainResult<Vec<FloorEvent>> {
        let virtual_table = self
            .virtual_row(group_id)
            .ok_or_else(|| DomainError::not_found(format!("group {group_id}")))?;
        // resolve to surface dangling member references before removing anything
        let members = self.members_of(virtual_table)?;

        Ok(vec![FloorEvent::GroupDissolved {
            group_id,
            virtual_table_id: virtual_table.id,
            members: members.iter().map(|m| m.id).collect(),
        }])
    }

    pub fn get_group(&self, group_id: GroupId) -> DomainResult<GroupView> {
        let virtual_table = self
            .virtual_row(group_id)
            .ok_or_else(|| DomainError::not_found(format!("group {group_id}")))?;
        self.group_view(group_id, virtual_table)
    }

    pub fn list_groups(&self) -> DomainResult<Vec<GroupView>> {
        self.tables()
            .iter()
            .filter_map(|t| match &t.membership {
                Membership::Virtual { group_id, .. } => Some((*group_id, t)),
                _ => None,
            })
            .map(|(group_id, t)| self.group_view(group_id, t))
            .collect()
    }

    fn group_view(&self, group_id: GroupId, virtual_table: &Table) -> DomainResult<GroupView> {
        let members: Vec<Table> = self
            .members_of(virtual_table)?
            .into_iter()
            .cloned()
            .collect();

        Ok(GroupView {
            group_id,
            totals: GroupTotals {
                member_count: members.len(),
                capacity: members.iter().map(|m| m.capacity).sum(),
                occupied_seats: members.iter().map(|m| m.occupied_seats).sum(),
                available_seats: virtual_table.available_seats(),
            },
            virtual_table: virtual_table.clone(),
            members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableCommand;
    use crate::model::NewTable;
    use tableside_core::Aggregate;

    fn plan_with(capacities: &[u32]) -> FloorPlan {
        let mut plan = FloorPlan::empty();
        for (idx, capacity) in capacities.iter().enumerate() {
            plan.execute(&TableCommand::CreateTable(NewTable::new(
                format!("T{}", idx + 1),
                *capacity,
            )))
            .unwrap();
        }
        plan
    }

    fn t(id: u64) -> TableId {
        TableId::new(id)
    }

    fn merge(plan: &mut FloorPlan, ids: &[u64], name: Option<&str>) -> DomainResult<Vec<FloorEvent>> {
        plan.execute(&TableCommand::CreateGroup {
            table_ids: ids.iter().copied().map(TableId::new).collect(),
            name: name.map(str::to_string),
        })
    }

    #[test]
    fn create_group_builds_virtual_row() {
        let mut plan = plan_with(&[4, 6]);
        let events = merge(&mut plan, &[1, 2], None).unwrap();
        let group_id = events[0].group_id().unwrap();

        let view = plan.get_group(group_id).unwrap();
        assert_eq!(view.virtual_table.id, t(3));
        assert_eq!(view.virtual_table.number, "T1+T2");
        assert_eq!(view.virtual_table.capacity, 10);
        assert_eq!(view.virtual_table.status, TableStatus::Available);
        assert!(view.virtual_table.is_merged_virtual());
        assert_eq!(view.virtual_table.member_table_ids(), &[t(1), t(2)]);
        assert_eq!(view.totals.member_count, 2);
        assert_eq!(view.totals.capacity, 10);
        assert_eq!(view.totals.available_seats, 10);

        for member in &view.members {
            assert_eq!(member.group_id(), Some(group_id));
            assert!(!member.is_allocatable());
        }
    }

    #[test]
    fn create_group_uses_given_name() {
        let mut plan = plan_with(&[2, 2, 2]);
        merge(&mut plan, &[1, 2, 3], Some(" Birthday ")).unwrap();
        assert_eq!(plan.get(t(4)).unwrap().number, "Birthday");
        assert_eq!(plan.get(t(4)).unwrap().capacity, 6);
    }

    #[test]
    fn create_group_rejects_bad_sizes_and_duplicates() {
        let mut plan = plan_with(&[2, 2, 2, 2]);
        assert!(matches!(merge(&mut plan, &[1], None), Err(DomainError::Validation(_))));
        assert!(matches!(
            merge(&mut plan, &[1, 2, 3, 4], None),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(merge(&mut plan, &[1, 1], None), Err(DomainError::Validation(_))));
        assert!(matches!(merge(&mut plan, &[1, 9], None), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn create_group_rejects_unavailable_or_grouped_tables() {
        let mut plan = plan_with(&[2, 2, 2, 2]);
        plan.execute(&TableCommand::SetOccupiedSeats {
            table_id: t(1),
            seats: 1,
        })
        .unwrap();
        assert!(matches!(merge(&mut plan, &[1, 2], None), Err(DomainError::Conflict(_))));

        merge(&mut plan, &[2, 3], None).unwrap();
        let before = plan.clone();
        assert!(matches!(merge(&mut plan, &[3, 4], None), Err(DomainError::Conflict(_))));
        // the virtual row itself cannot be merged again
        assert!(matches!(merge(&mut plan, &[5, 4], None), Err(DomainError::Conflict(_))));
        assert_eq!(plan, before);
    }

    #[test]
    fn dissolve_restores_members() {
        let mut plan = plan_with(&[4, 6]);
        let events = merge(&mut plan, &[1, 2], None).unwrap();
        let group_id = events[0].group_id().unwrap();
        plan.execute(&TableCommand::AllocateSeats {
            table_id: t(3),
            seats: 7,
        })
        .unwrap();

        plan.execute(&TableCommand::DissolveGroup(group_id)).unwrap();

        assert!(plan.get(t(3)).is_none());
        for (id, capacity) in [(1, 4), (2, 6)] {
            let table = plan.get(t(id)).unwrap();
            assert_eq!(table.status, TableStatus::Available);
            assert_eq!(table.occupied_seats, 0);
            assert_eq!(table.group_id(), None);
            assert_eq!(table.capacity, capacity);
        }
        assert!(matches!(plan.get_group(group_id), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn dissolve_unknown_group_is_not_found() {
        let plan = plan_with(&[4]);
        assert!(matches!(
            plan.handle_dissolve_group(GroupId::new(3)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn group_ids_are_not_reused_after_dissolve() {
        let mut plan = plan_with(&[2, 2]);
        let first = merge(&mut plan, &[1, 2], None).unwrap()[0].group_id().unwrap();
        plan.execute(&TableCommand::DissolveGroup(first)).unwrap();
        let second = merge(&mut plan, &[1, 2], None).unwrap()[0].group_id().unwrap();
        assert_ne!(first, second);
        assert_eq!(plan.list_groups().unwrap().len(), 1);
    }

    #[test]
    fn distribute_fills_largest_first() {
        let plan = plan_with(&[4, 6]);
        let members: Vec<&Table> = plan.tables().iter().collect();
        let assignments = distribute_seats(&members, 7).unwrap();
        assert_eq!(assignments, vec![(t(2), 6), (t(1), 1)]);
    }

    #[test]
    fn distribute_breaks_capacity_ties_by_id() {
        let plan = plan_with(&[4, 4, 2]);
        let mut members: Vec<&Table> = plan.tables().iter().collect();
        members.reverse();
        let assignments = distribute_seats(&members, 5).unwrap();
        assert_eq!(assignments, vec![(t(1), 4), (t(2), 1), (t(3), 0)]);
    }

    #[test]
    fn distribute_rejects_overflow() {
        let plan = plan_with(&[2, 2]);
        let members: Vec<&Table> = plan.tables().iter().collect();
        assert!(matches!(distribute_seats(&members, 5), Err(DomainError::Conflict(_))));
    }
}
