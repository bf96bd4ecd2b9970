//! Seat allocation and seating-option ranking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tableside_core::{DomainError, DomainResult, TableId};

use crate::model::{Membership, Table, TableStatus};
use crate::plan::{FloorEvent, FloorPlan};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Single,
    Merged,
}

/// A free allocatable row that can take the whole party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatingOption {
    pub kind: OptionKind,
    pub table_id: TableId,
    pub number: String,
    pub capacity: u32,
    pub section: String,
    /// `party_size / capacity`; 1.0 is a perfect fit.
    pub efficiency: f64,
    pub member_count: usize,
}

impl SeatingOption {
    /// Seats that would stay empty.
    pub fn spare_seats(&self, party_size: u32) -> u32 {
        self.capacity - party_size
    }
}

/// Standalone tables that could be merged to seat a party no single table fits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSuggestion {
    pub table_ids: Vec<TableId>,
    pub combined_capacity: u32,
    pub section: String,
    pub spare_seats: u32,
}

fn require_party(party_size: u32) -> DomainResult<()> {
    if party_size == 0 {
        return Err(DomainError::validation("party size must be at least 1"));
    }
    Ok(())
}

/// True when the combination seats the party and no member is superfluous.
fn fits_minimally(combo: &[&Table], party_size: u32) -> bool {
    let total: u32 = combo.iter().map(|t| t.capacity).sum();
    total >= party_size && combo.iter().all(|t| total - t.capacity < party_size)
}

impl FloorPlan {
    pub(crate) fn handle_allocate(
        &self,
        table_id: TableId,
        seats: u32,
    ) -> DomainResult<Vec<FloorEvent>> {
        let table = self.require(table_id)?;

        match &table.membership {
            Membership::Member { group_id } => Err(DomainError::conflict(format!(
                "table {table_id} belongs to group {group_id}; allocate to the group's table"
            ))),
            Membership::Standalone => {
                if seats > table.capacity {
                    return Err(DomainError::conflict(format!(
                        "party of {seats} exceeds capacity {} of table {table_id}",
                        table.capacity
                    )));
                }
                self.plan_seats(table, seats)
            }
            Membership::Virtual { group_id, .. } => {
                let combined: u32 = self.members_of(table)?.iter().map(|m| m.capacity).sum();
                if combined != table.capacity {
                    return Err(DomainError::invariant(format!(
                        "group {group_id} capacity {} differs from member total {combined}",
                        table.capacity
                    )));
                }
                if seats > combined {
                    return Err(DomainError::conflict(format!(
                        "party of {seats} exceeds combined capacity {combined} of group {group_id}"
                    )));
                }
                self.plan_seats(table, seats)
            }
        }
    }

    /// Free tables and groups able to seat `party_size`, best fit first.
    ///
    /// Ordered by spare seats ascending, then table id ascending.
    pub fn find_seating_options(
        &self,
        party_size: u32,
        preferred_section: Option<&str>,
    ) -> DomainResult<Vec<SeatingOption>> {
        require_party(party_size)?;

        let mut options: Vec<SeatingOption> = self
            .allocatable()
            .filter(|t| t.status == TableStatus::Available)
            .filter(|t| t.capacity >= party_size)
            .filter(|t| preferred_section.is_none_or(|s| t.section == s))
            .map(|t| SeatingOption {
                kind: if t.is_merged_virtual() {
                    OptionKind::Merged
                } else {
                    OptionKind::Single
                },
                table_id: t.id,
                number: t.number.clone(),
                capacity: t.capacity,
                section: t.section.clone(),
                efficiency: f64::from(party_size) / f64::from(t.capacity),
                member_count: t.member_table_ids().len().max(1),
            })
            .collect();

        options.sort_by_key(|o| (o.spare_seats(party_size), o.table_id));
        tracing::debug!(party_size, options = options.len(), "ranked seating options");

        Ok(options)
    }

    /// Up to `limit` combinations of 2–3 free standalone tables in one section
    /// that together seat `party_size`.
    ///
    /// Only combinations where every table is needed are returned. Ordered by
    /// spare seats, then fewer tables, then member ids.
    pub fn suggest_merges(
        &self,
        party_size: u32,
        preferred_section: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<MergeSuggestion>> {
        require_party(party_size)?;

        let mut by_section: BTreeMap<&str, Vec<&Table>> = BTreeMap::new();
        for table in self.allocatable().filter(|t| {
            !t.is_merged_virtual()
                && t.status == TableStatus::Available
                && preferred_section.is_none_or(|s| t.section == s)
        }) {
            by_section.entry(table.section.as_str()).or_default().push(table);
        }

        let mut suggestions = Vec::new();
        for (section, mut tables) in by_section {
            tables.sort_by_key(|t| t.id);
            let n = tables.len();
            for i in 0..n {
                for j in (i + 1)..n {
                    let pair = [tables[i], tables[j]];
                    if fits_minimally(&pair, party_size) {
                        suggestions.push(suggestion(section, &pair, party_size));
                    }
                    for k in (j + 1)..n {
                        let triple = [tables[i], tables[j], tables[k]];
                        if fits_minimally(&triple, party_size) {
                            suggestions.push(suggestion(section, &triple, party_size));
                        }
                    }
                }
            }
        }

        suggestions.sort_by(|a, b| {
            (a.spare_seats, a.table_ids.len(), &a.table_ids)
                .cmp(&(b.spare_seats, b.table_ids.len(), &b.table_ids))
        });
        suggestions.truncate(limit);

        Ok(suggestions)
    }
}

fn suggestion(section: &str, combo: &[&Table], party_size: u32) -> MergeSuggestion {
    let combined_capacity: u32 = combo.iter().map(|t| t.capacity).sum();
    MergeSuggestion {
        table_ids: combo.iter().map(|t| t.id).collect(),
        combined_capacity,
        section: section.to_string(),
        spare_seats: combined_capacity - party_size,
    }
}
