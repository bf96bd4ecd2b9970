//! Occupancy statistics.
//!
//! Totals are computed over allocatable units only: standalone tables and
//! virtual group rows. A grouped member is already represented by its
//! group's row and is skipped.

use serde::{Deserialize, Serialize};

use tableside_core::FloorId;

use crate::model::{Environment, Floor, Table, TableStatus};
use crate::plan::FloorPlan;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableStats {
    pub total_tables: usize,
    pub available_count: usize,
    pub occupied_count: usize,
    pub reserved_count: usize,
    pub cleaning_count: usize,
    pub total_capacity: u64,
    pub total_occupied_seats: u64,
    /// Whole percent of capacity in use.
    pub utilization_rate: u32,
}

impl TableStats {
    fn from_rows<'a>(rows: impl Iterator<Item = &'a Table>) -> Self {
        let mut stats = Self::default();
        for table in rows.filter(|t| t.is_allocatable()) {
            stats.total_tables += 1;
            match table.status {
                TableStatus::Available => stats.available_count += 1,
                TableStatus::Occupied => stats.occupied_count += 1,
                TableStatus::Reserved => stats.reserved_count += 1,
                TableStatus::Cleaning => stats.cleaning_count += 1,
            }
            stats.total_capacity += u64::from(table.capacity);
            stats.total_occupied_seats += u64::from(table.occupied_seats);
        }
        stats.utilization_rate = utilization_rate(stats.total_occupied_seats, stats.total_capacity);
        stats
    }
}

/// `round(100 * occupied / capacity)`, rounding halves up; 0 for no capacity.
pub fn utilization_rate(occupied: u64, capacity: u64) -> u32 {
    if capacity == 0 {
        return 0;
    }
    // capacity >= occupied keeps this within 0..=100
    ((200 * occupied + capacity) / (2 * capacity)) as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorStats {
    pub floor_id: FloorId,
    pub name: String,
    pub environment: Environment,
    pub stats: TableStats,
}

impl FloorPlan {
    pub fn compute_stats(&self) -> TableStats {
        TableStats::from_rows(self.tables().iter())
    }

    pub fn compute_floor_stats(&self, floor: &Floor) -> FloorStats {
        FloorStats {
            floor_id: floor.id,
            name: floor.name.clone(),
            environment: floor.environment,
            stats: TableStats::from_rows(
                self.tables()
                    .iter()
                    .filter(|t| t.floor_id == Some(floor.id)),
            ),
        }
    }
}
