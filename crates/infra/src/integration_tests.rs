//! Integration tests for the full catalog pipeline.
//!
//! Tests: command → FloorPlan → JsonFileStorage → EventBus → subscriber
//!
//! Verifies:
//! - committed changes survive a restart through the JSON file
//! - subscribers see every committed change, in order
//! - a service-shift scenario keeps stats consistent with the rows

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use tableside_core::TableId;
    use tableside_events::InMemoryEventBus;
    use tableside_seating::{
        ChangeEnvelope, ChangeOperation, NewTable, OptionKind, Storage, TableCatalog, TableStatus,
    };

    use crate::storage::JsonFileStorage;

    type FileCatalog = TableCatalog<JsonFileStorage, Arc<InMemoryEventBus<ChangeEnvelope>>>;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!("tableside-it-{}", uuid::Uuid::now_v7())))
        }

        fn file(&self) -> PathBuf {
            self.0.join("tables.json")
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn open(dir: &TempDir) -> FileCatalog {
        TableCatalog::open(
            JsonFileStorage::new(dir.file()),
            Arc::new(InMemoryEventBus::new()),
        )
        .unwrap()
    }

    #[test]
    fn groups_and_seats_survive_restart() {
        let dir = TempDir::new();
        let (group_id, virtual_id) = {
            let catalog = open(&dir);
            let a = catalog.create_table(NewTable::new("T1", 4)).unwrap();
            let b = catalog.create_table(NewTable::new("T2", 6)).unwrap();
            catalog.create_table(NewTable::new("T3", 2)).unwrap();
            let group = catalog.create_group(vec![a.id, b.id], None).unwrap();
            catalog.allocate_seats(group.virtual_table.id, 7).unwrap();
            (group.group_id, group.virtual_table.id)
        };

        let catalog = open(&dir);
        let view = catalog.get_group(group_id).unwrap();
        assert_eq!(view.virtual_table.id, virtual_id);
        assert_eq!(view.virtual_table.occupied_seats, 7);
        assert_eq!(view.totals.capacity, 10);

        let seats: Vec<(TableId, u32)> = view.members.iter().map(|m| (m.id, m.occupied_seats)).collect();
        assert_eq!(seats, vec![(TableId::new(1), 1), (TableId::new(2), 6)]);

        let stats = catalog.compute_stats().unwrap();
        assert_eq!(stats.total_capacity, 12);
        assert_eq!(stats.total_occupied_seats, 7);
    }

    #[test]
    fn subscriber_thread_sees_changes_in_order() {
        let dir = TempDir::new();
        let catalog = open(&dir);

        let sub = catalog.subscribe();
        let (tx, rx) = std::sync::mpsc::channel();
        let consumer = std::thread::spawn(move || {
            while let Ok(envelope) = sub.recv_timeout(Duration::from_secs(2)) {
                let done = envelope.payload().operation == ChangeOperation::GroupDissolved;
                let _ = tx.send((envelope.sequence_number(), envelope.payload().operation));
                if done {
                    break;
                }
            }
        });

        let a = catalog.create_table(NewTable::new("T1", 2)).unwrap();
        let b = catalog.create_table(NewTable::new("T2", 2)).unwrap();
        let group = catalog.create_group(vec![a.id, b.id], None).unwrap();
        catalog.dissolve_group(group.group_id).unwrap();
        consumer.join().unwrap();

        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                (1, ChangeOperation::TableCreated),
                (2, ChangeOperation::TableCreated),
                (3, ChangeOperation::GroupCreated),
                (4, ChangeOperation::GroupDissolved),
            ]
        );
    }

    #[test]
    fn service_shift_scenario() {
        let dir = TempDir::new();
        let catalog = open(&dir);

        for (number, capacity, section) in [
            ("1", 2, "Main"),
            ("2", 4, "Main"),
            ("3", 4, "Main"),
            ("4", 6, "Patio"),
            ("5", 8, "Patio"),
        ] {
            catalog
                .create_table(NewTable::new(number, capacity).in_section(section))
                .unwrap();
        }

        // party of 4 goes to the best fit in Main
        let best = catalog.find_seating_options(4, Some("Main")).unwrap();
        assert_eq!(best[0].table_id, TableId::new(2));
        catalog.allocate_seats(best[0].table_id, 4).unwrap();

        // party of 7 on the patio fits table 5 only
        let patio = catalog.find_seating_options(7, Some("Patio")).unwrap();
        assert_eq!(patio.len(), 1);
        catalog.allocate_seats(patio[0].table_id, 7).unwrap();

        // party of 6 in Main needs a merge
        assert!(catalog.find_seating_options(6, Some("Main")).unwrap().is_empty());
        let merge = catalog.suggest_merges(6, Some("Main"), 1).unwrap();
        assert_eq!(merge[0].table_ids, vec![TableId::new(1), TableId::new(3)]);
        let group = catalog.create_group(merge[0].table_ids.clone(), None).unwrap();
        let options = catalog.find_seating_options(6, Some("Main")).unwrap();
        assert_eq!(options[0].kind, OptionKind::Merged);
        catalog.allocate_seats(group.virtual_table.id, 6).unwrap();

        catalog.set_status(TableId::new(4), TableStatus::Reserved, 0).unwrap();

        let stats = catalog.compute_stats().unwrap();
        assert_eq!(stats.total_tables, 4);
        assert_eq!(stats.occupied_count, 3);
        assert_eq!(stats.reserved_count, 1);
        assert_eq!(stats.total_capacity, 24);
        assert_eq!(stats.total_occupied_seats, 17);
        assert_eq!(stats.utilization_rate, 71);

        // guests leave: clean, then free again
        catalog.set_status(TableId::new(5), TableStatus::Cleaning, 0).unwrap();
        catalog.set_status(TableId::new(5), TableStatus::Available, 0).unwrap();
        catalog.dissolve_group(group.group_id).unwrap();

        let persisted = JsonFileStorage::new(dir.file()).load().unwrap();
        assert_eq!(persisted, catalog.list_all().unwrap());
        assert_eq!(catalog.list_available().unwrap().len(), 3);
    }
}
