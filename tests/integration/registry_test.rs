use scanmon::core::disk_table::{DiskRow, DiskSource, DiskTable};
use scanmon::core::registry::TableRegistry;
use scanmon::core::table::{ProcessTable, SnapshotSource, TableRef};
use std::rc::Rc;

struct NoDisks;

impl DiskSource for NoDisks {
    fn sample(&mut self) -> scanmon::Result<Vec<DiskRow>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_registry_keeps_first_insertion_order() {
    let disks = TableRef::shared(DiskTable::new(Box::new(NoDisks)));
    let other = TableRef::shared(ProcessTable::new(Box::new(SnapshotSource::default())));

    let mut registry = TableRegistry::new();
    for table in [
        disks.clone(),
        TableRef::Primary,
        disks.clone(),
        other.clone(),
        TableRef::Primary,
    ] {
        registry.add(table);
    }

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.position(&disks), Some(0));
    assert_eq!(registry.position(&TableRef::Primary), Some(1));
    assert_eq!(registry.position(&other), Some(2));
}

#[test]
fn test_empty_registry_is_valid() {
    let mut registry = TableRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.active().is_none());
    registry.clear();
    assert_eq!(registry.iter().count(), 0);
}

#[test]
fn test_clear_releases_registry_references_only() {
    let handle = match TableRef::shared(DiskTable::new(Box::new(NoDisks))) {
        TableRef::Shared(handle) => handle,
        TableRef::Primary => unreachable!(),
    };

    let mut registry = TableRegistry::new();
    registry.set_active(TableRef::Shared(handle.clone()));
    assert_eq!(Rc::strong_count(&handle), 2);

    registry.clear();
    assert_eq!(Rc::strong_count(&handle), 1);
    assert_eq!(handle.borrow().name(), "disks");
}
