//! Conversion of notify events into watch events

use crate::watch::filtering::WatchFilter;
use crate::watch::types::{ChangeKind, WatchEvent};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::debug;

/// Map a notify event kind onto the change kinds we report
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Create),
        EventKind::Remove(_) => Some(ChangeKind::Delete),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Delete),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Create),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Update),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// Watched changes carried by one notify event
pub fn process_file_system_event(filter: &WatchFilter, event: Event) -> Vec<WatchEvent> {
    let Some(kind) = change_kind(&event.kind) else {
        debug!("Ignoring event kind: {:?}", event.kind);
        return Vec::new();
    };

    event
        .paths
        .into_iter()
        .filter_map(|path| {
            filter.matches(&path).map(|relative| WatchEvent {
                path,
                relative,
                kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::path::{Path, PathBuf};

    fn filter() -> WatchFilter {
        WatchFilter::new(Path::new("/project"), &["src/**/*.ts".to_string()], Path::new("schema.json")).unwrap()
    }

    #[test]
    fn test_kinds() {
        assert_eq!(change_kind(&EventKind::Create(CreateKind::File)), Some(ChangeKind::Create));
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeKind::Update)
        );
        assert_eq!(change_kind(&EventKind::Remove(RemoveKind::File)), Some(ChangeKind::Delete));
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(ChangeKind::Delete)
        );
        assert_eq!(change_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))), None);
        assert_eq!(change_kind(&EventKind::Access(AccessKind::Any)), None);
    }

    #[test]
    fn test_unwatched_paths_are_dropped() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/project/src/a.ts"))
            .add_path(PathBuf::from("/project/notes.txt"))
            .add_path(PathBuf::from("/project/schema.json"));

        let changes = process_file_system_event(&filter(), event);
        let relative: Vec<_> = changes.iter().map(|c| c.relative.as_str()).collect();
        assert_eq!(relative, vec!["src/a.ts", "schema.json"]);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Update));
    }
}
