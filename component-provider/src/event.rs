//! Change notifications and file system event classification.

use chrono::{DateTime, Utc};
use notify::event::ModifyKind;
use serde::{Deserialize, Serialize};

/// Notification that the components of a provider may have changed.
///
/// The notification does not say which file changed; subscribers re-scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentChange {
    /// Id of the provider whose components changed.
    pub provider_id: String,

    /// When the change was observed.
    pub observed_at: DateTime<Utc>,
}

impl ComponentChange {
    /// Create a change notification for `provider_id`.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            observed_at: Utc::now(),
        }
    }
}

/// Kind of a raw file system event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    /// File was created.
    Created,

    /// File contents changed.
    Modified,

    /// File was deleted.
    Deleted,

    /// File was renamed.
    Renamed,

    /// File metadata changed.
    MetadataChanged,

    /// File was read or opened.
    Accessed,

    /// Unknown event type.
    Unknown,
}

impl FileEventKind {
    /// Whether this kind of event can change the set of components.
    pub fn is_component_change(self) -> bool {
        !matches!(self, Self::Accessed | Self::Unknown)
    }
}

impl From<notify::EventKind> for FileEventKind {
    fn from(kind: notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => Self::Created,
            notify::EventKind::Modify(ModifyKind::Name(_)) => Self::Renamed,
            notify::EventKind::Modify(ModifyKind::Metadata(_)) => Self::MetadataChanged,
            notify::EventKind::Modify(_) => Self::Modified,
            notify::EventKind::Remove(_) => Self::Deleted,
            notify::EventKind::Access(_) => Self::Accessed,
            // Backends that cannot tell what happened report `Any`.
            notify::EventKind::Any => Self::Modified,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind, RenameMode};
    use notify::EventKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            FileEventKind::from(EventKind::Create(CreateKind::File)),
            FileEventKind::Created
        );
        assert_eq!(
            FileEventKind::from(EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            FileEventKind::Modified
        );
        assert_eq!(
            FileEventKind::from(EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            FileEventKind::Renamed
        );
        assert_eq!(
            FileEventKind::from(EventKind::Remove(RemoveKind::File)),
            FileEventKind::Deleted
        );
        assert_eq!(
            FileEventKind::from(EventKind::Access(AccessKind::Read)),
            FileEventKind::Accessed
        );
    }

    #[test]
    fn test_component_relevance() {
        assert!(FileEventKind::Created.is_component_change());
        assert!(FileEventKind::Renamed.is_component_change());
        assert!(FileEventKind::MetadataChanged.is_component_change());
        assert!(!FileEventKind::Accessed.is_component_change());
        assert!(!FileEventKind::Unknown.is_component_change());
    }

    #[test]
    fn test_change_carries_provider_id() {
        let change = ComponentChange::new("FileBasedComponentProvider");
        assert_eq!(change.provider_id, "FileBasedComponentProvider");
    }
}
