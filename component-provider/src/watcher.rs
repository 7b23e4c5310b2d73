//! Provider directory watcher.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::ProviderConfig;
use crate::error::{ComponentError, Result};
use crate::event::{ComponentChange, FileEventKind};

/// Watches a provider directory and turns file system events into
/// [`ComponentChange`] notifications.
///
/// Create, delete, modify and rename events all land in one unbounded channel
/// in the order the backend reports them. Bursts are not coalesced.
pub struct ChangeWatcher {
    /// Watched directory.
    directory: PathBuf,

    /// Internal notify watcher, `None` once stopped.
    watcher: Option<RecommendedWatcher>,
}

impl ChangeWatcher {
    /// Start watching the configured directory.
    ///
    /// Returns the watcher and the receiving end of its change channel. The
    /// channel closes once the watcher is stopped or dropped.
    pub fn start(
        config: &ProviderConfig,
        provider_id: impl Into<String>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ComponentChange>)> {
        let provider_id = provider_id.into();
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let filter = config.clone();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if let Some(change) = change_for(&event, &filter, &provider_id) {
                        if change_tx.send(change).is_err() {
                            debug!("Change receiver for {provider_id} is gone");
                        }
                    }
                }
                Err(e) => {
                    error!("Watch error: {e}");
                }
            })
            .map_err(|source| ComponentError::Watch {
                path: config.directory.clone(),
                source,
            })?;

        watcher
            .watch(&config.directory, config.recursive_mode())
            .map_err(|source| ComponentError::Watch {
                path: config.directory.clone(),
                source,
            })?;

        info!(
            "Watching {} for component changes ({:?})",
            config.directory.display(),
            config.recursive_mode()
        );

        Ok((
            Self {
                directory: config.directory.clone(),
                watcher: Some(watcher),
            },
            change_rx,
        ))
    }

    /// Stop watching. Pending notifications stay in the channel.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.directory) {
                debug!("Failed to unwatch {}: {e}", self.directory.display());
            }
            info!("Stopped watching {}", self.directory.display());
        }
    }

    /// Check if the watcher is running.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Get the watched directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Map one raw event to at most one change notification.
///
/// Removals and renames always count: a vanished path cannot be inspected,
/// and a moved directory may have held components.
fn change_for(
    event: &notify::Event,
    config: &ProviderConfig,
    provider_id: &str,
) -> Option<ComponentChange> {
    // The backend dropped events and cannot say which paths changed.
    if event.need_rescan() {
        debug!("Rescan requested for {}", config.directory.display());
        return Some(ComponentChange::new(provider_id));
    }

    let kind = FileEventKind::from(event.kind);
    if !kind.is_component_change() {
        return None;
    }

    let relevant = event.paths.is_empty()
        || matches!(kind, FileEventKind::Deleted | FileEventKind::Renamed)
        || event
            .paths
            .iter()
            .any(|path| config.matches(path) || path.is_dir());

    if !relevant {
        return None;
    }

    debug!("{kind:?} event for {:?}", event.paths);
    Some(ComponentChange::new(provider_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use notify::event::{AccessKind, CreateKind, Flag, ModifyKind, RemoveKind, RenameMode};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    const PROVIDER: &str = "FileBasedComponentProvider";

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_change_mapping() {
        let config = ProviderConfig::new("/components");

        let change = change_for(
            &event(EventKind::Create(CreateKind::File), "/components/a.xml"),
            &config,
            PROVIDER,
        )
        .unwrap();
        assert_eq!(change.provider_id, PROVIDER);

        assert!(
            change_for(
                &event(EventKind::Remove(RemoveKind::File), "/components/a.xml"),
                &config,
                PROVIDER
            )
            .is_some()
        );
        assert!(
            change_for(
                &event(
                    EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                    "/components/old.xml"
                ),
                &config,
                PROVIDER
            )
            .is_some()
        );
    }

    #[test]
    fn test_irrelevant_events_are_dropped() {
        let config = ProviderConfig::new("/components");

        assert!(
            change_for(
                &event(EventKind::Access(AccessKind::Read), "/components/a.xml"),
                &config,
                PROVIDER
            )
            .is_none()
        );
        assert!(
            change_for(
                &event(EventKind::Create(CreateKind::File), "/components/a.xml.swp"),
                &config,
                PROVIDER
            )
            .is_none()
        );
    }

    #[test]
    fn test_rescan_always_notifies() {
        let config = ProviderConfig::new("/components");
        let overflow = notify::Event::new(EventKind::Other).set_flag(Flag::Rescan);

        let change = change_for(&overflow, &config, PROVIDER).unwrap();
        assert_eq!(change.provider_id, PROVIDER);
    }

    #[test]
    fn test_vanished_directory_notifies() {
        let config = ProviderConfig::new("/components");

        assert!(
            change_for(
                &event(EventKind::Remove(RemoveKind::Folder), "/components/news"),
                &config,
                PROVIDER
            )
            .is_some()
        );
        assert!(
            change_for(
                &event(
                    EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                    "/components/news"
                ),
                &config,
                PROVIDER
            )
            .is_some()
        );
    }

    #[test]
    fn test_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = ProviderConfig::new(temp_dir.path().join("missing"));

        let err = ChangeWatcher::start(&config, PROVIDER).err().unwrap();
        assert!(matches!(err, ComponentError::Watch { .. }));
    }

    #[tokio::test]
    async fn test_emits_change_on_create() {
        let temp_dir = TempDir::new().unwrap();
        let config = ProviderConfig::new(temp_dir.path());

        let (watcher, mut changes) = ChangeWatcher::start(&config, PROVIDER).unwrap();
        assert!(watcher.is_running());

        std::fs::write(temp_dir.path().join("a.xml"), "<a/>").unwrap();

        let change = timeout(Duration::from_secs(5), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.provider_id, PROVIDER);
    }

    #[tokio::test]
    async fn test_emits_change_when_directory_moves_out() {
        let temp_dir = TempDir::new().unwrap();
        let watched = temp_dir.path().join("watched");
        std::fs::create_dir_all(watched.join("news")).unwrap();
        std::fs::write(watched.join("news/a.xml"), "<a/>").unwrap();

        let (_watcher, mut changes) =
            ChangeWatcher::start(&ProviderConfig::new(&watched), PROVIDER).unwrap();

        std::fs::rename(watched.join("news"), temp_dir.path().join("moved")).unwrap();

        let change = timeout(Duration::from_secs(5), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.provider_id, PROVIDER);
    }

    #[tokio::test]
    async fn test_channel_closes_after_stop() {
        let temp_dir = TempDir::new().unwrap();
        let config = ProviderConfig::new(temp_dir.path());

        let (mut watcher, mut changes) = ChangeWatcher::start(&config, PROVIDER).unwrap();
        watcher.stop();
        assert!(!watcher.is_running());
        drop(watcher);

        // Anything already queued drains first, then the channel ends.
        let closed = timeout(Duration::from_secs(5), async {
            while changes.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok());
    }
}
