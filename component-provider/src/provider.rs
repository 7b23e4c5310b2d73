//! File-based component provider.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::component::Component;
use crate::config::ProviderConfig;
use crate::error::Result;
use crate::event::ComponentChange;
use crate::notifier::ChangeNotifier;
use crate::parser::ComponentParser;
use crate::scanner::DirectoryScanner;
use crate::settings::ComponentProviderSettings;
use crate::tags::TagResolver;
use crate::watcher::ChangeWatcher;

/// Id of the file-based provider, also its settings section name.
pub const FILE_BASED_PROVIDER_ID: &str = "FileBasedComponentProvider";

/// A source of components.
pub trait ComponentProvider: Send + Sync {
    /// Stable id of this provider.
    fn provider_id(&self) -> &str;

    /// List the components this provider currently offers.
    fn get_components(&self) -> Vec<Component>;
}

/// Provides components from XML files in a directory and reports changes to
/// that directory through a [`ChangeNotifier`].
pub struct FileBasedComponentProvider {
    /// Scanner over the provider directory.
    scanner: DirectoryScanner,

    /// Sink for change notifications.
    notifier: Arc<dyn ChangeNotifier>,

    /// Directory watcher, `None` after shutdown.
    watcher: Mutex<Option<ChangeWatcher>>,

    /// Thread forwarding watcher notifications to `notifier`.
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl FileBasedComponentProvider {
    /// Create the provider from settings.
    ///
    /// The provider directory is resolved against `app_root` and created if
    /// missing. Invalid settings and watch failures are returned as errors.
    pub fn new(
        settings: &ComponentProviderSettings,
        app_root: impl AsRef<Path>,
        tags: Arc<dyn TagResolver>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Result<Self> {
        let config = settings
            .provider_path(FILE_BASED_PROVIDER_ID)?
            .resolve(app_root.as_ref());
        Self::with_config(config, tags, notifier)
    }

    /// Create the provider from an already resolved configuration.
    pub fn with_config(
        config: ProviderConfig,
        tags: Arc<dyn TagResolver>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Result<Self> {
        config.ensure_directory()?;

        let (watcher, changes) = ChangeWatcher::start(&config, FILE_BASED_PROVIDER_ID)?;
        let forwarder = spawn_forwarder(changes, Arc::clone(&notifier))?;

        info!(
            "Component provider {FILE_BASED_PROVIDER_ID} serving {} ({})",
            config.directory.display(),
            config.search_pattern
        );

        let parser = ComponentParser::new(&config.directory, tags);
        Ok(Self {
            scanner: DirectoryScanner::new(config, parser),
            notifier,
            watcher: Mutex::new(Some(watcher)),
            forwarder: Mutex::new(Some(forwarder)),
        })
    }

    /// Get the resolved configuration.
    pub fn config(&self) -> &ProviderConfig {
        self.scanner.config()
    }

    /// Check whether the directory is still being watched.
    pub fn is_watching(&self) -> bool {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(ChangeWatcher::is_running)
    }

    /// Stop watching and wait for the forwarder thread to finish.
    ///
    /// Listing components keeps working afterwards. Calling this more than
    /// once is a no-op.
    pub fn shutdown(&self) {
        let watcher = take(&self.watcher);
        if watcher.is_none() {
            return;
        }
        // Dropping the watcher closes the change channel, which ends the forwarder.
        drop(watcher);

        if let Some(forwarder) = take(&self.forwarder) {
            if forwarder.join().is_err() {
                debug!("Component change forwarder panicked");
            }
        }
        info!("Component provider {FILE_BASED_PROVIDER_ID} shut down");
    }
}

impl ComponentProvider for FileBasedComponentProvider {
    fn provider_id(&self) -> &str {
        FILE_BASED_PROVIDER_ID
    }

    /// Signal a change to the notifier, then scan the directory.
    ///
    /// The signal goes out on every call so listeners resynchronize even when
    /// no file system event fired.
    fn get_components(&self) -> Vec<Component> {
        self.notifier.provider_change(FILE_BASED_PROVIDER_ID);
        self.scanner.scan()
    }
}

impl Drop for FileBasedComponentProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn spawn_forwarder(
    mut changes: mpsc::UnboundedReceiver<ComponentChange>,
    notifier: Arc<dyn ChangeNotifier>,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("component-changes".to_string())
        .spawn(move || {
            while let Some(change) = changes.blocking_recv() {
                notifier.provider_change(&change.provider_id);
            }
            debug!("Component change forwarder stopped");
        })?;

    Ok(handle)
}
