//! # Component Provider
//!
//! File-based component discovery for the Composite CMS. Components are XML
//! fragments stored in a provider directory; their display metadata lives in
//! reserved attributes on the root element.
//!
//! ## Features
//!
//! - **Fresh listings**: every call re-scans the directory, nothing is cached
//! - **Stable ids**: a component's id is derived from its file path
//! - **Change notifications**: create, delete, modify and rename events are
//!   pushed to a [`ChangeNotifier`]
//! - **Tag inference**: files without explicit tags are grouped by folder
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 FileBasedComponentProvider                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ProviderPath ──► ProviderConfig ──► DirectoryScanner           │
//! │                         │                  │                    │
//! │                         ▼                  ▼                    │
//! │                   ChangeWatcher      ComponentParser            │
//! │                         │                  │                    │
//! │                         ▼                  ▼                    │
//! │                 ChangeNotifier         Component                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use composite_component_provider::{
//!     ComponentChangeNotifier, ComponentProvider, ComponentProviderSettings,
//!     FileBasedComponentProvider, TagCatalog,
//! };
//!
//! let settings = ComponentProviderSettings::load("components.toml")?;
//! let (notifier, mut changes) = ComponentChangeNotifier::channel();
//! let provider = FileBasedComponentProvider::new(
//!     &settings,
//!     "/srv/site",
//!     Arc::new(TagCatalog::new(settings.tags.clone())),
//!     Arc::new(notifier),
//! )?;
//!
//! for component in provider.get_components() {
//!     println!("{} {}", component.id, component.title);
//! }
//! ```

pub mod component;
pub mod config;
pub mod container_class;
pub mod error;
pub mod event;
pub mod notifier;
pub mod parser;
pub mod provider;
pub mod registry;
pub mod scanner;
pub mod settings;
pub mod tags;
pub mod watcher;

pub use component::{Component, ComponentImage, component_id};
pub use config::ProviderConfig;
pub use error::{ComponentError, Result};
pub use event::{ComponentChange, FileEventKind};
pub use notifier::{ChangeNotifier, ComponentChangeNotifier};
pub use parser::{COMPONENTS_NAMESPACE, ComponentParser};
pub use provider::{ComponentProvider, FILE_BASED_PROVIDER_ID, FileBasedComponentProvider};
pub use registry::ComponentRegistry;
pub use scanner::DirectoryScanner;
pub use settings::{ComponentProviderSettings, ProviderPath};
pub use tags::{TagCatalog, TagResolver};
pub use watcher::ChangeWatcher;
