//! Directory scanning for component files.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::component::Component;
use crate::config::ProviderConfig;
use crate::parser::ComponentParser;

/// Enumerates component files and parses each one.
///
/// Nothing is cached: every scan walks the directory again.
pub struct DirectoryScanner {
    /// Configuration.
    config: ProviderConfig,

    /// Parser for individual files.
    parser: ComponentParser,
}

impl DirectoryScanner {
    /// Create a new scanner.
    pub fn new(config: ProviderConfig, parser: ComponentParser) -> Self {
        Self { config, parser }
    }

    /// Get the scanner configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// List the files matching the search pattern.
    ///
    /// Symbolic links are followed; link cycles are reported by the walker and
    /// skipped. Entries are visited in file name order within each directory.
    /// Callers must not depend on that order.
    pub fn files(&self) -> Vec<PathBuf> {
        let walker = WalkDir::new(&self.config.directory)
            .min_depth(1)
            .max_depth(self.config.max_depth())
            .follow_links(true)
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {e}", self.config.directory.display());
                    continue;
                }
            };

            if entry.file_type().is_file() && self.config.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files
    }

    /// Scan the directory and parse every matching file.
    ///
    /// Files that fail to parse are logged by the parser and left out.
    pub fn scan(&self) -> Vec<Component> {
        let start = Instant::now();
        let files = self.files();

        let components: Vec<Component> = files
            .iter()
            .filter_map(|path| self.parser.parse_file(path))
            .collect();

        debug!(
            "Scanned {} in {:?}: {} files, {} components",
            self.config.directory.display(),
            start.elapsed(),
            files.len(),
            components.len()
        );

        components
    }
}
