//! Resolved configuration for a component provider directory.

use std::path::{Path, PathBuf};

use notify::RecursiveMode;
use serde::{Deserialize, Serialize};
use wildmatch::WildMatch;

/// Where a provider looks for component files, after path resolution.
///
/// Immutable once built; the scanner and the watcher each hold a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Absolute path to the provider directory.
    pub directory: PathBuf,

    /// File name pattern (`*` and `?` wildcards), e.g. `*.xml`.
    pub search_pattern: String,

    /// Only look at immediate children of `directory`.
    pub top_directory_only: bool,
}

impl ProviderConfig {
    /// Create a recursive config matching `*.xml`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            search_pattern: "*.xml".to_string(),
            top_directory_only: false,
        }
    }

    /// Set the file name pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.search_pattern = pattern.into();
        self
    }

    /// Restrict scanning and watching to the top directory.
    pub fn top_directory_only(mut self) -> Self {
        self.top_directory_only = true;
        self
    }

    /// Check whether a file name matches the search pattern.
    ///
    /// Matching ignores ASCII case.
    pub fn matches_name(&self, file_name: &str) -> bool {
        WildMatch::new(&self.search_pattern.to_ascii_lowercase())
            .matches(&file_name.to_ascii_lowercase())
    }

    /// Check whether the file name of `path` matches the search pattern.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.matches_name(name))
    }

    /// Maximum walk depth below `directory`.
    pub fn max_depth(&self) -> usize {
        if self.top_directory_only { 1 } else { usize::MAX }
    }

    /// Recursion mode for the file system watcher.
    pub fn recursive_mode(&self) -> RecursiveMode {
        if self.top_directory_only {
            RecursiveMode::NonRecursive
        } else {
            RecursiveMode::Recursive
        }
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure_directory(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_pattern_matching() {
        let config = ProviderConfig::new("/components");

        assert!(config.matches(Path::new("/components/a.xml")));
        assert!(config.matches(Path::new("/components/nested/Banner.XML")));
        assert!(!config.matches(Path::new("/components/a.xml.bak")));
        assert!(!config.matches(Path::new("/components/readme.md")));

        let config = config.with_pattern("card-?.xml");
        assert!(config.matches_name("card-1.xml"));
        assert!(!config.matches_name("card-10.xml"));
    }

    #[test]
    fn test_recursion_policy() {
        let config = ProviderConfig::new("/components");
        assert_eq!(config.max_depth(), usize::MAX);
        assert_eq!(config.recursive_mode(), RecursiveMode::Recursive);

        let config = config.top_directory_only();
        assert_eq!(config.max_depth(), 1);
        assert_eq!(config.recursive_mode(), RecursiveMode::NonRecursive);
    }

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let config = ProviderConfig::new(temp_dir.path().join("App_Data/Components"));

        config.ensure_directory().unwrap();
        config.ensure_directory().unwrap();
        assert!(config.directory.is_dir());
    }
}
