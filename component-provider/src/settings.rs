//! Component provider settings.
//!
//! Settings are kept in a TOML document with one section per provider and an
//! optional table of tag titles:
//!
//! ```toml
//! [providers.FileBasedComponentProvider]
//! directory = "~/Components"
//! file_search_pattern = "*.xml"
//! top_directory_only = false
//!
//! [tags]
//! news = "News"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ComponentError, Result};
use crate::provider::FILE_BASED_PROVIDER_ID;

/// Settings for every configured component provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentProviderSettings {
    /// Provider sections keyed by provider id.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderPath>,

    /// Display titles keyed by normalized tag.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ComponentProviderSettings {
    /// Parse settings from a TOML string.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading component provider settings from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Get the validated path settings for a provider.
    pub fn provider_path(&self, provider_id: &str) -> Result<&ProviderPath> {
        let path = self
            .providers
            .get(provider_id)
            .ok_or_else(|| ComponentError::UnknownProvider(provider_id.to_string()))?;
        path.validate(provider_id)?;
        Ok(path)
    }
}

impl Default for ComponentProviderSettings {
    fn default() -> Self {
        Self {
            providers: BTreeMap::from([(
                FILE_BASED_PROVIDER_ID.to_string(),
                ProviderPath::default(),
            )]),
            tags: BTreeMap::new(),
        }
    }
}

/// Unresolved location settings of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderPath {
    /// Directory, absolute or relative to the application root (`~/...`).
    pub directory: String,

    /// File name pattern.
    #[serde(default = "default_search_pattern")]
    pub file_search_pattern: String,

    /// Skip subdirectories.
    #[serde(default)]
    pub top_directory_only: bool,
}

fn default_search_pattern() -> String {
    "*.xml".to_string()
}

impl Default for ProviderPath {
    fn default() -> Self {
        Self {
            directory: "~/Components".to_string(),
            file_search_pattern: default_search_pattern(),
            top_directory_only: false,
        }
    }
}

impl ProviderPath {
    fn validate(&self, provider_id: &str) -> Result<()> {
        if self.directory.trim().is_empty() {
            return Err(ComponentError::Config(format!(
                "{provider_id}: directory must not be empty"
            )));
        }

        let pattern = self.file_search_pattern.trim();
        if pattern.is_empty() {
            return Err(ComponentError::Config(format!(
                "{provider_id}: file_search_pattern must not be empty"
            )));
        }
        if pattern.contains(['/', '\\']) {
            return Err(ComponentError::Config(format!(
                "{provider_id}: file_search_pattern must be a file name pattern, got {pattern:?}"
            )));
        }

        Ok(())
    }

    /// Resolve the directory against the application root.
    ///
    /// `~` and `~/...` are relative to `app_root`, as are plain relative paths.
    pub fn resolve_directory(&self, app_root: &Path) -> PathBuf {
        let directory = self.directory.trim().replace('\\', "/");

        if directory == "~" {
            return app_root.to_path_buf();
        }
        if let Some(rest) = directory.strip_prefix("~/") {
            return app_root.join(rest.trim_start_matches('/'));
        }

        let path = PathBuf::from(directory);
        if path.is_absolute() {
            path
        } else {
            app_root.join(path)
        }
    }

    /// Build the resolved provider configuration.
    pub fn resolve(&self, app_root: &Path) -> ProviderConfig {
        ProviderConfig {
            directory: self.resolve_directory(app_root),
            search_pattern: self.file_search_pattern.trim().to_string(),
            top_directory_only: self.top_directory_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SETTINGS: &str = r#"
[providers.FileBasedComponentProvider]
directory = "~/App_Data/Components"
file_search_pattern = "*.xml"
top_directory_only = true

[tags]
news = "News"
"#;

    #[test]
    fn test_parse_settings() {
        let settings = ComponentProviderSettings::from_toml_str(SETTINGS).unwrap();
        let path = settings.provider_path(FILE_BASED_PROVIDER_ID).unwrap();

        assert_eq!(path.directory, "~/App_Data/Components");
        assert!(path.top_directory_only);
        assert_eq!(settings.tags.get("news").map(String::as_str), Some("News"));
    }

    #[test]
    fn test_defaults() {
        let settings = ComponentProviderSettings::default();
        let path = settings.provider_path(FILE_BASED_PROVIDER_ID).unwrap();

        assert_eq!(path.file_search_pattern, "*.xml");
        assert!(!path.top_directory_only);
    }

    #[test]
    fn test_pattern_defaults_when_omitted() {
        let settings = ComponentProviderSettings::from_toml_str(
            "[providers.Custom]\ndirectory = \"/srv/components\"\n",
        )
        .unwrap();

        let path = settings.provider_path("Custom").unwrap();
        assert_eq!(path.file_search_pattern, "*.xml");
    }

    #[test]
    fn test_unknown_provider() {
        let settings = ComponentProviderSettings::from_toml_str(SETTINGS).unwrap();
        let err = settings.provider_path("Missing").unwrap_err();
        assert!(matches!(err, ComponentError::UnknownProvider(name) if name == "Missing"));
    }

    #[test]
    fn test_malformed_settings() {
        assert!(matches!(
            ComponentProviderSettings::from_toml_str("[providers.X]\ndirectory = 12\n"),
            Err(ComponentError::Settings(_))
        ));
        assert!(matches!(
            ComponentProviderSettings::from_toml_str("[providers.X]\ndirectry = \"a\"\n"),
            Err(ComponentError::Settings(_))
        ));

        let settings = ComponentProviderSettings::from_toml_str(
            "[providers.X]\ndirectory = \"a\"\nfile_search_pattern = \"sub/*.xml\"\n",
        )
        .unwrap();
        assert!(matches!(
            settings.provider_path("X"),
            Err(ComponentError::Config(_))
        ));

        let settings =
            ComponentProviderSettings::from_toml_str("[providers.X]\ndirectory = \" \"\n")
                .unwrap();
        assert!(matches!(
            settings.provider_path("X"),
            Err(ComponentError::Config(_))
        ));
    }

    #[test]
    fn test_resolve_directory() {
        let root = Path::new("/srv/site");
        let path = |directory: &str| ProviderPath {
            directory: directory.to_string(),
            ..ProviderPath::default()
        };

        assert_eq!(
            path("~/Components").resolve_directory(root),
            root.join("Components")
        );
        assert_eq!(path("~").resolve_directory(root), root.to_path_buf());
        assert_eq!(
            path("~\\App_Data\\Components").resolve_directory(root),
            root.join("App_Data/Components")
        );
        assert_eq!(
            path("Components").resolve_directory(root),
            root.join("Components")
        );
        assert_eq!(
            path("/var/components").resolve_directory(root),
            PathBuf::from("/var/components")
        );
    }
}
