//! Grouping tag normalization and title lookup.

use std::collections::BTreeMap;

/// Maps a normalized tag token to its display title.
pub trait TagResolver: Send + Sync {
    /// Get the display title for `tag`.
    fn tag_title(&self, tag: &str) -> String;
}

/// Tag titles from settings. Unknown tags resolve to themselves.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    titles: BTreeMap<String, String>,
}

impl TagCatalog {
    /// Create a catalog from `tag -> title` pairs. Keys are normalized.
    pub fn new(titles: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            titles: titles
                .into_iter()
                .map(|(tag, title)| (normalize_token(&tag), title))
                .collect(),
        }
    }

    /// Number of known tags.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl TagResolver for TagCatalog {
    fn tag_title(&self, tag: &str) -> String {
        self.titles
            .get(tag)
            .cloned()
            .unwrap_or_else(|| tag.to_string())
    }
}

fn normalize_token(token: &str) -> String {
    token.replace(' ', "").to_lowercase()
}

/// Turn a raw comma separated tag list into resolved titles.
///
/// Spaces are removed and tokens lower-cased before lookup. Empty tokens are
/// dropped; order is preserved.
pub fn resolve_grouping_tags(raw: &str, resolver: &dyn TagResolver) -> Vec<String> {
    normalize_token(raw)
        .split(',')
        .filter(|token| !token.is_empty())
        .map(|token| resolver.tag_title(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> TagCatalog {
        TagCatalog::new([
            ("news".to_string(), "News".to_string()),
            ("Image Gallery".to_string(), "Image gallery".to_string()),
        ])
    }

    #[test]
    fn test_resolve_known_and_unknown_tags() {
        let tags = resolve_grouping_tags("News, sport", &catalog());
        assert_eq!(tags, vec!["News".to_string(), "sport".to_string()]);
    }

    #[test]
    fn test_catalog_keys_are_normalized() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.tag_title("imagegallery"), "Image gallery");
    }

    #[test]
    fn test_empty_tokens_dropped() {
        assert!(resolve_grouping_tags("", &catalog()).is_empty());
        assert_eq!(
            resolve_grouping_tags(" , news,,", &catalog()),
            vec!["News".to_string()]
        );
    }
}
