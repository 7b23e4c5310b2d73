//! Component records produced by a scan.

use std::path::Path;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reusable content fragment discovered from a component file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Stable identifier derived from the file path.
    pub id: Uuid,

    /// Display title.
    pub title: String,

    /// Description shown in the component picker.
    pub description: String,

    /// Resolved grouping tag titles, in document order.
    pub grouping_tags: Vec<String>,

    /// Container classes the component may be placed in.
    pub container_classes: Vec<String>,

    /// Container classes the component must not be placed in.
    pub anti_tags: Vec<String>,

    /// Picker image.
    pub image: ComponentImage,

    /// The document with its metadata attributes removed.
    pub definition: String,
}

/// Image shown for a component in the picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentImage {
    /// Custom image URI.
    pub custom_image_uri: Option<String>,

    /// Named icon.
    pub icon_name: Option<String>,
}

/// Compute the identifier of the component stored at `path`.
///
/// The id is the MD5 digest of the UTF-16LE encoded path string, laid out as a
/// GUID (little-endian leading fields), so the same path always maps to the
/// same id.
pub fn component_id(path: &Path) -> Uuid {
    let path = path.to_string_lossy();
    let utf16: Vec<u8> = path.encode_utf16().flat_map(u16::to_le_bytes).collect();

    let digest = Md5::digest(&utf16);
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);

    Uuid::from_bytes_le(bytes)
}
