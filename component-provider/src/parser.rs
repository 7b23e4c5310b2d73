//! Component document parsing.
//!
//! A component file is an XML document whose root element carries the
//! component metadata as attributes in [`COMPONENTS_NAMESPACE`]. The parser
//! reads those attributes, cuts them out of the root tag and keeps the rest of
//! the document, byte for byte, as the component definition.
//!
//! Files are decoded from their byte order mark or their declared encoding,
//! UTF-8 otherwise.

use std::borrow::Cow;
use std::ops::Range;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::Arc;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Writer};
use tracing::{debug, error};

use crate::component::{Component, ComponentImage, component_id};
use crate::container_class;
use crate::error::{ComponentError, Result};
use crate::tags::{TagResolver, resolve_grouping_tags};

/// Namespace of the reserved metadata attributes.
pub const COMPONENTS_NAMESPACE: &str = "http://www.composite.net/ns/components/1.0";

/// Metadata attribute values found on a root element.
#[derive(Debug, Default)]
struct Metadata {
    title: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    container_class: Option<String>,
    anti_tags: Option<String>,
    image: Option<String>,
    icon: Option<String>,
}

impl Metadata {
    fn set(&mut self, local_name: &[u8], value: String) {
        let slot = match local_name {
            b"title" => &mut self.title,
            b"description" => &mut self.description,
            b"tags" => &mut self.tags,
            b"container-class" => &mut self.container_class,
            b"container-anti-tags" => &mut self.anti_tags,
            b"image" => &mut self.image,
            b"icon" => &mut self.icon,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// A document split into its metadata and the remaining markup.
#[derive(Debug)]
struct StrippedDocument {
    metadata: Metadata,
    definition: String,
}

/// Turns component files into [`Component`] records.
pub struct ComponentParser {
    /// Provider directory, used to infer tags from subdirectories.
    provider_root: PathBuf,

    /// Tag title lookup.
    tags: Arc<dyn TagResolver>,
}

impl ComponentParser {
    /// Create a parser for files below `provider_root`.
    pub fn new(provider_root: impl Into<PathBuf>, tags: Arc<dyn TagResolver>) -> Self {
        Self {
            provider_root: provider_root.into(),
            tags,
        }
    }

    /// Parse a component file.
    ///
    /// Unreadable and malformed files are logged and yield `None`, as do
    /// documents without a root element.
    pub fn parse_file(&self, path: &Path) -> Option<Component> {
        let parsed = std::fs::read(path)
            .map_err(ComponentError::from)
            .and_then(|bytes| self.parse_bytes(path, &bytes));

        match parsed {
            Ok(component) => component,
            Err(e) => {
                error!("Error in reading component file {}: {e}", path.display());
                None
            }
        }
    }

    /// Decode and parse the raw contents of a component file.
    pub fn parse_bytes(&self, path: &Path, bytes: &[u8]) -> Result<Option<Component>> {
        let source = decode_document(bytes)?;
        self.parse_source(path, &source)
    }

    /// Parse component markup that was read from `path`.
    ///
    /// Returns `Ok(None)` when the document has no root element.
    pub fn parse_source(&self, path: &Path, source: &str) -> Result<Option<Component>> {
        let Some(StrippedDocument {
            metadata,
            definition,
        }) = strip_metadata(source)?
        else {
            return Ok(None);
        };

        let title = metadata.title.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let description = metadata.description.unwrap_or_else(|| title.clone());

        let grouping_tags = match metadata.tags {
            Some(raw) => resolve_grouping_tags(&raw, self.tags.as_ref()),
            None => self.guess_grouping_tags(path),
        };

        Ok(Some(Component {
            id: component_id(path),
            title,
            description,
            grouping_tags,
            container_classes: container_class::parse_list(metadata.container_class.as_deref()),
            anti_tags: container_class::parse_list(metadata.anti_tags.as_deref()),
            image: ComponentImage {
                custom_image_uri: metadata.image,
                icon_name: metadata.icon,
            },
            definition,
        }))
    }

    /// Infer tags from the subdirectories between the provider root and the file.
    ///
    /// Files outside the provider root get no tags.
    fn guess_grouping_tags(&self, path: &Path) -> Vec<String> {
        let Some(parent) = path.parent() else {
            return Vec::new();
        };

        let Ok(relative) = parent.strip_prefix(&self.provider_root) else {
            debug!(
                "{} is outside {}, no grouping tags inferred",
                path.display(),
                self.provider_root.display()
            );
            return Vec::new();
        };

        let raw = relative
            .components()
            .filter_map(|component| match component {
                PathComponent::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(",");

        resolve_grouping_tags(&raw, self.tags.as_ref())
    }
}

/// Read the document, pulling the metadata attributes off the root element.
///
/// Everything except the metadata attributes and the declarations binding
/// their namespace is written back unchanged.
fn strip_metadata(source: &str) -> Result<Option<StrippedDocument>> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut reader = NsReader::from_str(source);
    let mut writer = Writer::new(Vec::with_capacity(source.len()));
    let mut metadata: Option<Metadata> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(start) => {
                if depth == 0 {
                    let root = root_element(&reader, &start, &mut metadata)?;
                    writer.write_event(Event::Start(root))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                }
                depth += 1;
            }
            Event::Empty(start) => {
                if depth == 0 {
                    let root = root_element(&reader, &start, &mut metadata)?;
                    writer.write_event(Event::Empty(root))?;
                } else {
                    writer.write_event(Event::Empty(start))?;
                }
            }
            Event::End(end) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ComponentError::Malformed("end tag without a start tag".to_string())
                })?;
                writer.write_event(Event::End(end))?;
            }
            Event::Text(text) => {
                if depth == 0 && !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(ComponentError::Malformed(
                        "text outside the root element".to_string(),
                    ));
                }
                writer.write_event(Event::Text(text))?;
            }
            Event::CData(_) if depth == 0 => {
                return Err(ComponentError::Malformed(
                    "character data outside the root element".to_string(),
                ));
            }
            other => writer.write_event(other)?,
        }
    }

    if depth > 0 {
        return Err(ComponentError::Malformed(format!(
            "{depth} element(s) not closed"
        )));
    }

    let Some(metadata) = metadata else {
        return Ok(None);
    };

    let definition = String::from_utf8(writer.into_inner())
        .map_err(|e| ComponentError::Malformed(e.to_string()))?;

    Ok(Some(StrippedDocument {
        metadata,
        definition,
    }))
}

/// Copy the root element without its metadata attributes.
///
/// The metadata attributes are cut out of the tag as written, so quoting
/// and spacing of the remaining attributes are left alone.
fn root_element<'i>(
    reader: &NsReader<&'i [u8]>,
    start: &BytesStart<'i>,
    metadata: &mut Option<Metadata>,
) -> Result<BytesStart<'static>> {
    if metadata.is_some() {
        return Err(ComponentError::Malformed(
            "more than one root element".to_string(),
        ));
    }

    let mut found = Metadata::default();
    let mut stripped: Vec<&[u8]> = Vec::new();

    for attr in start.attributes() {
        let attr = attr?;

        if binds_components_namespace(&attr) {
            stripped.push(attr.key.0);
            continue;
        }

        let (namespace, local_name) = reader.resolve_attribute(attr.key);
        if matches!(namespace, ResolveResult::Bound(Namespace(ns)) if ns == COMPONENTS_NAMESPACE.as_bytes())
        {
            found.set(local_name.as_ref(), attr.unescape_value()?.into_owned());
            stripped.push(attr.key.0);
        }
    }

    let raw: &[u8] = start;
    let content =
        std::str::from_utf8(raw).map_err(|e| ComponentError::Malformed(e.to_string()))?;
    let name_len = start.name().as_ref().len();

    let mut kept = String::with_capacity(content.len());
    kept.push_str(&content[..name_len]);
    let mut tail = name_len;
    for span in attribute_spans(raw, name_len) {
        let key = &raw[span.key];
        if !stripped.iter().any(|name| *name == key) {
            kept.push_str(&content[span.range.clone()]);
        }
        tail = span.range.end;
    }
    kept.push_str(&content[tail..]);

    *metadata = Some(found);
    Ok(BytesStart::from_content(kept, name_len))
}

/// Location of one attribute inside the text of a start tag.
#[derive(Debug, PartialEq)]
struct AttributeSpan {
    /// The attribute including its leading whitespace.
    range: Range<usize>,

    /// The qualified attribute name.
    key: Range<usize>,
}

/// Split the text of an already validated start tag into attribute spans.
fn attribute_spans(content: &[u8], name_len: usize) -> Vec<AttributeSpan> {
    let len = content.len();
    let mut spans = Vec::new();
    let mut pos = name_len;

    loop {
        let start = pos;
        while pos < len && content[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let key_start = pos;
        while pos < len && content[pos] != b'=' && !content[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let key = key_start..pos;

        while pos < len && content[pos] != b'"' && content[pos] != b'\'' {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let quote = content[pos];
        pos += 1;
        while pos < len && content[pos] != quote {
            pos += 1;
        }
        pos = (pos + 1).min(len);

        spans.push(AttributeSpan {
            range: start..pos,
            key,
        });
    }

    spans
}

/// Decode a component file to text.
///
/// A byte order mark wins over the declared encoding; undecodable bytes make
/// the document malformed.
fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let fallback = declared_encoding(bytes).unwrap_or(UTF_8);
    let (text, encoding, had_errors) = fallback.decode(bytes);
    if had_errors {
        return Err(ComponentError::Malformed(format!(
            "document is not valid {}",
            encoding.name()
        )));
    }
    Ok(text)
}

/// Encoding named in an ASCII-compatible XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let declaration = bytes.strip_prefix(b"<?xml")?;
    let end = declaration.windows(2).position(|window| window == b"?>")?;
    let declaration = std::str::from_utf8(&declaration[..end]).ok()?;

    let (_, rest) = declaration.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let label = rest[1..].split(quote).next()?;

    // Text that reached here is ASCII-compatible, so a UTF-16 label is wrong.
    Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
}

fn binds_components_namespace(attr: &Attribute<'_>) -> bool {
    attr.key.as_ref().starts_with(b"xmlns:") && attr.value.as_ref() == COMPONENTS_NAMESPACE.as_bytes()
}
