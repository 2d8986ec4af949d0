//! Catalog metadata: output intents, optional content, XMP and `/Info`

use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use super::icc;
use super::objects::{lookup, lookup_dict, name_of, resolve, stream_bytes, text_of};
use crate::error::{Error, Result, SignalIssue};
use crate::source::OutputIntentEntry;

fn catalog(doc: &Document) -> std::result::Result<&Dictionary, SignalIssue> {
    doc.catalog()
        .map_err(|e| SignalIssue::unavailable("document catalog", e))
}

/// Entries of `/OutputIntents`, in array order
pub(crate) fn output_intents(doc: &Document) -> std::result::Result<Vec<OutputIntentEntry>, SignalIssue> {
    let catalog = catalog(doc)?;
    let Some(Object::Array(items)) = lookup(doc, catalog, b"OutputIntents") else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| resolve(doc, item)?.as_dict().ok())
        .map(|intent| OutputIntentEntry {
            subtype: lookup(doc, intent, b"S").and_then(name_of),
            identifier: lookup(doc, intent, b"OutputConditionIdentifier").and_then(text_of),
            condition: lookup(doc, intent, b"OutputCondition").and_then(text_of),
            info: lookup(doc, intent, b"Info").and_then(text_of),
            profile_description: lookup(doc, intent, b"DestOutputProfile")
                .and_then(|o| o.as_stream().ok())
                .and_then(|s| stream_bytes(s).ok())
                .and_then(|bytes| icc::profile_description(&bytes)),
        })
        .collect())
}

/// Whether the catalog declares `/OCProperties`
pub(crate) fn has_optional_content(doc: &Document) -> bool {
    catalog(doc).is_ok_and(|c| c.has(b"OCProperties"))
}

/// `/Name` of every group in `/OCProperties/OCGs`
pub(crate) fn optional_content_groups(doc: &Document) -> std::result::Result<Vec<String>, SignalIssue> {
    let catalog = catalog(doc)?;
    let Some(properties) = lookup_dict(doc, catalog, b"OCProperties") else {
        return Ok(Vec::new());
    };
    let Some(Object::Array(groups)) = lookup(doc, properties, b"OCGs") else {
        return Ok(Vec::new());
    };

    Ok(groups
        .iter()
        .filter_map(|group| resolve(doc, group)?.as_dict().ok())
        .filter_map(|group| lookup(doc, group, b"Name").and_then(text_of))
        .collect())
}

/// Decoded bytes of the catalog's `/Metadata` stream
pub(crate) fn metadata_stream(doc: &Document) -> std::result::Result<Option<Vec<u8>>, SignalIssue> {
    let catalog = catalog(doc)?;
    match lookup(doc, catalog, b"Metadata") {
        Some(Object::Stream(stream)) => stream_bytes(stream)
            .map(Some)
            .map_err(|e| SignalIssue::unavailable("XMP metadata stream", e)),
        _ => Ok(None),
    }
}

/// Summary shown by the `info` command
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Producing application (if present)
    pub producer: Option<String>,
    /// Output condition identifier of the first OutputIntent
    pub output_condition: Option<String>,
    /// Catalog has `/OCProperties`
    pub has_layers: bool,
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    Ok(metadata_of(&doc))
}

/// Metadata of an already loaded document
pub fn metadata_of(doc: &Document) -> PdfMetadata {
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok());
    let info_text = |key: &[u8]| info.and_then(|dict| lookup(doc, dict, key)).and_then(text_of);

    let output_condition = output_intents(doc)
        .ok()
        .and_then(|intents| intents.into_iter().next())
        .and_then(|intent| intent.identifier.or(intent.condition));

    PdfMetadata {
        page_count: doc.get_pages().len(),
        title: info_text(b"Title"),
        author: info_text(b"Author"),
        producer: info_text(b"Producer"),
        output_condition,
        has_layers: has_optional_content(doc),
    }
}
