//! lopdf-backed document access

mod content;
mod icc;
pub mod metadata;
mod objects;
mod resources;

pub use icc::{header_color_space, profile_description};
pub use metadata::{extract_metadata, metadata_of, PdfMetadata};

use std::path::Path;
use std::time::Duration;

use lopdf::{Document, Object, ObjectId};

use crate::budget::bounded;
use crate::error::{Error, Result, SignalIssue};
use crate::layout::PageSize;
use crate::source::{
    ColorSpaceEntry, DocumentSource, FontEntry, ImageEntry, OutputIntentEntry, PageMarks,
};
use objects::{filter_names, inherited, number_of, resolve};

/// A [`DocumentSource`] over a parsed [`lopdf::Document`]
#[derive(Debug)]
pub struct LopdfSource {
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl LopdfSource {
    /// Load a PDF file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Ok(Self::from_document(Document::load(path)?))
    }

    /// Parse a PDF held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_document(Document::load_mem(bytes)?))
    }

    pub fn from_document(document: Document) -> Self {
        let page_ids = document.get_pages().into_values().collect();
        Self { document, page_ids }
    }

    fn page_id(&self, page: u32) -> std::result::Result<ObjectId, SignalIssue> {
        (page as usize)
            .checked_sub(1)
            .and_then(|index| self.page_ids.get(index))
            .copied()
            .ok_or_else(|| SignalIssue::unavailable(format!("page {page}"), "no such page"))
    }

    fn scopes(&self, page: u32) -> std::result::Result<Vec<&lopdf::Dictionary>, SignalIssue> {
        Ok(resources::resource_scopes(&self.document, self.page_id(page)?))
    }
}

fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<PageSize> {
    let values = inherited(doc, page_id, key)?.as_array().ok()?;
    let coords: Vec<f64> = values
        .iter()
        .filter_map(|v| resolve(doc, v).and_then(number_of))
        .collect();
    let coords: [f64; 4] = coords.try_into().ok()?;
    Some(PageSize::from_box(coords))
}

impl DocumentSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        let page_id = self.page_id(page).ok()?;
        page_box(&self.document, page_id, b"CropBox")
            .or_else(|| page_box(&self.document, page_id, b"MediaBox"))
    }

    fn fonts(&self, page: u32) -> std::result::Result<Vec<FontEntry>, SignalIssue> {
        Ok(resources::fonts(&self.document, &self.scopes(page)?))
    }

    fn images(&self, page: u32) -> std::result::Result<Vec<ImageEntry>, SignalIssue> {
        Ok(resources::images(&self.document, &self.scopes(page)?))
    }

    fn color_spaces(&self, page: u32) -> std::result::Result<Vec<ColorSpaceEntry>, SignalIssue> {
        Ok(resources::color_spaces(&self.document, &self.scopes(page)?))
    }

    fn marks(&self, page: u32) -> std::result::Result<PageMarks, SignalIssue> {
        content::page_marks(&self.document, self.page_id(page)?)
            .map_err(|e| SignalIssue::unavailable(format!("page {page} content stream"), e))
    }

    fn image_samples(
        &self,
        object_id: u64,
        limit: Option<Duration>,
    ) -> std::result::Result<Vec<u8>, SignalIssue> {
        let signal = format!("image {object_id} samples");
        let number = u32::try_from(object_id)
            .map_err(|_| SignalIssue::unavailable(&signal, "object number out of range"))?;
        let stream = self
            .document
            .objects
            .range((number, 0)..=(number, u16::MAX))
            .find_map(|(_, obj)| match obj {
                Object::Stream(stream) => Some(stream.clone()),
                _ => None,
            })
            .ok_or_else(|| SignalIssue::unavailable(&signal, "not a stream object"))?;
        let filters = filter_names(&self.document, &stream.dict);

        bounded(&signal, limit, move || resources::materialize(&filters, &stream))?
            .map_err(|reason| SignalIssue::unavailable(&signal, reason))
    }

    fn output_intents(&self) -> std::result::Result<Vec<OutputIntentEntry>, SignalIssue> {
        metadata::output_intents(&self.document)
    }

    fn has_optional_content(&self) -> bool {
        metadata::has_optional_content(&self.document)
    }

    fn optional_content_groups(&self) -> std::result::Result<Vec<String>, SignalIssue> {
        metadata::optional_content_groups(&self.document)
    }

    fn metadata_stream(&self) -> std::result::Result<Option<Vec<u8>>, SignalIssue> {
        metadata::metadata_stream(&self.document)
    }
}
