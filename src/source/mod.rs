//! Read-only object model the analysis runs against
//!
//! [`DocumentSource`] is the seam between the analysis engine and whatever
//! parses the PDF. [`crate::pdf::LopdfSource`] is the lopdf-backed
//! implementation; [`MemorySource`] holds an already-extracted model.
//!
//! Every category is fallible on its own. A failing category costs that
//! signal only; the engine records a warning and carries on.

mod memory;

pub use memory::{MemoryPage, MemorySource, PageCategory};

use std::time::Duration;

use crate::color::RawColor;
use crate::error::SignalIssue;
use crate::layout::PageSize;

/// Keys in a font descriptor that hold an embedded font program
pub const EMBEDDED_FONT_KEYS: [&str; 3] = ["FontFile", "FontFile2", "FontFile3"];

/// A font referenced from a page's resources
#[derive(Debug, Clone, PartialEq)]
pub struct FontEntry {
    /// Object number when the font dictionary is an indirect object
    pub object_id: Option<u64>,
    /// Key under `/Resources/Font`, e.g. `F1`
    pub resource_name: String,
    /// `/BaseFont` name, if present
    pub base_font: Option<String>,
    /// Keys of the font descriptor; `None` when there is no descriptor
    pub descriptor_keys: Option<Vec<String>>,
}

impl FontEntry {
    /// Base font name, falling back to the resource alias
    pub fn display_name(&self) -> &str {
        self.base_font
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.resource_name)
    }
}

/// An image XObject reachable from a page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    /// Stable identity; the same object reused on several pages keeps its id
    pub object_id: u64,
    pub width: u32,
    pub height: u32,
    /// `/ColorSpace` as declared on the image; `None` when absent
    pub color_space: Option<RawColor>,
    /// Last filter in the `/Filter` chain, e.g. `DCTDecode`
    pub filter: Option<String>,
    /// `/ImageMask true` stencil masks carry no color of their own
    pub image_mask: bool,
    /// The image dictionary points at an external file (`/F`)
    pub external_reference: bool,
}

/// A named color space from a page's `/Resources/ColorSpace`
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpaceEntry {
    pub resource_name: String,
    /// Family name, e.g. `ICCBased`, `Separation`, `DeviceN`
    pub family: String,
    pub color: RawColor,
    /// Colorant names of Separation/DeviceN spaces
    pub colorants: Vec<String>,
}

/// Which painting operator closed a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintKind {
    Fill,
    Stroke,
    FillStroke,
}

impl PaintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaintKind::Fill => "fill",
            PaintKind::Stroke => "stroke",
            PaintKind::FillStroke => "fill_stroke",
        }
    }
}

/// One painted path with the colors in effect when it was painted
///
/// Colors are `None` for the side that was not painted, and for a side whose
/// color was never set explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOp {
    pub kind: PaintKind,
    pub fill: Option<RawColor>,
    pub stroke: Option<RawColor>,
    /// Separation colorant of the fill, when painting with a spot color
    pub fill_spot: Option<String>,
    /// Separation colorant of the stroke
    pub stroke_spot: Option<String>,
}

impl DrawOp {
    /// A fill-only path
    pub fn fill(color: RawColor) -> Self {
        Self {
            kind: PaintKind::Fill,
            fill: Some(color),
            stroke: None,
            fill_spot: None,
            stroke_spot: None,
        }
    }

    /// A stroke-only path
    pub fn stroke(color: RawColor) -> Self {
        Self {
            kind: PaintKind::Stroke,
            fill: None,
            stroke: Some(color),
            fill_spot: None,
            stroke_spot: None,
        }
    }
}

/// A shown text string with its fill color
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub color: Option<RawColor>,
}

/// Drawings and text runs of one page, from one content-stream pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMarks {
    pub drawings: Vec<DrawOp>,
    pub text_runs: Vec<TextRun>,
}

/// An entry of the catalog's `/OutputIntents` array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputIntentEntry {
    /// `/S`, e.g. `GTS_PDFX`
    pub subtype: Option<String>,
    /// `/OutputConditionIdentifier`
    pub identifier: Option<String>,
    /// `/OutputCondition`
    pub condition: Option<String>,
    /// `/Info`
    pub info: Option<String>,
    /// Description text of `/DestOutputProfile`
    pub profile_description: Option<String>,
}

/// Read-only access to a parsed document
///
/// Pages are numbered from 1 in document order.
pub trait DocumentSource: Sync {
    fn page_count(&self) -> u32;

    /// Physical page size; `None` when the page has no usable box
    fn page_size(&self, page: u32) -> Option<PageSize>;

    fn fonts(&self, page: u32) -> Result<Vec<FontEntry>, SignalIssue>;

    fn images(&self, page: u32) -> Result<Vec<ImageEntry>, SignalIssue>;

    fn color_spaces(&self, page: u32) -> Result<Vec<ColorSpaceEntry>, SignalIssue>;

    fn marks(&self, page: u32) -> Result<PageMarks, SignalIssue>;

    /// Materialize an image's sample data, giving up after `limit`
    fn image_samples(&self, object_id: u64, limit: Option<Duration>) -> Result<Vec<u8>, SignalIssue>;

    fn output_intents(&self) -> Result<Vec<OutputIntentEntry>, SignalIssue>;

    /// Whether the catalog carries `/OCProperties`
    fn has_optional_content(&self) -> bool;

    /// `/Name` of each optional content group
    fn optional_content_groups(&self) -> Result<Vec<String>, SignalIssue>;

    /// Raw (decoded) bytes of the catalog's `/Metadata` stream
    fn metadata_stream(&self) -> Result<Option<Vec<u8>>, SignalIssue>;
}
