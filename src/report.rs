//! The analysis report and its detail records

use serde::{Deserialize, Serialize};

use crate::color::{ColorMode, SourceKind};
use crate::error::Result;

/// Document-level color verdict
///
/// Like [`ColorMode`], plus `Mixed` for documents whose content carries both
/// RGB and CMYK without any declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentColorMode {
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "CMYK")]
    Cmyk,
    Grayscale,
    Other,
    Mixed,
    Unknown,
}

impl From<ColorMode> for DocumentColorMode {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Rgb => DocumentColorMode::Rgb,
            ColorMode::Cmyk => DocumentColorMode::Cmyk,
            ColorMode::Grayscale => DocumentColorMode::Grayscale,
            ColorMode::Other => DocumentColorMode::Other,
            ColorMode::Unknown => DocumentColorMode::Unknown,
        }
    }
}

/// A distinct font and whether its program is embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontRef {
    pub name: String,
    pub is_embedded: bool,
    /// First page the font was seen on
    pub page: u32,
}

/// One placement of an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub page: u32,
    /// Object number; the same image on several pages shares it
    pub xref_id: u64,
    pub color: ColorMode,
    pub dpi: Option<f64>,
    pub is_embedded: bool,
    pub low_dpi: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorElement {
    pub page: u32,
    /// `fill`, `stroke` or `fill_stroke`
    pub kind: String,
    pub fill: ColorMode,
    pub stroke: ColorMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextColorSample {
    pub page: u32,
    pub excerpt: String,
    pub mode: ColorMode,
}

/// A color declaration found in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredColorSpace {
    pub source: SourceKind,
    pub name: String,
    pub mode: ColorMode,
    /// Page of a resource color space; `None` for document-level declarations
    pub page: Option<u32>,
}

/// Print-readiness report for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Known modes observed in content, sorted by name
    pub content_color_modes: Vec<ColorMode>,
    pub declared_color_spaces: Vec<DeclaredColorSpace>,
    pub document_color_mode: DocumentColorMode,
    pub fonts_enclosed: bool,
    pub fonts_list: Vec<FontRef>,
    pub has_cut_contour_layer: bool,
    pub images_embedded: u32,
    pub images_linked: u32,
    pub images_low_dpi: u32,
    pub image_list: Vec<ImageRef>,
    pub vector_list: Vec<VectorElement>,
    pub text_colors: Vec<TextColorSample>,
    /// The catalog declares optional content
    pub layers: bool,
    /// Layer, swatch and spot names that matched a cut-contour name
    pub cut_contour_names: Vec<String>,
    pub mode_conflict: bool,
    pub warnings: Vec<String>,
    pub page_count: u32,
}

impl AnalysisReport {
    /// Serialize to JSON
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
