//! Analysis policy and tuning options

use std::time::Duration;

/// Images whose effective resolution falls below this are flagged as low DPI
pub const LOW_DPI_THRESHOLD: f64 = 150.0;

/// Characters of span text kept in a text color sample
pub const TEXT_EXCERPT_CHARS: usize = 30;

/// Layer, swatch and spot-color names that mark a cut/die line (case-sensitive)
pub const CUT_CONTOUR_NAMES: [&str; 2] = ["CutContour", "Thru-cut"];

/// Options controlling a single document analysis
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// DPI below which an image counts as low resolution
    pub low_dpi_threshold: f64,
    /// Length of the text excerpt kept per span
    pub excerpt_chars: usize,
    /// Upper bound on text color samples reported per page
    pub max_text_samples_per_page: usize,
    /// Scan pages on the rayon pool instead of sequentially
    pub parallel_pages: bool,
    /// Time budget for materializing one image's samples
    pub image_decode_timeout: Option<Duration>,
    /// Time budget for parsing the XMP metadata packet
    pub metadata_timeout: Option<Duration>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            low_dpi_threshold: LOW_DPI_THRESHOLD,
            excerpt_chars: TEXT_EXCERPT_CHARS,
            max_text_samples_per_page: 200,
            parallel_pages: true,
            image_decode_timeout: Some(Duration::from_secs(5)),
            metadata_timeout: Some(Duration::from_secs(2)),
        }
    }
}

/// True when `name` is one of the canonical cut-contour names
pub fn is_cut_contour_name(name: &str) -> bool {
    CUT_CONTOUR_NAMES.contains(&name)
}
