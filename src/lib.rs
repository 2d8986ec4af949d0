//! PDF Preflight Library
//!
//! Print-readiness analysis for production PDFs. For one document this
//! library reports:
//! - the effective color mode (RGB, CMYK, Grayscale or Mixed) and every
//!   color signal it was inferred from
//! - whether all fonts are embedded
//! - optional-content layers and cut-contour (die line) detection
//! - embedded vs linked images and low-resolution images
//! - conflicts between declared and observed color
//!
//! # Example
//!
//! ```no_run
//! use pdf_preflight::{analyze_path, AnalysisOptions};
//! use std::path::Path;
//!
//! let report = analyze_path(Path::new("sticker-sheet.pdf"), &AnalysisOptions::default())
//!     .expect("Failed to open PDF");
//!
//! if report.mode_conflict {
//!     for warning in &report.warnings {
//!         println!("{warning}");
//!     }
//! }
//! ```

pub mod analysis;
pub mod budget;
pub mod color;
pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod report;
pub mod source;

use std::path::Path;

// Re-export commonly used items
pub use color::{ColorMode, RawColor};
pub use config::AnalysisOptions;
pub use error::{Error, Result, SignalIssue};
pub use pdf::LopdfSource;
pub use report::{AnalysisReport, DocumentColorMode};
pub use source::DocumentSource;

/// Analyze a PDF file
///
/// Fails only when the file cannot be opened or parsed as a PDF.
pub fn analyze_path(path: &Path, options: &AnalysisOptions) -> Result<AnalysisReport> {
    let source = LopdfSource::open(path)?;
    Ok(analyze_source(&source, options))
}

/// Analyze a PDF held in memory
pub fn analyze_bytes(bytes: &[u8], options: &AnalysisOptions) -> Result<AnalysisReport> {
    let source = LopdfSource::from_bytes(bytes)?;
    Ok(analyze_source(&source, options))
}

/// Analyze an already opened document
pub fn analyze_source(source: &impl DocumentSource, options: &AnalysisOptions) -> AnalysisReport {
    analysis::analyze(source, options)
}
