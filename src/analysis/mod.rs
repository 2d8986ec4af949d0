//! The inference engine: from a [`DocumentSource`] to an [`AnalysisReport`]
//!
//! Stages run leaves first. Declared intent (OutputIntents, XMP), font
//! embedding, the per-page content scan, image classification and layer
//! detection each produce their own immutable result, and
//! [`verdict::aggregate`] reconciles them into the report.

mod declared;
mod fonts;
mod images;
mod layers;
mod scanner;
mod verdict;
pub mod xmp;

pub use fonts::is_embedded;
pub use layers::LayerInfo;
pub use xmp::{parse_xmp, XmpFacts};

use std::time::Duration;

use crate::budget::bounded;
use crate::config::AnalysisOptions;
use crate::error::SignalIssue;
use crate::report::AnalysisReport;
use crate::source::DocumentSource;

/// Pipeline stage a warning belongs to, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Stage {
    Fonts,
    Layers,
    Images,
    Color,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Warning {
    pub stage: Stage,
    /// `None` for document-level warnings, which sort first in their stage
    pub page: Option<u32>,
    pub message: String,
}

impl Warning {
    pub fn new(stage: Stage, page: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            stage,
            page,
            message: message.into(),
        }
    }

    /// A warning for a sub-step that degraded
    pub fn issue(stage: Stage, page: Option<u32>, issue: &SignalIssue) -> Self {
        let message = match page {
            Some(page) => format!("Page {page}: {issue}"),
            None => issue.to_string(),
        };
        Self::new(stage, page, message)
    }
}

/// Stable sort by stage, then page
pub(crate) fn ordered_messages(mut warnings: Vec<Warning>) -> Vec<String> {
    warnings.sort_by_key(|w| (w.stage, w.page));
    warnings.into_iter().map(|w| w.message).collect()
}

type XmpParser = fn(&[u8]) -> Result<XmpFacts, SignalIssue>;

fn read_xmp(
    source: &impl DocumentSource,
    limit: Option<Duration>,
    parse: XmpParser,
    warnings: &mut Vec<Warning>,
) -> Option<XmpFacts> {
    let bytes = match source.metadata_stream() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(issue) => {
            log::warn!("{issue}");
            warnings.push(Warning::issue(Stage::Color, None, &issue));
            return None;
        }
    };

    match bounded("XMP metadata", limit, move || parse(&bytes)) {
        Ok(Ok(facts)) => Some(facts),
        Ok(Err(issue)) | Err(issue) => {
            log::warn!("{issue}");
            warnings.push(Warning::issue(Stage::Color, None, &issue));
            None
        }
    }
}

/// Run every stage over `source` and reconcile the results
///
/// Never fails: a stage that cannot read its input degrades its signal and
/// leaves a warning behind.
pub fn analyze(source: &impl DocumentSource, options: &AnalysisOptions) -> AnalysisReport {
    let page_count = source.page_count();
    log::debug!("analyzing {page_count} page(s)");

    let mut warnings = Vec::new();
    let xmp = read_xmp(source, options.metadata_timeout, parse_xmp, &mut warnings);
    let declared = declared::resolve_declared(source, xmp.as_ref());
    let fonts = fonts::verify_fonts(source);
    let pages = scanner::scan_pages(source, options);
    let images = images::classify_images(source, &pages, options);
    let (layers, layer_warnings) = layers::detect_layers(source, xmp.as_ref(), &pages);
    warnings.extend(layer_warnings);

    verdict::aggregate(verdict::Findings {
        page_count,
        declared,
        fonts,
        pages,
        images,
        layers,
        warnings,
    })
}
