//! Optional content and cut-contour detection

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::scanner::PageScan;
use super::xmp::XmpFacts;
use super::{Stage, Warning};
use crate::config::is_cut_contour_name;
use crate::source::DocumentSource;

/// Layer findings for a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// The catalog declares optional content
    pub has_layers: bool,
    /// A layer, swatch or spot colorant carries a cut-contour name
    pub cut_contour_detected: bool,
    pub matched_layer_names: BTreeSet<String>,
}

pub(crate) fn detect_layers(
    source: &impl DocumentSource,
    xmp: Option<&XmpFacts>,
    pages: &[PageScan],
) -> (LayerInfo, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut matched = BTreeSet::new();

    let has_layers = source.has_optional_content();
    if has_layers {
        match source.optional_content_groups() {
            Ok(names) => matched.extend(names.into_iter().filter(|n| is_cut_contour_name(n))),
            Err(issue) => {
                log::warn!("optional content groups: {issue}");
                warnings.push(Warning::issue(Stage::Layers, None, &issue));
            }
        }
    }

    if let Some(facts) = xmp {
        matched.extend(
            facts
                .swatch_names
                .iter()
                .filter(|n| is_cut_contour_name(n))
                .cloned(),
        );
    }

    let colorants = pages
        .iter()
        .flat_map(|scan| &scan.color_spaces)
        .flat_map(|space| &space.colorants);
    matched.extend(colorants.filter(|n| is_cut_contour_name(n)).cloned());

    let info = LayerInfo {
        has_layers,
        cut_contour_detected: !matched.is_empty(),
        matched_layer_names: matched,
    };

    if !info.cut_contour_detected {
        for scan in pages.iter().filter(|scan| scan.cut_heuristic) {
            warnings.push(Warning::new(
                Stage::Layers,
                Some(scan.page),
                format!(
                    "Probable cut line drawn in magenta on page {} but no CutContour layer is named",
                    scan.page
                ),
            ));
        }
    }

    (info, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RawColor;
    use crate::source::{ColorSpaceEntry, MemorySource};

    fn scan(page: u32, cut_heuristic: bool) -> PageScan {
        PageScan {
            page,
            cut_heuristic,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_layers() {
        let (info, warnings) = detect_layers(&MemorySource::new(), None, &[scan(1, false)]);
        assert_eq!(info, LayerInfo::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_named_ocg_matches_exactly() {
        let source = MemorySource::new().with_optional_content(["Artwork", "cutcontour", "CutContour"]);
        let (info, _) = detect_layers(&source, None, &[]);
        assert!(info.has_layers);
        assert!(info.cut_contour_detected);
        assert_eq!(info.matched_layer_names.into_iter().collect::<Vec<_>>(), vec!["CutContour"]);
    }

    #[test]
    fn test_layers_without_cut_name() {
        let source = MemorySource::new().with_optional_content(["Artwork"]);
        let (info, _) = detect_layers(&source, None, &[]);
        assert!(info.has_layers);
        assert!(!info.cut_contour_detected);
    }

    #[test]
    fn test_xmp_swatch_and_spot_colorant() {
        let facts = XmpFacts {
            color_mode: None,
            swatch_names: vec!["Thru-cut".to_string()],
        };
        let mut page = scan(1, false);
        page.color_spaces.push(ColorSpaceEntry {
            resource_name: "CS0".to_string(),
            family: "Separation".to_string(),
            color: RawColor::named("Separation"),
            colorants: vec!["CutContour".to_string()],
        });

        let (info, _) = detect_layers(&MemorySource::new(), Some(&facts), &[page]);
        assert!(!info.has_layers);
        assert!(info.cut_contour_detected);
        assert_eq!(info.matched_layer_names.len(), 2);
    }

    #[test]
    fn test_heuristic_only_warns_per_page() {
        let pages = [scan(1, false), scan(2, true), scan(3, true)];
        let (info, warnings) = detect_layers(&MemorySource::new(), None, &pages);
        assert!(!info.cut_contour_detected);
        let pages: Vec<Option<u32>> = warnings.iter().map(|w| w.page).collect();
        assert_eq!(pages, vec![Some(2), Some(3)]);
    }
}
