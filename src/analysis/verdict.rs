//! Final reconciliation: precedence, conflicts and report assembly

use std::collections::BTreeSet;

use super::declared::Declaration;
use super::fonts::FontVerdict;
use super::images::ImageVerdict;
use super::layers::LayerInfo;
use super::scanner::PageScan;
use super::{ordered_messages, Stage, Warning};
use crate::color::{normalize, ColorMode, SourceKind};
use crate::report::{AnalysisReport, DeclaredColorSpace, DocumentColorMode};

pub(crate) const NO_CONFLICTS: &str = "No color mode conflicts detected";

/// Intermediate results of every stage, consumed once
pub(crate) struct Findings {
    pub page_count: u32,
    pub declared: Declaration,
    pub fonts: FontVerdict,
    pub pages: Vec<PageScan>,
    pub images: ImageVerdict,
    pub layers: LayerInfo,
    /// Warnings raised outside the stages above (metadata reads, layers)
    pub warnings: Vec<Warning>,
}

/// Precedence: OutputIntent, XMP, a single observed mode, Mixed, Unknown
pub(crate) fn document_mode(declared: &Declaration, observed: &BTreeSet<ColorMode>) -> DocumentColorMode {
    if let Some(mode) = declared.output_intent.or(declared.xmp) {
        return mode.into();
    }
    let mut modes = observed.iter();
    match (modes.next(), modes.next()) {
        (Some(only), None) => (*only).into(),
        _ if observed.contains(&ColorMode::Rgb) && observed.contains(&ColorMode::Cmyk) => {
            DocumentColorMode::Mixed
        }
        _ => DocumentColorMode::Unknown,
    }
}

/// Human-readable description of every conflict found
pub(crate) fn conflicts(declared: Option<ColorMode>, observed: &BTreeSet<ColorMode>) -> Vec<String> {
    let mut found = Vec::new();
    let has_rgb = observed.contains(&ColorMode::Rgb);
    let has_cmyk = observed.contains(&ColorMode::Cmyk);

    if has_rgb && has_cmyk {
        found.push("Color mode conflict: content contains both RGB and CMYK".to_string());
    }
    match declared {
        Some(ColorMode::Cmyk) if has_rgb => {
            found.push("Color mode conflict: document declares CMYK but content contains RGB".to_string())
        }
        Some(ColorMode::Rgb) if has_cmyk => {
            found.push("Color mode conflict: document declares RGB but content contains CMYK".to_string())
        }
        _ => {}
    }
    found
}

fn page_declarations(pages: &[PageScan]) -> impl Iterator<Item = DeclaredColorSpace> + '_ {
    pages.iter().flat_map(|scan| {
        scan.color_spaces.iter().map(move |space| {
            let name = match space.colorants.as_slice() {
                [] => space.family.clone(),
                colorants => format!("{} ({})", space.family, colorants.join(", ")),
            };
            DeclaredColorSpace {
                source: SourceKind::DeclaredColorSpace,
                name,
                mode: normalize(Some(&space.color)),
                page: Some(scan.page),
            }
        })
    })
}

pub(crate) fn aggregate(findings: Findings) -> AnalysisReport {
    let Findings {
        page_count,
        declared,
        fonts,
        pages,
        images,
        layers,
        warnings: mut all_warnings,
    } = findings;

    let observed: BTreeSet<ColorMode> = pages
        .iter()
        .flat_map(|scan| &scan.samples)
        .chain(&images.samples)
        .map(|sample| sample.mode)
        .filter(ColorMode::is_known)
        .collect();

    let mut content_color_modes: Vec<ColorMode> = observed.iter().copied().collect();
    content_color_modes.sort_by_key(ColorMode::as_str);

    let document_color_mode = document_mode(&declared, &observed);
    let conflict_messages = conflicts(declared.output_intent.or(declared.xmp), &observed);
    let mode_conflict = !conflict_messages.is_empty();

    all_warnings.extend(declared.warnings.iter().cloned());
    all_warnings.extend(fonts.warnings);
    all_warnings.extend(images.warnings);
    all_warnings.extend(pages.iter().flat_map(|scan| scan.warnings.iter().cloned()));
    if mode_conflict {
        all_warnings.extend(
            conflict_messages
                .into_iter()
                .map(|message| Warning::new(Stage::Color, None, message)),
        );
    } else {
        all_warnings.push(Warning::new(Stage::Color, None, NO_CONFLICTS));
    }

    let has_cut_contour_layer =
        layers.cut_contour_detected || pages.iter().any(|scan| scan.cut_heuristic);

    let mut declared_color_spaces = declared.spaces;
    declared_color_spaces.extend(page_declarations(&pages));

    log::debug!(
        "verdict: mode={document_color_mode:?} conflict={mode_conflict} modes={content_color_modes:?}"
    );

    AnalysisReport {
        content_color_modes,
        declared_color_spaces,
        document_color_mode,
        fonts_enclosed: fonts.enclosed,
        fonts_list: fonts.fonts,
        has_cut_contour_layer,
        images_embedded: images.embedded,
        images_linked: images.linked,
        images_low_dpi: images.low_dpi,
        image_list: images.refs,
        vector_list: pages.iter().flat_map(|s| s.vectors.iter().cloned()).collect(),
        text_colors: pages.iter().flat_map(|s| s.text_colors.iter().cloned()).collect(),
        layers: layers.has_layers,
        cut_contour_names: layers.matched_layer_names.into_iter().collect(),
        mode_conflict,
        warnings: ordered_messages(all_warnings),
        page_count,
    }
}
