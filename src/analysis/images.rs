//! Embedded-vs-linked and resolution classification of image objects

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use super::scanner::{ImagePlacement, PageScan};
use super::{Stage, Warning};
use crate::color::{ColorMode, ColorSample, RawColor, SourceKind};
use crate::config::AnalysisOptions;
use crate::error::SignalIssue;
use crate::report::ImageRef;
use crate::source::{DocumentSource, ImageEntry};

#[derive(Debug, Clone)]
struct Classification {
    sample: ColorSample,
    embedded: bool,
    warnings: Vec<Warning>,
}

/// Image tallies and detail records
#[derive(Debug, Clone, Default)]
pub(crate) struct ImageVerdict {
    pub refs: Vec<ImageRef>,
    pub embedded: u32,
    pub linked: u32,
    pub low_dpi: u32,
    /// One sample per distinct image with a known mode
    pub samples: Vec<ColorSample>,
    pub warnings: Vec<Warning>,
}

/// Component count from a JPEG's start-of-frame header
pub(crate) fn jpeg_components(data: &[u8]) -> Option<u8> {
    if data.get(0..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        match marker {
            // Fill bytes and standalone markers carry no length
            0xFF => pos += 1,
            0x01 | 0xD0..=0xD7 => pos += 2,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return data.get(pos + 9).copied();
            }
            0xD9 | 0xDA => return None,
            _ => {
                let len = u16::from_be_bytes([*data.get(pos + 2)?, *data.get(pos + 3)?]) as usize;
                pos += 2 + len;
            }
        }
    }
    None
}

fn is_jpeg(filter: Option<&str>) -> bool {
    matches!(filter, Some("DCTDecode") | Some("DCT"))
}

fn classify_image(
    source: &impl DocumentSource,
    entry: &ImageEntry,
    page: u32,
    options: &AnalysisOptions,
) -> Classification {
    let declared = entry.color_space.as_ref().filter(|_| !entry.image_mask);
    let classified = |raw: Option<&RawColor>, embedded, warnings| Classification {
        sample: ColorSample::observe(raw, SourceKind::Image),
        embedded,
        warnings,
    };

    if entry.external_reference {
        return classified(declared, false, Vec::new());
    }

    match source.image_samples(entry.object_id, options.image_decode_timeout) {
        Ok(bytes) if !bytes.is_empty() => {
            let sniffed = match declared {
                None if !entry.image_mask && is_jpeg(entry.filter.as_deref()) => {
                    jpeg_components(&bytes).map(RawColor::Channels)
                }
                _ => None,
            };
            classified(declared.or(sniffed.as_ref()), true, Vec::new())
        }
        Ok(_) => classified(declared, false, Vec::new()),
        Err(issue) => {
            log::warn!("image {} on page {page}: {issue}", entry.object_id);
            let warnings = vec![Warning::issue(Stage::Images, Some(page), &issue)];
            match issue {
                SignalIssue::TimedOut { .. } => classified(None, false, warnings),
                _ => classified(declared, false, warnings),
            }
        }
    }
}

/// Classify each distinct image once and build per-placement detail
pub(crate) fn classify_images(
    source: &impl DocumentSource,
    pages: &[PageScan],
    options: &AnalysisOptions,
) -> ImageVerdict {
    let placements: Vec<&ImagePlacement> = pages.iter().flat_map(|p| &p.images).collect();

    let mut ids = BTreeSet::new();
    let distinct: Vec<&ImagePlacement> = placements
        .iter()
        .copied()
        .filter(|p| ids.insert(p.entry.object_id))
        .collect();

    let classify = |p: &&ImagePlacement| classify_image(source, &p.entry, p.page, options);
    let results: Vec<Classification> = if options.parallel_pages {
        distinct.par_iter().map(classify).collect()
    } else {
        distinct.iter().map(classify).collect()
    };

    let mut verdict = ImageVerdict::default();
    let mut by_id = BTreeMap::new();
    for (first, class) in distinct.iter().zip(results) {
        let id = first.entry.object_id;
        if class.embedded {
            verdict.embedded += 1;
        } else {
            verdict.linked += 1;
        }
        if class.sample.mode.is_known() {
            verdict.samples.push(class.sample);
        }
        verdict.warnings.extend(class.warnings.iter().cloned());
        if !class.embedded {
            verdict.warnings.push(Warning::new(
                Stage::Images,
                Some(first.page),
                format!("Image {id} on page {} is linked, not embedded", first.page),
            ));
        }
        by_id.insert(id, class);
    }

    let is_low = |dpi: Option<f64>| dpi.is_some_and(|d| d < options.low_dpi_threshold);
    let mut flagged = BTreeSet::new();
    for placement in &placements {
        let id = placement.entry.object_id;
        let low = is_low(placement.dpi);
        if low && flagged.insert(id) {
            verdict.low_dpi += 1;
            verdict.warnings.push(Warning::new(
                Stage::Images,
                Some(placement.page),
                format!(
                    "Image {id} on page {} is low resolution ({:.0} DPI)",
                    placement.page,
                    placement.dpi.unwrap_or_default()
                ),
            ));
        }

        let (color, embedded) = by_id
            .get(&id)
            .map(|c| (c.sample.mode, c.embedded))
            .unwrap_or((ColorMode::Unknown, false));
        verdict.refs.push(ImageRef {
            page: placement.page,
            xref_id: id,
            color,
            dpi: placement.dpi,
            is_embedded: embedded,
            low_dpi: low,
        });
    }

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scanner::scan_pages;
    use crate::layout::PageSize;
    use crate::source::{MemoryPage, MemorySource};

    /// SOI, an APP0 segment, then a baseline SOF0 with `components`
    fn jpeg_header(components: u8) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, b'J', b'F', b'I', b'F']);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x10, components]);
        data
    }

    fn image(object_id: u64, color_space: Option<RawColor>) -> ImageEntry {
        ImageEntry {
            object_id,
            width: 1275,
            height: 1650,
            color_space,
            filter: None,
            image_mask: false,
            external_reference: false,
        }
    }

    fn verdict_for(source: &MemorySource) -> ImageVerdict {
        let options = AnalysisOptions::default();
        let pages = scan_pages(source, &options);
        classify_images(source, &pages, &options)
    }

    #[test]
    fn test_jpeg_components() {
        assert_eq!(jpeg_components(&jpeg_header(4)), Some(4));
        assert_eq!(jpeg_components(&jpeg_header(1)), Some(1));
        assert_eq!(jpeg_components(b"not a jpeg"), None);
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF, 0xD9]), None);
    }

    #[test]
    fn test_external_reference_is_linked() {
        let mut entry = image(2, Some(RawColor::named("DeviceRGB")));
        entry.external_reference = true;
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()).with_image(entry))
            .with_image_samples(2, vec![1, 2, 3]);

        let verdict = verdict_for(&source);
        assert_eq!((verdict.embedded, verdict.linked), (0, 1));
        assert_eq!(verdict.refs[0].color, ColorMode::Rgb);
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_missing_or_empty_samples_are_linked() {
        let source = MemorySource::new()
            .with_page(
                MemoryPage::new(PageSize::letter())
                    .with_image(image(1, Some(RawColor::named("DeviceCMYK"))))
                    .with_image(image(2, Some(RawColor::named("DeviceCMYK"))))
                    .with_image(image(3, Some(RawColor::named("DeviceCMYK")))),
            )
            .with_image_samples(1, vec![0; 8])
            .with_image_samples(2, Vec::new());

        let verdict = verdict_for(&source);
        assert_eq!(verdict.embedded, 1);
        assert_eq!(verdict.linked, 2);
        let embedded: Vec<bool> = verdict.refs.iter().map(|r| r.is_embedded).collect();
        assert_eq!(embedded, vec![true, false, false]);
    }

    #[test]
    fn test_reused_image_counted_once() {
        let entry = image(7, Some(RawColor::named("DeviceGray")));
        let small = ImageEntry {
            width: 300,
            height: 300,
            ..entry.clone()
        };
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()).with_image(small.clone()))
            .with_page(MemoryPage::new(PageSize::letter()).with_image(small))
            .with_image_samples(7, vec![0; 4]);

        let verdict = verdict_for(&source);
        assert_eq!(verdict.refs.len(), 2);
        assert_eq!(verdict.embedded, 1);
        assert_eq!(verdict.low_dpi, 1);
        assert_eq!(verdict.samples.len(), 1);
        assert!(verdict.refs.iter().all(|r| r.low_dpi));
    }

    #[test]
    fn test_resolution_at_threshold_is_not_low() {
        // 1275 px over 8.5 in is exactly 150 DPI
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()).with_image(image(1, None)))
            .with_image_samples(1, vec![0; 4]);

        let verdict = verdict_for(&source);
        assert_eq!(verdict.low_dpi, 0);
        assert_eq!(verdict.refs[0].dpi, Some(150.0));
        assert_eq!(verdict.refs[0].color, ColorMode::Unknown);
    }

    #[test]
    fn test_image_without_dimensions_has_no_dpi() {
        let entry = ImageEntry {
            width: 0,
            height: 0,
            ..image(1, Some(RawColor::named("DeviceRGB")))
        };
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()).with_image(entry))
            .with_image_samples(1, vec![0; 4]);

        let verdict = verdict_for(&source);
        assert_eq!(verdict.refs[0].dpi, None);
        assert!(!verdict.refs[0].low_dpi);
        assert_eq!(verdict.low_dpi, 0);
        assert!(verdict.warnings.is_empty());
    }

    #[test]
    fn test_jpeg_without_color_space_uses_sof() {
        let mut entry = image(4, None);
        entry.filter = Some("DCTDecode".to_string());
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()).with_image(entry))
            .with_image_samples(4, jpeg_header(4));

        let verdict = verdict_for(&source);
        assert_eq!(verdict.refs[0].color, ColorMode::Cmyk);
        assert_eq!(verdict.samples[0].raw_component_count, 4);
    }

    #[test]
    fn test_image_mask_has_no_color() {
        let mut entry = image(5, Some(RawColor::named("DeviceRGB")));
        entry.image_mask = true;
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()).with_image(entry))
            .with_image_samples(5, vec![0xFF]);

        let verdict = verdict_for(&source);
        assert_eq!(verdict.refs[0].color, ColorMode::Unknown);
        assert!(verdict.samples.is_empty());
    }
}
