//! Per-page walk over images, vector drawings and text

use std::collections::BTreeSet;

use rayon::prelude::*;

use super::{Stage, Warning};
use crate::color::{is_cut_magenta, ColorMode, ColorSample, SourceKind};
use crate::config::{is_cut_contour_name, AnalysisOptions};
use crate::report::{TextColorSample, VectorElement};
use crate::source::{ColorSpaceEntry, DocumentSource, DrawOp, ImageEntry, TextRun};

/// One placement of an image on a page
#[derive(Debug, Clone)]
pub(crate) struct ImagePlacement {
    pub page: u32,
    pub entry: ImageEntry,
    pub dpi: Option<f64>,
}

/// Everything observed on one page
#[derive(Debug, Clone, Default)]
pub(crate) struct PageScan {
    pub page: u32,
    pub images: Vec<ImagePlacement>,
    pub vectors: Vec<VectorElement>,
    pub text_colors: Vec<TextColorSample>,
    /// Known-mode samples from drawings and text
    pub samples: Vec<ColorSample>,
    pub color_spaces: Vec<ColorSpaceEntry>,
    /// A path was painted in registration magenta or a cut-named spot color
    pub cut_heuristic: bool,
    pub warnings: Vec<Warning>,
}

/// Scan every page, in page order regardless of how the work was scheduled
pub(crate) fn scan_pages(source: &impl DocumentSource, options: &AnalysisOptions) -> Vec<PageScan> {
    let pages: Vec<u32> = (1..=source.page_count()).collect();

    let mut scans: Vec<PageScan> = if options.parallel_pages {
        pages
            .into_par_iter()
            .map(|page| scan_page(source, page, options))
            .collect()
    } else {
        pages
            .into_iter()
            .map(|page| scan_page(source, page, options))
            .collect()
    };

    scans.sort_by_key(|scan| scan.page);
    scans
}

fn scan_page(source: &impl DocumentSource, page: u32, options: &AnalysisOptions) -> PageScan {
    log::debug!("scanning page {page}");
    let mut scan = PageScan {
        page,
        ..Default::default()
    };
    let size = source.page_size(page);

    match source.images(page) {
        Ok(images) => {
            scan.images = images
                .into_iter()
                .map(|entry| ImagePlacement {
                    page,
                    dpi: size.and_then(|s| s.effective_dpi(entry.width, entry.height)),
                    entry,
                })
                .collect();
        }
        Err(issue) => scan.degrade(Stage::Images, &issue),
    }

    match source.color_spaces(page) {
        Ok(spaces) => scan.color_spaces = spaces,
        Err(issue) => scan.degrade(Stage::Color, &issue),
    }

    match source.marks(page) {
        Ok(marks) => {
            scan.scan_drawings(&marks.drawings);
            scan.scan_text(&marks.text_runs, options);
        }
        Err(issue) => scan.degrade(Stage::Color, &issue),
    }

    scan
}

fn is_cut_drawing(op: &DrawOp) -> bool {
    let magenta = [&op.fill, &op.stroke]
        .into_iter()
        .flatten()
        .any(is_cut_magenta);
    let spot = [&op.fill_spot, &op.stroke_spot]
        .into_iter()
        .flatten()
        .any(|name| is_cut_contour_name(name));
    magenta || spot
}

impl PageScan {
    fn degrade(&mut self, stage: Stage, issue: &crate::error::SignalIssue) {
        log::warn!("page {}: {issue}", self.page);
        self.warnings.push(Warning::issue(stage, Some(self.page), issue));
    }

    fn observe(&mut self, sample: ColorSample) -> ColorMode {
        if sample.mode.is_known() {
            self.samples.push(sample);
        }
        sample.mode
    }

    fn scan_drawings(&mut self, drawings: &[DrawOp]) {
        let mut listed = BTreeSet::new();
        for op in drawings {
            if op.fill.is_none() && op.stroke.is_none() {
                continue;
            }
            let fill = self.observe(ColorSample::observe(op.fill.as_ref(), SourceKind::VectorFill));
            let stroke =
                self.observe(ColorSample::observe(op.stroke.as_ref(), SourceKind::VectorStroke));
            if is_cut_drawing(op) {
                self.cut_heuristic = true;
            }
            if listed.insert((op.kind.as_str(), fill, stroke)) {
                self.vectors.push(VectorElement {
                    page: self.page,
                    kind: op.kind.as_str().to_string(),
                    fill,
                    stroke,
                });
            }
        }
    }

    fn scan_text(&mut self, runs: &[TextRun], options: &AnalysisOptions) {
        for run in runs {
            let mode = self.observe(ColorSample::observe(run.color.as_ref(), SourceKind::TextSpan));
            if self.text_colors.len() < options.max_text_samples_per_page {
                self.text_colors.push(TextColorSample {
                    page: self.page,
                    excerpt: run.text.chars().take(options.excerpt_chars).collect(),
                    mode,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RawColor;
    use crate::layout::PageSize;
    use crate::source::{MemoryPage, MemorySource, PageCategory, PaintKind};

    fn image(object_id: u64, width: u32, height: u32) -> ImageEntry {
        ImageEntry {
            object_id,
            width,
            height,
            color_space: Some(RawColor::named("DeviceCMYK")),
            filter: None,
            image_mask: false,
            external_reference: false,
        }
    }

    #[test]
    fn test_pages_come_back_in_order() {
        let mut source = MemorySource::new();
        for _ in 0..12 {
            source = source.with_page(MemoryPage::new(PageSize::letter()));
        }
        let scans = scan_pages(&source, &AnalysisOptions::default());
        let pages: Vec<u32> = scans.iter().map(|s| s.page).collect();
        assert_eq!(pages, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_image_dpi_from_page_size() {
        let source = MemorySource::new().with_page(
            MemoryPage::new(PageSize::letter()).with_image(image(3, 612, 792)),
        );
        let scans = scan_pages(&source, &AnalysisOptions::default());
        assert_eq!(scans[0].images[0].dpi, Some(72.0));
    }

    #[test]
    fn test_missing_page_size_has_no_dpi() {
        let page = MemoryPage {
            size: None,
            ..Default::default()
        }
        .with_image(image(3, 100, 100));
        let source = MemorySource::new().with_page(page);
        let scans = scan_pages(&source, &AnalysisOptions::default());
        assert_eq!(scans[0].images[0].dpi, None);
        assert!(scans[0].warnings.is_empty());
    }

    #[test]
    fn test_fill_and_stroke_stay_separate() {
        let op = DrawOp {
            kind: PaintKind::FillStroke,
            fill: Some(RawColor::Components(vec![0.0, 0.0, 0.0, 1.0])),
            stroke: Some(RawColor::Components(vec![0.2, 0.4, 0.6])),
            fill_spot: None,
            stroke_spot: None,
        };
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()).with_drawing(op));
        let scans = scan_pages(&source, &AnalysisOptions::default());

        let vector = &scans[0].vectors[0];
        assert_eq!(vector.fill, ColorMode::Cmyk);
        assert_eq!(vector.stroke, ColorMode::Rgb);
        assert_eq!(scans[0].samples.len(), 2);
        assert!(!scans[0].cut_heuristic);
    }

    #[test]
    fn test_magenta_and_spot_cut_heuristic() {
        let magenta = MemoryPage::new(PageSize::letter())
            .with_drawing(DrawOp::stroke(RawColor::Components(vec![1.0, 0.0, 1.0])));
        let spot = MemoryPage::new(PageSize::letter()).with_drawing(DrawOp {
            stroke_spot: Some("Thru-cut".to_string()),
            ..DrawOp::stroke(RawColor::named("Separation"))
        });
        let plain = MemoryPage::new(PageSize::letter())
            .with_drawing(DrawOp::fill(RawColor::PackedInt(0x00FF00)));
        let source = MemorySource::new().with_page(magenta).with_page(spot).with_page(plain);

        let scans = scan_pages(&source, &AnalysisOptions::default());
        let flags: Vec<bool> = scans.iter().map(|s| s.cut_heuristic).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn test_duplicate_vectors_listed_once() {
        let mut page = MemoryPage::new(PageSize::letter());
        for _ in 0..5 {
            page = page.with_drawing(DrawOp::fill(RawColor::Components(vec![0.5])));
        }
        let source = MemorySource::new().with_page(page);
        let scans = scan_pages(&source, &AnalysisOptions::default());
        assert_eq!(scans[0].vectors.len(), 1);
        assert_eq!(scans[0].samples.len(), 5);
    }

    #[test]
    fn test_text_excerpt_and_cap() {
        let long = "x".repeat(100);
        let mut page = MemoryPage::new(PageSize::letter());
        for _ in 0..3 {
            page = page.with_text(TextRun {
                text: long.clone(),
                color: Some(RawColor::Components(vec![0.0, 0.0, 0.0, 1.0])),
            });
        }
        let source = MemorySource::new().with_page(page);
        let options = AnalysisOptions {
            max_text_samples_per_page: 2,
            parallel_pages: false,
            ..Default::default()
        };

        let scans = scan_pages(&source, &options);
        assert_eq!(scans[0].text_colors.len(), 2);
        assert_eq!(scans[0].text_colors[0].excerpt.chars().count(), 30);
        assert_eq!(scans[0].samples.len(), 3);
    }

    #[test]
    fn test_unreadable_marks_degrade_to_warning() {
        let source = MemorySource::new().with_page(
            MemoryPage::new(PageSize::letter())
                .with_image(image(1, 10, 10))
                .with_unreadable(PageCategory::Marks),
        );
        let scans = scan_pages(&source, &AnalysisOptions::default());
        assert_eq!(scans[0].images.len(), 1);
        assert_eq!(scans[0].warnings.len(), 1);
        assert_eq!(scans[0].warnings[0].stage, Stage::Color);
    }
}
