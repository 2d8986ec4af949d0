//! In-memory object model
//!
//! Useful when the PDF was parsed by something other than lopdf, and for
//! exercising the analysis without building real documents.

use std::collections::BTreeMap;
use std::time::Duration;

use super::{
    ColorSpaceEntry, DocumentSource, DrawOp, FontEntry, ImageEntry, OutputIntentEntry, PageMarks,
    TextRun,
};
use crate::error::SignalIssue;
use crate::layout::PageSize;

/// A per-page category that can be marked unreadable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCategory {
    Fonts,
    Images,
    ColorSpaces,
    Marks,
}

impl PageCategory {
    fn signal(&self) -> &'static str {
        match self {
            PageCategory::Fonts => "fonts",
            PageCategory::Images => "images",
            PageCategory::ColorSpaces => "color spaces",
            PageCategory::Marks => "content stream",
        }
    }
}

/// One page of a [`MemorySource`]
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    pub size: Option<PageSize>,
    pub fonts: Vec<FontEntry>,
    pub images: Vec<ImageEntry>,
    pub color_spaces: Vec<ColorSpaceEntry>,
    pub marks: PageMarks,
    pub unreadable: Vec<PageCategory>,
}

impl MemoryPage {
    /// An empty page of the given size
    pub fn new(size: PageSize) -> Self {
        Self {
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn with_font(mut self, font: FontEntry) -> Self {
        self.fonts.push(font);
        self
    }

    pub fn with_image(mut self, image: ImageEntry) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_color_space(mut self, space: ColorSpaceEntry) -> Self {
        self.color_spaces.push(space);
        self
    }

    pub fn with_drawing(mut self, op: DrawOp) -> Self {
        self.marks.drawings.push(op);
        self
    }

    pub fn with_text(mut self, run: TextRun) -> Self {
        self.marks.text_runs.push(run);
        self
    }

    /// Make `category` fail when read
    pub fn with_unreadable(mut self, category: PageCategory) -> Self {
        self.unreadable.push(category);
        self
    }

    fn read<T: Clone>(&self, category: PageCategory, value: &T) -> Result<T, SignalIssue> {
        if self.unreadable.contains(&category) {
            Err(SignalIssue::unavailable(category.signal(), "marked unreadable"))
        } else {
            Ok(value.clone())
        }
    }
}

/// A fully in-memory [`DocumentSource`]
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub pages: Vec<MemoryPage>,
    pub output_intents: Vec<OutputIntentEntry>,
    pub optional_content: bool,
    pub ocg_names: Vec<String>,
    pub metadata: Option<Vec<u8>>,
    /// Sample bytes per image object; a missing entry fails materialization
    pub image_samples: BTreeMap<u64, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_output_intent(mut self, intent: OutputIntentEntry) -> Self {
        self.output_intents.push(intent);
        self
    }

    /// Declare `/OCProperties` with the given group names
    pub fn with_optional_content<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional_content = true;
        self.ocg_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_metadata(mut self, xmp: impl Into<Vec<u8>>) -> Self {
        self.metadata = Some(xmp.into());
        self
    }

    pub fn with_image_samples(mut self, object_id: u64, samples: impl Into<Vec<u8>>) -> Self {
        self.image_samples.insert(object_id, samples.into());
        self
    }

    fn page(&self, page: u32) -> Result<&MemoryPage, SignalIssue> {
        (page as usize)
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or_else(|| SignalIssue::unavailable(format!("page {page}"), "no such page"))
    }
}

impl DocumentSource for MemorySource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        self.page(page).ok().and_then(|p| p.size)
    }

    fn fonts(&self, page: u32) -> Result<Vec<FontEntry>, SignalIssue> {
        let p = self.page(page)?;
        p.read(PageCategory::Fonts, &p.fonts)
    }

    fn images(&self, page: u32) -> Result<Vec<ImageEntry>, SignalIssue> {
        let p = self.page(page)?;
        p.read(PageCategory::Images, &p.images)
    }

    fn color_spaces(&self, page: u32) -> Result<Vec<ColorSpaceEntry>, SignalIssue> {
        let p = self.page(page)?;
        p.read(PageCategory::ColorSpaces, &p.color_spaces)
    }

    fn marks(&self, page: u32) -> Result<PageMarks, SignalIssue> {
        let p = self.page(page)?;
        p.read(PageCategory::Marks, &p.marks)
    }

    fn image_samples(&self, object_id: u64, _limit: Option<Duration>) -> Result<Vec<u8>, SignalIssue> {
        self.image_samples
            .get(&object_id)
            .cloned()
            .ok_or_else(|| SignalIssue::unavailable(format!("image {object_id} samples"), "no data"))
    }

    fn output_intents(&self) -> Result<Vec<OutputIntentEntry>, SignalIssue> {
        Ok(self.output_intents.clone())
    }

    fn has_optional_content(&self) -> bool {
        self.optional_content
    }

    fn optional_content_groups(&self) -> Result<Vec<String>, SignalIssue> {
        Ok(self.ocg_names.clone())
    }

    fn metadata_stream(&self) -> Result<Option<Vec<u8>>, SignalIssue> {
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_are_one_based() {
        let source = MemorySource::new()
            .with_page(MemoryPage::new(PageSize::letter()))
            .with_page(MemoryPage::new(PageSize::a4()));

        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_size(1), Some(PageSize::letter()));
        assert_eq!(source.page_size(2), Some(PageSize::a4()));
        assert_eq!(source.page_size(0), None);
        assert_eq!(source.page_size(3), None);
    }

    #[test]
    fn test_unreadable_category_fails_alone() {
        let source = MemorySource::new().with_page(
            MemoryPage::new(PageSize::letter()).with_unreadable(PageCategory::Marks),
        );

        assert!(source.marks(1).is_err());
        assert_eq!(source.fonts(1), Ok(vec![]));
    }

    #[test]
    fn test_missing_samples_are_unavailable() {
        let source = MemorySource::new().with_image_samples(4, vec![1, 2, 3]);
        assert_eq!(source.image_samples(4, None), Ok(vec![1, 2, 3]));
        assert!(source.image_samples(5, None).is_err());
    }
}
