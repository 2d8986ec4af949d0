//! Font embedding verification

use std::collections::BTreeSet;

use super::{Stage, Warning};
use crate::report::FontRef;
use crate::source::{DocumentSource, FontEntry, EMBEDDED_FONT_KEYS};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum FontKey {
    Object(u64),
    Name(String),
}

impl FontKey {
    fn of(font: &FontEntry) -> Self {
        match font.object_id {
            Some(id) => FontKey::Object(id),
            None => FontKey::Name(font.display_name().to_string()),
        }
    }
}

/// Outcome of checking every font in the document
#[derive(Debug, Clone)]
pub(crate) struct FontVerdict {
    /// Every distinct font is embedded; vacuously true with no fonts
    pub enclosed: bool,
    pub fonts: Vec<FontRef>,
    pub warnings: Vec<Warning>,
}

/// A font is embedded when its descriptor holds a font program
///
/// No descriptor at all counts as not embedded.
pub fn is_embedded(font: &FontEntry) -> bool {
    font.descriptor_keys
        .as_ref()
        .is_some_and(|keys| keys.iter().any(|key| EMBEDDED_FONT_KEYS.contains(&key.as_str())))
}

pub(crate) fn verify_fonts(source: &impl DocumentSource) -> FontVerdict {
    let mut seen = BTreeSet::new();
    let mut fonts = Vec::new();
    let mut warnings = Vec::new();

    for page in 1..=source.page_count() {
        let entries = match source.fonts(page) {
            Ok(entries) => entries,
            Err(issue) => {
                log::warn!("page {page}: {issue}");
                warnings.push(Warning::issue(Stage::Fonts, Some(page), &issue));
                continue;
            }
        };

        for font in entries {
            if !seen.insert(FontKey::of(&font)) {
                continue;
            }
            let name = font.display_name().to_string();
            let embedded = is_embedded(&font);
            log::debug!("font {name} on page {page}: embedded={embedded}");
            if !embedded {
                warnings.push(Warning::new(
                    Stage::Fonts,
                    Some(page),
                    format!("Font '{name}' is not embedded (page {page})"),
                ));
            }
            fonts.push(FontRef {
                name,
                is_embedded: embedded,
                page,
            });
        }
    }

    FontVerdict {
        enclosed: fonts.iter().all(|f| f.is_embedded),
        fonts,
        warnings,
    }
}
